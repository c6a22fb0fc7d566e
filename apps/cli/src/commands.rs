//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use notesite_core::pipeline::{BuildResult, ProgressReporter, build_site, classify_dir};
use notesite_shared::{AppConfig, SiteConfig, init_config, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// notesite: batch-convert .docx notes into a Markdown site.
#[derive(Parser)]
#[command(
    name = "notesite",
    version,
    about = "Convert chapter/problem .docx notes into a docsify-style Markdown site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert every .docx in the input directory and write the site.
    Build {
        /// Directory holding the source documents.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output root for the generated site.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show how each source file would be classified, without writing anything.
    Classify {
        /// Directory holding the source documents.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "notesite=info",
        1 => "notesite=debug",
        _ => "notesite=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build { input, out } => cmd_build(input, out).await,
        Command::Classify { input, json } => cmd_classify(input, json),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Merge the config file with command-line overrides.
fn resolve_site_config(input: Option<PathBuf>, out: Option<PathBuf>) -> Result<SiteConfig> {
    let config = load_config()?;
    let mut site = SiteConfig::from(&config);
    if let Some(input) = input {
        site.input_dir = input;
    }
    if let Some(out) = out {
        site.output_dir = out;
    }
    Ok(site)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(input: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
    let site = resolve_site_config(input, out)?;

    info!(
        input = %site.input_dir.display(),
        output = %site.output_dir.display(),
        "building site"
    );

    let reporter = CliProgress::new();
    let result = build_site(&site, &reporter).await?;

    println!("{}", build_summary(&result, &site.input_dir));
    Ok(())
}

/// Summary line printed after a successful build.
fn build_summary(result: &BuildResult, input_dir: &Path) -> String {
    if result.converted == 0 && result.skipped == 0 {
        return format!("No .docx files found in {}", input_dir.display());
    }

    let mut line = format!(
        "Converted {} file(s) into {}",
        result.converted,
        result.output_root.display()
    );
    if result.skipped > 0 {
        line.push_str(&format!(" ({} skipped)", result.skipped));
    }
    line
}

fn cmd_classify(input: Option<PathBuf>, json: bool) -> Result<()> {
    let site = resolve_site_config(input, None)?;
    let classified = classify_dir(&site.input_dir)?;

    if json {
        let entries: Vec<serde_json::Value> = classified
            .iter()
            .map(|(path, c)| {
                serde_json::json!({
                    "file": path.file_name().map(|n| n.to_string_lossy().into_owned()),
                    "classification": c,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if classified.is_empty() {
        println!("No .docx files found in {}", site.input_dir.display());
        return Ok(());
    }

    for (path, c) in &classified {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("{name}\t{}\t{}", c.chapter_label, c.problem_label);
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_converted(&self, name: &str, current: usize, total: usize) {
        self.spinner.set_message(format!("Converting [{current}/{total}] {name}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

// Clears the spinner when a build fails before `done`.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_with_overrides() {
        let cli = Cli::try_parse_from([
            "notesite", "-v", "build", "--input", "notes", "--out", "site",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Build { input, out } => {
                assert_eq!(input, Some(PathBuf::from("notes")));
                assert_eq!(out, Some(PathBuf::from("site")));
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn parses_classify_json_and_log_format() {
        let cli =
            Cli::try_parse_from(["notesite", "classify", "--json", "--log-format", "json"])
                .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(cli.command, Command::Classify { input: None, json: true }));
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["notesite", "--log-format", "xml", "build"]).is_err());
    }

    fn result(converted: usize, skipped: usize) -> BuildResult {
        BuildResult {
            converted,
            skipped,
            chapters: 1,
            output_root: PathBuf::from("docs"),
            elapsed: std::time::Duration::from_millis(5),
        }
    }

    #[test]
    fn build_summary_reports_converted_count() {
        let line = build_summary(&result(3, 0), Path::new("notes"));
        let expected = format!("Converted 3 file(s) into {}", Path::new("docs").display());
        assert_eq!(line, expected);
    }

    #[test]
    fn build_summary_reports_empty_input() {
        let line = build_summary(&result(0, 0), Path::new("notes"));
        let expected = format!("No .docx files found in {}", Path::new("notes").display());
        assert_eq!(line, expected);
    }

    #[test]
    fn build_summary_mentions_skipped_files() {
        let line = build_summary(&result(0, 2), Path::new("notes"));
        assert!(line.starts_with("Converted 0 file(s) into "));
        assert!(line.ends_with(" (2 skipped)"));
    }

    #[test]
    fn dropping_progress_clears_unfinished_spinner() {
        let progress = CliProgress::new();
        let spinner = progress.spinner.clone();
        progress.phase("Converting documents");
        drop(progress);
        assert!(spinner.is_finished());
    }
}
