//! Application configuration for notesite.
//!
//! User config lives at `~/.notesite/notesite.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NotesiteError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "notesite.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".notesite";

// ---------------------------------------------------------------------------
// Config structs (matching notesite.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generated site settings.
    #[serde(default)]
    pub site: SiteSection,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory scanned for `.docx` sources.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Root directory the site is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_input_dir() -> String {
    ".".into()
}
fn default_output_dir() -> String {
    "docs".into()
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    /// Heading of the top-level `README.md`.
    #[serde(default = "default_title")]
    pub title: String,

    /// Text of the root link at the top of `_sidebar.md`.
    #[serde(default = "default_home_label")]
    pub home_label: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            home_label: default_home_label(),
        }
    }
}

fn default_title() -> String {
    "学习笔记".into()
}
fn default_home_label() -> String {
    "首页".into()
}

// ---------------------------------------------------------------------------
// Site config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Directory scanned (non-recursively) for sources.
    pub input_dir: PathBuf,
    /// Output root for the generated site.
    pub output_dir: PathBuf,
    /// Heading of the top-level index.
    pub title: String,
    /// Root link text in the sidebar.
    pub home_label: String,
}

impl From<&AppConfig> for SiteConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            input_dir: PathBuf::from(&config.defaults.input_dir),
            output_dir: PathBuf::from(&config.defaults.output_dir),
            title: config.site.title.clone(),
            home_label: config.site.home_label.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.notesite/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NotesiteError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.notesite/notesite.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NotesiteError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NotesiteError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NotesiteError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NotesiteError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NotesiteError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("学习笔记"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
output_dir = "/tmp/site"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.output_dir, "/tmp/site");
        assert_eq!(config.defaults.input_dir, ".");
        assert_eq!(config.site.home_label, "首页");
    }

    #[test]
    fn site_config_from_app_config() {
        let mut app = AppConfig::default();
        app.site.title = "算法笔记".into();
        let site = SiteConfig::from(&app);
        assert_eq!(site.input_dir, PathBuf::from("."));
        assert_eq!(site.output_dir, PathBuf::from("docs"));
        assert_eq!(site.title, "算法笔记");
    }

    #[test]
    fn load_config_from_reports_parse_errors() {
        let path = std::env::temp_dir().join("notesite-bad-config-test.toml");
        std::fs::write(&path, "[defaults\noutput_dir = ").expect("write temp config");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));

        let _ = std::fs::remove_file(&path);
    }
}
