//! End-to-end `build` pipeline: scan → classify → convert → write → navigation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use notesite_shared::{Classification, NotesiteError, Result, SiteConfig};

use crate::assembler::{self, is_valid_segment};
use crate::classifier::classify;
use crate::scanner::scan_sources;
use crate::toc::ChapterIndex;

/// Result of the `build_site` pipeline.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of source documents converted.
    pub converted: usize,
    /// Source documents skipped because their name gives no usable label.
    pub skipped: usize,
    /// Number of distinct chapters.
    pub chapters: usize,
    /// Root the site was written to.
    pub output_root: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a document has been converted and written.
    fn file_converted(&self, name: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_converted(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run the full `build` pipeline.
///
/// Files are processed one at a time, in file-name order. The first
/// conversion or filesystem error aborts the run; pages written before it
/// are left in place.
#[instrument(
    skip_all,
    fields(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
    )
)]
pub async fn build_site(
    config: &SiteConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();

    // --- Phase 1: Scan ---
    progress.phase("Scanning sources");
    let sources = scan_sources(&config.input_dir)?;
    let total = sources.len();

    if sources.is_empty() {
        info!("no source documents found");
    } else {
        info!(count = total, "found source documents");
    }

    // --- Phase 2: Convert and write pages ---
    progress.phase("Converting documents");
    let mut index = ChapterIndex::new();
    let mut written: HashSet<PathBuf> = HashSet::new();
    let mut skipped = 0;

    for (i, path) in sources.iter().enumerate() {
        let name = file_name(path);
        let classification = classify(&name);

        if !is_valid_segment(&classification.chapter_label)
            || !is_valid_segment(&classification.problem_label)
        {
            warn!(
                file = %name,
                problem = %classification.problem_label,
                "file name gives no usable page name, skipping"
            );
            skipped += 1;
            progress.file_converted(&name, i + 1, total);
            continue;
        }

        let markdown = convert_document(path.clone()).await?;
        let page = assembler::write_problem(
            &config.output_dir,
            &classification.chapter_label,
            &classification.problem_label,
            &markdown,
        )?;

        if !written.insert(page.clone()) {
            warn!(
                file = %name,
                page = %page.display(),
                "page already written by an earlier file this run, overwriting"
            );
        }

        debug!(
            file = %name,
            chapter = %classification.chapter_label,
            problem = %classification.problem_label,
            "document converted"
        );

        index.push(&classification);
        progress.file_converted(&name, i + 1, total);
    }

    // --- Phase 3: Navigation ---
    progress.phase("Writing navigation");
    let chapters = index.into_sorted();
    assembler::write_navigation(
        &config.output_dir,
        &config.title,
        &config.home_label,
        &chapters,
    )?;

    let result = BuildResult {
        converted: total - skipped,
        skipped,
        chapters: chapters.len(),
        output_root: config.output_dir.clone(),
        elapsed: start.elapsed(),
    };

    info!(
        converted = result.converted,
        skipped = result.skipped,
        chapters = result.chapters,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "build complete"
    );

    progress.done(&result);
    Ok(result)
}

/// Classify every source document in `dir` without converting anything.
pub fn classify_dir(dir: &Path) -> Result<Vec<(PathBuf, Classification)>> {
    let sources = scan_sources(dir)?;
    Ok(sources
        .into_iter()
        .map(|path| {
            let classification = classify(&file_name(&path));
            (path, classification)
        })
        .collect())
}

/// docx → HTML on the blocking pool, then HTML → Markdown.
async fn convert_document(path: PathBuf) -> Result<String> {
    let html = tokio::task::spawn_blocking(move || notesite_docx::docx_to_html(&path))
        .await
        .map_err(|e| NotesiteError::Conversion(format!("conversion task failed: {e}")))??;

    let converted = notesite_markdown::convert(&html)?;
    debug!(word_count = converted.word_count, "markdown ready");
    Ok(converted.markdown)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
