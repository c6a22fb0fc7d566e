//! HTML-to-Markdown conversion and cleanup passes.
//!
//! Converts the HTML rendered from a note document to clean Markdown using the
//! `htmd` crate, then applies a series of cleanup passes to normalize
//! headings, whitespace, and leftover markup.

mod cleanup;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use notesite_shared::{NotesiteError, Result};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Result of converting an HTML fragment to Markdown.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// The Markdown body, ending with exactly one newline (empty for an empty document).
    pub markdown: String,
    /// Approximate length of the body: CJK characters count one each,
    /// other text counts by whitespace-separated words.
    pub word_count: usize,
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Convert HTML to clean Markdown.
///
/// 1. Takes the `<body>` content if a full document was given
/// 2. Pre-renders HTML tables into markdown tables
/// 3. Converts HTML → Markdown via `htmd` and puts the tables back
/// 4. Runs the cleanup pipeline
#[instrument(skip_all, fields(html_len = html.len()))]
pub fn convert(html: &str) -> Result<ConvertResult> {
    let content_html = extract_content_html(html);
    let (content_html, tables) = preprocess_tables(&content_html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "iframe", "noscript"])
        .build();

    let raw_markdown = converter
        .convert(&content_html)
        .map_err(|e| NotesiteError::Conversion(format!("htmd conversion failed: {e}")))?;

    debug!(raw_len = raw_markdown.len(), "htmd conversion complete");

    let markdown = cleanup::run_pipeline(&tables.restore(&raw_markdown));
    let word_count = count_words(&markdown);

    debug!(word_count, final_len = markdown.len(), "conversion complete");

    Ok(ConvertResult {
        markdown,
        word_count,
    })
}

// ---------------------------------------------------------------------------
// Table pre-processing
// ---------------------------------------------------------------------------

/// First char of every table marker. Private-use, so `htmd` passes it through
/// unescaped.
const MARKER_OPEN: char = '\u{E000}';
const MARKER_CLOSE: char = '\u{E001}';

/// Tables rendered ahead of `htmd`, waiting to replace their markers.
struct PendingTables {
    /// Run of [`MARKER_OPEN`] that occurs nowhere in the input HTML.
    sentinel: String,
    rendered: Vec<String>,
}

impl PendingTables {
    fn new(html: &str) -> Self {
        let mut sentinel = String::from(MARKER_OPEN);
        while html.contains(&sentinel) {
            sentinel.push(MARKER_OPEN);
        }
        Self {
            sentinel,
            rendered: Vec::new(),
        }
    }

    /// `<sentinel><index><close>`. The close char keeps `1` from matching
    /// inside `10`.
    fn marker(&self, index: usize) -> String {
        format!("{}{index}{MARKER_CLOSE}", self.sentinel)
    }

    fn restore(&self, md: &str) -> String {
        self.rendered
            .iter()
            .enumerate()
            .fold(md.to_string(), |acc, (i, table)| {
                acc.replacen(&self.marker(i), table, 1)
            })
    }
}

/// Swap each top-level HTML `<table>` for a marker paragraph and render it as
/// a markdown table.
///
/// `htmd` 0.1 doesn't support table conversion and would collapse the rows of
/// a pre-rendered table, so the tables are put back after conversion by
/// [`PendingTables::restore`].
fn preprocess_tables(html: &str) -> (String, PendingTables) {
    static TABLE_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("table").expect("valid selector"));

    let mut tables = PendingTables::new(html);
    let doc = Html::parse_fragment(html);

    if doc.select(&TABLE_SEL).next().is_none() {
        return (html.to_string(), tables);
    }

    // Match against the parser's own serialization so `table_el.html()` is
    // always a substring.
    let mut result = doc.root_element().inner_html();

    for table_el in doc.select(&TABLE_SEL) {
        let table_html = table_el.html();
        // Nested tables disappear with their outer table.
        if !result.contains(&table_html) {
            continue;
        }
        let marker = format!("<p>{}</p>", tables.marker(tables.rendered.len()));
        result = result.replacen(&table_html, &marker, 1);
        tables.rendered.push(html_table_to_markdown(&table_el));
    }

    (result, tables)
}

/// Convert a single HTML table element to a markdown table string.
///
/// The first row is always the header row.
fn html_table_to_markdown(table: &scraper::ElementRef) -> String {
    static TR_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
    static CELL_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));

    let mut rows: Vec<Vec<String>> = table
        .select(&TR_SEL)
        .map(|tr| tr.select(&CELL_SEL).map(|cell| cell_text(&cell)).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    if col_count == 0 {
        return String::new();
    }

    for row in &mut rows {
        row.resize(col_count, String::new());
    }

    let mut md = String::from("\n\n");

    let header = &rows[0];
    md.push_str("| ");
    md.push_str(&header.join(" | "));
    md.push_str(" |\n");

    md.push_str("| ");
    md.push_str(&vec!["---"; col_count].join(" | "));
    md.push_str(" |\n");

    for row in &rows[1..] {
        md.push_str("| ");
        md.push_str(&row.join(" | "));
        md.push_str(" |\n");
    }

    md.push('\n');
    md
}

/// Cell text with `<br>` kept for line breaks. Pipes and raw newlines would
/// break the row.
fn cell_text(cell: &scraper::ElementRef) -> String {
    let mut text = String::new();
    for node in cell.descendants() {
        match node.value() {
            scraper::Node::Text(t) => text.push_str(t),
            scraper::Node::Element(e) if e.name() == "br" => text.push_str("<br>"),
            _ => {}
        }
    }
    text.trim()
        .replace('|', "\\|")
        .replace(['\n', '\r'], " ")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Use the `<body>` content of a full document; fragments pass through as-is.
fn extract_content_html(html: &str) -> String {
    static BODY_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("body").expect("valid selector"));

    if !html.contains("<body") {
        return html.to_string();
    }

    let doc = Html::parse_document(html);
    doc.select(&BODY_SEL)
        .next()
        .map(|body| body.inner_html())
        .unwrap_or_else(|| html.to_string())
}

/// Count words in the Markdown body, excluding fenced code blocks.
fn count_words(md: &str) -> usize {
    static CODE_BLOCK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex"));

    let without_code = CODE_BLOCK_RE.replace_all(md, "");
    without_code
        .split_whitespace()
        .filter(|w| !w.chars().all(|c| c == '#' || c == '-' || c == '|'))
        .map(|w| {
            let cjk = w.chars().filter(|c| is_cjk(*c)).count();
            let has_other = w.chars().any(|c| c.is_alphanumeric() && !is_cjk(c));
            cjk + usize::from(has_other)
        })
        .sum()
}

fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
