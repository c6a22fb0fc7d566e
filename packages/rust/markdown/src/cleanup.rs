//! Post-conversion cleanup pipeline for Markdown output.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on raw Markdown text.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = md.to_string();

    result = demote_h1(&result);
    result = strip_leftover_html(&result);
    result = normalize_whitespace(&result);
    result = clean_blank_lines(&result);
    result = ensure_trailing_newline(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Demote H1 headings
// ---------------------------------------------------------------------------

/// Turn every body H1 into an H2.
///
/// The site writer puts its own `# <chapter> · <problem>` heading on top of
/// each page, so the body must not carry a second H1. Lines inside fenced
/// code blocks are left alone.
fn demote_h1(md: &str) -> String {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^#\s+(.+)$").expect("valid regex"));

    let mut in_code_block = false;
    let mut lines: Vec<String> = Vec::new();

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
        }

        match H1_RE.captures(line) {
            Some(caps) if !in_code_block => lines.push(format!("## {}", &caps[1])),
            _ => lines.push(line.to_string()),
        }
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Strip leftover HTML tags
// ---------------------------------------------------------------------------

/// Remove stray wrapper tags that survived the conversion.
///
/// We keep `<br>`, `<sup>` and `<sub>` since Markdown renderers support them,
/// and we preserve content inside tags (just remove the tags themselves).
fn strip_leftover_html(md: &str) -> String {
    let mut result = String::new();
    let mut in_code_block = false;

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            result.push_str(line);
            result.push('\n');
            continue;
        }

        if in_code_block {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        result.push_str(&strip_html_tags(line));
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

/// Strip wrapper HTML tags from a single line, preserving inner text.
fn strip_html_tags(line: &str) -> String {
    static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"</?(?:div|span|section|font|u|o:p|tbody|thead)(?:\s[^>]*)?>")
            .expect("valid regex")
    });

    HTML_TAG_RE.replace_all(line, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Normalize whitespace
// ---------------------------------------------------------------------------

/// Trim trailing whitespace on every line.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 4: Collapse blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into exactly one.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE
        .replace_all(md.trim_start_matches('\n'), "\n\n")
        .to_string()
}

// ---------------------------------------------------------------------------
// Pass 5: Ensure trailing newline
// ---------------------------------------------------------------------------

/// Ensure non-empty output ends with exactly one newline.
fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_end_matches('\n');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{trimmed}\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demote_h1_turns_h1_into_h2() {
        let input = "# Title\n\nSome text\n\n# Another\n\n## Sub";
        assert_eq!(demote_h1(input), "## Title\n\nSome text\n\n## Another\n\n## Sub");
    }

    #[test]
    fn demote_h1_skips_code_blocks() {
        let input = "```sh\n# comment\n```";
        assert_eq!(demote_h1(input), input);
    }

    #[test]
    fn clean_blank_lines_collapses_excess() {
        assert_eq!(clean_blank_lines("Line 1\n\n\n\n\nLine 2"), "Line 1\n\nLine 2");
    }

    #[test]
    fn clean_blank_lines_drops_leading_blank_lines() {
        assert_eq!(clean_blank_lines("\n\nText"), "Text");
    }

    #[test]
    fn strip_leftover_html_removes_span_tags() {
        let input = "正文 <span style=\"color:red\">重点</span> 结束";
        let result = strip_leftover_html(input);
        assert_eq!(result, "正文 重点 结束");
    }

    #[test]
    fn strip_leftover_html_keeps_br_and_sup() {
        let input = "| a<br>b | x<sup>2</sup> |";
        assert_eq!(strip_leftover_html(input), input);
    }

    #[test]
    fn strip_leftover_html_preserves_code_blocks() {
        let input = "```html\n<div>Preserved</div>\n```";
        assert!(strip_leftover_html(input).contains("<div>Preserved</div>"));
    }

    #[test]
    fn normalize_whitespace_trims_trailing() {
        assert_eq!(
            normalize_whitespace("Line 1   \nLine 2\t\nLine 3"),
            "Line 1\nLine 2\nLine 3"
        );
    }

    #[test]
    fn ensure_trailing_newline_normalizes() {
        assert_eq!(ensure_trailing_newline("Content"), "Content\n");
        assert_eq!(ensure_trailing_newline("Content\n\n\n"), "Content\n");
        assert_eq!(ensure_trailing_newline("\n\n"), "");
    }

    #[test]
    fn full_pipeline_cleans_markdown() {
        let input = "\n# Title   \n\n\n\n\n\n## Section\n\n<div>Some content</div>\n\nEnd";
        let result = run_pipeline(input);
        assert_eq!(result, "## Title\n\n## Section\n\nSome content\n\nEnd\n");
    }
}
