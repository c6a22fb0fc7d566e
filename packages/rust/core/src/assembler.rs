//! Site writer.
//!
//! Writes the per-problem pages and the navigation documents of the
//! generated site:
//!
//! ```text
//! <output_root>/
//! ├── README.md             top-level index
//! ├── _sidebar.md           navigation list
//! └── 第一章：基础知识/
//!     ├── README.md         chapter index
//!     └── 第一题.md
//! ```
//!
//! Every write overwrites the target unconditionally.

use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, info, instrument};

use notesite_shared::{Chapter, NotesiteError, Result};

/// Index file name, both at the root and in each chapter directory.
pub const README_FILE: &str = "README.md";

/// Sidebar navigation file name.
pub const SIDEBAR_FILE: &str = "_sidebar.md";

/// Line written in place of an empty list.
pub const EMPTY_PLACEHOLDER: &str = "暂无内容";

/// Characters left alone by JavaScript's `encodeURIComponent`.
const LABEL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a chapter or problem label for use as a link path segment.
pub fn encode_label(label: &str) -> String {
    utf8_percent_encode(label, LABEL_ENCODE_SET).to_string()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Page content for one problem: heading, blank line, body, one trailing newline.
pub fn render_problem(chapter: &str, problem: &str, body: &str) -> String {
    let body = body.trim_end_matches('\n');
    format!("# {chapter} · {problem}\n\n{body}\n")
}

/// Chapter index listing each problem page.
pub fn render_chapter_readme(chapter: &Chapter) -> String {
    let mut md = format!("# {}\n\n", chapter.label);

    if chapter.problems.is_empty() {
        md.push_str(EMPTY_PLACEHOLDER);
        md.push('\n');
        return md;
    }

    for problem in &chapter.problems {
        md.push_str(&format!(
            "- [{}](./{}.md)\n",
            problem.label,
            encode_label(&problem.label)
        ));
    }
    md
}

/// Top-level index listing each chapter index.
pub fn render_root_readme(title: &str, chapters: &[Chapter]) -> String {
    let mut md = format!("# {title}\n\n");

    if chapters.is_empty() {
        md.push_str(EMPTY_PLACEHOLDER);
        md.push('\n');
        return md;
    }

    for chapter in chapters {
        md.push_str(&format!(
            "- [{}](./{}/{README_FILE})\n",
            chapter.label,
            encode_label(&chapter.label)
        ));
    }
    md
}

/// Sidebar: root link, then each chapter label with its problems indented below.
pub fn render_sidebar(home_label: &str, chapters: &[Chapter]) -> String {
    let mut md = format!("- [{home_label}](/)\n");

    for chapter in chapters {
        let chapter_segment = encode_label(&chapter.label);
        md.push_str(&format!("- **{}**\n", chapter.label));
        for problem in &chapter.problems {
            md.push_str(&format!(
                "  - [{}](/{chapter_segment}/{}.md)\n",
                problem.label,
                encode_label(&problem.label)
            ));
        }
    }
    md
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write `<output_root>/<chapter>/<problem>.md`. Returns the written path.
pub fn write_problem(
    output_root: &Path,
    chapter: &str,
    problem: &str,
    body: &str,
) -> Result<PathBuf> {
    validate_segment(chapter)?;
    validate_segment(problem)?;

    let path = output_root.join(chapter).join(format!("{problem}.md"));
    write_file(&path, &render_problem(chapter, problem, body))?;
    Ok(path)
}

/// Write `<output_root>/<chapter>/README.md`. Returns the written path.
pub fn write_chapter_readme(output_root: &Path, chapter: &Chapter) -> Result<PathBuf> {
    validate_segment(&chapter.label)?;
    let path = output_root.join(&chapter.label).join(README_FILE);
    write_file(&path, &render_chapter_readme(chapter))?;
    Ok(path)
}

/// Write the top-level `README.md`. Returns the written path.
pub fn write_root_readme(
    output_root: &Path,
    title: &str,
    chapters: &[Chapter],
) -> Result<PathBuf> {
    let path = output_root.join(README_FILE);
    write_file(&path, &render_root_readme(title, chapters))?;
    Ok(path)
}

/// Write `_sidebar.md`. Returns the written path.
pub fn write_sidebar(
    output_root: &Path,
    home_label: &str,
    chapters: &[Chapter],
) -> Result<PathBuf> {
    let path = output_root.join(SIDEBAR_FILE);
    write_file(&path, &render_sidebar(home_label, chapters))?;
    Ok(path)
}

/// Write every chapter README, the root README, and the sidebar.
#[instrument(
    skip_all,
    fields(root = %output_root.display(), chapters = chapters.len())
)]
pub fn write_navigation(
    output_root: &Path,
    title: &str,
    home_label: &str,
    chapters: &[Chapter],
) -> Result<()> {
    for chapter in chapters {
        write_chapter_readme(output_root, chapter)?;
    }
    write_root_readme(output_root, title, chapters)?;
    write_sidebar(output_root, home_label, chapters)?;

    info!("navigation written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write a file, creating parent directories as needed.
fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| NotesiteError::io(parent, e))?;
    }

    std::fs::write(path, content).map_err(|e| NotesiteError::io(path, e))?;

    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}

/// Whether `label` can be used as a single path component under the output root.
pub fn is_valid_segment(label: &str) -> bool {
    !(label.is_empty() || label == "." || label == ".." || label.contains(['/', '\\']))
}

fn validate_segment(label: &str) -> Result<()> {
    if !is_valid_segment(label) {
        return Err(NotesiteError::validation(format!(
            "label {label:?} cannot be used as a file name"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use notesite_shared::ProblemEntry;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "notesite-assembler-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn chapter(label: &str, number: u32, problems: &[(&str, u32)]) -> Chapter {
        Chapter {
            label: label.into(),
            number,
            problems: problems
                .iter()
                .map(|(label, number)| ProblemEntry {
                    label: (*label).into(),
                    number: *number,
                })
                .collect(),
        }
    }

    /// Inverse of `encode_label`, for checking links.
    fn decode(segment: &str) -> String {
        percent_encoding::percent_decode_str(segment)
            .decode_utf8()
            .unwrap()
            .into_owned()
    }

    #[test]
    fn encode_label_matches_encode_uri_component() {
        assert_eq!(encode_label("第一题"), "%E7%AC%AC%E4%B8%80%E9%A2%98");
        assert_eq!(encode_label("a b&c"), "a%20b%26c");
        assert_eq!(encode_label("x-y_z.(1)!~*'"), "x-y_z.(1)!~*'");
        assert!(!encode_label("第一章：基础知识").contains('：'));
    }

    #[test]
    fn encoded_labels_round_trip() {
        for label in ["第一章：基础知识", "第十二题", "杂项 (旧)", "100%"] {
            assert_eq!(decode(&encode_label(label)), label);
        }
    }

    #[test]
    fn render_problem_layout() {
        let page = render_problem("第一章：基础知识", "第一题", "正文\n\n");
        assert_eq!(page, "# 第一章：基础知识 · 第一题\n\n正文\n");
    }

    #[test]
    fn render_chapter_readme_lists_problems() {
        let ch = chapter("第一章：基础知识", 1, &[("第一题", 1), ("第二题", 2)]);
        let md = render_chapter_readme(&ch);
        assert_eq!(
            md,
            format!(
                "# 第一章：基础知识\n\n- [第一题](./{}.md)\n- [第二题](./{}.md)\n",
                encode_label("第一题"),
                encode_label("第二题")
            )
        );
    }

    #[test]
    fn render_chapter_readme_placeholder() {
        let md = render_chapter_readme(&chapter("第六章", 6, &[]));
        assert_eq!(md, format!("# 第六章\n\n{EMPTY_PLACEHOLDER}\n"));
    }

    #[test]
    fn render_root_readme_links_chapters() {
        let chapters = vec![chapter("未分章", 0, &[("杂项", 0)]), chapter("第六章", 6, &[])];
        let md = render_root_readme("学习笔记", &chapters);
        assert!(md.starts_with("# 学习笔记\n\n"));

        let links: Vec<&str> = md
            .lines()
            .filter_map(|l| l.split_once("](./").map(|(_, rest)| rest))
            .collect();
        assert_eq!(links.len(), 2);
        assert_eq!(decode(links[0].trim_end_matches("/README.md)")), "未分章");
        assert_eq!(decode(links[1].trim_end_matches("/README.md)")), "第六章");
    }

    #[test]
    fn render_root_readme_placeholder() {
        assert_eq!(
            render_root_readme("学习笔记", &[]),
            format!("# 学习笔记\n\n{EMPTY_PLACEHOLDER}\n")
        );
    }

    #[test]
    fn render_sidebar_layout() {
        let chapters = vec![chapter("第一章：基础知识", 1, &[("第一题", 1)])];
        let md = render_sidebar("首页", &chapters);
        assert_eq!(
            md,
            format!(
                "- [首页](/)\n- **第一章：基础知识**\n  - [第一题](/{}/{}.md)\n",
                encode_label("第一章：基础知识"),
                encode_label("第一题")
            )
        );
    }

    #[test]
    fn render_sidebar_empty_has_only_root_link() {
        assert_eq!(render_sidebar("首页", &[]), "- [首页](/)\n");
    }

    #[test]
    fn write_problem_creates_chapter_dir() {
        let tmp = temp_dir();
        let path = write_problem(&tmp, "第一章：基础知识", "第一题", "正文\n").unwrap();

        assert_eq!(path, tmp.join("第一章：基础知识").join("第一题.md"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# 第一章：基础知识 · 第一题\n\n正文\n");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_problem_overwrites() {
        let tmp = temp_dir();
        write_problem(&tmp, "第二章：进阶技巧", "第一题", "旧内容\n").unwrap();
        let path = write_problem(&tmp, "第二章：进阶技巧", "第一题", "新内容\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("新内容"));
        assert!(!content.contains("旧内容"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn segment_validity() {
        assert!(is_valid_segment("第一题"));
        assert!(is_valid_segment("a.b"));
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(!is_valid_segment(bad), "{bad:?}");
        }
    }

    #[test]
    fn write_problem_rejects_escaping_labels() {
        let tmp = temp_dir();
        assert!(write_problem(&tmp, "..", "第一题", "").is_err());
        assert!(write_problem(&tmp, "第一章", "a/b", "").is_err());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_chapter_readme_writes_index() {
        let tmp = temp_dir();
        let ch = chapter("第二章：进阶技巧", 2, &[("第一题", 1)]);
        let path = write_chapter_readme(&tmp, &ch).unwrap();

        assert_eq!(path, tmp.join("第二章：进阶技巧").join(README_FILE));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), render_chapter_readme(&ch));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_chapter_readme_rejects_escaping_label() {
        let tmp = temp_dir();
        assert!(write_chapter_readme(&tmp, &chapter("..", 0, &[])).is_err());
        assert!(!tmp.join(README_FILE).exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_root_readme_overwrites() {
        let tmp = temp_dir();
        write_root_readme(&tmp, "旧标题", &[]).unwrap();
        let chapters = vec![chapter("第六章", 6, &[])];
        let path = write_root_readme(&tmp, "学习笔记", &chapters).unwrap();

        assert_eq!(path, tmp.join(README_FILE));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, render_root_readme("学习笔记", &chapters));
        assert!(!content.contains("旧标题"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_sidebar_creates_output_root() {
        let tmp = temp_dir().join("nested").join("site");
        let path = write_sidebar(&tmp, "首页", &[]).unwrap();

        assert_eq!(path, tmp.join(SIDEBAR_FILE));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "- [首页](/)\n");

        let _ = std::fs::remove_dir_all(tmp.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn write_navigation_writes_all_indexes() {
        let tmp = temp_dir();
        let chapters = vec![
            chapter("第一章：基础知识", 1, &[("第一题", 1)]),
            chapter("第六章", 6, &[("第二题", 2)]),
        ];

        write_navigation(&tmp, "学习笔记", "首页", &chapters).unwrap();

        assert!(tmp.join(README_FILE).exists());
        assert!(tmp.join(SIDEBAR_FILE).exists());
        assert!(tmp.join("第一章：基础知识").join(README_FILE).exists());
        assert!(tmp.join("第六章").join(README_FILE).exists());

        let sidebar = std::fs::read_to_string(tmp.join(SIDEBAR_FILE)).unwrap();
        assert_eq!(sidebar, render_sidebar("首页", &chapters));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
