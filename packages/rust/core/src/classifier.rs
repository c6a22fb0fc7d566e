//! Filename classifier.
//!
//! Source files are named `<chapter-token> <problem-token>.docx`, e.g.
//! `第三章 第十二题.docx`. The chapter and problem numbers are written as
//! Chinese numerals and drive the sort order of the generated site.

use std::sync::LazyLock;

use regex::Regex;

use notesite_shared::Classification;

/// Chapter label used when a filename has no problem token.
pub const UNCLASSIFIED_LABEL: &str = "未分章";

/// Source document extension, matched case-insensitively.
pub const SOURCE_EXTENSION: &str = "docx";

/// Separator between a chapter label and its title.
const TITLE_SEPARATOR: char = '：';

/// Human-readable title of a known chapter number.
pub fn chapter_title(number: u32) -> Option<&'static str> {
    match number {
        1 => Some("基础知识"),
        2 => Some("进阶技巧"),
        3 => Some("综合应用"),
        4 => Some("专题突破"),
        5 => Some("真题演练"),
        _ => None,
    }
}

/// Decode a Chinese numeral in the range 0–99.
///
/// Supported forms are a single digit, `十`, `十<d>`, `<d>十` and `<d>十<d>`.
/// Anything else (hundreds, repeated `十`, empty text) decodes to `0`, as does
/// any character outside `零`–`九` in a digit position.
pub fn parse_numeral(text: &str) -> u32 {
    let chars: Vec<char> = text.chars().collect();

    match chars.iter().position(|&c| c == '十') {
        None if chars.len() == 1 => digit(chars[0]),
        None => 0,
        Some(pos) => {
            let (tens, units) = (&chars[..pos], &chars[pos + 1..]);
            if tens.len() > 1 || units.len() > 1 || units.contains(&'十') {
                return 0;
            }
            let tens = tens.first().map_or(1, |&c| digit(c));
            let units = units.first().map_or(0, |&c| digit(c));
            tens * 10 + units
        }
    }
}

fn digit(c: char) -> u32 {
    match c {
        '零' => 0,
        '一' => 1,
        '二' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        _ => 0,
    }
}

/// Classify a source filename into chapter/problem labels and sort keys.
pub fn classify(filename: &str) -> Classification {
    static CHAPTER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^第(.+)章$").expect("valid regex"));
    static PROBLEM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^第(.+)题$").expect("valid regex"));

    let base = strip_extension(filename);
    let mut tokens = base.split_whitespace();

    let (chapter_token, problem_token) = match (tokens.next(), tokens.next()) {
        (Some(chapter), Some(problem)) => (chapter, problem),
        _ => (UNCLASSIFIED_LABEL, base),
    };

    let chapter_number = CHAPTER_RE
        .captures(chapter_token)
        .map_or(0, |caps| parse_numeral(&caps[1]));
    let problem_number = PROBLEM_RE
        .captures(problem_token)
        .map_or(0, |caps| parse_numeral(&caps[1]));

    let chapter_label = match chapter_title(chapter_number) {
        Some(title) => format!("{chapter_token}{TITLE_SEPARATOR}{title}"),
        None => chapter_token.to_string(),
    };

    Classification {
        chapter_label,
        problem_label: problem_token.to_string(),
        chapter_number,
        problem_number,
    }
}

/// Whether `filename` carries the source extension (any case).
pub fn has_source_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((base, ext)) if ext.eq_ignore_ascii_case(SOURCE_EXTENSION) => base,
        _ => filename,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DIGITS: [&str; 10] = ["零", "一", "二", "三", "四", "五", "六", "七", "八", "九"];

    #[test]
    fn parse_numeral_single_digits() {
        for (value, text) in DIGITS.iter().enumerate() {
            assert_eq!(parse_numeral(text), value as u32, "{text}");
        }
    }

    #[test]
    fn parse_numeral_two_token_composition() {
        assert_eq!(parse_numeral("十"), 10);
        for units in 1..10 {
            let text = format!("十{}", DIGITS[units]);
            assert_eq!(parse_numeral(&text), 10 + units as u32, "{text}");
        }
        for tens in 2..10 {
            let text = format!("{}十", DIGITS[tens]);
            assert_eq!(parse_numeral(&text), tens as u32 * 10, "{text}");
            for units in 1..10 {
                let text = format!("{}十{}", DIGITS[tens], DIGITS[units]);
                assert_eq!(parse_numeral(&text), (tens * 10 + units) as u32, "{text}");
            }
        }
    }

    #[test]
    fn parse_numeral_unsupported_is_zero() {
        assert_eq!(parse_numeral(""), 0);
        assert_eq!(parse_numeral("一百"), 0);
        assert_eq!(parse_numeral("一百零一"), 0);
        assert_eq!(parse_numeral("十十"), 0);
        assert_eq!(parse_numeral("二十一二"), 0);
        assert_eq!(parse_numeral("甲"), 0);
        assert_eq!(parse_numeral("12"), 0);
    }

    #[test]
    fn parse_numeral_unknown_digit_in_composition_is_zero() {
        assert_eq!(parse_numeral("甲十"), 0);
        assert_eq!(parse_numeral("十甲"), 10);
    }

    #[test]
    fn classify_titled_chapter() {
        let c = classify("第一章 第一题.docx");
        assert_eq!(c.chapter_label, "第一章：基础知识");
        assert_eq!(c.problem_label, "第一题");
        assert_eq!(c.chapter_number, 1);
        assert_eq!(c.problem_number, 1);
    }

    #[test]
    fn classify_untitled_chapter() {
        let c = classify("第六章 第一题.docx");
        assert_eq!(c.chapter_label, "第六章");
        assert_eq!(c.chapter_number, 6);
        assert_eq!(c.problem_number, 1);
    }

    #[test]
    fn classify_without_problem_token() {
        let c = classify("杂项.docx");
        assert_eq!(c.chapter_label, UNCLASSIFIED_LABEL);
        assert_eq!(c.problem_label, "杂项");
        assert_eq!(c.chapter_number, 0);
        assert_eq!(c.problem_number, 0);
    }

    #[test]
    fn classify_nonstandard_chapter_token_is_verbatim() {
        let c = classify("附录 第二十三题.docx");
        assert_eq!(c.chapter_label, "附录");
        assert_eq!(c.chapter_number, 0);
        assert_eq!(c.problem_label, "第二十三题");
        assert_eq!(c.problem_number, 23);
    }

    #[test]
    fn classify_extension_is_case_insensitive() {
        let c = classify("第二章 第十题.DOCX");
        assert_eq!(c.chapter_label, "第二章：进阶技巧");
        assert_eq!(c.problem_label, "第十题");
        assert_eq!(c.problem_number, 10);
    }

    #[test]
    fn classify_ignores_extra_tokens_and_whitespace() {
        let c = classify("第三章   第五题  补充.docx");
        assert_eq!(c.chapter_label, "第三章：综合应用");
        assert_eq!(c.problem_label, "第五题");
        assert_eq!(c.problem_number, 5);
    }

    #[test]
    fn classify_hundredth_chapter_falls_back_to_zero() {
        let c = classify("第一百章 第一题.docx");
        assert_eq!(c.chapter_label, "第一百章");
        assert_eq!(c.chapter_number, 0);
    }

    #[test]
    fn chapter_title_table() {
        assert_eq!(chapter_title(1), Some("基础知识"));
        assert_eq!(chapter_title(5), Some("真题演练"));
        assert_eq!(chapter_title(0), None);
        assert_eq!(chapter_title(6), None);
    }

    #[test]
    fn has_source_extension_matches_any_case() {
        assert!(has_source_extension("a.docx"));
        assert!(has_source_extension("a.DocX"));
        assert!(!has_source_extension("a.doc"));
        assert!(!has_source_extension("docx"));
    }
}
