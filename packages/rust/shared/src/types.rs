//! Core domain types for the notes site.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Chapter/problem metadata derived from one source filename.
///
/// Both numbers are `0` when the corresponding token carried no recognizable
/// `第…章` / `第…题` numeral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Chapter label, including the `：<title>` suffix for known chapters.
    pub chapter_label: String,
    /// Problem label, verbatim from the filename.
    pub problem_label: String,
    /// Sort key for the chapter.
    pub chapter_number: u32,
    /// Sort key for the problem within its chapter.
    pub problem_number: u32,
}

// ---------------------------------------------------------------------------
// Chapter
// ---------------------------------------------------------------------------

/// A single problem entry listed under a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemEntry {
    pub label: String,
    pub number: u32,
}

/// A chapter group, keyed by its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Unique grouping key.
    pub label: String,
    /// Sort key among chapters.
    pub number: u32,
    /// Problems in the order they were added (or sorted, after `into_sorted`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<ProblemEntry>,
}

impl Chapter {
    /// Create an empty chapter.
    pub fn new(label: impl Into<String>, number: u32) -> Self {
        Self {
            label: label.into(),
            number,
            problems: Vec::new(),
        }
    }
}
