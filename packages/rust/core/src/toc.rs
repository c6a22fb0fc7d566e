//! Chapter aggregation and ordering.
//!
//! Classified files are grouped by chapter label, then sorted into the order
//! used by every navigation document.

use std::collections::HashMap;

use tracing::debug;

use notesite_shared::{Chapter, Classification, ProblemEntry};

/// Chapters keyed by label, in first-seen order until sorted.
#[derive(Debug, Default)]
pub struct ChapterIndex {
    chapters: Vec<Chapter>,
    by_label: HashMap<String, usize>,
}

impl ChapterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a classified file. Duplicate problem labels are kept.
    pub fn push(&mut self, classification: &Classification) {
        let idx = match self.by_label.get(&classification.chapter_label) {
            Some(&idx) => idx,
            None => {
                let idx = self.chapters.len();
                self.chapters.push(Chapter::new(
                    classification.chapter_label.clone(),
                    classification.chapter_number,
                ));
                self.by_label
                    .insert(classification.chapter_label.clone(), idx);
                idx
            }
        };

        self.chapters[idx].problems.push(ProblemEntry {
            label: classification.problem_label.clone(),
            number: classification.problem_number,
        });
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Chapters ascending by number, problems ascending by number within each.
    ///
    /// Both sorts are stable, so ties keep the order files were added in.
    pub fn into_sorted(self) -> Vec<Chapter> {
        let mut chapters = self.chapters;
        chapters.sort_by_key(|c| c.number);
        for chapter in &mut chapters {
            chapter.problems.sort_by_key(|p| p.number);
        }

        debug!(chapters = chapters.len(), "chapters sorted");
        chapters
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
