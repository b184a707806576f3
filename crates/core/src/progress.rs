//! Mastery percentages derived from raw counts.
//!
//! The snapshot stored on a profile is a cache of this computation; the
//! study-progress rows stay the source of truth.

use serde::{Deserialize, Serialize};

use crate::guided::GuidedState;
use crate::model::Step;

/// Raw inputs for one category: mastered items and catalog size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryCounts {
    pub completed: u32,
    pub total: u32,
}

impl CategoryCounts {
    #[must_use]
    pub fn new(completed: u32, total: u32) -> Self {
        Self { completed, total }
    }
}

/// `(total, completed, percentage)` triple as persisted on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub total: u32,
    pub completed: u32,
    pub percentage: u8,
}

impl CategoryProgress {
    #[must_use]
    pub fn from_counts(counts: CategoryCounts) -> Self {
        Self {
            total: counts.total,
            completed: counts.completed,
            percentage: percentage(u64::from(counts.completed), u64::from(counts.total)),
        }
    }
}

/// Per-category and aggregate mastery.
///
/// `total` is weighted by item count: `round(100 * Σcompleted / Σtotal)`.
/// It is deliberately not the mean of the three category percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub flashcards: CategoryProgress,
    pub quizzes: CategoryProgress,
    pub concepts: CategoryProgress,
    pub total: CategoryProgress,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn from_counts(
        flashcards: CategoryCounts,
        quizzes: CategoryCounts,
        concepts: CategoryCounts,
    ) -> Self {
        let completed = u64::from(flashcards.completed)
            + u64::from(quizzes.completed)
            + u64::from(concepts.completed);
        let total =
            u64::from(flashcards.total) + u64::from(quizzes.total) + u64::from(concepts.total);

        Self {
            flashcards: CategoryProgress::from_counts(flashcards),
            quizzes: CategoryProgress::from_counts(quizzes),
            concepts: CategoryProgress::from_counts(concepts),
            total: CategoryProgress {
                total: saturate_u32(total),
                completed: saturate_u32(completed),
                percentage: percentage(completed, total),
            },
        }
    }

    /// All-zero snapshot written on profile creation.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// `round(100 * completed / total)`, rounding halves up, 0 for an empty
/// category and never above 100.
#[must_use]
pub fn percentage(completed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * completed + total) / (2 * total);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Share of guided-learning steps already behind the learner.
///
/// Each topic contributes three steps (concept, flashcard, quiz).
/// `topics_per_chapter[i]` is the topic count of chapter `i`.
#[must_use]
pub fn curriculum_percentage(state: &GuidedState, topics_per_chapter: &[u32]) -> u8 {
    let total_topics: u64 = topics_per_chapter.iter().map(|n| u64::from(*n)).sum();
    let total_steps = total_topics * 3;
    if total_steps == 0 {
        return 0;
    }
    if state.completed {
        return 100;
    }

    let chapter = usize::try_from(state.chapter_index).unwrap_or(usize::MAX);
    let topics_before: u64 = topics_per_chapter
        .iter()
        .take(chapter)
        .map(|n| u64::from(*n))
        .sum();
    let step_offset = match state.step {
        Step::Concept => 0,
        Step::Flashcard => 1,
        Step::Quiz => 2,
    };
    let done = (topics_before + u64::from(state.topic_index)) * 3 + step_offset;
    percentage(done.min(total_steps), total_steps)
}
