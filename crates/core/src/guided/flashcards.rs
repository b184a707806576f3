use std::collections::HashSet;

use thiserror::Error;

use crate::model::{ContentId, Flashcard};
use crate::progress::percentage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlashcardRunError {
    #[error("card {index} out of range (run has {len})")]
    CardOutOfRange { index: usize, len: usize },
}

/// Outcome of moving forward through a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardMove {
    Moved(usize),
    /// Moved past the last card; the run is over.
    Finished,
}

/// Linear pass over a topic's flashcards with per-card mastered flags.
///
/// No wraparound: stepping past the last card finishes the run and further
/// navigation is ignored.
#[derive(Debug, Clone)]
pub struct FlashcardRun {
    cards: Vec<Flashcard>,
    mastered: Vec<bool>,
    current: usize,
    flipped: bool,
    finished: bool,
}

impl FlashcardRun {
    /// `mastered` holds ids already mastered in earlier sessions.
    #[must_use]
    pub fn new(cards: Vec<Flashcard>, mastered: &HashSet<ContentId>) -> Self {
        let flags = cards.iter().map(|c| mastered.contains(&c.id)).collect();
        Self {
            cards,
            mastered: flags,
            current: 0,
            flipped: false,
            finished: false,
        }
    }

    #[must_use]
    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> Option<&Flashcard> {
        if self.finished {
            return None;
        }
        self.cards.get(self.current)
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn is_on_last_card(&self) -> bool {
        !self.cards.is_empty() && self.current + 1 == self.cards.len()
    }

    pub fn next(&mut self) -> CardMove {
        if self.finished {
            return CardMove::Finished;
        }
        if self.current + 1 < self.cards.len() {
            self.current += 1;
            self.flipped = false;
            CardMove::Moved(self.current)
        } else {
            self.finished = true;
            CardMove::Finished
        }
    }

    /// Steps back one card. Ignored on the first card and after finishing.
    pub fn previous(&mut self) -> bool {
        if self.finished || self.current == 0 {
            return false;
        }
        self.current -= 1;
        self.flipped = false;
        true
    }

    #[must_use]
    pub fn is_mastered(&self, index: usize) -> bool {
        self.mastered.get(index).copied().unwrap_or(false)
    }

    /// Flips the mastered flag of one card and returns the new value.
    ///
    /// # Errors
    ///
    /// `CardOutOfRange` for an unknown index.
    pub fn toggle_mastered(&mut self, index: usize) -> Result<bool, FlashcardRunError> {
        let len = self.mastered.len();
        let flag = self
            .mastered
            .get_mut(index)
            .ok_or(FlashcardRunError::CardOutOfRange { index, len })?;
        *flag = !*flag;
        Ok(*flag)
    }

    #[must_use]
    pub fn mastered_count(&self) -> usize {
        self.mastered.iter().filter(|m| **m).count()
    }

    #[must_use]
    pub fn mastered_percentage(&self) -> u8 {
        percentage(self.mastered_count() as u64, self.cards.len() as u64)
    }
}
