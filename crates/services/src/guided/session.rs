use sie_core::guided::{CurriculumShape, FlashcardRun, GuidedState, QuizSession};
use sie_core::model::{Chapter, Concept, Topic, UserId};

/// Where the chapters and topics of a guided session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurriculumSource {
    Catalog,
    /// The catalog was empty or unreachable; the built-in curriculum is used.
    BuiltIn,
}

/// A learner's open guided-learning screen.
///
/// Holds the chapter list, the topics of the current chapter and the
/// position. Only `GuidedLearningService` moves the position.
#[derive(Debug, Clone)]
pub struct GuidedSession {
    pub(super) user_id: UserId,
    pub(super) state: GuidedState,
    pub(super) chapters: Vec<Chapter>,
    pub(super) topics: Vec<Topic>,
    pub(super) source: CurriculumSource,
}

impl GuidedSession {
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn state(&self) -> GuidedState {
        self.state
    }

    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Topics of the current chapter, in order.
    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    #[must_use]
    pub fn source(&self) -> CurriculumSource {
        self.source
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.completed
    }

    #[must_use]
    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.chapters.get(index(self.state.chapter_index))
    }

    #[must_use]
    pub fn current_topic(&self) -> Option<&Topic> {
        self.topics.get(index(self.state.topic_index))
    }

    #[must_use]
    pub fn shape(&self) -> CurriculumShape {
        CurriculumShape {
            total_chapters: count(self.chapters.len()),
            topics_in_current_chapter: count(self.topics.len()),
        }
    }
}

/// What the current step shows.
#[derive(Debug, Clone)]
pub enum StepContent {
    /// The topic's concept; `None` when the topic has no concept entry.
    Concept {
        topic: Topic,
        concept: Option<Concept>,
    },
    Flashcards {
        topic: Topic,
        run: FlashcardRun,
    },
    Quiz {
        topic: Topic,
        quiz: QuizSession,
    },
    Completed,
}

pub(super) fn index(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
