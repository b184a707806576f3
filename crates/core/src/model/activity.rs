use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{TopicId, UserId};
use crate::model::learning::Step;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActivityError {
    #[error("unknown xp event type: {0}")]
    UnknownEventType(String),

    #[error("correct answers ({correct}) exceed question count ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },
}

//
// ─── XP EVENTS ─────────────────────────────────────────────────────────────────
//

/// Reason an XP amount was granted. Stored as its snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XpEventKind {
    CompleteConcept,
    CompleteFlashcard,
    CompleteQuiz,
    CompleteAllChapters,
    QuizCompletion,
    MasterFlashcard,
    ViewConcept,
    ViewTopic,
    CompleteTopic,
    PracticeTestComplete,
}

impl XpEventKind {
    /// Event recorded when a guided step is left via "continue".
    #[must_use]
    pub fn for_completed_step(step: Step) -> Self {
        match step {
            Step::Concept => Self::CompleteConcept,
            Step::Flashcard => Self::CompleteFlashcard,
            Step::Quiz => Self::CompleteQuiz,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompleteConcept => "complete_concept",
            Self::CompleteFlashcard => "complete_flashcard",
            Self::CompleteQuiz => "complete_quiz",
            Self::CompleteAllChapters => "complete_all_chapters",
            Self::QuizCompletion => "quiz_completion",
            Self::MasterFlashcard => "master_flashcard",
            Self::ViewConcept => "view_concept",
            Self::ViewTopic => "view_topic",
            Self::CompleteTopic => "complete_topic",
            Self::PracticeTestComplete => "practice_test_complete",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::UnknownEventType` for unrecognized names.
    pub fn parse(value: &str) -> Result<Self, ActivityError> {
        let kind = match value {
            "complete_concept" => Self::CompleteConcept,
            "complete_flashcard" => Self::CompleteFlashcard,
            "complete_quiz" => Self::CompleteQuiz,
            "complete_all_chapters" => Self::CompleteAllChapters,
            "quiz_completion" => Self::QuizCompletion,
            "master_flashcard" => Self::MasterFlashcard,
            "view_concept" => Self::ViewConcept,
            "view_topic" => Self::ViewTopic,
            "complete_topic" => Self::CompleteTopic,
            "practice_test_complete" => Self::PracticeTestComplete,
            other => return Err(ActivityError::UnknownEventType(other.to_owned())),
        };
        Ok(kind)
    }
}

/// Append-only audit entry for an XP grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpEvent {
    pub user_id: UserId,
    pub amount: u32,
    pub kind: XpEventKind,
    pub created_at: DateTime<Utc>,
}

//
// ─── QUIZ ATTEMPTS ─────────────────────────────────────────────────────────────
//

/// A submitted topic quiz, kept as history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    pub user_id: UserId,
    pub topic_id: TopicId,
    pub score_percent: u8,
    pub completed_at: DateTime<Utc>,
}

//
// ─── PRACTICE TESTS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeTestResult {
    user_id: UserId,
    correct_count: u32,
    total_questions: u32,
    passed: bool,
    completed_at: DateTime<Utc>,
    time_taken_secs: u32,
}

impl PracticeTestResult {
    /// Build a result, validating the counts.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::CorrectExceedsTotal` when `correct_count > total_questions`.
    pub fn new(
        user_id: UserId,
        correct_count: u32,
        total_questions: u32,
        passed: bool,
        completed_at: DateTime<Utc>,
        time_taken_secs: u32,
    ) -> Result<Self, ActivityError> {
        if correct_count > total_questions {
            return Err(ActivityError::CorrectExceedsTotal {
                correct: correct_count,
                total: total_questions,
            });
        }
        Ok(Self {
            user_id,
            correct_count,
            total_questions,
            passed,
            completed_at,
            time_taken_secs,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    /// Fraction of correct answers in `[0, 1]`; 0 for an empty test.
    #[must_use]
    pub fn score(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.correct_count) / f64::from(self.total_questions)
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn time_taken_secs(&self) -> u32 {
        self.time_taken_secs
    }
}
