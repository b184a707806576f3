use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ChapterId, ContentId, TopicId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("invalid answer choice: {0}")]
    InvalidAnswerChoice(String),
}

//
// ─── STRUCTURE ─────────────────────────────────────────────────────────────────
//

/// Ordered grouping of topics. Read-only from the client's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    pub chapter_order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub chapter_id: ChapterId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub topic_order: u32,
}

//
// ─── STUDY CONTENT ─────────────────────────────────────────────────────────────
//

/// Concept explanation shown as the first step of a guided topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: ContentId,
    pub topic_id: TopicId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: ContentId,
    pub topic_id: TopicId,
    pub term: String,
    pub definition: String,
}

/// One of the four lettered options of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerChoice {
    A,
    B,
    C,
    D,
}

impl AnswerChoice {
    pub const ALL: [AnswerChoice; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Parses a letter (`"A"`..`"D"`, case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidAnswerChoice` for anything else.
    pub fn from_letter(value: &str) -> Result<Self, CatalogError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(CatalogError::InvalidAnswerChoice(value.to_owned())),
        }
    }

    #[must_use]
    pub fn as_letter(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: ContentId,
    pub topic_id: TopicId,
    pub question: String,
    pub options: [String; 4],
    pub correct: AnswerChoice,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    #[must_use]
    pub fn option(&self, choice: AnswerChoice) -> &str {
        &self.options[choice.index()]
    }

    #[must_use]
    pub fn is_correct(&self, choice: AnswerChoice) -> bool {
        self.correct == choice
    }
}

//
// ─── BUNDLE ────────────────────────────────────────────────────────────────────
//

/// A whole catalog in one value: used for the built-in fallback curriculum
/// and for seed files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curriculum {
    pub chapters: Vec<Chapter>,
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

impl Curriculum {
    /// Chapters ordered by `chapter_order`.
    #[must_use]
    pub fn ordered_chapters(&self) -> Vec<&Chapter> {
        let mut chapters: Vec<_> = self.chapters.iter().collect();
        chapters.sort_by_key(|c| c.chapter_order);
        chapters
    }

    /// Topics of one chapter ordered by `topic_order`.
    #[must_use]
    pub fn topics_in(&self, chapter_id: &ChapterId) -> Vec<&Topic> {
        let mut topics: Vec<_> = self
            .topics
            .iter()
            .filter(|t| &t.chapter_id == chapter_id)
            .collect();
        topics.sort_by_key(|t| t.topic_order);
        topics
    }

    #[must_use]
    pub fn concept_for(&self, topic_id: &TopicId) -> Option<&Concept> {
        self.concepts.iter().find(|c| &c.topic_id == topic_id)
    }

    #[must_use]
    pub fn flashcards_for(&self, topic_id: &TopicId) -> Vec<&Flashcard> {
        self.flashcards
            .iter()
            .filter(|f| &f.topic_id == topic_id)
            .collect()
    }

    #[must_use]
    pub fn questions_for(&self, topic_id: &TopicId) -> Vec<&QuizQuestion> {
        self.questions
            .iter()
            .filter(|q| &q.topic_id == topic_id)
            .collect()
    }
}
