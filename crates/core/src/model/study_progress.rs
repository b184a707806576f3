use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ContentId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudyProgressError {
    #[error("unknown content type: {0}")]
    UnknownContentType(String),
}

/// Kind of item a mastery row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Flashcard,
    Quiz,
    Concept,
    Topic,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flashcard => "flashcard",
            Self::Quiz => "quiz",
            Self::Concept => "concept",
            Self::Topic => "topic",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `StudyProgressError::UnknownContentType` for unrecognized values.
    pub fn parse(value: &str) -> Result<Self, StudyProgressError> {
        match value {
            "flashcard" => Ok(Self::Flashcard),
            "quiz" => Ok(Self::Quiz),
            "concept" => Ok(Self::Concept),
            "topic" => Ok(Self::Topic),
            other => Err(StudyProgressError::UnknownContentType(other.to_owned())),
        }
    }
}

/// Ground truth for mastery: one row per `(user, content_type, content_id)`.
///
/// Writers must upsert on that key; there is never more than one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyProgress {
    pub user_id: UserId,
    pub content_type: ContentType,
    pub content_id: ContentId,
    pub mastered: bool,
    pub last_studied: DateTime<Utc>,
}

impl StudyProgress {
    #[must_use]
    pub fn new(
        user_id: UserId,
        content_type: ContentType,
        content_id: ContentId,
        mastered: bool,
        last_studied: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            content_type,
            content_id,
            mastered,
            last_studied,
        }
    }

    /// The uniqueness key of the row.
    #[must_use]
    pub fn key(&self) -> (UserId, ContentType, ContentId) {
        (
            self.user_id.clone(),
            self.content_type,
            self.content_id.clone(),
        )
    }
}
