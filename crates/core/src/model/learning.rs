use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepError {
    #[error("unknown guided learning step: {0}")]
    Unknown(String),
}

/// One of the three activities a guided topic walks through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Concept,
    Flashcard,
    Quiz,
}

impl Step {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Flashcard => "flashcard",
            Self::Quiz => "quiz",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `StepError::Unknown` for anything but the three step names.
    pub fn parse(value: &str) -> Result<Self, StepError> {
        match value {
            "concept" => Ok(Self::Concept),
            "flashcard" => Ok(Self::Flashcard),
            "quiz" => Ok(Self::Quiz),
            other => Err(StepError::Unknown(other.to_owned())),
        }
    }
}
