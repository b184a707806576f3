//! Shared error types for the services crate.

use thiserror::Error;

use sie_core::guided::{FlashcardRunError, GuidedError, QuizError};
use sie_core::model::{ActivityError, ValidationError};
use storage::AuthError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::practice_test::PracticeTestError;

/// Errors surfaced to callers of the app-facing services.
///
/// Storage failures are split: a missing row becomes `NotFound`, everything
/// else is `Transient` (network, connection, decoding) and may succeed on a
/// later attempt. Nothing here retries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound,

    #[error("datastore unavailable: {0}")]
    Transient(StorageError),

    #[error(transparent)]
    Guided(#[from] GuidedError),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Flashcards(#[from] FlashcardRunError),

    #[error(transparent)]
    Activity(#[from] ActivityError),

    #[error(transparent)]
    PracticeTest(#[from] PracticeTestError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            other => Self::Transient(other),
        }
    }
}

/// Errors from reading backend configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("backend URL is not valid: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("backend URL must use http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("backend anon key is empty")]
    MissingAnonKey,
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_not_found_is_not_transient() {
        assert!(matches!(
            ServiceError::from(StorageError::NotFound),
            ServiceError::NotFound
        ));
        assert!(matches!(
            ServiceError::from(StorageError::Connection("reset".into())),
            ServiceError::Transient(StorageError::Connection(_))
        ));
    }
}
