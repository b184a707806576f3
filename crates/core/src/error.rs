use thiserror::Error;

use crate::guided::{FlashcardRunError, GuidedError, QuizError};
use crate::model::{ActivityError, CatalogError, StepError, StudyProgressError, ValidationError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    StudyProgress(#[from] StudyProgressError),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    Guided(#[from] GuidedError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Flashcards(#[from] FlashcardRunError),
}
