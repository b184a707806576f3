mod activity;
mod catalog;
mod credentials;
mod ids;
mod learning;
mod profile;
mod study_progress;

pub use activity::{ActivityError, PracticeTestResult, QuizAttempt, XpEvent, XpEventKind};
pub use catalog::{
    AnswerChoice, CatalogError, Chapter, Concept, Curriculum, Flashcard, QuizQuestion, Topic,
};
pub use credentials::{Credentials, MIN_PASSWORD_LEN, ValidationError};
pub use ids::{ChapterId, ContentId, TopicId, UserId};
pub use learning::{Step, StepError};
pub use profile::{Profile, User};
pub use study_progress::{ContentType, StudyProgress, StudyProgressError};
