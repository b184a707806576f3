use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sie_core::guided::GuidedState;
use sie_core::model::{
    Chapter, ChapterId, Concept, ContentId, ContentType, Curriculum, Flashcard,
    PracticeTestResult, Profile, QuizAttempt, QuizQuestion, StudyProgress, Topic, TopicId,
    UserId, XpEvent,
};
use sie_core::progress::ProgressSnapshot;
use thiserror::Error;

use crate::memory::InMemoryRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── PROFILES ──────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the user has no profile yet.
    async fn get_profile(&self, user_id: &UserId) -> Result<Profile, StorageError>;

    /// Insert a new profile row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when a row already exists for the user.
    async fn create_profile(&self, profile: &Profile) -> Result<(), StorageError>;

    /// Add `amount` to the stored XP counter and return the new total.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the profile is missing.
    async fn add_xp(&self, user_id: &UserId, amount: u32) -> Result<u32, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the profile is missing.
    async fn set_streak(
        &self,
        user_id: &UserId,
        streak: u32,
        last_active: NaiveDate,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the profile is missing.
    async fn set_exam_date(
        &self,
        user_id: &UserId,
        exam_date: Option<NaiveDate>,
    ) -> Result<(), StorageError>;

    /// Overwrite the cached progress snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the profile is missing.
    async fn set_overall_progress(
        &self,
        user_id: &UserId,
        snapshot: &ProgressSnapshot,
    ) -> Result<(), StorageError>;
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Read-only access to study content.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All chapters ordered by `chapter_order`.
    async fn list_chapters(&self) -> Result<Vec<Chapter>, StorageError>;

    /// Topics of one chapter ordered by `topic_order`.
    async fn list_topics(&self, chapter_id: &ChapterId) -> Result<Vec<Topic>, StorageError>;

    /// Number of topics per chapter, in chapter order.
    async fn topics_per_chapter(&self) -> Result<Vec<u32>, StorageError>;

    async fn concept_for_topic(&self, topic_id: &TopicId) -> Result<Option<Concept>, StorageError>;

    async fn flashcards_for_topic(&self, topic_id: &TopicId)
    -> Result<Vec<Flashcard>, StorageError>;

    async fn questions_for_topic(
        &self,
        topic_id: &TopicId,
    ) -> Result<Vec<QuizQuestion>, StorageError>;

    /// Every question in the bank, for practice tests.
    async fn all_questions(&self) -> Result<Vec<QuizQuestion>, StorageError>;

    async fn count_flashcards(&self) -> Result<u32, StorageError>;

    async fn count_topics(&self) -> Result<u32, StorageError>;

    async fn count_concepts(&self) -> Result<u32, StorageError>;
}

/// Bulk content loading for seeding and tests. Not used by the app itself.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Upsert every item of `curriculum` by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any row cannot be written; SQL backends
    /// write nothing in that case.
    async fn import_curriculum(&self, curriculum: &Curriculum) -> Result<(), StorageError>;
}

//
// ─── MASTERY AND POSITION ──────────────────────────────────────────────────────
//

#[async_trait]
pub trait StudyProgressRepository: Send + Sync {
    /// Insert or replace the row keyed by `(user, content_type, content_id)`.
    async fn upsert(&self, row: &StudyProgress) -> Result<(), StorageError>;

    async fn get(
        &self,
        user_id: &UserId,
        content_type: ContentType,
        content_id: &ContentId,
    ) -> Result<Option<StudyProgress>, StorageError>;

    /// Rows with `mastered = true` for one content type.
    async fn count_mastered(
        &self,
        user_id: &UserId,
        content_type: ContentType,
    ) -> Result<u32, StorageError>;

    async fn mastered_ids(
        &self,
        user_id: &UserId,
        content_type: ContentType,
    ) -> Result<HashSet<ContentId>, StorageError>;
}

#[async_trait]
pub trait LearningProgressRepository: Send + Sync {
    /// Fetch the guided-learning position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the user never started.
    async fn get_position(&self, user_id: &UserId) -> Result<GuidedState, StorageError>;

    /// Insert or overwrite the position.
    async fn save_position(
        &self,
        user_id: &UserId,
        state: &GuidedState,
    ) -> Result<(), StorageError>;
}

//
// ─── ACTIVITY LOGS ─────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait XpEventRepository: Send + Sync {
    async fn append_event(&self, event: &XpEvent) -> Result<(), StorageError>;

    /// Newest first.
    async fn list_events(&self, user_id: &UserId) -> Result<Vec<XpEvent>, StorageError>;
}

#[async_trait]
pub trait StreakRepository: Send + Sync {
    /// Record activity on `day`. Recording the same day twice is a no-op.
    async fn record_day(&self, user_id: &UserId, day: NaiveDate) -> Result<(), StorageError>;

    /// Oldest first.
    async fn list_days(&self, user_id: &UserId) -> Result<Vec<NaiveDate>, StorageError>;
}

#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<(), StorageError>;

    async fn count_attempts(&self, user_id: &UserId) -> Result<u32, StorageError>;

    /// Newest first.
    async fn list_attempts(&self, user_id: &UserId) -> Result<Vec<QuizAttempt>, StorageError>;
}

#[async_trait]
pub trait PracticeTestRepository: Send + Sync {
    async fn append_result(&self, result: &PracticeTestResult) -> Result<(), StorageError>;

    /// Newest first.
    async fn list_results(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PracticeTestResult>, StorageError>;
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// All repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub profiles: Arc<dyn ProfileRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub study_progress: Arc<dyn StudyProgressRepository>,
    pub learning_progress: Arc<dyn LearningProgressRepository>,
    pub xp_events: Arc<dyn XpEventRepository>,
    pub streaks: Arc<dyn StreakRepository>,
    pub quiz_attempts: Arc<dyn QuizAttemptRepository>,
    pub practice_tests: Arc<dyn PracticeTestRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_memory(&InMemoryRepository::new())
    }

    /// Wrap an existing in-memory repository, keeping a handle for seeding.
    #[must_use]
    pub fn from_memory(repo: &InMemoryRepository) -> Self {
        Self {
            profiles: Arc::new(repo.clone()),
            catalog: Arc::new(repo.clone()),
            study_progress: Arc::new(repo.clone()),
            learning_progress: Arc::new(repo.clone()),
            xp_events: Arc::new(repo.clone()),
            streaks: Arc::new(repo.clone()),
            quiz_attempts: Arc::new(repo.clone()),
            practice_tests: Arc::new(repo.clone()),
        }
    }
}
