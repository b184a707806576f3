use std::sync::Arc;

use sie_core::Clock;
use sie_core::model::{ContentId, ContentType, StudyProgress, TopicId, UserId};
use sie_core::progress::{CategoryCounts, ProgressSnapshot};
use storage::repository::{CatalogRepository, ProfileRepository, StudyProgressRepository};

use crate::error::ServiceError;

/// Rebuilds the progress snapshot cached on a profile from study-progress rows.
#[derive(Clone)]
pub struct ProgressAggregator {
    clock: Clock,
    profiles: Arc<dyn ProfileRepository>,
    catalog: Arc<dyn CatalogRepository>,
    study_progress: Arc<dyn StudyProgressRepository>,
}

impl ProgressAggregator {
    #[must_use]
    pub fn new(
        clock: Clock,
        profiles: Arc<dyn ProfileRepository>,
        catalog: Arc<dyn CatalogRepository>,
        study_progress: Arc<dyn StudyProgressRepository>,
    ) -> Self {
        Self {
            clock,
            profiles,
            catalog,
            study_progress,
        }
    }

    /// Count mastered items and catalog sizes, then overwrite the profile's
    /// cached snapshot.
    ///
    /// The six counts are fetched concurrently. If any of them fails nothing
    /// is written. Quizzes are counted per topic.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when the profile row is missing and
    /// `ServiceError::Transient` for any other storage failure.
    pub async fn recompute_progress(&self, user_id: &UserId) -> Result<ProgressSnapshot, ServiceError> {
        let (
            flashcards_mastered,
            quizzes_mastered,
            concepts_mastered,
            flashcard_total,
            topic_total,
            concept_total,
        ) = futures::try_join!(
            self.study_progress
                .count_mastered(user_id, ContentType::Flashcard),
            self.study_progress.count_mastered(user_id, ContentType::Quiz),
            self.study_progress
                .count_mastered(user_id, ContentType::Concept),
            self.catalog.count_flashcards(),
            self.catalog.count_topics(),
            self.catalog.count_concepts(),
        )?;

        let snapshot = ProgressSnapshot::from_counts(
            CategoryCounts::new(flashcards_mastered, flashcard_total),
            CategoryCounts::new(quizzes_mastered, topic_total),
            CategoryCounts::new(concepts_mastered, concept_total),
        );
        self.profiles.set_overall_progress(user_id, &snapshot).await?;

        tracing::debug!(
            user_id = %user_id,
            total = snapshot.total.percentage,
            "progress snapshot recomputed"
        );
        Ok(snapshot)
    }

    /// Recompute, falling back to `cached` (or an empty snapshot) on failure.
    pub async fn snapshot_or_cached(
        &self,
        user_id: &UserId,
        cached: Option<ProgressSnapshot>,
    ) -> ProgressSnapshot {
        match self.recompute_progress(user_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %err,
                    has_cached = cached.is_some(),
                    "progress recompute failed, serving cached snapshot"
                );
                cached.unwrap_or_else(ProgressSnapshot::empty)
            }
        }
    }

    /// Set or clear a flashcard's mastered flag and refresh the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the upsert or the recomputation fails.
    pub async fn set_flashcard_mastered(
        &self,
        user_id: &UserId,
        flashcard_id: &ContentId,
        mastered: bool,
    ) -> Result<ProgressSnapshot, ServiceError> {
        self.record_mastery(user_id, ContentType::Flashcard, flashcard_id.clone(), mastered)
            .await?;
        self.recompute_progress(user_id).await
    }

    /// A viewed concept counts as mastered.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the upsert or the recomputation fails.
    pub async fn mark_concept_viewed(
        &self,
        user_id: &UserId,
        concept_id: &ContentId,
    ) -> Result<ProgressSnapshot, ServiceError> {
        self.record_mastery(user_id, ContentType::Concept, concept_id.clone(), true)
            .await?;
        self.recompute_progress(user_id).await
    }

    /// Record the outcome of a topic quiz.
    ///
    /// A pass upserts the topic's quiz row as mastered and returns the new
    /// snapshot. A fail writes nothing, so an earlier pass is never revoked,
    /// and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the upsert or the recomputation fails.
    pub async fn record_quiz_mastery(
        &self,
        user_id: &UserId,
        topic_id: &TopicId,
        passed: bool,
    ) -> Result<Option<ProgressSnapshot>, ServiceError> {
        if !passed {
            return Ok(None);
        }
        self.record_mastery(
            user_id,
            ContentType::Quiz,
            ContentId::new(topic_id.as_str()),
            true,
        )
        .await?;
        self.recompute_progress(user_id).await.map(Some)
    }

    /// Upsert one study-progress row without recomputing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the write fails.
    pub async fn record_mastery(
        &self,
        user_id: &UserId,
        content_type: ContentType,
        content_id: ContentId,
        mastered: bool,
    ) -> Result<(), ServiceError> {
        let row = StudyProgress::new(
            user_id.clone(),
            content_type,
            content_id,
            mastered,
            self.clock.now(),
        );
        self.study_progress.upsert(&row).await?;
        Ok(())
    }
}
