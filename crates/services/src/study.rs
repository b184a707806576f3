use std::sync::Arc;

use sie_core::StudyRules;
use sie_core::guided::FlashcardRun;
use sie_core::model::{ContentId, ContentType, TopicId, UserId, XpEventKind};
use sie_core::progress::ProgressSnapshot;
use storage::repository::{CatalogRepository, StudyProgressRepository};

use crate::error::ServiceError;
use crate::gamification::{XpAward, XpService};
use crate::progress::ProgressAggregator;

/// Result of flipping a card's mastered flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardToggle {
    pub mastered: bool,
    /// `None` when saving or recomputing failed; the local flag still flipped.
    pub snapshot: Option<ProgressSnapshot>,
}

/// Flashcard, concept and topic study outside the guided walk.
#[derive(Clone)]
pub struct StudyService {
    rules: StudyRules,
    catalog: Arc<dyn CatalogRepository>,
    study_progress: Arc<dyn StudyProgressRepository>,
    progress: ProgressAggregator,
    xp: XpService,
}

impl StudyService {
    #[must_use]
    pub fn new(
        rules: StudyRules,
        catalog: Arc<dyn CatalogRepository>,
        study_progress: Arc<dyn StudyProgressRepository>,
        progress: ProgressAggregator,
        xp: XpService,
    ) -> Self {
        Self {
            rules,
            catalog,
            study_progress,
            progress,
            xp,
        }
    }

    /// Flashcards of a topic with the user's mastered flags filled in.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Transient` if the cards or flags cannot be read.
    pub async fn open_flashcards(
        &self,
        user_id: &UserId,
        topic_id: &TopicId,
    ) -> Result<FlashcardRun, ServiceError> {
        let (cards, mastered) = futures::try_join!(
            self.catalog.flashcards_for_topic(topic_id),
            self.study_progress
                .mastered_ids(user_id, ContentType::Flashcard),
        )?;
        Ok(FlashcardRun::new(cards, &mastered))
    }

    /// Flip card `index` in `run` and persist the new flag.
    ///
    /// Only the card's own row changes. Marking a card mastered awards XP;
    /// clearing it does not take XP back.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Flashcards` for an index outside the run.
    pub async fn toggle_flashcard(
        &self,
        user_id: &UserId,
        run: &mut FlashcardRun,
        index: usize,
    ) -> Result<FlashcardToggle, ServiceError> {
        let mastered = run.toggle_mastered(index)?;
        let card_id = run.cards()[index].id.clone();

        let snapshot = match self
            .progress
            .set_flashcard_mastered(user_id, &card_id, mastered)
            .await
        {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    flashcard_id = %card_id,
                    error = %err,
                    "flashcard mastery not saved"
                );
                None
            }
        };

        if mastered {
            self.xp
                .award(&XpAward::new(
                    user_id.clone(),
                    self.rules.xp_flashcard_mastered,
                    XpEventKind::MasterFlashcard,
                ))
                .await;
        }

        Ok(FlashcardToggle { mastered, snapshot })
    }

    /// Mark a concept as viewed; XP only on the first view.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the view cannot be recorded.
    pub async fn view_concept(
        &self,
        user_id: &UserId,
        concept_id: &ContentId,
    ) -> Result<ProgressSnapshot, ServiceError> {
        let seen = self
            .study_progress
            .get(user_id, ContentType::Concept, concept_id)
            .await?
            .is_some_and(|row| row.mastered);

        let snapshot = self.progress.mark_concept_viewed(user_id, concept_id).await?;
        if !seen {
            self.xp
                .award(&XpAward::new(
                    user_id.clone(),
                    self.rules.xp_concept_viewed,
                    XpEventKind::ViewConcept,
                ))
                .await;
        }
        Ok(snapshot)
    }

    /// Record that a topic was opened. The first open awards XP.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the topic row cannot be read or written.
    pub async fn open_topic(&self, user_id: &UserId, topic_id: &TopicId) -> Result<(), ServiceError> {
        let content_id = ContentId::new(topic_id.as_str());
        if self
            .study_progress
            .get(user_id, ContentType::Topic, &content_id)
            .await?
            .is_some()
        {
            return Ok(());
        }

        self.progress
            .record_mastery(user_id, ContentType::Topic, content_id, false)
            .await?;
        self.xp
            .award(&XpAward::new(
                user_id.clone(),
                self.rules.xp_topic_viewed,
                XpEventKind::ViewTopic,
            ))
            .await;
        Ok(())
    }

    /// Mark a topic as completed. Completing it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the topic row cannot be read or written.
    pub async fn complete_topic(
        &self,
        user_id: &UserId,
        topic_id: &TopicId,
    ) -> Result<(), ServiceError> {
        let content_id = ContentId::new(topic_id.as_str());
        let done = self
            .study_progress
            .get(user_id, ContentType::Topic, &content_id)
            .await?
            .is_some_and(|row| row.mastered);
        if done {
            return Ok(());
        }

        self.progress
            .record_mastery(user_id, ContentType::Topic, content_id, true)
            .await?;
        self.xp
            .award(&XpAward::new(
                user_id.clone(),
                self.rules.xp_topic_completed,
                XpEventKind::CompleteTopic,
            ))
            .await;
        Ok(())
    }
}
