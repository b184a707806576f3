use std::sync::Arc;

use sie_core::guided::GuidedState;
use sie_core::model::{ContentType, Profile, UserId};
use sie_core::progress::{ProgressSnapshot, curriculum_percentage};
use storage::repository::{
    CatalogRepository, LearningProgressRepository, QuizAttemptRepository, StorageError,
    StudyProgressRepository,
};

use crate::error::ServiceError;
use crate::gamification::StreakService;
use crate::profile_service::ProfileService;
use crate::progress::ProgressAggregator;

/// Counters shown under the progress rings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudyStats {
    pub flashcards_mastered: u32,
    pub quizzes_passed: u32,
    pub topics_total: u32,
    pub quiz_attempts: u32,
}

/// Everything the home screen renders for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub profile: Profile,
    pub snapshot: ProgressSnapshot,
    pub streak: u32,
    pub days_until_exam: Option<i64>,
    /// Share of guided steps behind the saved position.
    pub guided_percentage: u8,
    pub stats: StudyStats,
}

#[derive(Clone)]
pub struct DashboardService {
    profiles: ProfileService,
    progress: ProgressAggregator,
    streaks: StreakService,
    catalog: Arc<dyn CatalogRepository>,
    study_progress: Arc<dyn StudyProgressRepository>,
    learning_progress: Arc<dyn LearningProgressRepository>,
    quiz_attempts: Arc<dyn QuizAttemptRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        profiles: ProfileService,
        progress: ProgressAggregator,
        streaks: StreakService,
        catalog: Arc<dyn CatalogRepository>,
        study_progress: Arc<dyn StudyProgressRepository>,
        learning_progress: Arc<dyn LearningProgressRepository>,
        quiz_attempts: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        Self {
            profiles,
            progress,
            streaks,
            catalog,
            study_progress,
            learning_progress,
            quiz_attempts,
        }
    }

    /// Load the dashboard, creating the profile on first visit.
    ///
    /// The snapshot is recomputed for a new profile or one without a cached
    /// snapshot; a failed recomputation serves the cached values. Streak,
    /// guided progress and stats failures are logged and shown as zero.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Transient` if the profile cannot be loaded.
    pub async fn load(&self, user_id: &UserId) -> Result<Dashboard, ServiceError> {
        let (mut profile, created) = self.profiles.load_or_create(user_id).await?;

        let cached = profile.overall_progress().copied();
        let snapshot = match cached {
            Some(snapshot) if !created => snapshot,
            _ => self.progress.snapshot_or_cached(user_id, cached).await,
        };

        let streak = match self.streaks.touch(user_id).await {
            Ok(streak) => streak,
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "streak not updated");
                profile.streak()
            }
        };
        // pick up the streak and snapshot written above
        match self.profiles.get(user_id).await {
            Ok(fresh) => profile = fresh,
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "profile not refreshed");
            }
        }

        let (guided_percentage, stats) =
            futures::join!(self.guided_percentage(user_id), self.stats(user_id));
        let guided_percentage = guided_percentage.unwrap_or_else(|err| {
            tracing::warn!(user_id = %user_id, error = %err, "guided progress unavailable");
            0
        });
        let stats = stats.unwrap_or_else(|err| {
            tracing::warn!(user_id = %user_id, error = %err, "study stats unavailable");
            StudyStats::default()
        });

        let days_until_exam = self.profiles.days_until_exam(&profile);
        tracing::debug!(
            user_id = %user_id,
            created,
            streak,
            total = snapshot.total.percentage,
            guided_percentage,
            "dashboard loaded"
        );
        Ok(Dashboard {
            profile,
            snapshot,
            streak,
            days_until_exam,
            guided_percentage,
            stats,
        })
    }

    async fn guided_percentage(&self, user_id: &UserId) -> Result<u8, StorageError> {
        let position = match self.learning_progress.get_position(user_id).await {
            Ok(state) => state,
            Err(StorageError::NotFound) => GuidedState::initial(),
            Err(err) => return Err(err),
        };
        let mut shape = self.catalog.topics_per_chapter().await?;
        // the walk skips chapters without topics
        shape.retain(|topics| *topics > 0);
        Ok(curriculum_percentage(&position, &shape))
    }

    async fn stats(&self, user_id: &UserId) -> Result<StudyStats, StorageError> {
        let (flashcards_mastered, quizzes_passed, topics_total, quiz_attempts) = futures::try_join!(
            self.study_progress
                .count_mastered(user_id, ContentType::Flashcard),
            self.study_progress.count_mastered(user_id, ContentType::Quiz),
            self.catalog.count_topics(),
            self.quiz_attempts.count_attempts(user_id),
        )?;
        Ok(StudyStats {
            flashcards_mastered,
            quizzes_passed,
            topics_total,
            quiz_attempts,
        })
    }
}
