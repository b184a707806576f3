use std::sync::Arc;

use sie_core::StudyRules;
use storage::repository::Storage;
use storage::{IdentityProvider, InMemoryIdentityProvider};

use crate::Clock;
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::gamification::{StreakService, XpService};
use crate::guided::GuidedLearningService;
use crate::hosted_auth::HostedIdentityProvider;
use crate::practice_test::PracticeTestService;
use crate::profile_service::ProfileService;
use crate::progress::ProgressAggregator;
use crate::session_manager::SessionManager;
use crate::study::StudyService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    sessions: Arc<SessionManager>,
    profiles: Arc<ProfileService>,
    progress: Arc<ProgressAggregator>,
    dashboard: Arc<DashboardService>,
    guided: Arc<GuidedLearningService>,
    study: Arc<StudyService>,
    practice_tests: Arc<PracticeTestService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// Identity goes to the hosted backend when `SIE_BACKEND_URL` and
    /// `SIE_BACKEND_ANON_KEY` are set, and stays in memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let identity: Arc<dyn IdentityProvider> = match HostedIdentityProvider::from_env() {
            Some(hosted) => Arc::new(hosted),
            None => {
                tracing::info!("no hosted backend configured, using local identity");
                Arc::new(InMemoryIdentityProvider::new())
            }
        };
        Ok(Self::from_parts(storage, identity, clock, StudyRules::default()))
    }

    /// Services over in-memory storage and identity.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_parts(
            Storage::in_memory(),
            Arc::new(InMemoryIdentityProvider::new()),
            clock,
            StudyRules::default(),
        )
    }

    /// Wire every service over the given backends.
    #[must_use]
    pub fn from_parts(
        storage: Storage,
        identity: Arc<dyn IdentityProvider>,
        clock: Clock,
        rules: StudyRules,
    ) -> Self {
        let progress = ProgressAggregator::new(
            clock,
            Arc::clone(&storage.profiles),
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.study_progress),
        );
        let xp = XpService::new(
            clock,
            Arc::clone(&storage.profiles),
            Arc::clone(&storage.xp_events),
        );
        let streaks = StreakService::new(
            clock,
            Arc::clone(&storage.profiles),
            Arc::clone(&storage.streaks),
        );
        let profiles = ProfileService::new(clock, Arc::clone(&storage.profiles));

        let dashboard = Arc::new(DashboardService::new(
            profiles.clone(),
            progress.clone(),
            streaks,
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.study_progress),
            Arc::clone(&storage.learning_progress),
            Arc::clone(&storage.quiz_attempts),
        ));
        let guided = Arc::new(GuidedLearningService::new(
            clock,
            rules.clone(),
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.study_progress),
            Arc::clone(&storage.learning_progress),
            Arc::clone(&storage.quiz_attempts),
            progress.clone(),
            xp.clone(),
        ));
        let study = Arc::new(StudyService::new(
            rules.clone(),
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.study_progress),
            progress.clone(),
            xp.clone(),
        ));
        let practice_tests = Arc::new(PracticeTestService::new(
            clock,
            rules,
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.practice_tests),
            xp,
        ));

        Self {
            storage,
            sessions: Arc::new(SessionManager::new(identity)),
            profiles: Arc::new(profiles),
            progress: Arc::new(progress),
            dashboard,
            guided,
            study,
            practice_tests,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressAggregator> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn guided(&self) -> Arc<GuidedLearningService> {
        Arc::clone(&self.guided)
    }

    #[must_use]
    pub fn study(&self) -> Arc<StudyService> {
        Arc::clone(&self.study)
    }

    #[must_use]
    pub fn practice_tests(&self) -> Arc<PracticeTestService> {
        Arc::clone(&self.practice_tests)
    }
}
