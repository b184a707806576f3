#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gamification;
pub mod guided;
pub mod hosted_auth;
pub mod practice_test;
pub mod profile_service;
pub mod progress;
pub mod session_manager;
pub mod study;

pub use sie_core::Clock;

pub use app_services::AppServices;
pub use config::BackendConfig;
pub use dashboard::{Dashboard, DashboardService, StudyStats};
pub use error::{AppServicesError, ConfigError, ServiceError};
pub use gamification::{StreakService, XpAward, XpOutcome, XpService};
pub use guided::{
    CurriculumSource, EffectReport, GuidedLearningService, GuidedSession, QuizOutcome,
    StepContent, StepOutcome,
};
pub use hosted_auth::HostedIdentityProvider;
pub use practice_test::{
    PracticeTest, PracticeTestError, PracticeTestGrade, PracticeTestOutcome, PracticeTestService,
};
pub use profile_service::ProfileService;
pub use progress::ProgressAggregator;
pub use session_manager::SessionManager;
pub use study::{FlashcardToggle, StudyService};
