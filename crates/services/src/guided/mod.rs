//! Guided learning: chapter → topic → concept/flashcard/quiz walk.
//!
//! The transition rules live in `sie_core::guided`; this module loads
//! content, keeps the open session and applies the effects of each step.

mod effects;
mod service;
mod session;

pub use effects::EffectReport;
pub use service::{GuidedLearningService, QuizOutcome, StepOutcome};
pub use session::{CurriculumSource, GuidedSession, StepContent};
