//! Guided learning: a linear walk through chapters and topics, each topic
//! shown as concept, then flashcards, then a quiz.
//!
//! Everything here is pure. Transitions return the next state plus the
//! effects the caller has to run (persist, award XP, load topics).

mod flashcards;
mod machine;
mod quiz;

pub use flashcards::{CardMove, FlashcardRun, FlashcardRunError};
pub use machine::{
    CurriculumShape, Effect, GuidedError, GuidedState, Transition, advance, quiz_submitted,
};
pub use quiz::{QuestionReview, QuizError, QuizScore, QuizSession};
