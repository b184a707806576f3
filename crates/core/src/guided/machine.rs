use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Step, TopicId, XpEventKind};
use crate::rules::StudyRules;

use super::quiz::QuizScore;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GuidedError {
    #[error("curriculum has no chapters")]
    NoChapters,

    #[error("chapter {chapter_index} has no topics")]
    EmptyChapter { chapter_index: u32 },

    #[error("quiz can only be submitted on the quiz step, not {}", step.as_str())]
    NotOnQuizStep { step: Step },
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Persisted position in the guided curriculum.
///
/// Indices are 0-based. `completed` is terminal: once set, nothing moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidedState {
    pub chapter_index: u32,
    pub topic_index: u32,
    pub step: Step,
    pub completed: bool,
}

impl GuidedState {
    /// Position of a learner who has never opened guided learning.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            chapter_index: 0,
            topic_index: 0,
            step: Step::Concept,
            completed: false,
        }
    }
}

impl Default for GuidedState {
    fn default() -> Self {
        Self::initial()
    }
}

/// The parts of the catalog the transition function needs to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurriculumShape {
    pub total_chapters: u32,
    pub topics_in_current_chapter: u32,
}

//
// ─── EFFECTS ───────────────────────────────────────────────────────────────────
//

/// Side-effect intents produced by a transition, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Topics of this chapter must be loaded before the transition is committed.
    LoadChapterTopics { chapter_index: u32 },
    /// Write the new position; it is the learner's place in the curriculum.
    PersistPosition(GuidedState),
    AwardXp { amount: u32, kind: XpEventKind },
    /// Append a quiz attempt to history.
    RecordQuizAttempt { topic_id: TopicId, score_percent: u8 },
    /// Upsert the topic's quiz mastery row as mastered.
    MarkQuizMastered { topic_id: TopicId },
    /// Rebuild the cached progress snapshot.
    RecomputeProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: GuidedState,
    pub to: GuidedState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn noop(state: GuidedState) -> Self {
        Self {
            from: state,
            to: state,
            effects: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.effects.is_empty()
    }

    #[must_use]
    pub fn changes_chapter(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, Effect::LoadChapterTopics { .. }))
    }
}

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

/// Move one step forward through the curriculum.
///
/// - `concept → flashcard → quiz` inside a topic
/// - `quiz →` next topic, else first topic of the next chapter, else terminal
/// - terminal → no-op (the completion bonus is only ever emitted once)
///
/// Progression never depends on the quiz score.
///
/// # Errors
///
/// Returns `GuidedError::NoChapters` or `GuidedError::EmptyChapter` when the
/// shape cannot contain the current position.
pub fn advance(
    state: &GuidedState,
    shape: CurriculumShape,
    rules: &StudyRules,
) -> Result<Transition, GuidedError> {
    if state.completed {
        return Ok(Transition::noop(*state));
    }
    if shape.total_chapters == 0 {
        return Err(GuidedError::NoChapters);
    }
    if shape.topics_in_current_chapter == 0 {
        return Err(GuidedError::EmptyChapter {
            chapter_index: state.chapter_index,
        });
    }

    let mut effects = vec![Effect::AwardXp {
        amount: rules.xp_guided_step,
        kind: XpEventKind::for_completed_step(state.step),
    }];

    let next = match state.step {
        Step::Concept => GuidedState {
            step: Step::Flashcard,
            ..*state
        },
        Step::Flashcard => GuidedState {
            step: Step::Quiz,
            ..*state
        },
        Step::Quiz if state.topic_index + 1 < shape.topics_in_current_chapter => GuidedState {
            topic_index: state.topic_index + 1,
            step: Step::Concept,
            ..*state
        },
        Step::Quiz if state.chapter_index + 1 < shape.total_chapters => {
            let chapter_index = state.chapter_index + 1;
            effects.push(Effect::LoadChapterTopics { chapter_index });
            GuidedState {
                chapter_index,
                topic_index: 0,
                step: Step::Concept,
                completed: false,
            }
        }
        Step::Quiz => {
            let done = GuidedState {
                completed: true,
                ..*state
            };
            effects.push(Effect::PersistPosition(done));
            effects.push(Effect::AwardXp {
                amount: rules.xp_curriculum_complete,
                kind: XpEventKind::CompleteAllChapters,
            });
            return Ok(Transition {
                from: *state,
                to: done,
                effects,
            });
        }
    };

    effects.push(Effect::PersistPosition(next));
    Ok(Transition {
        from: *state,
        to: next,
        effects,
    })
}

/// Effects of submitting the quiz of `topic_id` with `score`.
///
/// Passing marks the topic's quiz as mastered and refreshes the snapshot;
/// failing only records the attempt and XP. Neither blocks advancing.
#[must_use]
pub fn quiz_submitted(
    state: &GuidedState,
    topic_id: &TopicId,
    score: QuizScore,
    rules: &StudyRules,
) -> Vec<Effect> {
    let mut effects = vec![
        Effect::AwardXp {
            amount: rules.quiz_completion_xp(score.percent),
            kind: XpEventKind::QuizCompletion,
        },
        Effect::RecordQuizAttempt {
            topic_id: topic_id.clone(),
            score_percent: score.percent,
        },
    ];
    if rules.is_mastery(score.percent) {
        effects.push(Effect::MarkQuizMastered {
            topic_id: topic_id.clone(),
        });
        effects.push(Effect::RecomputeProgress);
    }
    effects.push(Effect::PersistPosition(*state));
    effects
}
