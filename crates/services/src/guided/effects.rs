use std::sync::Arc;

use sie_core::Clock;
use sie_core::guided::Effect;
use sie_core::model::{ContentId, ContentType, QuizAttempt, UserId};
use sie_core::progress::ProgressSnapshot;
use storage::repository::{LearningProgressRepository, QuizAttemptRepository};

use crate::gamification::{XpAward, XpOutcome, XpService};
use crate::progress::ProgressAggregator;

/// What happened while applying a list of effects.
///
/// Effects are applied optimistically: a failure is logged, recorded in
/// `failed`, and the remaining effects still run.
#[derive(Debug, Default)]
pub struct EffectReport {
    pub xp: Vec<XpOutcome>,
    /// Sum of the awards that reached the profile total.
    pub xp_awarded: u32,
    /// Snapshot produced by a `RecomputeProgress` effect.
    pub snapshot: Option<ProgressSnapshot>,
    pub failed: Vec<Effect>,
}

impl EffectReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn position_saved(&self) -> bool {
        !self
            .failed
            .iter()
            .any(|e| matches!(e, Effect::PersistPosition(_)))
    }
}

/// Applies effect intents against the persistence boundary, in order.
#[derive(Clone)]
pub(super) struct EffectRunner {
    pub(super) clock: Clock,
    pub(super) learning_progress: Arc<dyn LearningProgressRepository>,
    pub(super) quiz_attempts: Arc<dyn QuizAttemptRepository>,
    pub(super) progress: ProgressAggregator,
    pub(super) xp: XpService,
}

impl EffectRunner {
    /// Run `effects` for `user_id`.
    ///
    /// `LoadChapterTopics` is skipped: it is resolved before a transition is
    /// committed.
    pub(super) async fn run(&self, user_id: &UserId, effects: &[Effect]) -> EffectReport {
        let mut report = EffectReport::default();
        for effect in effects {
            let ok = match effect {
                Effect::LoadChapterTopics { .. } => true,
                Effect::PersistPosition(state) => {
                    match self.learning_progress.save_position(user_id, state).await {
                        Ok(()) => true,
                        Err(err) => {
                            tracing::warn!(
                                user_id = %user_id,
                                chapter_index = state.chapter_index,
                                topic_index = state.topic_index,
                                step = state.step.as_str(),
                                error = %err,
                                "guided position not saved"
                            );
                            false
                        }
                    }
                }
                Effect::AwardXp { amount, kind } => {
                    let outcome = self
                        .xp
                        .award(&XpAward::new(user_id.clone(), *amount, *kind))
                        .await;
                    let applied = outcome.is_applied();
                    if outcome.total_xp().is_some() {
                        report.xp_awarded = report.xp_awarded.saturating_add(*amount);
                    }
                    report.xp.push(outcome);
                    applied
                }
                Effect::RecordQuizAttempt {
                    topic_id,
                    score_percent,
                } => {
                    let attempt = QuizAttempt {
                        user_id: user_id.clone(),
                        topic_id: topic_id.clone(),
                        score_percent: *score_percent,
                        completed_at: self.clock.now(),
                    };
                    match self.quiz_attempts.append_attempt(&attempt).await {
                        Ok(()) => true,
                        Err(err) => {
                            tracing::warn!(
                                user_id = %user_id,
                                topic_id = %topic_id,
                                error = %err,
                                "quiz attempt not recorded"
                            );
                            false
                        }
                    }
                }
                Effect::MarkQuizMastered { topic_id } => {
                    let content_id = ContentId::new(topic_id.as_str());
                    match self
                        .progress
                        .record_mastery(user_id, ContentType::Quiz, content_id, true)
                        .await
                    {
                        Ok(()) => true,
                        Err(err) => {
                            tracing::warn!(
                                user_id = %user_id,
                                topic_id = %topic_id,
                                error = %err,
                                "quiz mastery not saved"
                            );
                            false
                        }
                    }
                }
                Effect::RecomputeProgress => {
                    match self.progress.recompute_progress(user_id).await {
                        Ok(snapshot) => {
                            report.snapshot = Some(snapshot);
                            true
                        }
                        Err(err) => {
                            tracing::warn!(
                                user_id = %user_id,
                                error = %err,
                                "progress snapshot not refreshed"
                            );
                            false
                        }
                    }
                }
            };
            if !ok {
                report.failed.push(effect.clone());
            }
        }
        report
    }
}
