use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rng;
use rand::seq::SliceRandom;
use sie_core::model::{AnswerChoice, PracticeTestResult, QuizQuestion, UserId, XpEventKind};
use sie_core::progress::percentage;
use sie_core::{Clock, StudyRules, fallback};
use storage::repository::{CatalogRepository, PracticeTestRepository};
use thiserror::Error;

use crate::error::ServiceError;
use crate::gamification::{XpAward, XpOutcome, XpService};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PracticeTestError {
    #[error("question {index} out of range (test has {len})")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("practice test already graded")]
    AlreadyGraded,
}

/// Outcome of grading a practice test. Unanswered questions count as wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeTestGrade {
    pub correct: u32,
    pub total: u32,
    pub percent: u8,
    pub passed: bool,
}

/// A timed mock exam drawn from the whole question bank.
#[derive(Debug, Clone)]
pub struct PracticeTest {
    questions: Vec<QuizQuestion>,
    answers: Vec<Option<AnswerChoice>>,
    started_at: DateTime<Utc>,
    grade: Option<PracticeTestGrade>,
}

impl PracticeTest {
    #[must_use]
    pub fn new(questions: Vec<QuizQuestion>, started_at: DateTime<Utc>) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            questions,
            answers,
            started_at,
            grade: None,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.answers.iter().flatten().count()
    }

    #[must_use]
    pub fn grade_result(&self) -> Option<PracticeTestGrade> {
        self.grade
    }

    /// # Errors
    ///
    /// Returns `PracticeTestError` for an unknown index or a graded test.
    pub fn select_answer(
        &mut self,
        index: usize,
        choice: AnswerChoice,
    ) -> Result<(), PracticeTestError> {
        if self.grade.is_some() {
            return Err(PracticeTestError::AlreadyGraded);
        }
        let len = self.answers.len();
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(PracticeTestError::QuestionOutOfRange { index, len })?;
        *slot = Some(choice);
        Ok(())
    }

    /// Seconds left before the time limit, saturating at zero.
    #[must_use]
    pub fn seconds_remaining(&self, now: DateTime<Utc>, rules: &StudyRules) -> u32 {
        rules
            .practice_test_time_limit_secs
            .saturating_sub(elapsed_secs(self.started_at, now))
    }

    /// Score the answers and lock the test.
    ///
    /// # Errors
    ///
    /// Returns `PracticeTestError::AlreadyGraded` on a second call.
    pub fn grade(&mut self, rules: &StudyRules) -> Result<PracticeTestGrade, PracticeTestError> {
        if self.grade.is_some() {
            return Err(PracticeTestError::AlreadyGraded);
        }
        let correct = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| a.is_some_and(|choice| q.is_correct(choice)))
            .count();
        let correct = u32::try_from(correct).unwrap_or(u32::MAX);
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        let percent = percentage(u64::from(correct), u64::from(total));
        let grade = PracticeTestGrade {
            correct,
            total,
            percent,
            passed: total > 0 && percent >= rules.practice_test_pass_percent,
        };
        self.grade = Some(grade);
        Ok(grade)
    }
}

/// What `PracticeTestService::finish` did.
#[derive(Debug)]
pub struct PracticeTestOutcome {
    pub grade: PracticeTestGrade,
    pub time_taken_secs: u32,
    pub xp: XpOutcome,
}

#[derive(Clone)]
pub struct PracticeTestService {
    clock: Clock,
    rules: StudyRules,
    catalog: Arc<dyn CatalogRepository>,
    results: Arc<dyn PracticeTestRepository>,
    xp: XpService,
}

impl PracticeTestService {
    #[must_use]
    pub fn new(
        clock: Clock,
        rules: StudyRules,
        catalog: Arc<dyn CatalogRepository>,
        results: Arc<dyn PracticeTestRepository>,
        xp: XpService,
    ) -> Self {
        Self {
            clock,
            rules,
            catalog,
            results,
            xp,
        }
    }

    /// Draw a shuffled test of at most `practice_test_questions` questions.
    ///
    /// An empty or unreachable question bank falls back to the built-in one.
    pub async fn start(&self) -> PracticeTest {
        let mut questions = match self.catalog.all_questions().await {
            Ok(questions) if !questions.is_empty() => questions,
            Ok(_) => fallback::curriculum().questions,
            Err(err) => {
                tracing::warn!(error = %err, "question bank unavailable, using built-in questions");
                fallback::curriculum().questions
            }
        };

        let mut rng = rng();
        questions.as_mut_slice().shuffle(&mut rng);
        questions.truncate(self.rules.practice_test_questions);

        tracing::debug!(questions = questions.len(), "practice test drawn");
        PracticeTest::new(questions, self.clock.now())
    }

    /// Grade `test`, store the result and award XP equal to the percent score.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::PracticeTest` for a graded test and
    /// `ServiceError::Transient` if the result cannot be stored; no XP is
    /// awarded then.
    pub async fn finish(
        &self,
        user_id: &UserId,
        test: &mut PracticeTest,
    ) -> Result<PracticeTestOutcome, ServiceError> {
        let grade = test.grade(&self.rules)?;
        let time_taken_secs = elapsed_secs(test.started_at, self.clock.now());

        let result = PracticeTestResult::new(
            user_id.clone(),
            grade.correct,
            grade.total,
            grade.passed,
            self.clock.now(),
            time_taken_secs,
        )?;
        self.results.append_result(&result).await?;

        let xp = self
            .xp
            .award(&XpAward::new(
                user_id.clone(),
                u32::from(grade.percent),
                XpEventKind::PracticeTestComplete,
            ))
            .await;

        tracing::info!(
            user_id = %user_id,
            correct = grade.correct,
            total = grade.total,
            passed = grade.passed,
            time_taken_secs,
            "practice test finished"
        );
        Ok(PracticeTestOutcome {
            grade,
            time_taken_secs,
            xp,
        })
    }

    /// Past results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Transient` if storage is unreachable.
    pub async fn history(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PracticeTestResult>, ServiceError> {
        Ok(self.results.list_results(user_id).await?)
    }
}

fn elapsed_secs(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    u32::try_from((to - from).num_seconds().max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use sie_core::model::Profile;
    use sie_core::time::fixed_clock;
    use storage::InMemoryRepository;
    use storage::repository::ProfileRepository;

    fn wrong(q: &QuizQuestion) -> AnswerChoice {
        if q.correct == AnswerChoice::A {
            AnswerChoice::B
        } else {
            AnswerChoice::A
        }
    }

    fn service(repo: &InMemoryRepository, clock: Clock, rules: StudyRules) -> PracticeTestService {
        let xp = XpService::new(clock, Arc::new(repo.clone()), Arc::new(repo.clone()));
        PracticeTestService::new(clock, rules, Arc::new(repo.clone()), Arc::new(repo.clone()), xp)
    }

    #[test]
    fn grading_counts_unanswered_as_wrong() {
        let rules = StudyRules::default();
        let questions = fallback::curriculum().questions;
        let mut test = PracticeTest::new(questions.clone(), fixed_clock().now());
        for (i, q) in questions.iter().enumerate().take(6) {
            test.select_answer(i, q.correct).unwrap();
        }
        test.select_answer(6, wrong(&questions[6])).unwrap();

        let grade = test.grade(&rules).unwrap();
        assert_eq!((grade.correct, grade.total, grade.percent), (6, 9, 67));
        assert!(!grade.passed);
        assert_eq!(test.grade(&rules), Err(PracticeTestError::AlreadyGraded));
        assert_eq!(
            test.select_answer(0, AnswerChoice::A),
            Err(PracticeTestError::AlreadyGraded)
        );
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        let mut questions = fallback::curriculum().questions;
        questions.push(questions[0].clone());
        assert_eq!(questions.len(), 10);
        let mut test = PracticeTest::new(questions.clone(), fixed_clock().now());
        for (i, q) in questions.iter().enumerate() {
            let choice = if i < 7 { q.correct } else { wrong(q) };
            test.select_answer(i, choice).unwrap();
        }
        let grade = test.grade(&StudyRules::default()).unwrap();
        assert_eq!(grade.percent, 70);
        assert!(grade.passed);
    }

    #[test]
    fn select_answer_rejects_unknown_index() {
        let mut test = PracticeTest::new(fallback::curriculum().questions, fixed_clock().now());
        assert_eq!(
            test.select_answer(9, AnswerChoice::A),
            Err(PracticeTestError::QuestionOutOfRange { index: 9, len: 9 })
        );
    }

    #[test]
    fn remaining_time_saturates() {
        let rules = StudyRules::default();
        let start = fixed_clock().now();
        let test = PracticeTest::new(Vec::new(), start);
        assert_eq!(test.seconds_remaining(start, &rules), 7200);
        assert_eq!(
            test.seconds_remaining(start + Duration::minutes(30), &rules),
            5400
        );
        assert_eq!(test.seconds_remaining(start + Duration::hours(3), &rules), 0);
    }

    #[tokio::test]
    async fn start_caps_question_count_and_falls_back() {
        let empty = InMemoryRepository::new();
        let rules = StudyRules {
            practice_test_questions: 4,
            ..StudyRules::default()
        };
        let test = service(&empty, fixed_clock(), rules).start().await;
        assert_eq!(test.len(), 4);

        let full = InMemoryRepository::with_curriculum(fallback::curriculum());
        let test = service(&full, fixed_clock(), StudyRules::default())
            .start()
            .await;
        assert_eq!(test.len(), 9);
    }

    #[tokio::test]
    async fn finish_stores_result_and_awards_percent_xp() {
        let repo = InMemoryRepository::with_curriculum(fallback::curriculum());
        let user = UserId::new("u1");
        repo.create_profile(&Profile::new_default(user.clone()))
            .await
            .unwrap();
        let mut clock = fixed_clock();
        let mut test = service(&repo, clock, StudyRules::default()).start().await;
        let answers: Vec<_> = test.questions().iter().map(|q| q.correct).collect();
        for (i, choice) in answers.into_iter().enumerate() {
            test.select_answer(i, choice).unwrap();
        }

        clock.advance(Duration::minutes(12));
        let service = service(&repo, clock, StudyRules::default());
        let outcome = service.finish(&user, &mut test).await.unwrap();
        assert!(outcome.grade.passed);
        assert_eq!(outcome.time_taken_secs, 720);
        assert_eq!(outcome.xp.total_xp(), Some(100));

        let history = service.history(&user).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].correct_count(), 9);
        assert!(service.finish(&user, &mut test).await.is_err());
        assert_eq!(service.history(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_test_fails_without_dividing_by_zero() {
        let mut test = PracticeTest::new(Vec::new(), fixed_clock().now());
        let grade = test.grade(&StudyRules::default()).unwrap();
        assert_eq!(grade.percent, 0);
        assert!(!grade.passed);
    }
}
