use thiserror::Error;

use crate::model::{AnswerChoice, QuizQuestion};
use crate::progress::percentage;
use crate::rules::StudyRules;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    NoQuestions,

    #[error("question {index} out of range (quiz has {len})")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("{unanswered} question(s) left unanswered")]
    Unanswered { unanswered: usize },

    #[error("quiz already submitted")]
    AlreadySubmitted,

    #[error("quiz not submitted yet")]
    NotSubmitted,

    #[error("score {percent}% is above the restart threshold")]
    RestartNotAllowed { percent: u8 },
}

/// Result of a submitted quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
    pub percent: u8,
}

impl QuizScore {
    #[must_use]
    pub fn new(correct: u32, total: u32) -> Self {
        Self {
            correct,
            total,
            percent: percentage(u64::from(correct), u64::from(total)),
        }
    }
}

/// Per-question review after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionReview {
    pub selected: AnswerChoice,
    pub correct: AnswerChoice,
}

impl QuestionReview {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.selected == self.correct
    }
}

/// One pass over a topic's quiz questions.
///
/// Answers can be changed freely until `submit`; afterwards they are frozen
/// until an allowed `restart`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    answers: Vec<Option<AnswerChoice>>,
    current: usize,
    score: Option<QuizScore>,
}

impl QuizSession {
    #[must_use]
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            questions,
            answers,
            current: 0,
            score: None,
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
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<AnswerChoice> {
        self.answers.get(index).copied().flatten()
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.score.is_some()
    }

    #[must_use]
    pub fn score(&self) -> Option<QuizScore> {
        self.score
    }

    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_none()).count()
    }

    #[must_use]
    pub fn all_answered(&self) -> bool {
        self.unanswered() == 0
    }

    /// Records (or replaces) the answer for question `index`.
    ///
    /// # Errors
    ///
    /// `AlreadySubmitted` once the quiz is scored, leaving answers untouched.
    pub fn select_answer(&mut self, index: usize, choice: AnswerChoice) -> Result<(), QuizError> {
        if self.is_submitted() {
            return Err(QuizError::AlreadySubmitted);
        }
        let len = self.answers.len();
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(QuizError::QuestionOutOfRange { index, len })?;
        *slot = Some(choice);
        Ok(())
    }

    /// Moves to the next question; stays put on the last one.
    pub fn next_question(&mut self) -> bool {
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_question(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// # Errors
    ///
    /// `QuestionOutOfRange` when `index` is past the last question.
    pub fn go_to(&mut self, index: usize) -> Result<(), QuizError> {
        if index >= self.questions.len() {
            return Err(QuizError::QuestionOutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    /// Scores the quiz. Only allowed once every question has an answer.
    ///
    /// # Errors
    ///
    /// `NoQuestions`, `Unanswered` or `AlreadySubmitted`.
    pub fn submit(&mut self) -> Result<QuizScore, QuizError> {
        if self.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        if self.is_submitted() {
            return Err(QuizError::AlreadySubmitted);
        }
        let unanswered = self.unanswered();
        if unanswered > 0 {
            return Err(QuizError::Unanswered { unanswered });
        }

        let correct = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| a.is_some_and(|choice| q.is_correct(choice)))
            .count();
        let score = QuizScore::new(
            u32::try_from(correct).unwrap_or(u32::MAX),
            u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
        );
        self.score = Some(score);
        Ok(score)
    }

    /// `None` until submitted.
    #[must_use]
    pub fn passed(&self, rules: &StudyRules) -> Option<bool> {
        self.score.map(|s| rules.is_mastery(s.percent))
    }

    #[must_use]
    pub fn can_restart(&self, rules: &StudyRules) -> bool {
        self.score.is_some_and(|s| rules.allows_restart(s.percent))
    }

    /// Clears answers and score for another attempt.
    ///
    /// # Errors
    ///
    /// `NotSubmitted`, or `RestartNotAllowed` when the score is above the
    /// restart threshold.
    pub fn restart(&mut self, rules: &StudyRules) -> Result<(), QuizError> {
        let score = self.score.ok_or(QuizError::NotSubmitted)?;
        if !rules.allows_restart(score.percent) {
            return Err(QuizError::RestartNotAllowed {
                percent: score.percent,
            });
        }
        self.answers.iter_mut().for_each(|a| *a = None);
        self.current = 0;
        self.score = None;
        Ok(())
    }

    /// Selected and correct answer per question, available after submission.
    #[must_use]
    pub fn review(&self) -> Option<Vec<QuestionReview>> {
        self.score?;
        self.questions
            .iter()
            .zip(&self.answers)
            .map(|(q, a)| {
                a.map(|selected| QuestionReview {
                    selected,
                    correct: q.correct,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentId, TopicId};

    fn question(n: usize, correct: AnswerChoice) -> QuizQuestion {
        QuizQuestion {
            id: ContentId::new(format!("q{n}")),
            topic_id: TopicId::new("t1"),
            question: format!("Question {n}"),
            options: ["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
            explanation: None,
        }
    }

    fn quiz(n: usize) -> QuizSession {
        QuizSession::new((0..n).map(|i| question(i, AnswerChoice::A)).collect())
    }

    fn answer_all(session: &mut QuizSession, correct: usize) {
        for i in 0..session.len() {
            let choice = if i < correct {
                AnswerChoice::A
            } else {
                AnswerChoice::B
            };
            session.select_answer(i, choice).unwrap();
        }
    }

    #[test]
    fn submit_requires_every_answer() {
        let mut session = quiz(3);
        session.select_answer(0, AnswerChoice::A).unwrap();
        assert_eq!(
            session.submit().unwrap_err(),
            QuizError::Unanswered { unanswered: 2 }
        );
        assert!(!session.is_submitted());
    }

    #[test]
    fn answers_can_change_before_submit() {
        let mut session = quiz(1);
        session.select_answer(0, AnswerChoice::B).unwrap();
        session.select_answer(0, AnswerChoice::A).unwrap();
        assert_eq!(session.submit().unwrap().percent, 100);
    }

    #[test]
    fn answers_are_frozen_after_submit() {
        let mut session = quiz(2);
        answer_all(&mut session, 1);
        let score = session.submit().unwrap();
        assert_eq!(score.percent, 50);

        assert_eq!(
            session.select_answer(1, AnswerChoice::A).unwrap_err(),
            QuizError::AlreadySubmitted
        );
        assert_eq!(session.answer(1), Some(AnswerChoice::B));
        assert_eq!(session.score(), Some(score));
        assert_eq!(session.submit().unwrap_err(), QuizError::AlreadySubmitted);
    }

    #[test]
    fn empty_quiz_cannot_be_submitted() {
        assert_eq!(quiz(0).submit().unwrap_err(), QuizError::NoQuestions);
    }

    #[test]
    fn score_of_four_out_of_five_passes() {
        let rules = StudyRules::default();
        let mut session = quiz(5);
        answer_all(&mut session, 4);
        let score = session.submit().unwrap();
        assert_eq!(score, QuizScore::new(4, 5));
        assert_eq!(score.percent, 80);
        assert_eq!(session.passed(&rules), Some(true));
        assert!(!session.can_restart(&rules));
        assert_eq!(
            session.restart(&rules).unwrap_err(),
            QuizError::RestartNotAllowed { percent: 80 }
        );
    }

    #[test]
    fn low_score_can_restart() {
        let rules = StudyRules::default();
        let mut session = quiz(3);
        answer_all(&mut session, 2);
        assert_eq!(session.submit().unwrap().percent, 67);
        // 67 is above the restart bar and below mastery
        assert_eq!(session.passed(&rules), Some(false));
        assert!(!session.can_restart(&rules));

        let mut session = quiz(3);
        answer_all(&mut session, 1);
        session.submit().unwrap();
        assert!(session.can_restart(&rules));
        session.restart(&rules).unwrap();
        assert!(!session.is_submitted());
        assert_eq!(session.unanswered(), 3);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn restart_before_submit_is_rejected() {
        let mut session = quiz(2);
        assert_eq!(
            session.restart(&StudyRules::default()).unwrap_err(),
            QuizError::NotSubmitted
        );
    }

    #[test]
    fn navigation_is_bounded() {
        let mut session = quiz(2);
        assert!(!session.previous_question());
        assert!(session.next_question());
        assert!(!session.next_question());
        assert_eq!(session.current_index(), 1);
        assert!(session.go_to(2).is_err());
        session.go_to(0).unwrap();
        assert_eq!(session.current_question().unwrap().id.as_str(), "q0");
    }

    #[test]
    fn review_is_available_after_submit() {
        let mut session = quiz(2);
        answer_all(&mut session, 1);
        assert!(session.review().is_none());
        session.submit().unwrap();
        let review = session.review().unwrap();
        assert!(review[0].is_correct());
        assert!(!review[1].is_correct());
    }
}
