use std::future::Future;
use std::sync::Arc;

use sie_core::guided::{
    self, Effect, FlashcardRun, GuidedError, GuidedState, QuizScore, QuizSession, Transition,
};
use sie_core::model::{Chapter, ContentType, Curriculum, Step, Topic, TopicId, UserId};
use sie_core::{Clock, StudyRules, fallback};
use storage::repository::{
    CatalogRepository, LearningProgressRepository, QuizAttemptRepository, StorageError,
    StudyProgressRepository,
};

use super::effects::{EffectReport, EffectRunner};
use super::session::{CurriculumSource, GuidedSession, StepContent, index};
use crate::error::ServiceError;
use crate::gamification::XpService;
use crate::progress::ProgressAggregator;

/// Result of `GuidedLearningService::advance`.
#[derive(Debug)]
pub struct StepOutcome {
    pub transition: Transition,
    pub report: EffectReport,
}

/// Result of `GuidedLearningService::submit_quiz`.
#[derive(Debug)]
pub struct QuizOutcome {
    pub score: QuizScore,
    pub passed: bool,
    pub report: EffectReport,
}

/// Walks a learner through chapters, topics and steps.
#[derive(Clone)]
pub struct GuidedLearningService {
    rules: StudyRules,
    catalog: Arc<dyn CatalogRepository>,
    study_progress: Arc<dyn StudyProgressRepository>,
    learning_progress: Arc<dyn LearningProgressRepository>,
    builtin: Arc<Curriculum>,
    effects: EffectRunner,
}

impl GuidedLearningService {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        clock: Clock,
        rules: StudyRules,
        catalog: Arc<dyn CatalogRepository>,
        study_progress: Arc<dyn StudyProgressRepository>,
        learning_progress: Arc<dyn LearningProgressRepository>,
        quiz_attempts: Arc<dyn QuizAttemptRepository>,
        progress: ProgressAggregator,
        xp: XpService,
    ) -> Self {
        Self {
            rules,
            catalog,
            study_progress,
            learning_progress: Arc::clone(&learning_progress),
            builtin: Arc::new(fallback::curriculum()),
            effects: EffectRunner {
                clock,
                learning_progress,
                quiz_attempts,
                progress,
                xp,
            },
        }
    }

    #[must_use]
    pub fn rules(&self) -> &StudyRules {
        &self.rules
    }

    /// Open guided learning for `user_id` at their saved position.
    ///
    /// A missing position row is created at the start of the curriculum.
    /// When the catalog is empty or cannot be read, the built-in curriculum
    /// is used instead.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Transient` if the saved position cannot be read.
    pub async fn start(&self, user_id: &UserId) -> Result<GuidedSession, ServiceError> {
        let state = self.load_position(user_id).await?;

        let (chapters, topics, source) = match self.catalog_view(state.chapter_index).await {
            Ok(Some((chapters, topics))) => (chapters, topics, CurriculumSource::Catalog),
            Ok(None) => {
                tracing::info!(user_id = %user_id, "catalog has no content, using built-in curriculum");
                self.builtin_view(state.chapter_index)
            }
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %err,
                    "catalog unavailable, using built-in curriculum"
                );
                self.builtin_view(state.chapter_index)
            }
        };

        Ok(GuidedSession {
            user_id: user_id.clone(),
            state,
            chapters,
            topics,
            source,
        })
    }

    /// Content for the session's current step.
    ///
    /// Topics that also exist in the built-in curriculum use its content when
    /// the catalog has none or cannot be read.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when the position has no topic, and
    /// `ServiceError::Transient` for catalog failures without a fallback.
    pub async fn step_content(&self, session: &GuidedSession) -> Result<StepContent, ServiceError> {
        if session.is_complete() {
            return Ok(StepContent::Completed);
        }
        let topic = session.current_topic().cloned().ok_or(ServiceError::NotFound)?;

        match session.state.step {
            Step::Concept => {
                let concept = self
                    .catalog_or_builtin(
                        session,
                        &topic.id,
                        self.catalog.concept_for_topic(&topic.id),
                        |c| c.concept_for(&topic.id).cloned(),
                    )
                    .await?;
                Ok(StepContent::Concept { topic, concept })
            }
            Step::Flashcard => {
                let cards = self
                    .catalog_or_builtin(
                        session,
                        &topic.id,
                        self.catalog.flashcards_for_topic(&topic.id),
                        |c| c.flashcards_for(&topic.id).into_iter().cloned().collect(),
                    )
                    .await?;
                let mastered = match self
                    .study_progress
                    .mastered_ids(&session.user_id, ContentType::Flashcard)
                    .await
                {
                    Ok(ids) => ids,
                    Err(err) => {
                        tracing::warn!(
                            user_id = %session.user_id,
                            error = %err,
                            "mastered flashcards unavailable, showing all as unmastered"
                        );
                        Default::default()
                    }
                };
                let run = FlashcardRun::new(cards, &mastered);
                Ok(StepContent::Flashcards { topic, run })
            }
            Step::Quiz => {
                let questions = self
                    .catalog_or_builtin(
                        session,
                        &topic.id,
                        self.catalog.questions_for_topic(&topic.id),
                        |c| c.questions_for(&topic.id).into_iter().cloned().collect(),
                    )
                    .await?;
                Ok(StepContent::Quiz {
                    topic,
                    quiz: QuizSession::new(questions),
                })
            }
        }
    }

    /// Move the session one step forward and apply the step's effects.
    ///
    /// Entering a new chapter loads its topics first; if that fails the
    /// session is left unchanged. Failures of the remaining effects are
    /// logged and reported, and the session still moves.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Guided` when the current chapter or the next one
    /// has no topics, and `ServiceError::Transient` if the next chapter's
    /// topics cannot be read.
    pub async fn advance(&self, session: &mut GuidedSession) -> Result<StepOutcome, ServiceError> {
        let transition = guided::advance(&session.state, session.shape(), &self.rules)?;
        if transition.is_noop() {
            return Ok(StepOutcome {
                transition,
                report: EffectReport::default(),
            });
        }

        let mut next_topics = None;
        for effect in &transition.effects {
            if let Effect::LoadChapterTopics { chapter_index } = effect {
                let topics = self.chapter_topics(session, *chapter_index).await?;
                if topics.is_empty() {
                    return Err(GuidedError::EmptyChapter {
                        chapter_index: *chapter_index,
                    }
                    .into());
                }
                next_topics = Some(topics);
            }
        }

        session.state = transition.to;
        if let Some(topics) = next_topics {
            session.topics = topics;
        }
        let report = self.effects.run(&session.user_id, &transition.effects).await;

        tracing::debug!(
            user_id = %session.user_id,
            chapter_index = session.state.chapter_index,
            topic_index = session.state.topic_index,
            step = session.state.step.as_str(),
            completed = session.state.completed,
            "guided step advanced"
        );
        Ok(StepOutcome { transition, report })
    }

    /// Score `quiz` for the session's current topic and record the result.
    ///
    /// A pass marks the topic's quiz as mastered and refreshes the progress
    /// snapshot. Passing is never required to `advance`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Guided` when the session is not on a quiz step,
    /// `ServiceError::Quiz` when the quiz is empty, incomplete or already
    /// submitted, and `ServiceError::NotFound` when the position has no topic.
    pub async fn submit_quiz(
        &self,
        session: &GuidedSession,
        quiz: &mut QuizSession,
    ) -> Result<QuizOutcome, ServiceError> {
        if session.state.completed || session.state.step != Step::Quiz {
            return Err(GuidedError::NotOnQuizStep {
                step: session.state.step,
            }
            .into());
        }
        let topic_id: TopicId = session
            .current_topic()
            .map(|t| t.id.clone())
            .ok_or(ServiceError::NotFound)?;

        let score = quiz.submit()?;
        let passed = self.rules.is_mastery(score.percent);
        let effects = guided::quiz_submitted(&session.state, &topic_id, score, &self.rules);
        let report = self.effects.run(&session.user_id, &effects).await;

        tracing::info!(
            user_id = %session.user_id,
            topic_id = %topic_id,
            percent = score.percent,
            passed,
            "quiz submitted"
        );
        Ok(QuizOutcome {
            score,
            passed,
            report,
        })
    }

    /// Persist the current position before leaving the screen.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Transient` if the position cannot be saved.
    pub async fn save_and_exit(&self, session: &GuidedSession) -> Result<(), ServiceError> {
        self.learning_progress
            .save_position(&session.user_id, &session.state)
            .await?;
        tracing::debug!(user_id = %session.user_id, "guided position saved on exit");
        Ok(())
    }

    async fn load_position(&self, user_id: &UserId) -> Result<GuidedState, ServiceError> {
        match self.learning_progress.get_position(user_id).await {
            Ok(state) => Ok(state),
            Err(StorageError::NotFound) => {
                let state = GuidedState::initial();
                if let Err(err) = self.learning_progress.save_position(user_id, &state).await {
                    tracing::warn!(user_id = %user_id, error = %err, "initial guided position not saved");
                }
                Ok(state)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Chapters that have topics, and the topics of `chapter_index`, from the
    /// catalog; `None` when there is nothing walkable there.
    ///
    /// Topic-less chapters are skipped so the walk can always reach the end.
    async fn catalog_view(
        &self,
        chapter_index: u32,
    ) -> Result<Option<(Vec<Chapter>, Vec<Topic>)>, StorageError> {
        let (chapters, counts) = futures::try_join!(
            self.catalog.list_chapters(),
            self.catalog.topics_per_chapter(),
        )?;
        let chapters: Vec<Chapter> = chapters
            .into_iter()
            .zip(counts)
            .filter(|(_, topics)| *topics > 0)
            .map(|(chapter, _)| chapter)
            .collect();
        let Some(chapter) = chapters.get(index(chapter_index)) else {
            return Ok(None);
        };
        let topics = self.catalog.list_topics(&chapter.id).await?;
        if topics.is_empty() {
            return Ok(None);
        }
        Ok(Some((chapters, topics)))
    }

    /// Built-in chapters without topics are left out, as in `catalog_view`.
    fn builtin_view(&self, chapter_index: u32) -> (Vec<Chapter>, Vec<Topic>, CurriculumSource) {
        let chapters: Vec<Chapter> = self
            .builtin
            .ordered_chapters()
            .into_iter()
            .filter(|c| !self.builtin.topics_in(&c.id).is_empty())
            .cloned()
            .collect();
        let topics = builtin_topics(&self.builtin, &chapters, chapter_index);
        (chapters, topics, CurriculumSource::BuiltIn)
    }

    async fn chapter_topics(
        &self,
        session: &GuidedSession,
        chapter_index: u32,
    ) -> Result<Vec<Topic>, ServiceError> {
        match session.source {
            CurriculumSource::BuiltIn => Ok(builtin_topics(
                &self.builtin,
                &session.chapters,
                chapter_index,
            )),
            CurriculumSource::Catalog => {
                let Some(chapter) = session.chapters.get(index(chapter_index)) else {
                    return Ok(Vec::new());
                };
                Ok(self.catalog.list_topics(&chapter.id).await?)
            }
        }
    }

    async fn catalog_or_builtin<T, F>(
        &self,
        session: &GuidedSession,
        topic_id: &TopicId,
        fetch: F,
        builtin: impl FnOnce(&Curriculum) -> T,
    ) -> Result<T, ServiceError>
    where
        T: Blank,
        F: Future<Output = Result<T, StorageError>>,
    {
        if session.source == CurriculumSource::BuiltIn {
            return Ok(builtin(&self.builtin));
        }

        let has_builtin = self.builtin.topics.iter().any(|t| &t.id == topic_id);
        match fetch.await {
            Ok(found) if !has_builtin || !found.is_blank() => Ok(found),
            Ok(_) => {
                tracing::debug!(topic_id = %topic_id, "no catalog content, using built-in");
                Ok(builtin(&self.builtin))
            }
            Err(err) if has_builtin => {
                tracing::warn!(
                    topic_id = %topic_id,
                    error = %err,
                    "catalog content unavailable, using built-in"
                );
                Ok(builtin(&self.builtin))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn builtin_topics(curriculum: &Curriculum, chapters: &[Chapter], chapter_index: u32) -> Vec<Topic> {
    chapters
        .get(index(chapter_index))
        .map(|chapter| curriculum.topics_in(&chapter.id).into_iter().cloned().collect())
        .unwrap_or_default()
}

trait Blank {
    fn is_blank(&self) -> bool;
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Blank for Option<T> {
    fn is_blank(&self) -> bool {
        self.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sie_core::model::{AnswerChoice, ChapterId, ContentId, Profile, XpEventKind};
    use sie_core::time::fixed_clock;
    use storage::InMemoryRepository;
    use storage::repository::{ProfileRepository, XpEventRepository};

    fn two_chapters() -> Curriculum {
        let chapter = |id: &str, chapter_order| Chapter {
            id: ChapterId::new(id),
            title: id.to_uppercase(),
            chapter_order,
        };
        let topic = |id: &str, chapter: &str, topic_order| Topic {
            id: TopicId::new(id),
            chapter_id: ChapterId::new(chapter),
            title: id.to_uppercase(),
            description: None,
            topic_order,
        };
        Curriculum {
            chapters: vec![chapter("c2", 2), chapter("c1", 1)],
            topics: vec![topic("t2", "c1", 2), topic("t1", "c1", 1), topic("t3", "c2", 1)],
            ..Curriculum::default()
        }
    }

    async fn setup(repo: &InMemoryRepository) -> (GuidedLearningService, UserId) {
        let user = UserId::new("u1");
        repo.create_profile(&Profile::new_default(user.clone()))
            .await
            .unwrap();
        let clock = fixed_clock();
        let progress = ProgressAggregator::new(
            clock,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        let xp = XpService::new(clock, Arc::new(repo.clone()), Arc::new(repo.clone()));
        let service = GuidedLearningService::new(
            clock,
            StudyRules::default(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            progress,
            xp,
        );
        (service, user)
    }

    fn answer_all(quiz: &mut QuizSession, correct: bool) {
        let answers: Vec<AnswerChoice> = quiz
            .questions()
            .iter()
            .map(|q| match (correct, q.correct) {
                (true, right) => right,
                (false, AnswerChoice::A) => AnswerChoice::B,
                (false, _) => AnswerChoice::A,
            })
            .collect();
        for (i, choice) in answers.into_iter().enumerate() {
            quiz.select_answer(i, choice).unwrap();
        }
    }

    #[tokio::test]
    async fn empty_catalog_falls_back_to_builtin_curriculum() {
        let repo = InMemoryRepository::new();
        let (service, user) = setup(&repo).await;

        let session = service.start(&user).await.unwrap();
        assert_eq!(session.source(), CurriculumSource::BuiltIn);
        // only the built-in chapter with topics is walkable
        assert_eq!(session.chapters().len(), 1);
        assert_eq!(session.topics().len(), 3);
        assert_eq!(session.current_topic().unwrap().title, "Market Structure");

        let content = service.step_content(&session).await.unwrap();
        let StepContent::Concept { concept, .. } = content else {
            panic!("expected concept step");
        };
        assert_eq!(concept.unwrap().title, "Market Structure");
    }

    #[tokio::test]
    async fn first_start_creates_position_row() {
        let repo = InMemoryRepository::with_curriculum(two_chapters());
        let (service, user) = setup(&repo).await;
        assert!(matches!(
            repo.get_position(&user).await,
            Err(StorageError::NotFound)
        ));

        let session = service.start(&user).await.unwrap();
        assert_eq!(session.source(), CurriculumSource::Catalog);
        assert_eq!(session.state(), GuidedState::initial());
        assert_eq!(repo.get_position(&user).await.unwrap(), GuidedState::initial());
        let titles: Vec<_> = session.topics().iter().map(|t| t.title.clone()).collect();
        assert_eq!(titles, ["T1", "T2"]);
    }

    #[tokio::test]
    async fn resume_loads_topics_of_saved_chapter() {
        let repo = InMemoryRepository::with_curriculum(two_chapters());
        let (service, user) = setup(&repo).await;
        let saved = GuidedState {
            chapter_index: 1,
            topic_index: 0,
            step: Step::Flashcard,
            completed: false,
        };
        repo.save_position(&user, &saved).await.unwrap();

        let session = service.start(&user).await.unwrap();
        assert_eq!(session.state(), saved);
        assert_eq!(session.current_chapter().unwrap().id, ChapterId::new("c2"));
        assert_eq!(session.current_topic().unwrap().id, TopicId::new("t3"));

        // no catalog cards and t3 is not a built-in topic
        let StepContent::Flashcards { run, .. } = service.step_content(&session).await.unwrap()
        else {
            panic!("expected flashcard step");
        };
        assert!(run.is_empty());
    }

    #[tokio::test]
    async fn walk_crosses_chapters_and_completes_once() {
        let repo = InMemoryRepository::with_curriculum(two_chapters());
        let (service, user) = setup(&repo).await;
        let mut session = service.start(&user).await.unwrap();

        for _ in 0..5 {
            let outcome = service.advance(&mut session).await.unwrap();
            assert!(outcome.report.is_clean());
        }
        assert_eq!(session.state().topic_index, 1);
        assert_eq!(session.state().step, Step::Quiz);

        let outcome = service.advance(&mut session).await.unwrap();
        assert!(outcome.transition.changes_chapter());
        assert_eq!(session.state().chapter_index, 1);
        assert_eq!(session.state().topic_index, 0);
        assert_eq!(session.current_topic().unwrap().id, TopicId::new("t3"));
        assert_eq!(repo.get_position(&user).await.unwrap(), session.state());

        for _ in 0..3 {
            service.advance(&mut session).await.unwrap();
        }
        assert!(session.is_complete());
        assert!(repo.get_position(&user).await.unwrap().completed);
        assert!(matches!(
            service.step_content(&session).await.unwrap(),
            StepContent::Completed
        ));
        // nine steps at 5 XP plus the completion bonus
        assert_eq!(repo.get_profile(&user).await.unwrap().xp(), 145);

        let again = service.advance(&mut session).await.unwrap();
        assert!(again.transition.is_noop());
        assert_eq!(again.report.xp_awarded, 0);
        assert_eq!(repo.get_profile(&user).await.unwrap().xp(), 145);
        let bonuses = repo
            .list_events(&user)
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.kind == XpEventKind::CompleteAllChapters)
            .count();
        assert_eq!(bonuses, 1);
    }

    #[tokio::test]
    async fn topicless_catalog_chapters_are_skipped_and_walk_completes() {
        let repo = InMemoryRepository::with_curriculum(fallback::curriculum());
        let (service, user) = setup(&repo).await;
        let mut session = service.start(&user).await.unwrap();
        assert_eq!(session.source(), CurriculumSource::Catalog);
        assert_eq!(session.chapters().len(), 1);

        for _ in 0..9 {
            service.advance(&mut session).await.unwrap();
        }
        assert!(session.is_complete());
        assert_eq!(session.state().topic_index, 2);
        assert!(repo.get_position(&user).await.unwrap().completed);
        assert_eq!(repo.get_profile(&user).await.unwrap().xp(), 145);

        let reopened = service.start(&user).await.unwrap();
        assert_eq!(reopened.source(), CurriculumSource::Catalog);
        assert!(reopened.is_complete());
    }

    #[tokio::test]
    async fn leading_empty_chapter_does_not_shift_the_walk() {
        let mut curriculum = two_chapters();
        curriculum.chapters.push(Chapter {
            id: ChapterId::new("intro"),
            title: "INTRO".into(),
            chapter_order: 0,
        });
        let repo = InMemoryRepository::with_curriculum(curriculum);
        let (service, user) = setup(&repo).await;

        let mut session = service.start(&user).await.unwrap();
        assert_eq!(session.current_chapter().unwrap().id, ChapterId::new("c1"));
        for _ in 0..6 {
            service.advance(&mut session).await.unwrap();
        }
        assert_eq!(session.current_chapter().unwrap().id, ChapterId::new("c2"));
        for _ in 0..3 {
            service.advance(&mut session).await.unwrap();
        }
        assert!(session.is_complete());
    }

    #[tokio::test]
    async fn quiz_pass_marks_mastery_and_fail_keeps_it() {
        let repo = InMemoryRepository::with_curriculum(fallback::curriculum());
        let (service, user) = setup(&repo).await;
        let mut session = service.start(&user).await.unwrap();
        service.advance(&mut session).await.unwrap();
        service.advance(&mut session).await.unwrap();

        let StepContent::Quiz { mut quiz, .. } = service.step_content(&session).await.unwrap()
        else {
            panic!("expected quiz step");
        };
        assert_eq!(quiz.len(), 3);
        let mut retry = quiz.clone();

        answer_all(&mut quiz, true);
        let passed = service.submit_quiz(&session, &mut quiz).await.unwrap();
        assert!(passed.passed);
        assert_eq!(passed.score.percent, 100);
        assert_eq!(passed.report.xp_awarded, 10);
        let snapshot = passed.report.snapshot.unwrap();
        assert_eq!(snapshot.quizzes.completed, 1);
        assert_eq!(snapshot.quizzes.percentage, 33);

        answer_all(&mut retry, false);
        let failed = service.submit_quiz(&session, &mut retry).await.unwrap();
        assert!(!failed.passed);
        assert!(failed.report.snapshot.is_none());
        let row = repo
            .get(&user, ContentType::Quiz, &ContentId::new("topic-1"))
            .await
            .unwrap()
            .unwrap();
        assert!(row.mastered);
        assert_eq!(repo.count_attempts(&user).await.unwrap(), 2);

        // a failed quiz does not block the walk
        service.advance(&mut session).await.unwrap();
        assert_eq!(session.state().topic_index, 1);
        assert_eq!(session.state().step, Step::Concept);
    }

    #[tokio::test]
    async fn resubmitting_a_graded_quiz_is_rejected() {
        let repo = InMemoryRepository::with_curriculum(fallback::curriculum());
        let (service, user) = setup(&repo).await;
        let mut session = service.start(&user).await.unwrap();
        service.advance(&mut session).await.unwrap();
        service.advance(&mut session).await.unwrap();
        let mut quiz = QuizSession::new(
            fallback::curriculum()
                .questions_for(&TopicId::new("topic-1"))
                .into_iter()
                .cloned()
                .collect(),
        );
        answer_all(&mut quiz, true);
        service.submit_quiz(&session, &mut quiz).await.unwrap();
        let err = service.submit_quiz(&session, &mut quiz).await.unwrap_err();
        assert!(matches!(err, ServiceError::Quiz(_)));
        assert_eq!(repo.count_attempts(&user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn save_and_exit_persists_current_position() {
        let repo = InMemoryRepository::with_curriculum(two_chapters());
        let (service, user) = setup(&repo).await;
        let mut session = service.start(&user).await.unwrap();
        session.state.step = Step::Quiz;

        service.save_and_exit(&session).await.unwrap();
        let reopened = service.start(&user).await.unwrap();
        assert_eq!(reopened.state().step, Step::Quiz);
    }

    #[tokio::test]
    async fn quiz_outside_quiz_step_is_rejected() {
        let repo = InMemoryRepository::with_curriculum(fallback::curriculum());
        let (service, user) = setup(&repo).await;
        let mut session = service.start(&user).await.unwrap();
        service.advance(&mut session).await.unwrap();
        assert_eq!(session.state().step, Step::Flashcard);

        let mut quiz = QuizSession::new(
            fallback::curriculum()
                .questions_for(&TopicId::new("topic-1"))
                .into_iter()
                .cloned()
                .collect(),
        );
        answer_all(&mut quiz, true);
        let err = service.submit_quiz(&session, &mut quiz).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Guided(GuidedError::NotOnQuizStep {
                step: Step::Flashcard
            })
        ));
        assert!(!quiz.is_submitted());
        assert_eq!(repo.count_attempts(&user).await.unwrap(), 0);
        assert!(
            repo.get(&user, ContentType::Quiz, &ContentId::new("topic-1"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
