use std::sync::Arc;

use async_trait::async_trait;
use sie_core::guided::{GuidedState, QuizSession};
use sie_core::model::{
    AnswerChoice, Chapter, ChapterId, Concept, ContentId, ContentType, Curriculum, Flashcard,
    Profile, QuizQuestion, Step, Topic, TopicId, UserId,
};
use sie_core::progress::{CategoryProgress, ProgressSnapshot};
use sie_core::time::fixed_clock;
use sie_core::StudyRules;
use services::{AppServices, GuidedLearningService, ProgressAggregator, StepContent, XpService};
use storage::repository::{
    LearningProgressRepository, ProfileRepository, QuizAttemptRepository, Storage, StorageError,
    StudyProgressRepository,
};
use storage::{InMemoryIdentityProvider, InMemoryRepository};

fn chapter(index: u32) -> Chapter {
    Chapter {
        id: ChapterId::new(format!("ch-{index}")),
        title: format!("Chapter {index}"),
        chapter_order: index + 1,
    }
}

fn topic(chapter_index: u32, index: u32) -> Topic {
    Topic {
        id: TopicId::new(format!("t-{chapter_index}-{index}")),
        chapter_id: ChapterId::new(format!("ch-{chapter_index}")),
        title: format!("Topic {chapter_index}.{index}"),
        description: None,
        topic_order: index + 1,
    }
}

fn question(topic_id: &TopicId, n: u32) -> QuizQuestion {
    QuizQuestion {
        id: ContentId::new(format!("{topic_id}-q{n}")),
        topic_id: topic_id.clone(),
        question: format!("Question {n}?"),
        options: ["a", "b", "c", "d"].map(str::to_owned),
        correct: AnswerChoice::C,
        explanation: None,
    }
}

/// One chapter, 4 topics, 10 flashcards and 8 concepts.
fn counted_catalog() -> Curriculum {
    let topics: Vec<Topic> = (0..4).map(|i| topic(0, i)).collect();
    let flashcards = (0..10)
        .map(|n| Flashcard {
            id: ContentId::new(format!("card-{n}")),
            topic_id: topics[n % 4].id.clone(),
            term: format!("Term {n}"),
            definition: format!("Definition {n}"),
        })
        .collect();
    let concepts = (0..8)
        .map(|n| Concept {
            id: ContentId::new(format!("concept-{n}")),
            topic_id: topics[n % 4].id.clone(),
            title: format!("Concept {n}"),
            description: String::new(),
            example: None,
        })
        .collect();
    Curriculum {
        chapters: vec![chapter(0)],
        topics,
        concepts,
        flashcards,
        questions: Vec::new(),
    }
}

/// Six chapters of five topics; each topic has a five-question quiz.
fn six_chapters() -> Curriculum {
    let mut curriculum = Curriculum {
        chapters: (0..6).map(chapter).collect(),
        ..Curriculum::default()
    };
    for c in 0..6 {
        for t in 0..5 {
            let topic = topic(c, t);
            curriculum
                .questions
                .extend((0..5).map(|n| question(&topic.id, n)));
            curriculum.topics.push(topic);
        }
    }
    curriculum
}

fn app(repo: &InMemoryRepository) -> AppServices {
    AppServices::from_parts(
        Storage::from_memory(repo),
        Arc::new(InMemoryIdentityProvider::new()),
        fixed_clock(),
        StudyRules::default(),
    )
}

fn category(completed: u32, total: u32, percentage: u8) -> CategoryProgress {
    CategoryProgress {
        total,
        completed,
        percentage,
    }
}

fn answer(quiz: &mut QuizSession, correct: usize) {
    let len = quiz.len();
    for i in 0..len {
        let choice = if i < correct {
            AnswerChoice::C
        } else {
            AnswerChoice::A
        };
        quiz.select_answer(i, choice).unwrap();
    }
}

#[tokio::test]
async fn fresh_user_gets_zero_snapshot() {
    let repo = InMemoryRepository::with_curriculum(counted_catalog());
    let user = UserId::new("fresh");

    let dashboard = app(&repo).dashboard().load(&user).await.unwrap();

    assert_eq!(dashboard.snapshot.flashcards, category(0, 10, 0));
    assert_eq!(dashboard.snapshot.quizzes, category(0, 4, 0));
    assert_eq!(dashboard.snapshot.concepts, category(0, 8, 0));
    assert_eq!(dashboard.snapshot.total, category(0, 22, 0));
}

#[tokio::test]
async fn mastering_one_flashcard_moves_both_percentages() {
    let repo = InMemoryRepository::with_curriculum(counted_catalog());
    let app = app(&repo);
    let user = UserId::new("learner");
    app.dashboard().load(&user).await.unwrap();

    let study = app.study();
    let mut run = study
        .open_flashcards(&user, &TopicId::new("t-0-0"))
        .await
        .unwrap();
    let toggle = study.toggle_flashcard(&user, &mut run, 0).await.unwrap();

    let snapshot = toggle.snapshot.unwrap();
    assert_eq!(snapshot.flashcards, category(1, 10, 10));
    assert_eq!(snapshot.total, category(1, 22, 5));
    let stored = repo.get_profile(&user).await.unwrap();
    assert_eq!(stored.overall_progress(), Some(&snapshot));
}

async fn quiz_at_last_topic_of_chapter(correct: usize) -> (InMemoryRepository, UserId, bool) {
    let repo = InMemoryRepository::with_curriculum(six_chapters());
    let app = app(&repo);
    let user = UserId::new("walker");
    app.dashboard().load(&user).await.unwrap();
    repo.save_position(
        &user,
        &GuidedState {
            chapter_index: 2,
            topic_index: 4,
            step: Step::Quiz,
            completed: false,
        },
    )
    .await
    .unwrap();

    let guided = app.guided();
    let mut session = guided.start(&user).await.unwrap();
    assert_eq!(session.topics().len(), 5);
    assert_eq!(session.chapters().len(), 6);

    let StepContent::Quiz { mut quiz, .. } = guided.step_content(&session).await.unwrap() else {
        panic!("expected quiz step");
    };
    answer(&mut quiz, correct);
    let outcome = guided.submit_quiz(&session, &mut quiz).await.unwrap();

    let step = guided.advance(&mut session).await.unwrap();
    assert!(step.report.is_clean());
    let expected = GuidedState {
        chapter_index: 3,
        topic_index: 0,
        step: Step::Concept,
        completed: false,
    };
    assert_eq!(session.state(), expected);
    assert_eq!(session.current_topic().unwrap().id, TopicId::new("t-3-0"));
    assert_eq!(repo.get_position(&user).await.unwrap(), expected);

    (repo, user, outcome.passed)
}

#[tokio::test]
async fn passing_quiz_marks_mastery_then_enters_next_chapter() {
    let (repo, user, passed) = quiz_at_last_topic_of_chapter(4).await;
    assert!(passed);
    let row = repo
        .get(&user, ContentType::Quiz, &ContentId::new("t-2-4"))
        .await
        .unwrap()
        .unwrap();
    assert!(row.mastered);
}

#[tokio::test]
async fn failing_quiz_still_enters_next_chapter() {
    let (repo, user, passed) = quiz_at_last_topic_of_chapter(2).await;
    assert!(!passed);
    assert!(
        repo.get(&user, ContentType::Quiz, &ContentId::new("t-2-4"))
            .await
            .unwrap()
            .is_none()
    );
    let attempts = repo.list_attempts(&user).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].score_percent, 40);
}

/// Position store that reads fine but refuses every write.
struct ReadOnlyPositions(InMemoryRepository);

#[async_trait]
impl LearningProgressRepository for ReadOnlyPositions {
    async fn get_position(&self, user_id: &UserId) -> Result<GuidedState, StorageError> {
        self.0.get_position(user_id).await
    }

    async fn save_position(
        &self,
        _user_id: &UserId,
        _state: &GuidedState,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("write refused".into()))
    }
}

#[tokio::test]
async fn transition_is_kept_when_position_write_fails() {
    let repo = InMemoryRepository::with_curriculum(six_chapters());
    let user = UserId::new("offline");
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
    let guided = GuidedLearningService::new(
        clock,
        StudyRules::default(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(ReadOnlyPositions(repo.clone())),
        Arc::new(repo.clone()),
        progress,
        xp,
    );

    let mut session = guided.start(&user).await.unwrap();
    let step = guided.advance(&mut session).await.unwrap();

    assert_eq!(session.state().step, Step::Flashcard);
    assert!(!step.report.position_saved());
    assert_eq!(step.report.xp_awarded, 5);
    assert!(guided.save_and_exit(&session).await.is_err());
    assert!(matches!(
        repo.get_position(&user).await,
        Err(StorageError::NotFound)
    ));
}

/// Profile store whose snapshot writes fail.
struct FrozenSnapshots(InMemoryRepository);

#[async_trait]
impl ProfileRepository for FrozenSnapshots {
    async fn get_profile(&self, user_id: &UserId) -> Result<Profile, StorageError> {
        self.0.get_profile(user_id).await
    }

    async fn create_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        self.0.create_profile(profile).await
    }

    async fn add_xp(&self, user_id: &UserId, amount: u32) -> Result<u32, StorageError> {
        self.0.add_xp(user_id, amount).await
    }

    async fn set_streak(
        &self,
        user_id: &UserId,
        streak: u32,
        last_active: chrono::NaiveDate,
    ) -> Result<(), StorageError> {
        self.0.set_streak(user_id, streak, last_active).await
    }

    async fn set_exam_date(
        &self,
        user_id: &UserId,
        exam_date: Option<chrono::NaiveDate>,
    ) -> Result<(), StorageError> {
        self.0.set_exam_date(user_id, exam_date).await
    }

    async fn set_overall_progress(
        &self,
        _user_id: &UserId,
        _snapshot: &ProgressSnapshot,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("timeout".into()))
    }
}

#[tokio::test]
async fn failed_recompute_serves_cached_snapshot() {
    let repo = InMemoryRepository::with_curriculum(counted_catalog());
    let user = UserId::new("stale");
    let app = app(&repo);
    let cached = app.dashboard().load(&user).await.unwrap().snapshot;

    let progress = ProgressAggregator::new(
        fixed_clock(),
        Arc::new(FrozenSnapshots(repo.clone())),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let err = progress
        .set_flashcard_mastered(&user, &ContentId::new("card-0"), true)
        .await
        .unwrap_err();
    assert!(matches!(err, services::ServiceError::Transient(_)));
    // the mastery row itself was written before the recompute failed
    assert_eq!(
        repo.count_mastered(&user, ContentType::Flashcard)
            .await
            .unwrap(),
        1
    );

    let served = progress.snapshot_or_cached(&user, Some(cached)).await;
    assert_eq!(served, cached);
    assert_eq!(served.flashcards.completed, 0);
}

#[tokio::test]
async fn quiz_attempts_show_up_in_dashboard_stats() {
    let repo = InMemoryRepository::with_curriculum(six_chapters());
    let app = app(&repo);
    let user = UserId::new("stats");
    app.dashboard().load(&user).await.unwrap();

    let guided = app.guided();
    let mut session = guided.start(&user).await.unwrap();
    guided.advance(&mut session).await.unwrap();
    guided.advance(&mut session).await.unwrap();
    let StepContent::Quiz { mut quiz, .. } = guided.step_content(&session).await.unwrap() else {
        panic!("expected quiz step");
    };
    answer(&mut quiz, 5);
    guided.submit_quiz(&session, &mut quiz).await.unwrap();

    let dashboard = app.dashboard().load(&user).await.unwrap();
    assert_eq!(dashboard.stats.quiz_attempts, 1);
    assert_eq!(dashboard.stats.quizzes_passed, 1);
    assert_eq!(dashboard.stats.topics_total, 30);
    // 2 of 90 guided steps
    assert_eq!(dashboard.guided_percentage, 2);
    assert_eq!(dashboard.snapshot.quizzes.completed, 1);
}
