use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use sie_core::guided::GuidedState;
use sie_core::model::{
    Chapter, ChapterId, Concept, ContentId, ContentType, Curriculum, Flashcard,
    PracticeTestResult, Profile, QuizAttempt, QuizQuestion, StudyProgress, Topic, TopicId,
    UserId, XpEvent,
};
use sie_core::progress::ProgressSnapshot;

use crate::repository::{
    CatalogRepository, CatalogWriter, LearningProgressRepository, PracticeTestRepository,
    ProfileRepository, QuizAttemptRepository, StorageError, StreakRepository,
    StudyProgressRepository, XpEventRepository,
};

type ProgressKey = (UserId, ContentType, ContentId);

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    profiles: Arc<Mutex<HashMap<UserId, Profile>>>,
    catalog: Arc<Mutex<Curriculum>>,
    study_progress: Arc<Mutex<HashMap<ProgressKey, StudyProgress>>>,
    positions: Arc<Mutex<HashMap<UserId, GuidedState>>>,
    xp_events: Arc<Mutex<Vec<XpEvent>>>,
    streak_days: Arc<Mutex<HashMap<UserId, BTreeSet<NaiveDate>>>>,
    quiz_attempts: Arc<Mutex<Vec<QuizAttempt>>>,
    practice_tests: Arc<Mutex<Vec<PracticeTestResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository preloaded with `curriculum`.
    #[must_use]
    pub fn with_curriculum(curriculum: Curriculum) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(curriculum)),
            ..Self::default()
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

fn count(n: usize) -> Result<u32, StorageError> {
    u32::try_from(n).map_err(|_| StorageError::Serialization("count overflow".into()))
}

fn with_profile<R>(
    repo: &InMemoryRepository,
    user_id: &UserId,
    f: impl FnOnce(&mut Profile) -> R,
) -> Result<R, StorageError> {
    let mut guard = lock(&repo.profiles)?;
    let profile = guard.get_mut(user_id).ok_or(StorageError::NotFound)?;
    Ok(f(profile))
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn get_profile(&self, user_id: &UserId) -> Result<Profile, StorageError> {
        let guard = lock(&self.profiles)?;
        guard.get(user_id).cloned().ok_or(StorageError::NotFound)
    }

    async fn create_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let mut guard = lock(&self.profiles)?;
        if guard.contains_key(profile.user_id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(profile.user_id().clone(), profile.clone());
        Ok(())
    }

    async fn add_xp(&self, user_id: &UserId, amount: u32) -> Result<u32, StorageError> {
        with_profile(self, user_id, |p| {
            p.add_xp(amount);
            p.xp()
        })
    }

    async fn set_streak(
        &self,
        user_id: &UserId,
        streak: u32,
        last_active: NaiveDate,
    ) -> Result<(), StorageError> {
        with_profile(self, user_id, |p| p.set_streak(streak, last_active))
    }

    async fn set_exam_date(
        &self,
        user_id: &UserId,
        exam_date: Option<NaiveDate>,
    ) -> Result<(), StorageError> {
        with_profile(self, user_id, |p| p.set_exam_date(exam_date))
    }

    async fn set_overall_progress(
        &self,
        user_id: &UserId,
        snapshot: &ProgressSnapshot,
    ) -> Result<(), StorageError> {
        with_profile(self, user_id, |p| p.set_overall_progress(*snapshot))
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn list_chapters(&self) -> Result<Vec<Chapter>, StorageError> {
        let guard = lock(&self.catalog)?;
        Ok(guard.ordered_chapters().into_iter().cloned().collect())
    }

    async fn list_topics(&self, chapter_id: &ChapterId) -> Result<Vec<Topic>, StorageError> {
        let guard = lock(&self.catalog)?;
        Ok(guard.topics_in(chapter_id).into_iter().cloned().collect())
    }

    async fn topics_per_chapter(&self) -> Result<Vec<u32>, StorageError> {
        let guard = lock(&self.catalog)?;
        guard
            .ordered_chapters()
            .iter()
            .map(|c| count(guard.topics_in(&c.id).len()))
            .collect()
    }

    async fn concept_for_topic(&self, topic_id: &TopicId) -> Result<Option<Concept>, StorageError> {
        let guard = lock(&self.catalog)?;
        Ok(guard.concept_for(topic_id).cloned())
    }

    async fn flashcards_for_topic(
        &self,
        topic_id: &TopicId,
    ) -> Result<Vec<Flashcard>, StorageError> {
        let guard = lock(&self.catalog)?;
        Ok(guard.flashcards_for(topic_id).into_iter().cloned().collect())
    }

    async fn questions_for_topic(
        &self,
        topic_id: &TopicId,
    ) -> Result<Vec<QuizQuestion>, StorageError> {
        let guard = lock(&self.catalog)?;
        Ok(guard.questions_for(topic_id).into_iter().cloned().collect())
    }

    async fn all_questions(&self) -> Result<Vec<QuizQuestion>, StorageError> {
        Ok(lock(&self.catalog)?.questions.clone())
    }

    async fn count_flashcards(&self) -> Result<u32, StorageError> {
        count(lock(&self.catalog)?.flashcards.len())
    }

    async fn count_topics(&self) -> Result<u32, StorageError> {
        count(lock(&self.catalog)?.topics.len())
    }

    async fn count_concepts(&self) -> Result<u32, StorageError> {
        count(lock(&self.catalog)?.concepts.len())
    }
}

fn upsert_by<T: Clone, K: PartialEq>(items: &mut Vec<T>, incoming: &[T], key: impl Fn(&T) -> K) {
    for item in incoming {
        match items.iter_mut().find(|existing| key(existing) == key(item)) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
    }
}

#[async_trait]
impl CatalogWriter for InMemoryRepository {
    async fn import_curriculum(&self, curriculum: &Curriculum) -> Result<(), StorageError> {
        let mut guard = lock(&self.catalog)?;
        upsert_by(&mut guard.chapters, &curriculum.chapters, |c| c.id.clone());
        upsert_by(&mut guard.topics, &curriculum.topics, |t| t.id.clone());
        upsert_by(&mut guard.concepts, &curriculum.concepts, |c| c.id.clone());
        upsert_by(&mut guard.flashcards, &curriculum.flashcards, |f| f.id.clone());
        upsert_by(&mut guard.questions, &curriculum.questions, |q| q.id.clone());
        Ok(())
    }
}

#[async_trait]
impl StudyProgressRepository for InMemoryRepository {
    async fn upsert(&self, row: &StudyProgress) -> Result<(), StorageError> {
        lock(&self.study_progress)?.insert(row.key(), row.clone());
        Ok(())
    }

    async fn get(
        &self,
        user_id: &UserId,
        content_type: ContentType,
        content_id: &ContentId,
    ) -> Result<Option<StudyProgress>, StorageError> {
        let key = (user_id.clone(), content_type, content_id.clone());
        Ok(lock(&self.study_progress)?.get(&key).cloned())
    }

    async fn count_mastered(
        &self,
        user_id: &UserId,
        content_type: ContentType,
    ) -> Result<u32, StorageError> {
        let n = self.mastered_ids(user_id, content_type).await?.len();
        count(n)
    }

    async fn mastered_ids(
        &self,
        user_id: &UserId,
        content_type: ContentType,
    ) -> Result<HashSet<ContentId>, StorageError> {
        let guard = lock(&self.study_progress)?;
        Ok(guard
            .values()
            .filter(|r| &r.user_id == user_id && r.content_type == content_type && r.mastered)
            .map(|r| r.content_id.clone())
            .collect())
    }
}

#[async_trait]
impl LearningProgressRepository for InMemoryRepository {
    async fn get_position(&self, user_id: &UserId) -> Result<GuidedState, StorageError> {
        lock(&self.positions)?
            .get(user_id)
            .copied()
            .ok_or(StorageError::NotFound)
    }

    async fn save_position(
        &self,
        user_id: &UserId,
        state: &GuidedState,
    ) -> Result<(), StorageError> {
        lock(&self.positions)?.insert(user_id.clone(), *state);
        Ok(())
    }
}

#[async_trait]
impl XpEventRepository for InMemoryRepository {
    async fn append_event(&self, event: &XpEvent) -> Result<(), StorageError> {
        lock(&self.xp_events)?.push(event.clone());
        Ok(())
    }

    async fn list_events(&self, user_id: &UserId) -> Result<Vec<XpEvent>, StorageError> {
        let guard = lock(&self.xp_events)?;
        Ok(guard
            .iter()
            .rev()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StreakRepository for InMemoryRepository {
    async fn record_day(&self, user_id: &UserId, day: NaiveDate) -> Result<(), StorageError> {
        lock(&self.streak_days)?
            .entry(user_id.clone())
            .or_default()
            .insert(day);
        Ok(())
    }

    async fn list_days(&self, user_id: &UserId) -> Result<Vec<NaiveDate>, StorageError> {
        let guard = lock(&self.streak_days)?;
        Ok(guard
            .get(user_id)
            .map(|days| days.iter().copied().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl QuizAttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<(), StorageError> {
        lock(&self.quiz_attempts)?.push(attempt.clone());
        Ok(())
    }

    async fn count_attempts(&self, user_id: &UserId) -> Result<u32, StorageError> {
        let guard = lock(&self.quiz_attempts)?;
        count(guard.iter().filter(|a| &a.user_id == user_id).count())
    }

    async fn list_attempts(&self, user_id: &UserId) -> Result<Vec<QuizAttempt>, StorageError> {
        let guard = lock(&self.quiz_attempts)?;
        Ok(guard
            .iter()
            .rev()
            .filter(|a| &a.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PracticeTestRepository for InMemoryRepository {
    async fn append_result(&self, result: &PracticeTestResult) -> Result<(), StorageError> {
        lock(&self.practice_tests)?.push(result.clone());
        Ok(())
    }

    async fn list_results(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PracticeTestResult>, StorageError> {
        let guard = lock(&self.practice_tests)?;
        Ok(guard
            .iter()
            .rev()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sie_core::fallback;
    use sie_core::model::Step;
    use sie_core::time::fixed_now;

    fn user() -> UserId {
        UserId::new("user-1")
    }

    #[tokio::test]
    async fn create_profile_twice_conflicts() {
        let repo = InMemoryRepository::new();
        let profile = Profile::new_default(user());
        repo.create_profile(&profile).await.unwrap();
        assert!(matches!(
            repo.create_profile(&profile).await,
            Err(StorageError::Conflict)
        ));
        assert_eq!(repo.add_xp(&user(), 7).await.unwrap(), 7);
        assert_eq!(repo.get_profile(&user()).await.unwrap().xp(), 7);
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.get_profile(&user()).await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            repo.add_xp(&user(), 1).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn study_progress_upsert_keeps_one_row_per_key() {
        let repo = InMemoryRepository::new();
        let card = ContentId::new("flash-1-1");
        let mut row = StudyProgress::new(
            user(),
            ContentType::Flashcard,
            card.clone(),
            true,
            fixed_now(),
        );
        repo.upsert(&row).await.unwrap();
        repo.upsert(&row).await.unwrap();
        assert_eq!(
            repo.count_mastered(&user(), ContentType::Flashcard)
                .await
                .unwrap(),
            1
        );

        row.mastered = false;
        repo.upsert(&row).await.unwrap();
        assert_eq!(
            repo.count_mastered(&user(), ContentType::Flashcard)
                .await
                .unwrap(),
            0
        );
        let stored = repo
            .get(&user(), ContentType::Flashcard, &card)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.mastered);
        assert_eq!(lock(&repo.study_progress).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn catalog_queries_follow_order_fields() {
        let repo = InMemoryRepository::new();
        repo.import_curriculum(&fallback::curriculum()).await.unwrap();
        // importing again upserts instead of duplicating
        repo.import_curriculum(&fallback::curriculum()).await.unwrap();

        let chapters = repo.list_chapters().await.unwrap();
        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].title, "Capital Markets");
        assert_eq!(repo.topics_per_chapter().await.unwrap(), vec![3, 0, 0]);
        assert_eq!(repo.count_flashcards().await.unwrap(), 9);
        assert_eq!(repo.count_topics().await.unwrap(), 3);
        assert_eq!(repo.count_concepts().await.unwrap(), 3);

        let topics = repo.list_topics(&chapters[0].id).await.unwrap();
        assert_eq!(topics[2].title, "Equity Markets");
        assert_eq!(
            repo.questions_for_topic(&topics[0].id).await.unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn position_round_trips() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.get_position(&user()).await,
            Err(StorageError::NotFound)
        ));
        let state = GuidedState {
            chapter_index: 1,
            topic_index: 2,
            step: Step::Quiz,
            completed: false,
        };
        repo.save_position(&user(), &state).await.unwrap();
        assert_eq!(repo.get_position(&user()).await.unwrap(), state);
    }

    #[tokio::test]
    async fn streak_days_are_deduplicated() {
        let repo = InMemoryRepository::new();
        let day = fixed_now().date_naive();
        repo.record_day(&user(), day).await.unwrap();
        repo.record_day(&user(), day).await.unwrap();
        assert_eq!(repo.list_days(&user()).await.unwrap(), vec![day]);
    }
}
