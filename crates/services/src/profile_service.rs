use std::sync::Arc;

use chrono::NaiveDate;
use sie_core::Clock;
use sie_core::model::{Profile, UserId};
use storage::repository::{ProfileRepository, StorageError};

use crate::error::ServiceError;

/// Profile row lifecycle: lazy creation and user-editable fields.
#[derive(Clone)]
pub struct ProfileService {
    clock: Clock,
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(clock: Clock, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { clock, profiles }
    }

    /// Load the user's profile, inserting the default row when there is none.
    ///
    /// The flag is `true` when this call created the row.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Transient` if storage is unreachable.
    pub async fn load_or_create(&self, user_id: &UserId) -> Result<(Profile, bool), ServiceError> {
        match self.profiles.get_profile(user_id).await {
            Ok(profile) => return Ok((profile, false)),
            Err(StorageError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let profile = Profile::new_default(user_id.clone());
        match self.profiles.create_profile(&profile).await {
            Ok(()) => {
                tracing::info!(user_id = %user_id, "created default profile");
                Ok((profile, true))
            }
            // another session inserted it first
            Err(StorageError::Conflict) => Ok((self.profiles.get_profile(user_id).await?, false)),
            Err(err) => Err(err.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when the profile does not exist.
    pub async fn get(&self, user_id: &UserId) -> Result<Profile, ServiceError> {
        Ok(self.profiles.get_profile(user_id).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when the profile does not exist.
    pub async fn set_exam_date(
        &self,
        user_id: &UserId,
        exam_date: Option<NaiveDate>,
    ) -> Result<(), ServiceError> {
        self.profiles.set_exam_date(user_id, exam_date).await?;
        tracing::info!(user_id = %user_id, ?exam_date, "exam date updated");
        Ok(())
    }

    /// Days from today until the exam; negative once it has passed.
    #[must_use]
    pub fn days_until_exam(&self, profile: &Profile) -> Option<i64> {
        profile.days_until_exam(self.clock.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use sie_core::progress::ProgressSnapshot;
    use sie_core::time::fixed_clock;
    use storage::InMemoryRepository;

    #[tokio::test]
    async fn first_load_creates_default_row_once() {
        let repo = InMemoryRepository::new();
        let service = ProfileService::new(fixed_clock(), Arc::new(repo.clone()));
        let user = UserId::new("u1");

        let (profile, created) = service.load_or_create(&user).await.unwrap();
        assert!(created);
        assert_eq!(profile.xp(), 0);
        assert_eq!(profile.streak(), 0);
        assert_eq!(profile.overall_progress(), Some(&ProgressSnapshot::empty()));

        let (_, created) = service.load_or_create(&user).await.unwrap();
        assert!(!created);
    }

    #[tokio::test]
    async fn exam_countdown_uses_clock() {
        let repo = InMemoryRepository::new();
        let clock = fixed_clock();
        let service = ProfileService::new(clock, Arc::new(repo.clone()));
        let user = UserId::new("u1");
        service.load_or_create(&user).await.unwrap();

        service
            .set_exam_date(&user, Some(clock.today() + Duration::days(12)))
            .await
            .unwrap();
        let (profile, _) = service.load_or_create(&user).await.unwrap();
        assert_eq!(service.days_until_exam(&profile), Some(12));

        service.set_exam_date(&user, None).await.unwrap();
        let (profile, _) = service.load_or_create(&user).await.unwrap();
        assert_eq!(service.days_until_exam(&profile), None);
    }

    #[tokio::test]
    async fn exam_date_on_missing_profile_is_not_found() {
        let service = ProfileService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        let err = service
            .set_exam_date(&UserId::new("ghost"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }
}
