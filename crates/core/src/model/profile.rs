use chrono::NaiveDate;

use crate::model::ids::UserId;
use crate::progress::ProgressSnapshot;

/// Signed-in identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

/// Per-user gamification and progress record.
///
/// Created lazily on first dashboard load; never deleted by the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    user_id: UserId,
    xp: u32,
    streak: u32,
    last_active: Option<NaiveDate>,
    exam_date: Option<NaiveDate>,
    overall_progress: Option<ProgressSnapshot>,
}

impl Profile {
    /// Default row inserted when a user has no profile yet.
    #[must_use]
    pub fn new_default(user_id: UserId) -> Self {
        Self {
            user_id,
            xp: 0,
            streak: 0,
            last_active: None,
            exam_date: None,
            overall_progress: Some(ProgressSnapshot::empty()),
        }
    }

    /// Rehydrate a profile from storage.
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        xp: u32,
        streak: u32,
        last_active: Option<NaiveDate>,
        exam_date: Option<NaiveDate>,
        overall_progress: Option<ProgressSnapshot>,
    ) -> Self {
        Self {
            user_id,
            xp,
            streak,
            last_active,
            exam_date,
            overall_progress,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn xp(&self) -> u32 {
        self.xp
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn last_active(&self) -> Option<NaiveDate> {
        self.last_active
    }

    #[must_use]
    pub fn exam_date(&self) -> Option<NaiveDate> {
        self.exam_date
    }

    #[must_use]
    pub fn overall_progress(&self) -> Option<&ProgressSnapshot> {
        self.overall_progress.as_ref()
    }

    pub fn add_xp(&mut self, amount: u32) {
        self.xp = self.xp.saturating_add(amount);
    }

    pub fn set_streak(&mut self, streak: u32, last_active: NaiveDate) {
        self.streak = streak;
        self.last_active = Some(last_active);
    }

    pub fn set_exam_date(&mut self, exam_date: Option<NaiveDate>) {
        self.exam_date = exam_date;
    }

    pub fn set_overall_progress(&mut self, snapshot: ProgressSnapshot) {
        self.overall_progress = Some(snapshot);
    }

    /// Whole days from `today` until the exam; negative once it has passed.
    #[must_use]
    pub fn days_until_exam(&self, today: NaiveDate) -> Option<i64> {
        self.exam_date
            .map(|exam| exam.signed_duration_since(today).num_days())
    }
}
