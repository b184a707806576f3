use std::sync::Arc;

use sie_core::Clock;
use sie_core::model::{UserId, XpEvent, XpEventKind};
use sie_core::streak::{StreakUpdate, next_streak};
use storage::repository::{ProfileRepository, StorageError, StreakRepository, XpEventRepository};

use crate::error::ServiceError;

//
// ─── XP ────────────────────────────────────────────────────────────────────────
//

/// One XP grant: bump the profile total, then log the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpAward {
    pub user_id: UserId,
    pub amount: u32,
    pub kind: XpEventKind,
}

impl XpAward {
    #[must_use]
    pub fn new(user_id: UserId, amount: u32, kind: XpEventKind) -> Self {
        Self {
            user_id,
            amount,
            kind,
        }
    }
}

/// What happened to an `XpAward`.
///
/// The two writes are not atomic. `EventLogFailed` means the profile total
/// already includes the award but the history row is missing.
#[derive(Debug)]
pub enum XpOutcome {
    Applied { total_xp: u32 },
    ProfileFailed(StorageError),
    EventLogFailed { total_xp: u32, error: StorageError },
}

impl XpOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Profile total after the award, when the increment went through.
    #[must_use]
    pub fn total_xp(&self) -> Option<u32> {
        match self {
            Self::Applied { total_xp } | Self::EventLogFailed { total_xp, .. } => Some(*total_xp),
            Self::ProfileFailed(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct XpService {
    clock: Clock,
    profiles: Arc<dyn ProfileRepository>,
    events: Arc<dyn XpEventRepository>,
}

impl XpService {
    #[must_use]
    pub fn new(
        clock: Clock,
        profiles: Arc<dyn ProfileRepository>,
        events: Arc<dyn XpEventRepository>,
    ) -> Self {
        Self {
            clock,
            profiles,
            events,
        }
    }

    /// Apply an award. Failures are logged and reported in the outcome, never
    /// raised, so callers can keep going.
    pub async fn award(&self, award: &XpAward) -> XpOutcome {
        let total_xp = match self.profiles.add_xp(&award.user_id, award.amount).await {
            Ok(total) => total,
            Err(error) => {
                tracing::warn!(
                    user_id = %award.user_id,
                    amount = award.amount,
                    kind = award.kind.as_str(),
                    error = %error,
                    "xp not applied"
                );
                return XpOutcome::ProfileFailed(error);
            }
        };

        let event = XpEvent {
            user_id: award.user_id.clone(),
            amount: award.amount,
            kind: award.kind,
            created_at: self.clock.now(),
        };
        if let Err(error) = self.events.append_event(&event).await {
            tracing::warn!(
                user_id = %award.user_id,
                amount = award.amount,
                kind = award.kind.as_str(),
                error = %error,
                "xp applied but event log write failed"
            );
            return XpOutcome::EventLogFailed { total_xp, error };
        }

        tracing::debug!(
            user_id = %award.user_id,
            amount = award.amount,
            kind = award.kind.as_str(),
            total_xp,
            "xp awarded"
        );
        XpOutcome::Applied { total_xp }
    }
}

//
// ─── STREAK ────────────────────────────────────────────────────────────────────
//

#[derive(Clone)]
pub struct StreakService {
    clock: Clock,
    profiles: Arc<dyn ProfileRepository>,
    days: Arc<dyn StreakRepository>,
}

impl StreakService {
    #[must_use]
    pub fn new(
        clock: Clock,
        profiles: Arc<dyn ProfileRepository>,
        days: Arc<dyn StreakRepository>,
    ) -> Self {
        Self {
            clock,
            profiles,
            days,
        }
    }

    /// Count today as a study day and return the resulting streak.
    ///
    /// Consecutive days extend the streak, a gap resets it to 1, and a second
    /// call on the same day changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the profile cannot be read or written.
    pub async fn touch(&self, user_id: &UserId) -> Result<u32, ServiceError> {
        let today = self.clock.today();
        let profile = self.profiles.get_profile(user_id).await?;

        let streak = match next_streak(profile.last_active(), profile.streak(), today) {
            StreakUpdate::AlreadyCounted => return Ok(profile.streak()),
            StreakUpdate::Set(streak) => streak,
        };

        self.profiles.set_streak(user_id, streak, today).await?;
        self.days.record_day(user_id, today).await?;
        tracing::debug!(user_id = %user_id, streak, "streak updated");
        Ok(streak)
    }
}
