use chrono::{Duration, NaiveDate};

/// Result of recording activity on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// Activity was already recorded today; nothing to write.
    AlreadyCounted,
    /// Write this streak value and a day marker for today.
    Set(u32),
}

/// Consecutive-day rule.
///
/// - last active day is today: unchanged
/// - last active day is yesterday: `current + 1`
/// - anything else (gap, first activity): restart at 1
#[must_use]
pub fn next_streak(last_active: Option<NaiveDate>, current: u32, today: NaiveDate) -> StreakUpdate {
    match last_active {
        Some(last) if last == today => StreakUpdate::AlreadyCounted,
        Some(last) if last + Duration::days(1) == today => {
            StreakUpdate::Set(current.saturating_add(1))
        }
        _ => StreakUpdate::Set(1),
    }
}
