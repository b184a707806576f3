//! Append-only activity logs: XP events, streak days, quiz attempts and
//! practice test results.

use async_trait::async_trait;
use chrono::NaiveDate;
use sie_core::model::{PracticeTestResult, QuizAttempt, UserId, XpEvent};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    conn, map_practice_test_row, map_quiz_attempt_row, map_xp_event_row, ser, u32_from_i64,
};
use crate::repository::{
    PracticeTestRepository, QuizAttemptRepository, StorageError, StreakRepository,
    XpEventRepository,
};

#[async_trait]
impl XpEventRepository for SqliteRepository {
    async fn append_event(&self, event: &XpEvent) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO xp_events (user_id, amount, event_type, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(event.user_id.as_str())
        .bind(i64::from(event.amount))
        .bind(event.kind.as_str())
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn list_events(&self, user_id: &UserId) -> Result<Vec<XpEvent>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, amount, event_type, created_at
            FROM xp_events
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_xp_event_row).collect()
    }
}

#[async_trait]
impl StreakRepository for SqliteRepository {
    async fn record_day(&self, user_id: &UserId, day: NaiveDate) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO streak_days (user_id, day)
            VALUES (?1, ?2)
            ON CONFLICT(user_id, day) DO NOTHING
            ",
        )
        .bind(user_id.as_str())
        .bind(day)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn list_days(&self, user_id: &UserId) -> Result<Vec<NaiveDate>, StorageError> {
        let rows = sqlx::query("SELECT day FROM streak_days WHERE user_id = ?1 ORDER BY day ASC")
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter()
            .map(|row| row.try_get::<NaiveDate, _>("day").map_err(ser))
            .collect()
    }
}

#[async_trait]
impl QuizAttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_attempts (user_id, topic_id, score, completed_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(attempt.user_id.as_str())
        .bind(attempt.topic_id.as_str())
        .bind(i64::from(attempt.score_percent))
        .bind(attempt.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn count_attempts(&self, user_id: &UserId) -> Result<u32, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM quiz_attempts WHERE user_id = ?1")
            .bind(user_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        u32_from_i64("attempt count", row.try_get("n").map_err(ser)?)
    }

    async fn list_attempts(&self, user_id: &UserId) -> Result<Vec<QuizAttempt>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, topic_id, score, completed_at
            FROM quiz_attempts
            WHERE user_id = ?1
            ORDER BY completed_at DESC, id DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_quiz_attempt_row).collect()
    }
}

#[async_trait]
impl PracticeTestRepository for SqliteRepository {
    async fn append_result(&self, result: &PracticeTestResult) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO practice_test_results (
                user_id, score, correct_count, total_questions, passed,
                completed_at, time_taken_secs
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(result.user_id().as_str())
        .bind(result.score())
        .bind(i64::from(result.correct_count()))
        .bind(i64::from(result.total_questions()))
        .bind(result.passed())
        .bind(result.completed_at())
        .bind(i64::from(result.time_taken_secs()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn list_results(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PracticeTestResult>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, correct_count, total_questions, passed, completed_at, time_taken_secs
            FROM practice_test_results
            WHERE user_id = ?1
            ORDER BY completed_at DESC, id DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_practice_test_row).collect()
    }
}
