use async_trait::async_trait;
use chrono::NaiveDate;
use sie_core::model::{Profile, UserId};
use sie_core::progress::ProgressSnapshot;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conflict_or_conn, conn, map_profile_row, ser, snapshot_to_json, u32_from_i64};
use crate::repository::{ProfileRepository, StorageError};

fn affected_or_not_found(rows: u64) -> Result<(), StorageError> {
    if rows == 0 {
        Err(StorageError::NotFound)
    } else {
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for SqliteRepository {
    async fn get_profile(&self, user_id: &UserId) -> Result<Profile, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, xp, streak, last_active, exam_date, overall_progress
            FROM profiles
            WHERE user_id = ?1
            ",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_profile_row(&row)
    }

    async fn create_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let snapshot = profile
            .overall_progress()
            .map(snapshot_to_json)
            .transpose()?;

        sqlx::query(
            r"
            INSERT INTO profiles (user_id, xp, streak, last_active, exam_date, overall_progress)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(profile.user_id().as_str())
        .bind(i64::from(profile.xp()))
        .bind(i64::from(profile.streak()))
        .bind(profile.last_active())
        .bind(profile.exam_date())
        .bind(snapshot)
        .execute(&self.pool)
        .await
        .map_err(conflict_or_conn)?;

        Ok(())
    }

    async fn add_xp(&self, user_id: &UserId, amount: u32) -> Result<u32, StorageError> {
        let row = sqlx::query(
            r"
            UPDATE profiles
            SET xp = MIN(xp + ?2, 4294967295)
            WHERE user_id = ?1
            RETURNING xp
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(amount))
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        u32_from_i64("xp", row.try_get("xp").map_err(ser)?)
    }

    async fn set_streak(
        &self,
        user_id: &UserId,
        streak: u32,
        last_active: NaiveDate,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE profiles SET streak = ?2, last_active = ?3 WHERE user_id = ?1")
            .bind(user_id.as_str())
            .bind(i64::from(streak))
            .bind(last_active)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        affected_or_not_found(res.rows_affected())
    }

    async fn set_exam_date(
        &self,
        user_id: &UserId,
        exam_date: Option<NaiveDate>,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE profiles SET exam_date = ?2 WHERE user_id = ?1")
            .bind(user_id.as_str())
            .bind(exam_date)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        affected_or_not_found(res.rows_affected())
    }

    async fn set_overall_progress(
        &self,
        user_id: &UserId,
        snapshot: &ProgressSnapshot,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE profiles SET overall_progress = ?2 WHERE user_id = ?1")
            .bind(user_id.as_str())
            .bind(snapshot_to_json(snapshot)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        affected_or_not_found(res.rows_affected())
    }
}
