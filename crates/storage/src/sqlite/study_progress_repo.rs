use std::collections::HashSet;

use async_trait::async_trait;
use sie_core::model::{ContentId, ContentType, StudyProgress, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_study_progress_row, ser, u32_from_i64};
use crate::repository::{StorageError, StudyProgressRepository};

#[async_trait]
impl StudyProgressRepository for SqliteRepository {
    async fn upsert(&self, row: &StudyProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO study_progress (user_id, content_type, content_id, mastered, last_studied)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, content_type, content_id) DO UPDATE SET
                mastered = excluded.mastered,
                last_studied = excluded.last_studied
            ",
        )
        .bind(row.user_id.as_str())
        .bind(row.content_type.as_str())
        .bind(row.content_id.as_str())
        .bind(row.mastered)
        .bind(row.last_studied)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get(
        &self,
        user_id: &UserId,
        content_type: ContentType,
        content_id: &ContentId,
    ) -> Result<Option<StudyProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, content_type, content_id, mastered, last_studied
            FROM study_progress
            WHERE user_id = ?1 AND content_type = ?2 AND content_id = ?3
            ",
        )
        .bind(user_id.as_str())
        .bind(content_type.as_str())
        .bind(content_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_study_progress_row).transpose()
    }

    async fn count_mastered(
        &self,
        user_id: &UserId,
        content_type: ContentType,
    ) -> Result<u32, StorageError> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS n
            FROM study_progress
            WHERE user_id = ?1 AND content_type = ?2 AND mastered = 1
            ",
        )
        .bind(user_id.as_str())
        .bind(content_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        u32_from_i64("mastered count", row.try_get("n").map_err(ser)?)
    }

    async fn mastered_ids(
        &self,
        user_id: &UserId,
        content_type: ContentType,
    ) -> Result<HashSet<ContentId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT content_id
            FROM study_progress
            WHERE user_id = ?1 AND content_type = ?2 AND mastered = 1
            ",
        )
        .bind(user_id.as_str())
        .bind(content_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("content_id")
                    .map(ContentId::new)
                    .map_err(ser)
            })
            .collect()
    }
}
