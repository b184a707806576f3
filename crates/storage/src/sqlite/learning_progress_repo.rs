use async_trait::async_trait;
use sie_core::guided::GuidedState;
use sie_core::model::UserId;

use super::SqliteRepository;
use super::mapping::{conn, map_position_row};
use crate::repository::{LearningProgressRepository, StorageError};

#[async_trait]
impl LearningProgressRepository for SqliteRepository {
    async fn get_position(&self, user_id: &UserId) -> Result<GuidedState, StorageError> {
        let row = sqlx::query(
            r"
            SELECT current_chapter_index, current_topic_index, current_step, completed
            FROM user_learning_progress
            WHERE user_id = ?1
            ",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_position_row(&row)
    }

    async fn save_position(
        &self,
        user_id: &UserId,
        state: &GuidedState,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_learning_progress (
                user_id, current_chapter_index, current_topic_index, current_step, completed
            )
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                current_chapter_index = excluded.current_chapter_index,
                current_topic_index = excluded.current_topic_index,
                current_step = excluded.current_step,
                completed = excluded.completed
            ",
        )
        .bind(user_id.as_str())
        .bind(i64::from(state.chapter_index))
        .bind(i64::from(state.topic_index))
        .bind(state.step.as_str())
        .bind(state.completed)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
