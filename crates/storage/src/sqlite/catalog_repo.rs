use async_trait::async_trait;
use sie_core::model::{
    Chapter, ChapterId, Concept, Curriculum, Flashcard, QuizQuestion, Topic, TopicId,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    conn, map_chapter_row, map_concept_row, map_flashcard_row, map_question_row, map_topic_row,
    ser, u32_from_i64,
};
use crate::repository::{CatalogRepository, CatalogWriter, StorageError};

const QUESTION_COLUMNS: &str = "id, topic_id, question, option_a, option_b, option_c, option_d, \
     correct_answer, explanation";

impl SqliteRepository {
    async fn count_rows(&self, table: &'static str) -> Result<u32, StorageError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        u32_from_i64("count", row.try_get("n").map_err(ser)?)
    }
}

#[async_trait]
impl CatalogRepository for SqliteRepository {
    async fn list_chapters(&self) -> Result<Vec<Chapter>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, title, chapter_order FROM chapters ORDER BY chapter_order ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_chapter_row).collect()
    }

    async fn list_topics(&self, chapter_id: &ChapterId) -> Result<Vec<Topic>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, chapter_id, title, description, topic_order
            FROM topics
            WHERE chapter_id = ?1
            ORDER BY topic_order ASC, id ASC
            ",
        )
        .bind(chapter_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_topic_row).collect()
    }

    async fn topics_per_chapter(&self) -> Result<Vec<u32>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT COUNT(t.id) AS n
            FROM chapters c
            LEFT JOIN topics t ON t.chapter_id = c.id
            GROUP BY c.id
            ORDER BY c.chapter_order ASC, c.id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter()
            .map(|row| u32_from_i64("topic count", row.try_get("n").map_err(ser)?))
            .collect()
    }

    async fn concept_for_topic(&self, topic_id: &TopicId) -> Result<Option<Concept>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, topic_id, title, description, example
            FROM concepts
            WHERE topic_id = ?1
            ORDER BY id ASC
            LIMIT 1
            ",
        )
        .bind(topic_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;
        row.as_ref().map(map_concept_row).transpose()
    }

    async fn flashcards_for_topic(
        &self,
        topic_id: &TopicId,
    ) -> Result<Vec<Flashcard>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, topic_id, term, definition
            FROM flashcards
            WHERE topic_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(topic_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter().map(map_flashcard_row).collect()
    }

    async fn questions_for_topic(
        &self,
        topic_id: &TopicId,
    ) -> Result<Vec<QuizQuestion>, StorageError> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM quiz_questions WHERE topic_id = ?1 ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(topic_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter().map(map_question_row).collect()
    }

    async fn all_questions(&self) -> Result<Vec<QuizQuestion>, StorageError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM quiz_questions ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter().map(map_question_row).collect()
    }

    async fn count_flashcards(&self) -> Result<u32, StorageError> {
        self.count_rows("flashcards").await
    }

    async fn count_topics(&self) -> Result<u32, StorageError> {
        self.count_rows("topics").await
    }

    async fn count_concepts(&self) -> Result<u32, StorageError> {
        self.count_rows("concepts").await
    }
}

#[async_trait]
impl CatalogWriter for SqliteRepository {
    async fn import_curriculum(&self, curriculum: &Curriculum) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        for chapter in &curriculum.chapters {
            sqlx::query(
                r"
                INSERT INTO chapters (id, title, chapter_order)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    chapter_order = excluded.chapter_order
                ",
            )
            .bind(chapter.id.as_str())
            .bind(&chapter.title)
            .bind(i64::from(chapter.chapter_order))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        for topic in &curriculum.topics {
            sqlx::query(
                r"
                INSERT INTO topics (id, chapter_id, title, description, topic_order)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    chapter_id = excluded.chapter_id,
                    title = excluded.title,
                    description = excluded.description,
                    topic_order = excluded.topic_order
                ",
            )
            .bind(topic.id.as_str())
            .bind(topic.chapter_id.as_str())
            .bind(&topic.title)
            .bind(topic.description.as_deref())
            .bind(i64::from(topic.topic_order))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        for concept in &curriculum.concepts {
            sqlx::query(
                r"
                INSERT INTO concepts (id, topic_id, title, description, example)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    topic_id = excluded.topic_id,
                    title = excluded.title,
                    description = excluded.description,
                    example = excluded.example
                ",
            )
            .bind(concept.id.as_str())
            .bind(concept.topic_id.as_str())
            .bind(&concept.title)
            .bind(&concept.description)
            .bind(concept.example.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        for card in &curriculum.flashcards {
            sqlx::query(
                r"
                INSERT INTO flashcards (id, topic_id, term, definition)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    topic_id = excluded.topic_id,
                    term = excluded.term,
                    definition = excluded.definition
                ",
            )
            .bind(card.id.as_str())
            .bind(card.topic_id.as_str())
            .bind(&card.term)
            .bind(&card.definition)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        for question in &curriculum.questions {
            let [a, b, c, d] = &question.options;
            sqlx::query(
                r"
                INSERT INTO quiz_questions (
                    id, topic_id, question, option_a, option_b, option_c, option_d,
                    correct_answer, explanation
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    topic_id = excluded.topic_id,
                    question = excluded.question,
                    option_a = excluded.option_a,
                    option_b = excluded.option_b,
                    option_c = excluded.option_c,
                    option_d = excluded.option_d,
                    correct_answer = excluded.correct_answer,
                    explanation = excluded.explanation
                ",
            )
            .bind(question.id.as_str())
            .bind(question.topic_id.as_str())
            .bind(&question.question)
            .bind(a)
            .bind(b)
            .bind(c)
            .bind(d)
            .bind(question.correct.as_letter())
            .bind(question.explanation.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
