use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS profiles (
            user_id TEXT PRIMARY KEY,
            xp INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0),
            streak INTEGER NOT NULL DEFAULT 0 CHECK (streak >= 0),
            last_active TEXT,
            exam_date TEXT,
            overall_progress TEXT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS chapters (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            chapter_order INTEGER NOT NULL CHECK (chapter_order >= 0)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS topics (
            id TEXT PRIMARY KEY,
            chapter_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            topic_order INTEGER NOT NULL CHECK (topic_order >= 0),
            FOREIGN KEY (chapter_id) REFERENCES chapters(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS concepts (
            id TEXT PRIMARY KEY,
            topic_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            example TEXT,
            FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS flashcards (
            id TEXT PRIMARY KEY,
            topic_id TEXT NOT NULL,
            term TEXT NOT NULL,
            definition TEXT NOT NULL,
            FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_questions (
            id TEXT PRIMARY KEY,
            topic_id TEXT NOT NULL,
            question TEXT NOT NULL,
            option_a TEXT NOT NULL,
            option_b TEXT NOT NULL,
            option_c TEXT NOT NULL,
            option_d TEXT NOT NULL,
            correct_answer TEXT NOT NULL CHECK (correct_answer IN ('A', 'B', 'C', 'D')),
            explanation TEXT,
            FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS study_progress (
            user_id TEXT NOT NULL,
            content_type TEXT NOT NULL
                CHECK (content_type IN ('flashcard', 'quiz', 'concept', 'topic')),
            content_id TEXT NOT NULL,
            mastered INTEGER NOT NULL CHECK (mastered IN (0, 1)),
            last_studied TEXT NOT NULL,
            PRIMARY KEY (user_id, content_type, content_id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS user_learning_progress (
            user_id TEXT PRIMARY KEY,
            current_chapter_index INTEGER NOT NULL CHECK (current_chapter_index >= 0),
            current_topic_index INTEGER NOT NULL CHECK (current_topic_index >= 0),
            current_step TEXT NOT NULL CHECK (current_step IN ('concept', 'flashcard', 'quiz')),
            completed INTEGER NOT NULL CHECK (completed IN (0, 1))
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS xp_events (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount >= 0),
            event_type TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS streak_days (
            user_id TEXT NOT NULL,
            day TEXT NOT NULL,
            PRIMARY KEY (user_id, day)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_attempts (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            topic_id TEXT NOT NULL,
            score INTEGER NOT NULL CHECK (score BETWEEN 0 AND 100),
            completed_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS practice_test_results (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            score REAL NOT NULL,
            correct_count INTEGER NOT NULL CHECK (correct_count >= 0),
            total_questions INTEGER NOT NULL CHECK (total_questions >= correct_count),
            passed INTEGER NOT NULL CHECK (passed IN (0, 1)),
            completed_at TEXT NOT NULL,
            time_taken_secs INTEGER NOT NULL CHECK (time_taken_secs >= 0)
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_topics_chapter_order
            ON topics (chapter_id, topic_order);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_study_progress_user_type_mastered
            ON study_progress (user_id, content_type, mastered);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_xp_events_user_created
            ON xp_events (user_id, created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quiz_attempts_user_completed
            ON quiz_attempts (user_id, completed_at);
    ",
];

/// Runs versioned migrations; each version is applied once, in a transaction.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: profiles, catalog, mastery, position and activity logs.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied sqlite migration");
    }

    Ok(())
}
