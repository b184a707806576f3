use chrono::{DateTime, NaiveDate, Utc};
use sie_core::guided::GuidedState;
use sie_core::model::{
    AnswerChoice, Chapter, ChapterId, Concept, ContentId, ContentType, Flashcard,
    PracticeTestResult, Profile, QuizAttempt, QuizQuestion, Step, StudyProgress, Topic, TopicId,
    UserId, XpEvent, XpEventKind,
};
use sie_core::progress::ProgressSnapshot;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Maps unique-key violations to `Conflict`, everything else to `Connection`.
pub(crate) fn conflict_or_conn(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => conn(e),
    }
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u8_from_i64(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn snapshot_to_json(snapshot: &ProgressSnapshot) -> Result<String, StorageError> {
    serde_json::to_string(snapshot).map_err(ser)
}

pub(crate) fn map_profile_row(row: &SqliteRow) -> Result<Profile, StorageError> {
    let overall_progress = row
        .try_get::<Option<String>, _>("overall_progress")
        .map_err(ser)?
        .map(|json| serde_json::from_str::<ProgressSnapshot>(&json))
        .transpose()
        .map_err(ser)?;

    Ok(Profile::from_persisted(
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        u32_from_i64("xp", row.try_get("xp").map_err(ser)?)?,
        u32_from_i64("streak", row.try_get("streak").map_err(ser)?)?,
        row.try_get::<Option<NaiveDate>, _>("last_active")
            .map_err(ser)?,
        row.try_get::<Option<NaiveDate>, _>("exam_date")
            .map_err(ser)?,
        overall_progress,
    ))
}

pub(crate) fn map_chapter_row(row: &SqliteRow) -> Result<Chapter, StorageError> {
    Ok(Chapter {
        id: ChapterId::new(row.try_get::<String, _>("id").map_err(ser)?),
        title: row.try_get("title").map_err(ser)?,
        chapter_order: u32_from_i64("chapter_order", row.try_get("chapter_order").map_err(ser)?)?,
    })
}

pub(crate) fn map_topic_row(row: &SqliteRow) -> Result<Topic, StorageError> {
    Ok(Topic {
        id: TopicId::new(row.try_get::<String, _>("id").map_err(ser)?),
        chapter_id: ChapterId::new(row.try_get::<String, _>("chapter_id").map_err(ser)?),
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        topic_order: u32_from_i64("topic_order", row.try_get("topic_order").map_err(ser)?)?,
    })
}

pub(crate) fn map_concept_row(row: &SqliteRow) -> Result<Concept, StorageError> {
    Ok(Concept {
        id: ContentId::new(row.try_get::<String, _>("id").map_err(ser)?),
        topic_id: TopicId::new(row.try_get::<String, _>("topic_id").map_err(ser)?),
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        example: row.try_get("example").map_err(ser)?,
    })
}

pub(crate) fn map_flashcard_row(row: &SqliteRow) -> Result<Flashcard, StorageError> {
    Ok(Flashcard {
        id: ContentId::new(row.try_get::<String, _>("id").map_err(ser)?),
        topic_id: TopicId::new(row.try_get::<String, _>("topic_id").map_err(ser)?),
        term: row.try_get("term").map_err(ser)?,
        definition: row.try_get("definition").map_err(ser)?,
    })
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<QuizQuestion, StorageError> {
    let correct: String = row.try_get("correct_answer").map_err(ser)?;
    Ok(QuizQuestion {
        id: ContentId::new(row.try_get::<String, _>("id").map_err(ser)?),
        topic_id: TopicId::new(row.try_get::<String, _>("topic_id").map_err(ser)?),
        question: row.try_get("question").map_err(ser)?,
        options: [
            row.try_get("option_a").map_err(ser)?,
            row.try_get("option_b").map_err(ser)?,
            row.try_get("option_c").map_err(ser)?,
            row.try_get("option_d").map_err(ser)?,
        ],
        correct: AnswerChoice::from_letter(&correct).map_err(ser)?,
        explanation: row.try_get("explanation").map_err(ser)?,
    })
}

pub(crate) fn map_study_progress_row(row: &SqliteRow) -> Result<StudyProgress, StorageError> {
    let content_type: String = row.try_get("content_type").map_err(ser)?;
    Ok(StudyProgress::new(
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        ContentType::parse(&content_type).map_err(ser)?,
        ContentId::new(row.try_get::<String, _>("content_id").map_err(ser)?),
        row.try_get("mastered").map_err(ser)?,
        row.try_get("last_studied").map_err(ser)?,
    ))
}

pub(crate) fn map_position_row(row: &SqliteRow) -> Result<GuidedState, StorageError> {
    let step: String = row.try_get("current_step").map_err(ser)?;
    Ok(GuidedState {
        chapter_index: u32_from_i64(
            "current_chapter_index",
            row.try_get("current_chapter_index").map_err(ser)?,
        )?,
        topic_index: u32_from_i64(
            "current_topic_index",
            row.try_get("current_topic_index").map_err(ser)?,
        )?,
        step: Step::parse(&step).map_err(ser)?,
        completed: row.try_get("completed").map_err(ser)?,
    })
}

pub(crate) fn map_xp_event_row(row: &SqliteRow) -> Result<XpEvent, StorageError> {
    let kind: String = row.try_get("event_type").map_err(ser)?;
    Ok(XpEvent {
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        amount: u32_from_i64("amount", row.try_get("amount").map_err(ser)?)?,
        kind: XpEventKind::parse(&kind).map_err(ser)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_quiz_attempt_row(row: &SqliteRow) -> Result<QuizAttempt, StorageError> {
    Ok(QuizAttempt {
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        topic_id: TopicId::new(row.try_get::<String, _>("topic_id").map_err(ser)?),
        score_percent: u8_from_i64("score", row.try_get("score").map_err(ser)?)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

pub(crate) fn map_practice_test_row(row: &SqliteRow) -> Result<PracticeTestResult, StorageError> {
    PracticeTestResult::new(
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        u32_from_i64("correct_count", row.try_get("correct_count").map_err(ser)?)?,
        u32_from_i64(
            "total_questions",
            row.try_get("total_questions").map_err(ser)?,
        )?,
        row.try_get("passed").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
        u32_from_i64(
            "time_taken_secs",
            row.try_get("time_taken_secs").map_err(ser)?,
        )?,
    )
    .map_err(ser)
}
