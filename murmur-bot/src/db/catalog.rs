//! Survey catalog queries
//!
//! Read-only view of surveys, questions and options. The catalog is
//! administered elsewhere; the bot only traverses it. Question order
//! is defined by the `position` column, unique per survey.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use murmur_common::db::{Question, QuestionOption, QuestionType, Survey};
use murmur_common::{Error, Result};

use super::parse_timestamp;

fn map_survey(row: &SqliteRow) -> Result<Survey> {
    let created_at: String = row.get("created_at");

    Ok(Survey {
        guid: row.get("guid"),
        title: row.get("title"),
        description: row.get("description"),
        active: row.get::<i64, _>("active") != 0,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn map_question(row: &SqliteRow) -> Result<Question> {
    let question_type: String = row.get("question_type");

    Ok(Question {
        guid: row.get("guid"),
        survey_guid: row.get("survey_guid"),
        text: row.get("text"),
        question_type: QuestionType::parse(&question_type)?,
        position: row.get("position"),
        required: row.get::<i64, _>("required") != 0,
    })
}

/// Fetch the active survey, if any.
///
/// When several surveys are active the newest by creation time wins,
/// with guid as a final disambiguator, so the pick is deterministic.
pub async fn active_survey(pool: &SqlitePool) -> Result<Option<Survey>> {
    let row = sqlx::query(
        "SELECT * FROM surveys WHERE active = 1 ORDER BY created_at DESC, guid DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_survey).transpose()
}

/// Fetch a question by guid
pub async fn question(pool: &SqlitePool, guid: &str) -> Result<Question> {
    let row = sqlx::query("SELECT * FROM questions WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("question {}", guid)))?;

    map_question(&row)
}

/// Lowest-position question of a survey, if the survey has any
pub async fn first_question(pool: &SqlitePool, survey_guid: &str) -> Result<Option<Question>> {
    let row = sqlx::query(
        "SELECT * FROM questions WHERE survey_guid = ? ORDER BY position ASC LIMIT 1",
    )
    .bind(survey_guid)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_question).transpose()
}

/// Smallest position strictly greater than `after_position` within the survey
pub async fn next_question(
    pool: &SqlitePool,
    survey_guid: &str,
    after_position: i64,
) -> Result<Option<Question>> {
    let row = sqlx::query(
        "SELECT * FROM questions WHERE survey_guid = ? AND position > ?
         ORDER BY position ASC LIMIT 1",
    )
    .bind(survey_guid)
    .bind(after_position)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_question).transpose()
}

/// Ordered option list for a choice question
pub async fn options(pool: &SqlitePool, question_guid: &str) -> Result<Vec<QuestionOption>> {
    let rows = sqlx::query(
        "SELECT * FROM question_options WHERE question_guid = ? ORDER BY position ASC",
    )
    .bind(question_guid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| QuestionOption {
            guid: row.get("guid"),
            question_guid: row.get("question_guid"),
            text: row.get("text"),
            position: row.get("position"),
        })
        .collect())
}

/// Resolve inbound text against a question's option labels.
///
/// Exact text match only; case or whitespace variants do not resolve.
pub async fn option_by_text(
    pool: &SqlitePool,
    question_guid: &str,
    text: &str,
) -> Result<Option<QuestionOption>> {
    let row = sqlx::query(
        "SELECT * FROM question_options WHERE question_guid = ? AND text = ? LIMIT 1",
    )
    .bind(question_guid)
    .bind(text)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| QuestionOption {
        guid: row.get("guid"),
        question_guid: row.get("question_guid"),
        text: row.get("text"),
        position: row.get("position"),
    }))
}

/// 1-based display index of a question within its survey
pub async fn question_index(pool: &SqlitePool, question: &Question) -> Result<i64> {
    let index: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM questions WHERE survey_guid = ? AND position <= ?",
    )
    .bind(&question.survey_guid)
    .bind(question.position)
    .fetch_one(pool)
    .await?;

    Ok(index)
}

/// Total question count of a survey
pub async fn question_count(pool: &SqlitePool, survey_guid: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE survey_guid = ?")
        .bind(survey_guid)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
