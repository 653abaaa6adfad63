//! Session and response store
//!
//! A session is one respondent's single traversal attempt of one
//! survey. The driving session for a conversation is always re-derived
//! here from durable state (`active_session`), never held in memory,
//! so a process restart cannot orphan it.
//!
//! Mutating functions are generic over the executor so the progression
//! engine can run the response insert and the pointer advance inside
//! one transaction.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

use murmur_common::db::{AnswerPayload, Response, Session, SessionStatus};
use murmur_common::{Error, Result};

use super::parse_timestamp;

fn map_session(row: &SqliteRow) -> Result<Session> {
    let status: String = row.get("status");
    let started_at: String = row.get("started_at");
    let completed_at: Option<String> = row.get("completed_at");

    Ok(Session {
        guid: row.get("guid"),
        respondent_token: row.get("respondent_token"),
        survey_guid: row.get("survey_guid"),
        status: SessionStatus::parse(&status)?,
        current_question_guid: row.get("current_question_guid"),
        started_at: parse_timestamp(&started_at)?,
        completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

/// Create a session in the `started` state, returning its guid
pub async fn create<'e, E>(executor: E, token: &str, survey_guid: &str) -> Result<String>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let guid = Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO sessions (guid, respondent_token, survey_guid, status, started_at)
         VALUES (?, ?, ?, 'started', ?)",
    )
    .bind(&guid)
    .bind(token)
    .bind(survey_guid)
    .bind(&started_at)
    .execute(executor)
    .await?;

    Ok(guid)
}

/// Fetch a session by guid
pub async fn get(pool: &SqlitePool, guid: &str) -> Result<Session> {
    let row = sqlx::query("SELECT * FROM sessions WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("session {}", guid)))?;

    map_session(&row)
}

/// The respondent's driving session, if one is open.
///
/// Most recently started non-terminal session; guid disambiguates
/// equal timestamps so the pick is deterministic.
pub async fn active_session(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        "SELECT * FROM sessions
         WHERE respondent_token = ? AND status IN ('started', 'in_progress')
         ORDER BY started_at DESC, guid DESC
         LIMIT 1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_session).transpose()
}

/// Move the current-question pointer
pub async fn set_current_question<'e, E>(
    executor: E,
    session_guid: &str,
    question_guid: Option<&str>,
) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE sessions SET current_question_guid = ? WHERE guid = ?")
        .bind(question_guid)
        .bind(session_guid)
        .execute(executor)
        .await?;

    Ok(())
}

/// Transition the session status.
///
/// Terminal transitions clear the current-question pointer; completion
/// also stamps `completed_at`.
pub async fn set_status<'e, E>(executor: E, session_guid: &str, status: SessionStatus) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    match status {
        SessionStatus::Completed => {
            sqlx::query(
                "UPDATE sessions
                 SET status = 'completed', completed_at = ?, current_question_guid = NULL
                 WHERE guid = ?",
            )
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(session_guid)
            .execute(executor)
            .await?;
        }
        SessionStatus::Abandoned => {
            sqlx::query(
                "UPDATE sessions
                 SET status = 'abandoned', current_question_guid = NULL
                 WHERE guid = ?",
            )
            .bind(session_guid)
            .execute(executor)
            .await?;
        }
        other => {
            sqlx::query("UPDATE sessions SET status = ? WHERE guid = ?")
                .bind(other.as_str())
                .bind(session_guid)
                .execute(executor)
                .await?;
        }
    }

    Ok(())
}

/// Insert one response row; exactly one payload column is populated
pub async fn insert_response<'e, E>(
    executor: E,
    session_guid: &str,
    question_guid: &str,
    payload: &AnswerPayload,
) -> Result<String>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let guid = Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();

    let (text_answer, selected_option_guid, voice_file_ref) = match payload {
        AnswerPayload::Text(text) => (Some(text.as_str()), None, None),
        AnswerPayload::SelectedOption(option_guid) => (None, Some(option_guid.as_str()), None),
        AnswerPayload::VoiceFileRef(file_ref) => (None, None, Some(file_ref.as_str())),
    };

    sqlx::query(
        "INSERT INTO responses
             (guid, session_guid, question_guid, text_answer, selected_option_guid,
              voice_file_ref, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(session_guid)
    .bind(question_guid)
    .bind(text_answer)
    .bind(selected_option_guid)
    .bind(voice_file_ref)
    .bind(&created_at)
    .execute(executor)
    .await?;

    Ok(guid)
}

/// Count a respondent's sessions in a given status
pub async fn count_by_status(
    pool: &SqlitePool,
    token: &str,
    status: SessionStatus,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sessions WHERE respondent_token = ? AND status = ?",
    )
    .bind(token)
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// All responses of a session in traversal (insertion) order
pub async fn responses_for_session(pool: &SqlitePool, session_guid: &str) -> Result<Vec<Response>> {
    let rows = sqlx::query("SELECT * FROM responses WHERE session_guid = ? ORDER BY rowid ASC")
        .bind(session_guid)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let text_answer: Option<String> = row.get("text_answer");
            let selected_option_guid: Option<String> = row.get("selected_option_guid");
            let voice_file_ref: Option<String> = row.get("voice_file_ref");
            let created_at: String = row.get("created_at");

            let payload = match (text_answer, selected_option_guid, voice_file_ref) {
                (Some(text), None, None) => AnswerPayload::Text(text),
                (None, Some(option_guid), None) => AnswerPayload::SelectedOption(option_guid),
                (None, None, Some(file_ref)) => AnswerPayload::VoiceFileRef(file_ref),
                _ => {
                    return Err(Error::Internal(format!(
                        "response {} has no single payload",
                        row.get::<String, _>("guid")
                    )))
                }
            };

            Ok(Response {
                guid: row.get("guid"),
                session_guid: row.get("session_guid"),
                question_guid: row.get("question_guid"),
                payload,
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .collect()
}
