//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently (`CREATE TABLE IF NOT EXISTS`). Every service start
//! goes through [`init_database`]; there is no separate migration
//! step for a fresh deployment.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas set through connect options apply to every pooled
    // connection, not just the first one handed out. Foreign keys are
    // required for the cascade deletes below; WAL allows concurrent
    // readers with one writer (event handling writes are short
    // transactions).
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_respondents_table(&pool).await?;
    create_surveys_table(&pool).await?;
    create_questions_table(&pool).await?;
    create_question_options_table(&pool).await?;
    create_sessions_table(&pool).await?;
    create_responses_table(&pool).await?;

    Ok(pool)
}

async fn create_respondents_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS respondents (
            token TEXT PRIMARY KEY,
            gender TEXT,
            age INTEGER,
            occupation TEXT,
            course_number INTEGER,
            experience_years INTEGER,
            profile_complete INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_surveys_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS surveys (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_questions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            guid TEXT PRIMARY KEY,
            survey_guid TEXT NOT NULL REFERENCES surveys(guid) ON DELETE CASCADE,
            text TEXT NOT NULL,
            question_type TEXT NOT NULL CHECK (question_type IN ('text', 'choice', 'voice')),
            position INTEGER NOT NULL,
            required INTEGER NOT NULL DEFAULT 1,
            UNIQUE (survey_guid, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_question_options_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS question_options (
            guid TEXT PRIMARY KEY,
            question_guid TEXT NOT NULL REFERENCES questions(guid) ON DELETE CASCADE,
            text TEXT NOT NULL,
            position INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            guid TEXT PRIMARY KEY,
            respondent_token TEXT NOT NULL REFERENCES respondents(token),
            survey_guid TEXT NOT NULL REFERENCES surveys(guid),
            status TEXT NOT NULL DEFAULT 'started'
                CHECK (status IN ('started', 'in_progress', 'completed', 'abandoned')),
            current_question_guid TEXT,
            started_at TEXT NOT NULL,
            completed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_responses_table(pool: &SqlitePool) -> Result<()> {
    // Exactly one payload column per row
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS responses (
            guid TEXT PRIMARY KEY,
            session_guid TEXT NOT NULL REFERENCES sessions(guid) ON DELETE CASCADE,
            question_guid TEXT NOT NULL REFERENCES questions(guid),
            text_answer TEXT,
            selected_option_guid TEXT REFERENCES question_options(guid),
            voice_file_ref TEXT,
            created_at TEXT NOT NULL,
            CHECK (
                (text_answer IS NOT NULL) + (selected_option_guid IS NOT NULL)
                    + (voice_file_ref IS NOT NULL) = 1
            )
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
