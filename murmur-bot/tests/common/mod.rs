//! Shared test fixtures: scratch database and survey seeding

use sqlx::SqlitePool;
use tempfile::TempDir;

use murmur_common::db::init_database;

/// Open a fresh database in a scratch directory.
///
/// The TempDir must stay alive as long as the pool is used.
pub async fn setup_db() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("murmur.db")).await.unwrap();
    (dir, pool)
}

/// Question blueprint for seeding: (guid, type, text, required, options)
pub struct QuestionSpec {
    pub guid: &'static str,
    pub question_type: &'static str,
    pub text: &'static str,
    pub required: bool,
    pub options: &'static [&'static str],
}

/// Insert a survey with ordered questions. Positions are assigned
/// 1..=N in slice order; option guids are `<question_guid>-o<index>`.
pub async fn seed_survey(
    pool: &SqlitePool,
    guid: &str,
    title: &str,
    active: bool,
    created_at: &str,
    questions: &[QuestionSpec],
) {
    sqlx::query(
        "INSERT INTO surveys (guid, title, description, active, created_at)
         VALUES (?, ?, '', ?, ?)",
    )
    .bind(guid)
    .bind(title)
    .bind(active as i64)
    .bind(created_at)
    .execute(pool)
    .await
    .unwrap();

    for (index, question) in questions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO questions (guid, survey_guid, text, question_type, position, required)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(question.guid)
        .bind(guid)
        .bind(question.text)
        .bind(question.question_type)
        .bind((index + 1) as i64)
        .bind(question.required as i64)
        .execute(pool)
        .await
        .unwrap();

        for (opt_index, option_text) in question.options.iter().enumerate() {
            sqlx::query(
                "INSERT INTO question_options (guid, question_guid, text, position)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(format!("{}-o{}", question.guid, opt_index + 1))
            .bind(question.guid)
            .bind(option_text)
            .bind((opt_index + 1) as i64)
            .execute(pool)
            .await
            .unwrap();
        }
    }
}

/// Insert a respondent with a fully completed profile
pub async fn seed_registered_respondent(pool: &SqlitePool, token: &str) {
    sqlx::query(
        "INSERT INTO respondents
             (token, gender, age, occupation, course_number, profile_complete, created_at)
         VALUES (?, 'female', 21, 'student', 3, 1, '2026-01-01T00:00:00Z')",
    )
    .bind(token)
    .execute(pool)
    .await
    .unwrap();
}
