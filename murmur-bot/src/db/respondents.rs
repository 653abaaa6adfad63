//! Respondent profile store
//!
//! Profiles are keyed by the anonymized token and mutated one field at
//! a time during registration, each setter persisting immediately. A
//! crash mid-registration therefore leaves a partially filled,
//! still-incomplete profile that is safely resumable. Profiles are
//! never deleted.

use sqlx::{Row, SqlitePool};
use sqlx::sqlite::SqliteRow;

use murmur_common::db::{Gender, Occupation, Respondent};
use murmur_common::{Error, Result};

use super::parse_timestamp;

fn map_respondent(row: &SqliteRow) -> Result<Respondent> {
    let gender: Option<String> = row.get("gender");
    let occupation: Option<String> = row.get("occupation");
    let created_at: String = row.get("created_at");

    Ok(Respondent {
        token: row.get("token"),
        gender: gender.as_deref().map(Gender::parse).transpose()?,
        age: row.get("age"),
        occupation: occupation.as_deref().map(Occupation::parse).transpose()?,
        course_number: row.get("course_number"),
        experience_years: row.get("experience_years"),
        profile_complete: row.get::<i64, _>("profile_complete") != 0,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Fetch a respondent, creating an empty profile on first contact
pub async fn get_or_create(pool: &SqlitePool, token: &str) -> Result<Respondent> {
    sqlx::query("INSERT OR IGNORE INTO respondents (token, created_at) VALUES (?, ?)")
        .bind(token)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    get(pool, token).await
}

/// Fetch an existing respondent
pub async fn get(pool: &SqlitePool, token: &str) -> Result<Respondent> {
    let row = sqlx::query("SELECT * FROM respondents WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("respondent {}", &token[..token.len().min(8)])))?;

    map_respondent(&row)
}

pub async fn set_gender(pool: &SqlitePool, token: &str, gender: Gender) -> Result<()> {
    sqlx::query("UPDATE respondents SET gender = ? WHERE token = ?")
        .bind(gender.as_str())
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_age(pool: &SqlitePool, token: &str, age: i64) -> Result<()> {
    sqlx::query("UPDATE respondents SET age = ? WHERE token = ?")
        .bind(age)
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_occupation(pool: &SqlitePool, token: &str, occupation: Occupation) -> Result<()> {
    sqlx::query("UPDATE respondents SET occupation = ? WHERE token = ?")
        .bind(occupation.as_str())
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

/// Set the course year and mark the profile complete (student branch)
pub async fn set_course(pool: &SqlitePool, token: &str, course: i64) -> Result<()> {
    sqlx::query("UPDATE respondents SET course_number = ?, profile_complete = 1 WHERE token = ?")
        .bind(course)
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

/// Set years of experience and mark the profile complete (worker branch)
pub async fn set_experience(pool: &SqlitePool, token: &str, years: i64) -> Result<()> {
    sqlx::query(
        "UPDATE respondents SET experience_years = ?, profile_complete = 1 WHERE token = ?",
    )
    .bind(years)
    .bind(token)
    .execute(pool)
    .await?;

    Ok(())
}
