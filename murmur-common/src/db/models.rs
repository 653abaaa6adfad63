//! Database models
//!
//! All primary keys are UUID v4 strings except `respondents`, which is
//! keyed directly by the anonymized token. Enumerated columns are
//! stored as their canonical text values; the enum types here are the
//! single source of truth for those values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Respondent gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Canonical value stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(Error::InvalidInput(format!("unknown gender: {}", other))),
        }
    }
}

/// Respondent occupation kind; determines which registration branch
/// (course number vs years of experience) applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupation {
    Student,
    Worker,
}

impl Occupation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Occupation::Student => "student",
            Occupation::Worker => "worker",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "student" => Ok(Occupation::Student),
            "worker" => Ok(Occupation::Worker),
            other => Err(Error::InvalidInput(format!(
                "unknown occupation: {}",
                other
            ))),
        }
    }
}

/// Anonymous respondent profile
///
/// Invariant: `profile_complete == true` implies gender, age,
/// occupation and the occupation-branch field are all set. Fields are
/// persisted one at a time during registration, so an incomplete
/// profile may hold any prefix of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Respondent {
    /// Anonymized token (64 lowercase hex chars), stable and unique
    pub token: String,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
    pub occupation: Option<Occupation>,
    /// Present iff occupation is Student (1..=6)
    pub course_number: Option<i64>,
    /// Present iff occupation is Worker (0..=60)
    pub experience_years: Option<i64>,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    pub guid: String,
    pub title: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Answer kind a question expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    Choice,
    Voice,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Choice => "choice",
            QuestionType::Voice => "voice",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "text" => Ok(QuestionType::Text),
            "choice" => Ok(QuestionType::Choice),
            "voice" => Ok(QuestionType::Voice),
            other => Err(Error::Internal(format!("unknown question type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub guid: String,
    pub survey_guid: String,
    pub text: String,
    pub question_type: QuestionType,
    /// Traversal position, unique per survey, ascending
    pub position: i64,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub guid: String,
    pub question_guid: String,
    pub text: String,
    pub position: i64,
}

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Started,
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Started => "started",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "started" => Ok(SessionStatus::Started),
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(Error::Internal(format!("unknown session status: {}", other))),
        }
    }

    /// Completed or abandoned sessions never receive further events
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Abandoned)
    }
}

/// One respondent's single traversal attempt of one survey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub guid: String,
    pub respondent_token: String,
    pub survey_guid: String,
    pub status: SessionStatus,
    /// NULL once the session is completed or abandoned
    pub current_question_guid: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Answer payload; exactly one variant per response row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerPayload {
    /// Free text, stored verbatim
    Text(String),
    /// Guid of the selected option (must belong to the question)
    SelectedOption(String),
    /// Opaque transport file reference; bytes are fetched lazily by
    /// the transport adapter, never materialized here
    VoiceFileRef(String),
}

/// One answered question within a session; insert-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub guid: String,
    pub session_guid: String,
    pub question_guid: String,
    pub payload: AnswerPayload,
    pub created_at: DateTime<Utc>,
}
