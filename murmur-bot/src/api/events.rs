//! Inbound event endpoint
//!
//! The transport adapter posts one event per inbound chat message and
//! gets back the outbound messages plus the next macro state to hold
//! for that chat. Per-respondent serialization (no two concurrent
//! events for the same chat) is the transport's contract; different
//! respondents' events may run in parallel.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use murmur_common::Error;

use crate::conversation::{self, ChatState};
use crate::render::Reply;
use crate::AppState;

/// Kind of inbound chat event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Plain text message; `text` must be present
    Text,
    /// Voice attachment; `file_ref` must be present
    Attachment,
    /// Explicit cancel command
    Cancel,
}

/// POST /event request body
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub platform_user_id: i64,
    /// Macro state the transport holds for this chat; defaults to the
    /// main menu when absent (fresh or restarted conversation)
    #[serde(default)]
    pub state: ChatState,
    pub kind: EventKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub file_ref: Option<String>,
}

/// POST /event response body
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub messages: Vec<Reply>,
    pub state: ChatState,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn into_api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            error!("event handling failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() })))
}

/// POST /event
pub async fn handle_event(
    State(state): State<AppState>,
    Json(request): Json<EventRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    let outcome = match request.kind {
        EventKind::Text => {
            let text = request.text.as_deref().ok_or_else(|| {
                into_api_error(Error::InvalidInput(
                    "text event without a text field".to_string(),
                ))
            })?;
            conversation::handle_text(
                &state.db,
                &state.anonymizer,
                request.platform_user_id,
                request.state,
                text,
            )
            .await
        }
        EventKind::Attachment => {
            let file_ref = request.file_ref.as_deref().ok_or_else(|| {
                into_api_error(Error::InvalidInput(
                    "attachment event without a file_ref field".to_string(),
                ))
            })?;
            conversation::handle_attachment(
                &state.db,
                &state.anonymizer,
                request.platform_user_id,
                request.state,
                file_ref,
            )
            .await
        }
        EventKind::Cancel => {
            conversation::handle_cancel(
                &state.db,
                &state.anonymizer,
                request.platform_user_id,
                request.state,
            )
            .await
        }
    };

    let outcome = outcome.map_err(into_api_error)?;

    Ok(Json(EventResponse {
        messages: outcome.replies,
        state: outcome.state,
    }))
}
