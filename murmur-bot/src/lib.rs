//! murmur-bot library - anonymous chat survey service
//!
//! Walks respondents through profile registration and an active
//! survey, question by question, with durable progress in SQLite.
//! The chat platform attaches through the HTTP ingress in [`api`].

use axum::Router;
use sqlx::SqlitePool;

use murmur_common::Anonymizer;

pub mod api;
pub mod commands;
pub mod conversation;
pub mod db;
pub mod progression;
pub mod registration;
pub mod render;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Keyed hash mapping platform user ids to anonymous tokens
    pub anonymizer: Anonymizer,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, anonymizer: Anonymizer) -> Self {
        Self { db, anonymizer }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/event", post(api::handle_event))
        .route("/health", get(api::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
