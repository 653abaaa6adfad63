//! Conversation dispatcher degradation tests
//!
//! A session whose current question has been edited away (catalog
//! administered elsewhere) must be closed cleanly and the respondent
//! returned to the menu, never surfaced as a transport error.

mod common;

use sqlx::SqlitePool;

use murmur_bot::conversation::{self, ChatState};
use murmur_bot::render::Keyboard;
use murmur_common::Anonymizer;

use common::{seed_registered_respondent, seed_survey, setup_db, QuestionSpec};

const USER_ID: i64 = 99;

fn anon() -> Anonymizer {
    Anonymizer::new("conversation-test-salt").unwrap()
}

async fn setup_in_survey() -> (tempfile::TempDir, SqlitePool, Anonymizer) {
    let (dir, pool) = setup_db().await;
    let anonymizer = anon();
    seed_registered_respondent(&pool, &anonymizer.token(USER_ID)).await;
    seed_survey(
        &pool,
        "s1",
        "Doomed",
        true,
        "2026-01-01T00:00:00Z",
        &[QuestionSpec { guid: "q1", question_type: "text", text: "Q?", required: true, options: &[] }],
    )
    .await;

    let outcome =
        conversation::handle_text(&pool, &anonymizer, USER_ID, ChatState::Idle, "📝 Start survey")
            .await
            .unwrap();
    assert_eq!(outcome.state, ChatState::InSurvey);

    (dir, pool, anonymizer)
}

async fn session_status(pool: &SqlitePool) -> String {
    sqlx::query_scalar("SELECT status FROM sessions")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_vanished_question_mid_survey_closes_session() {
    let (_dir, pool, anonymizer) = setup_in_survey().await;

    // The current question is edited away underneath the session
    sqlx::query("DELETE FROM questions WHERE guid = 'q1'")
        .execute(&pool)
        .await
        .unwrap();

    let outcome = conversation::handle_text(
        &pool,
        &anonymizer,
        USER_ID,
        ChatState::InSurvey,
        "my answer",
    )
    .await
    .unwrap();

    // Degrades to the menu instead of erroring out
    assert_eq!(outcome.state, ChatState::Idle);
    assert_eq!(outcome.replies.len(), 1);
    assert!(outcome.replies[0].text.contains("closed"));
    assert_eq!(outcome.replies[0].keyboard, Keyboard::MainMenu);

    assert_eq!(session_status(&pool).await, "abandoned");
}

#[tokio::test]
async fn test_resume_with_vanished_question_reinitializes_at_menu() {
    let (_dir, pool, anonymizer) = setup_in_survey().await;

    sqlx::query("DELETE FROM questions WHERE guid = 'q1'")
        .execute(&pool)
        .await
        .unwrap();

    // Transport restarted (state lost), respondent tries to start
    // again; the open session's pointer is orphaned
    let outcome =
        conversation::handle_text(&pool, &anonymizer, USER_ID, ChatState::Idle, "📝 Start survey")
            .await
            .unwrap();

    assert_eq!(outcome.state, ChatState::Idle);
    assert!(outcome.replies[0].text.contains("could not be restored"));
    assert_eq!(outcome.replies[0].keyboard, Keyboard::MainMenu);

    assert_eq!(session_status(&pool).await, "abandoned");
}
