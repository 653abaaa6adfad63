//! Registration state machine tests
//!
//! Driven through the conversation dispatcher the way the transport
//! would: first contact enters registration, each answer persists its
//! field immediately, invalid input re-prompts in the same state.

mod common;

use sqlx::{Row, SqlitePool};

use murmur_bot::conversation::{self, ChatState};
use murmur_bot::registration::RegStep;
use murmur_bot::render::{GENDER_FEMALE_LABEL, GENDER_MALE_LABEL, OCCUPATION_STUDENT_LABEL, OCCUPATION_WORKER_LABEL};
use murmur_common::Anonymizer;

use common::setup_db;

const USER_ID: i64 = 42;

fn anon() -> Anonymizer {
    Anonymizer::new("registration-test-salt").unwrap()
}

async fn respondent_row(pool: &SqlitePool, token: &str) -> sqlx::sqlite::SqliteRow {
    sqlx::query("SELECT * FROM respondents WHERE token = ?")
        .bind(token)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn send(
    pool: &SqlitePool,
    anonymizer: &Anonymizer,
    state: ChatState,
    text: &str,
) -> conversation::Outcome {
    conversation::handle_text(pool, anonymizer, USER_ID, state, text)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_first_contact_enters_registration() {
    let (_dir, pool) = setup_db().await;
    let anonymizer = anon();

    let outcome = send(&pool, &anonymizer, ChatState::Idle, "/start").await;

    assert_eq!(outcome.state, ChatState::Registering(RegStep::Gender));
    assert!(outcome.replies[0].text.contains("gender"));

    // First contact created the respondent row
    let row = respondent_row(&pool, &anonymizer.token(USER_ID)).await;
    assert_eq!(row.get::<i64, _>("profile_complete"), 0);
}

#[tokio::test]
async fn test_full_student_path() {
    let (_dir, pool) = setup_db().await;
    let anonymizer = anon();
    let token = anonymizer.token(USER_ID);

    let o = send(&pool, &anonymizer, ChatState::Idle, "/start").await;
    assert_eq!(o.state, ChatState::Registering(RegStep::Gender));

    let o = send(&pool, &anonymizer, o.state, GENDER_FEMALE_LABEL).await;
    assert_eq!(o.state, ChatState::Registering(RegStep::Age));

    let o = send(&pool, &anonymizer, o.state, "21").await;
    assert_eq!(o.state, ChatState::Registering(RegStep::Occupation));

    let o = send(&pool, &anonymizer, o.state, OCCUPATION_STUDENT_LABEL).await;
    assert_eq!(o.state, ChatState::Registering(RegStep::Course));

    let o = send(&pool, &anonymizer, o.state, "3").await;
    assert_eq!(o.state, ChatState::Idle);

    let row = respondent_row(&pool, &token).await;
    assert_eq!(row.get::<String, _>("gender"), "female");
    assert_eq!(row.get::<i64, _>("age"), 21);
    assert_eq!(row.get::<String, _>("occupation"), "student");
    assert_eq!(row.get::<i64, _>("course_number"), 3);
    assert_eq!(row.get::<i64, _>("profile_complete"), 1);
}

#[tokio::test]
async fn test_full_worker_path() {
    let (_dir, pool) = setup_db().await;
    let anonymizer = anon();
    let token = anonymizer.token(USER_ID);

    let o = send(&pool, &anonymizer, ChatState::Idle, "hi").await;
    let o = send(&pool, &anonymizer, o.state, GENDER_MALE_LABEL).await;
    let o = send(&pool, &anonymizer, o.state, "35").await;

    let o = send(&pool, &anonymizer, o.state, OCCUPATION_WORKER_LABEL).await;
    assert_eq!(o.state, ChatState::Registering(RegStep::Experience));

    let o = send(&pool, &anonymizer, o.state, "10").await;
    assert_eq!(o.state, ChatState::Idle);

    let row = respondent_row(&pool, &token).await;
    assert_eq!(row.get::<String, _>("occupation"), "worker");
    assert_eq!(row.get::<i64, _>("experience_years"), 10);
    assert!(row.get::<Option<i64>, _>("course_number").is_none());
    assert_eq!(row.get::<i64, _>("profile_complete"), 1);
}

#[tokio::test]
async fn test_invalid_gender_reprompts_unlimited() {
    let (_dir, pool) = setup_db().await;
    let anonymizer = anon();

    let mut state = send(&pool, &anonymizer, ChatState::Idle, "/start").await.state;

    // Substring / case variants of the label are not accepted
    for bad in ["Male", "male", "👨 male", "👨  Male", "other", "Male 👨"] {
        let o = send(&pool, &anonymizer, state, bad).await;
        assert_eq!(o.state, ChatState::Registering(RegStep::Gender), "input {:?}", bad);
        state = o.state;
    }

    // Still accepts the exact label afterwards
    let o = send(&pool, &anonymizer, state, GENDER_MALE_LABEL).await;
    assert_eq!(o.state, ChatState::Registering(RegStep::Age));
}

#[tokio::test]
async fn test_age_validation_distinct_messages() {
    let (_dir, pool) = setup_db().await;
    let anonymizer = anon();

    let o = send(&pool, &anonymizer, ChatState::Idle, "/start").await;
    let o = send(&pool, &anonymizer, o.state, GENDER_MALE_LABEL).await;
    assert_eq!(o.state, ChatState::Registering(RegStep::Age));

    // Non-numeric: format message, same state
    let format_err = send(&pool, &anonymizer, o.state, "twenty").await;
    assert_eq!(format_err.state, ChatState::Registering(RegStep::Age));
    assert!(format_err.replies[0].text.contains("as a number"));

    // Out of range: range message, same state
    for bad in ["15", "101", "0", "-3", "999"] {
        let range_err = send(&pool, &anonymizer, format_err.state, bad).await;
        assert_eq!(range_err.state, ChatState::Registering(RegStep::Age));
        assert!(range_err.replies[0].text.contains("between 16 and 100"), "input {:?}", bad);
    }

    // The two failure kinds produce different messages
    assert!(!format_err.replies[0].text.contains("between 16 and 100"));

    // Boundaries accepted
    let o = send(&pool, &anonymizer, ChatState::Registering(RegStep::Age), "16").await;
    assert_eq!(o.state, ChatState::Registering(RegStep::Occupation));
}

#[tokio::test]
async fn test_age_persisted_immediately() {
    let (_dir, pool) = setup_db().await;
    let anonymizer = anon();
    let token = anonymizer.token(USER_ID);

    let o = send(&pool, &anonymizer, ChatState::Idle, "/start").await;
    let o = send(&pool, &anonymizer, o.state, GENDER_FEMALE_LABEL).await;
    send(&pool, &anonymizer, o.state, "30").await;

    // Age is already durable while the profile is still incomplete
    let row = respondent_row(&pool, &token).await;
    assert_eq!(row.get::<i64, _>("age"), 30);
    assert_eq!(row.get::<i64, _>("profile_complete"), 0);
}

#[tokio::test]
async fn test_course_range_enforced() {
    let (_dir, pool) = setup_db().await;
    let anonymizer = anon();

    let o = send(&pool, &anonymizer, ChatState::Idle, "/start").await;
    let o = send(&pool, &anonymizer, o.state, GENDER_FEMALE_LABEL).await;
    let o = send(&pool, &anonymizer, o.state, "20").await;
    let o = send(&pool, &anonymizer, o.state, OCCUPATION_STUDENT_LABEL).await;

    for bad in ["0", "7", "abc"] {
        let r = send(&pool, &anonymizer, o.state, bad).await;
        assert_eq!(r.state, ChatState::Registering(RegStep::Course), "input {:?}", bad);
    }

    let done = send(&pool, &anonymizer, o.state, "6").await;
    assert_eq!(done.state, ChatState::Idle);
}

#[tokio::test]
async fn test_experience_range_enforced() {
    let (_dir, pool) = setup_db().await;
    let anonymizer = anon();

    let o = send(&pool, &anonymizer, ChatState::Idle, "/start").await;
    let o = send(&pool, &anonymizer, o.state, GENDER_MALE_LABEL).await;
    let o = send(&pool, &anonymizer, o.state, "40").await;
    let o = send(&pool, &anonymizer, o.state, OCCUPATION_WORKER_LABEL).await;

    for bad in ["-1", "61", "lots"] {
        let r = send(&pool, &anonymizer, o.state, bad).await;
        assert_eq!(r.state, ChatState::Registering(RegStep::Experience), "input {:?}", bad);
    }

    // Zero years is a valid answer
    let done = send(&pool, &anonymizer, o.state, "0").await;
    assert_eq!(done.state, ChatState::Idle);
}

#[tokio::test]
async fn test_completion_with_short_token() {
    let (_dir, pool) = setup_db().await;

    // Tokens are normally 64 hex chars, but the machine must not
    // assume any minimum length
    sqlx::query("INSERT INTO respondents (token, created_at) VALUES ('abc', '2026-01-01T00:00:00Z')")
        .execute(&pool)
        .await
        .unwrap();

    let outcome = murmur_bot::registration::handle_step(&pool, "abc", RegStep::Course, "2")
        .await
        .unwrap();
    assert!(outcome.next.is_none());

    let row = respondent_row(&pool, "abc").await;
    assert_eq!(row.get::<i64, _>("course_number"), 2);
    assert_eq!(row.get::<i64, _>("profile_complete"), 1);
}

#[tokio::test]
async fn test_lost_state_restarts_from_top_keeping_fields() {
    let (_dir, pool) = setup_db().await;
    let anonymizer = anon();
    let token = anonymizer.token(USER_ID);

    // Answer two steps, then simulate a transport restart: the
    // ephemeral state is gone, next event arrives with the default
    let o = send(&pool, &anonymizer, ChatState::Idle, "/start").await;
    let o = send(&pool, &anonymizer, o.state, GENDER_FEMALE_LABEL).await;
    send(&pool, &anonymizer, o.state, "25").await;

    let o = send(&pool, &anonymizer, ChatState::Idle, "hello again").await;
    assert_eq!(o.state, ChatState::Registering(RegStep::Gender));

    // Previously persisted fields survived the restart
    let row = respondent_row(&pool, &token).await;
    assert_eq!(row.get::<String, _>("gender"), "female");
    assert_eq!(row.get::<i64, _>("age"), 25);
}
