//! Survey progression engine
//!
//! Drives a session question by question in ascending position:
//! validates each answer against the current question's type, persists
//! at most one response per answered question, and advances until no
//! question remains (`completed`) or the respondent cancels
//! (`abandoned`).
//!
//! No path leaves an awaiting state without a persisted response, a
//! recorded skip, or an abandonment. Response insert and pointer
//! advance happen inside one transaction per inbound event, so a crash
//! between them cannot produce a duplicate or lost answer.

use sqlx::SqlitePool;
use tracing::{info, warn};

use murmur_common::db::{AnswerPayload, Question, QuestionType, Session, SessionStatus, Survey};
use murmur_common::Result;

use crate::db::{catalog, sessions};
use crate::render::{self, Keyboard, Reply, SKIP_LABEL};

/// Outcome of starting a survey for a respondent
#[derive(Debug)]
pub enum StartOutcome {
    /// Session opened on the first question
    Started { survey: Survey, prompt: Reply },
    /// No survey has `active == true`; nothing was created
    NoActiveSurvey,
    /// The active survey has zero questions; the session was created
    /// and immediately abandoned. Reported as a "try later" condition.
    EmptySurvey { survey: Survey },
}

/// Outcome of submitting one answer
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Answer accepted (or legitimately skipped); here is the next prompt
    Advanced(Reply),
    /// Answer accepted and no further question exists
    Completed(Reply),
    /// Validation failed; same state, same question
    Reprompt(Reply),
}

/// Inbound answer content, as delivered by the transport
#[derive(Debug, Clone, Copy)]
pub enum AnswerInput<'a> {
    Text(&'a str),
    /// Opaque attachment reference; bytes stay on the platform
    Voice(&'a str),
}

/// Start the active survey for a respondent.
///
/// Among multiple active surveys the newest wins (see
/// [`catalog::active_survey`]).
pub async fn start_survey(pool: &SqlitePool, token: &str) -> Result<StartOutcome> {
    let Some(survey) = catalog::active_survey(pool).await? else {
        return Ok(StartOutcome::NoActiveSurvey);
    };

    let first = catalog::first_question(pool, &survey.guid).await?;

    // All session writes for this event commit together; no observable
    // state has a `started` session without its question pointer
    let mut tx = pool.begin().await?;

    let session_guid = sessions::create(&mut *tx, token, &survey.guid).await?;

    let Some(first) = first else {
        // Zero questions: never leave the session dangling
        warn!(survey = %survey.guid, "active survey has no questions, abandoning session");
        sessions::set_status(&mut *tx, &session_guid, SessionStatus::Abandoned).await?;
        tx.commit().await?;
        return Ok(StartOutcome::EmptySurvey { survey });
    };

    sessions::set_current_question(&mut *tx, &session_guid, Some(&first.guid)).await?;
    sessions::set_status(&mut *tx, &session_guid, SessionStatus::InProgress).await?;
    tx.commit().await?;

    info!(survey = %survey.guid, session = %session_guid, "survey started");

    let prompt = present_question(pool, &first).await?;
    Ok(StartOutcome::Started { survey, prompt })
}

/// Render descriptor for a question: prompt text with its 1-based
/// display index, plus the matching choice/skip affordances. Required
/// questions never get a skip affordance. No persistence.
pub async fn present_question(pool: &SqlitePool, question: &Question) -> Result<Reply> {
    let index = catalog::question_index(pool, question).await?;
    let total = catalog::question_count(pool, &question.survey_guid).await?;
    let text = format!("Question {}/{}\n\n{}", index, total, question.text);

    let keyboard = match question.question_type {
        QuestionType::Choice => {
            let options = catalog::options(pool, &question.guid).await?;
            render::choices_keyboard(&options, question.required)
        }
        QuestionType::Text | QuestionType::Voice => {
            if question.required {
                Keyboard::Remove
            } else {
                Keyboard::Skip
            }
        }
    };

    Ok(Reply::new(text, keyboard))
}

/// Validate one answer against the session's current question and, on
/// success, persist it and advance.
pub async fn submit_answer(
    pool: &SqlitePool,
    session: &Session,
    input: AnswerInput<'_>,
) -> Result<SubmitOutcome> {
    let question_guid = session.current_question_guid.as_deref().ok_or_else(|| {
        murmur_common::Error::NotFound(format!("session {} has no current question", session.guid))
    })?;
    let question = catalog::question(pool, question_guid).await?;

    match question.question_type {
        QuestionType::Text => match input {
            AnswerInput::Text(text) if text == SKIP_LABEL && !question.required => {
                advance(pool, session, &question, None).await
            }
            // Stored verbatim; on a required question this includes
            // text that happens to equal the skip label
            AnswerInput::Text(text) => {
                advance(
                    pool,
                    session,
                    &question,
                    Some(AnswerPayload::Text(text.to_string())),
                )
                .await
            }
            AnswerInput::Voice(_) => {
                let mut reply = present_question(pool, &question).await?;
                reply.text = format!("Please answer with a text message.\n\n{}", reply.text);
                Ok(SubmitOutcome::Reprompt(reply))
            }
        },

        QuestionType::Choice => match input {
            AnswerInput::Text(text) if text == SKIP_LABEL && !question.required => {
                advance(pool, session, &question, None).await
            }
            AnswerInput::Text(text) => {
                match catalog::option_by_text(pool, &question.guid, text).await? {
                    Some(option) => {
                        advance(
                            pool,
                            session,
                            &question,
                            Some(AnswerPayload::SelectedOption(option.guid)),
                        )
                        .await
                    }
                    None => {
                        let options = catalog::options(pool, &question.guid).await?;
                        Ok(SubmitOutcome::Reprompt(Reply::new(
                            "That is not one of the options. Please pick an answer \
                             from the keyboard.",
                            render::choices_keyboard(&options, question.required),
                        )))
                    }
                }
            }
            AnswerInput::Voice(_) => {
                let options = catalog::options(pool, &question.guid).await?;
                Ok(SubmitOutcome::Reprompt(Reply::new(
                    "Please pick an answer from the keyboard.",
                    render::choices_keyboard(&options, question.required),
                )))
            }
        },

        QuestionType::Voice => match input {
            AnswerInput::Voice(file_ref) => {
                advance(
                    pool,
                    session,
                    &question,
                    Some(AnswerPayload::VoiceFileRef(file_ref.to_string())),
                )
                .await
            }
            AnswerInput::Text(text) if text == SKIP_LABEL && !question.required => {
                advance(pool, session, &question, None).await
            }
            AnswerInput::Text(_) => Ok(SubmitOutcome::Reprompt(Reply::new(
                "Please record a voice message to answer this question.",
                if question.required {
                    Keyboard::Remove
                } else {
                    Keyboard::Skip
                },
            ))),
        },
    }
}

/// Persist the answer (when present) and move the pointer to the next
/// question, or complete the session when none remains. One atomic
/// transaction per call.
async fn advance(
    pool: &SqlitePool,
    session: &Session,
    question: &Question,
    payload: Option<AnswerPayload>,
) -> Result<SubmitOutcome> {
    let next = catalog::next_question(pool, &session.survey_guid, question.position).await?;

    let mut tx = pool.begin().await?;

    if let Some(payload) = payload {
        sessions::insert_response(&mut *tx, &session.guid, &question.guid, &payload).await?;
    }

    match next {
        Some(next_question) => {
            sessions::set_current_question(&mut *tx, &session.guid, Some(&next_question.guid))
                .await?;
            tx.commit().await?;

            let prompt = present_question(pool, &next_question).await?;
            Ok(SubmitOutcome::Advanced(prompt))
        }
        None => {
            sessions::set_status(&mut *tx, &session.guid, SessionStatus::Completed).await?;
            tx.commit().await?;

            info!(session = %session.guid, "survey completed");
            Ok(SubmitOutcome::Completed(Reply::menu(
                "🎉 That was the last question — thank you for taking part!",
            )))
        }
    }
}

/// Explicit cancellation: mark the session abandoned. Responses
/// persisted so far are kept.
pub async fn abandon(pool: &SqlitePool, session: &Session) -> Result<()> {
    sessions::set_status(pool, &session.guid, SessionStatus::Abandoned).await?;
    info!(session = %session.guid, "survey abandoned");
    Ok(())
}
