//! Conversation dispatcher
//!
//! One entry point per inbound event kind (text, attachment, explicit
//! cancel). Each call resolves the respondent from the anonymized
//! token, routes the event to the registration machine or the
//! progression engine, and returns the outbound replies plus the next
//! macro state for the transport to hold.
//!
//! The macro state is ephemeral by design: the survey sub-state is
//! always re-derived from the durable session pointer, and a lost
//! registration state simply re-enters at the first step. Lookup
//! failures degrade to re-initiating the flow at the main menu rather
//! than surfacing as transport errors.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::warn;

use murmur_common::db::Respondent;
use murmur_common::{Anonymizer, Error, Result};

use crate::commands::Command;
use crate::db::{catalog, respondents, sessions};
use crate::progression::{self, AnswerInput, StartOutcome, SubmitOutcome};
use crate::registration::{self, RegStep};
use crate::render::{self, Reply};

/// Macro conversation state, held per chat by the transport adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "phase", content = "step", rename_all = "snake_case")]
pub enum ChatState {
    /// Main menu
    #[default]
    Idle,
    /// Registration in progress, awaiting the given step
    Registering(RegStep),
    /// Answering the active session's current question
    InSurvey,
}

/// Replies to deliver plus the next macro state
#[derive(Debug)]
pub struct Outcome {
    pub replies: Vec<Reply>,
    pub state: ChatState,
}

impl Outcome {
    fn one(reply: Reply, state: ChatState) -> Self {
        Self {
            replies: vec![reply],
            state,
        }
    }
}

/// Inbound text message
pub async fn handle_text(
    pool: &SqlitePool,
    anonymizer: &Anonymizer,
    platform_user_id: i64,
    state: ChatState,
    text: &str,
) -> Result<Outcome> {
    let token = anonymizer.token(platform_user_id);
    let respondent = respondents::get_or_create(pool, &token).await?;

    if !respondent.profile_complete {
        return match state {
            ChatState::Registering(step) => {
                let outcome = registration::handle_step(pool, &token, step, text).await?;
                let next = match outcome.next {
                    Some(step) => ChatState::Registering(step),
                    None => ChatState::Idle,
                };
                Ok(Outcome::one(outcome.reply, next))
            }
            // First contact, or state lost across a restart:
            // registration re-enters at the top
            _ => Ok(Outcome::one(
                registration::entry_prompt(),
                ChatState::Registering(RegStep::Gender),
            )),
        };
    }

    match state {
        // Transport state says registering but the profile is already
        // complete; fall back to the menu
        ChatState::Registering(_) => Ok(Outcome::one(
            Reply::menu("Your profile is already complete. Pick an action from the menu."),
            ChatState::Idle,
        )),

        ChatState::Idle => handle_menu_input(pool, &token, &respondent, text).await,

        ChatState::InSurvey => {
            if Command::from_input(text) == Some(Command::Cancel) {
                cancel_active(pool, &token).await
            } else {
                answer_active(pool, &token, AnswerInput::Text(text)).await
            }
        }
    }
}

/// Inbound attachment (voice message)
pub async fn handle_attachment(
    pool: &SqlitePool,
    anonymizer: &Anonymizer,
    platform_user_id: i64,
    state: ChatState,
    file_ref: &str,
) -> Result<Outcome> {
    let token = anonymizer.token(platform_user_id);
    let respondent = respondents::get_or_create(pool, &token).await?;

    if !respondent.profile_complete {
        return match state {
            ChatState::Registering(step) => {
                let mut reply = registration::step_prompt(step);
                reply.text = format!("Please answer with text.\n\n{}", reply.text);
                Ok(Outcome::one(reply, state))
            }
            _ => Ok(Outcome::one(
                registration::entry_prompt(),
                ChatState::Registering(RegStep::Gender),
            )),
        };
    }

    match state {
        ChatState::InSurvey => answer_active(pool, &token, AnswerInput::Voice(file_ref)).await,
        _ => Ok(Outcome::one(
            Reply::menu("Pick an action from the menu."),
            ChatState::Idle,
        )),
    }
}

/// Explicit cancel command
pub async fn handle_cancel(
    pool: &SqlitePool,
    anonymizer: &Anonymizer,
    platform_user_id: i64,
    state: ChatState,
) -> Result<Outcome> {
    let token = anonymizer.token(platform_user_id);
    let respondent = respondents::get_or_create(pool, &token).await?;

    if !respondent.profile_complete {
        // Cancelling mid-registration restarts it from the top
        let _ = state;
        return Ok(Outcome::one(
            registration::entry_prompt(),
            ChatState::Registering(RegStep::Gender),
        ));
    }

    cancel_active(pool, &token).await
}

/// Menu-state input: a recognized command or a nudge back to the menu
async fn handle_menu_input(
    pool: &SqlitePool,
    token: &str,
    respondent: &Respondent,
    text: &str,
) -> Result<Outcome> {
    match Command::from_input(text) {
        Some(Command::Start) => Ok(Outcome::one(
            Reply::menu("Welcome back! Pick an action from the menu."),
            ChatState::Idle,
        )),

        Some(Command::BeginSurvey) => begin_or_resume(pool, token).await,

        Some(Command::MyProfile) => Ok(Outcome::one(
            Reply::menu(render::profile_summary(respondent)),
            ChatState::Idle,
        )),

        Some(Command::MySurveys) => {
            let completed = sessions::count_by_status(
                pool,
                token,
                murmur_common::db::SessionStatus::Completed,
            )
            .await?;
            let in_progress = sessions::count_by_status(
                pool,
                token,
                murmur_common::db::SessionStatus::InProgress,
            )
            .await?;
            Ok(Outcome::one(
                Reply::menu(format!(
                    "📊 Your surveys\n\nCompleted: {}\nIn progress: {}",
                    completed, in_progress
                )),
                ChatState::Idle,
            ))
        }

        Some(Command::Info) => Ok(Outcome::one(
            Reply::menu(
                "This survey is anonymous. You are identified only by a one-way \
                 hash of your account id; nobody can recover who you are from \
                 your answers.",
            ),
            ChatState::Idle,
        )),

        Some(Command::Cancel) => cancel_active(pool, token).await,

        None => Ok(Outcome::one(
            Reply::menu("Please pick an action from the menu."),
            ChatState::Idle,
        )),
    }
}

/// Start the active survey, or resume an open session at its current
/// question
async fn begin_or_resume(pool: &SqlitePool, token: &str) -> Result<Outcome> {
    if let Some(session) = sessions::active_session(pool, token).await? {
        let current = match &session.current_question_guid {
            Some(guid) => catalog::question(pool, guid).await,
            None => Err(Error::NotFound(format!(
                "session {} has no current question",
                session.guid
            ))),
        };
        return match current {
            Ok(question) => {
                let prompt = progression::present_question(pool, &question).await?;
                Ok(Outcome {
                    replies: vec![
                        Reply::new(
                            "You already have a survey in progress — continuing where \
                             you left off.",
                            render::Keyboard::Remove,
                        ),
                        prompt,
                    ],
                    state: ChatState::InSurvey,
                })
            }
            Err(Error::NotFound(_)) => {
                // Orphaned pointer (question or survey edited away):
                // close the session and return to the menu
                warn!(session = %session.guid, "orphaned session, abandoning");
                progression::abandon(pool, &session).await?;
                Ok(Outcome::one(
                    Reply::menu(
                        "Your previous survey session could not be restored and was \
                         closed. You can start again from the menu.",
                    ),
                    ChatState::Idle,
                ))
            }
            Err(e) => Err(e),
        };
    }

    match progression::start_survey(pool, token).await? {
        StartOutcome::Started { survey, prompt } => {
            let intro = if survey.description.is_empty() {
                format!("📝 {}", survey.title)
            } else {
                format!("📝 {}\n\n{}", survey.title, survey.description)
            };
            Ok(Outcome {
                replies: vec![Reply::new(intro, render::Keyboard::Remove), prompt],
                state: ChatState::InSurvey,
            })
        }
        StartOutcome::NoActiveSurvey => Ok(Outcome::one(
            Reply::menu("There is no survey available right now. Please check back later."),
            ChatState::Idle,
        )),
        StartOutcome::EmptySurvey { .. } => Ok(Outcome::one(
            Reply::menu("The current survey is not ready yet. Please try again later."),
            ChatState::Idle,
        )),
    }
}

/// Submit an answer to the active session's current question
async fn answer_active(
    pool: &SqlitePool,
    token: &str,
    input: AnswerInput<'_>,
) -> Result<Outcome> {
    let Some(session) = sessions::active_session(pool, token).await? else {
        return Ok(Outcome::one(
            Reply::menu("You are not taking a survey right now. Pick an action from the menu."),
            ChatState::Idle,
        ));
    };

    match progression::submit_answer(pool, &session, input).await {
        Ok(SubmitOutcome::Advanced(reply)) => Ok(Outcome::one(reply, ChatState::InSurvey)),
        Ok(SubmitOutcome::Reprompt(reply)) => Ok(Outcome::one(reply, ChatState::InSurvey)),
        Ok(SubmitOutcome::Completed(reply)) => Ok(Outcome::one(reply, ChatState::Idle)),
        Err(Error::NotFound(what)) => {
            // Corrupted conversation context; close it out cleanly
            warn!(session = %session.guid, %what, "lookup failed mid-survey, abandoning");
            progression::abandon(pool, &session).await?;
            Ok(Outcome::one(
                Reply::menu(
                    "Something went wrong with your survey session, so it was closed. \
                     You can start again from the menu.",
                ),
                ChatState::Idle,
            ))
        }
        Err(e) => Err(e),
    }
}

/// Abandon the active session, if any
async fn cancel_active(pool: &SqlitePool, token: &str) -> Result<Outcome> {
    match sessions::active_session(pool, token).await? {
        Some(session) => {
            progression::abandon(pool, &session).await?;
            Ok(Outcome::one(
                Reply::menu("Survey cancelled. The answers you already gave are kept."),
                ChatState::Idle,
            ))
        }
        None => Ok(Outcome::one(
            Reply::menu("Nothing to cancel."),
            ChatState::Idle,
        )),
    }
}
