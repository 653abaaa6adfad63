//! Registration state machine
//!
//! Collects the respondent profile before survey access:
//! gender → age → occupation → {course | experience} → complete.
//!
//! Invalid input re-prompts in the same state with unlimited retries.
//! Every accepted answer is persisted immediately, so a crash leaves a
//! partially filled, still-incomplete profile; on next contact the
//! flow re-enters at the gender step (persisted fields are simply
//! overwritten as the respondent answers again).

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use murmur_common::Result;

use crate::db::respondents;
use crate::render::{self, Keyboard, Reply};

/// Registration step currently awaiting input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegStep {
    Gender,
    Age,
    Occupation,
    Course,
    Experience,
}

/// Result of feeding one inbound message to the machine
#[derive(Debug)]
pub struct RegOutcome {
    pub reply: Reply,
    /// Next awaited step; `None` once the profile is complete
    pub next: Option<RegStep>,
}

impl RegOutcome {
    fn stay(step: RegStep, reply: Reply) -> Self {
        Self {
            reply,
            next: Some(step),
        }
    }
}

/// Prompt shown when registration (re-)enters at the first step
pub fn entry_prompt() -> Reply {
    Reply::new(
        "Hi! Before the survey, a few quick questions about you.\n\
         All answers are stored anonymously.\n\nWhat is your gender?",
        Keyboard::Gender,
    )
}

fn age_prompt() -> Reply {
    Reply::new("How old are you?", Keyboard::Remove)
}

fn occupation_prompt() -> Reply {
    Reply::new("What do you do?", Keyboard::Occupation)
}

fn course_prompt() -> Reply {
    Reply::new("Which course year are you in?", Keyboard::Course)
}

fn experience_prompt() -> Reply {
    Reply::new(
        "How many years have you worked in your field?",
        Keyboard::Remove,
    )
}

/// Prompt for a given step, for re-asking without validation (e.g.
/// after a non-text event while registering)
pub fn step_prompt(step: RegStep) -> Reply {
    match step {
        RegStep::Gender => Reply::new("What is your gender?", Keyboard::Gender),
        RegStep::Age => age_prompt(),
        RegStep::Occupation => occupation_prompt(),
        RegStep::Course => course_prompt(),
        RegStep::Experience => experience_prompt(),
    }
}

fn completion_reply() -> Reply {
    Reply::menu("Thanks, your profile is complete! Pick an action from the menu.")
}

/// Feed one inbound text message to the machine at the given step.
///
/// Each successful transition persists its field before the next
/// prompt is returned.
pub async fn handle_step(
    pool: &SqlitePool,
    token: &str,
    step: RegStep,
    input: &str,
) -> Result<RegOutcome> {
    match step {
        RegStep::Gender => match render::gender_from_label(input) {
            Some(gender) => {
                respondents::set_gender(pool, token, gender).await?;
                Ok(RegOutcome::stay(RegStep::Age, age_prompt()))
            }
            None => Ok(RegOutcome::stay(
                RegStep::Gender,
                Reply::new(
                    "Please choose one of the two options on the keyboard.",
                    Keyboard::Gender,
                ),
            )),
        },

        RegStep::Age => match input.trim().parse::<i64>() {
            Err(_) => Ok(RegOutcome::stay(
                RegStep::Age,
                Reply::new("Please enter your age as a number.", Keyboard::Remove),
            )),
            Ok(age) if !(16..=100).contains(&age) => Ok(RegOutcome::stay(
                RegStep::Age,
                Reply::new(
                    "Please enter an age between 16 and 100.",
                    Keyboard::Remove,
                ),
            )),
            Ok(age) => {
                respondents::set_age(pool, token, age).await?;
                Ok(RegOutcome::stay(RegStep::Occupation, occupation_prompt()))
            }
        },

        RegStep::Occupation => match render::occupation_from_label(input) {
            Some(occupation) => {
                respondents::set_occupation(pool, token, occupation).await?;
                let outcome = match occupation {
                    murmur_common::db::Occupation::Student => {
                        RegOutcome::stay(RegStep::Course, course_prompt())
                    }
                    murmur_common::db::Occupation::Worker => {
                        RegOutcome::stay(RegStep::Experience, experience_prompt())
                    }
                };
                Ok(outcome)
            }
            None => Ok(RegOutcome::stay(
                RegStep::Occupation,
                Reply::new(
                    "Please choose one of the options on the keyboard.",
                    Keyboard::Occupation,
                ),
            )),
        },

        RegStep::Course => match input.trim().parse::<i64>() {
            Ok(course) if (1..=6).contains(&course) => {
                respondents::set_course(pool, token, course).await?;
                debug!(
                    "registration complete (student) for token prefix {}",
                    &token[..token.len().min(8)]
                );
                Ok(RegOutcome {
                    reply: completion_reply(),
                    next: None,
                })
            }
            _ => Ok(RegOutcome::stay(
                RegStep::Course,
                Reply::new("Please pick a course year from 1 to 6.", Keyboard::Course),
            )),
        },

        RegStep::Experience => match input.trim().parse::<i64>() {
            Ok(years) if (0..=60).contains(&years) => {
                respondents::set_experience(pool, token, years).await?;
                debug!(
                    "registration complete (worker) for token prefix {}",
                    &token[..token.len().min(8)]
                );
                Ok(RegOutcome {
                    reply: completion_reply(),
                    next: None,
                })
            }
            _ => Ok(RegOutcome::stay(
                RegStep::Experience,
                Reply::new(
                    "Please enter years of experience from 0 to 60.",
                    Keyboard::Remove,
                ),
            )),
        },
    }
}
