//! Render descriptors and user-facing presentation
//!
//! Everything the respondent sees lives here: prompt strings, button
//! labels, and the keyboard descriptors the transport adapter turns
//! into platform widgets. The rest of the service works on canonical
//! enum values only; label text is presentation and is matched
//! byte-for-byte when it comes back as input.

use serde::{Deserialize, Serialize};

use murmur_common::db::{Gender, Occupation, QuestionOption, Respondent};

/// Fixed label interpreted as "no answer" on non-required questions.
///
/// Compared byte-for-byte against inbound text. A genuine answer equal
/// to this label on a non-required question is indistinguishable from
/// a skip; on a required question the affordance is never rendered and
/// the label is stored as an ordinary answer.
pub const SKIP_LABEL: &str = "⏭ Skip";

pub const GENDER_MALE_LABEL: &str = "👨 Male";
pub const GENDER_FEMALE_LABEL: &str = "👩 Female";

pub const OCCUPATION_STUDENT_LABEL: &str = "🎓 University student";
pub const OCCUPATION_WORKER_LABEL: &str = "💼 Working professional";

/// Gender presentation label
pub fn gender_label(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => GENDER_MALE_LABEL,
        Gender::Female => GENDER_FEMALE_LABEL,
    }
}

/// Resolve an inbound label back to its canonical gender, exact match only
pub fn gender_from_label(text: &str) -> Option<Gender> {
    match text {
        GENDER_MALE_LABEL => Some(Gender::Male),
        GENDER_FEMALE_LABEL => Some(Gender::Female),
        _ => None,
    }
}

/// Occupation presentation label
pub fn occupation_label(occupation: Occupation) -> &'static str {
    match occupation {
        Occupation::Student => OCCUPATION_STUDENT_LABEL,
        Occupation::Worker => OCCUPATION_WORKER_LABEL,
    }
}

/// Resolve an inbound label back to its canonical occupation, exact match only
pub fn occupation_from_label(text: &str) -> Option<Occupation> {
    match text {
        OCCUPATION_STUDENT_LABEL => Some(Occupation::Student),
        OCCUPATION_WORKER_LABEL => Some(Occupation::Worker),
        _ => None,
    }
}

/// Choice affordance set attached to an outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Keyboard {
    /// Main menu buttons
    MainMenu,
    /// Two gender labels
    Gender,
    /// Two occupation labels
    Occupation,
    /// Course year buttons 1..=6
    Course,
    /// Question option labels in order, plus the skip button when the
    /// question is not required
    Choices {
        options: Vec<String>,
        allow_skip: bool,
    },
    /// Only the skip button (non-required text/voice questions)
    Skip,
    /// No buttons; plain input expected
    Remove,
}

/// One outbound message: prompt text plus choice affordances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    pub fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }

    /// Plain text message with the main menu attached
    pub fn menu(text: impl Into<String>) -> Self {
        Self::new(text, Keyboard::MainMenu)
    }
}

/// Keyboard for a survey question's options
pub fn choices_keyboard(options: &[QuestionOption], required: bool) -> Keyboard {
    Keyboard::Choices {
        options: options.iter().map(|o| o.text.clone()).collect(),
        allow_skip: !required,
    }
}

/// Profile summary shown from the main menu
pub fn profile_summary(respondent: &Respondent) -> String {
    let gender = respondent
        .gender
        .map(gender_label)
        .unwrap_or("not specified");
    let age = respondent
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "not specified".to_string());
    let occupation = match (
        respondent.occupation,
        respondent.course_number,
        respondent.experience_years,
    ) {
        (Some(Occupation::Student), Some(course), _) => {
            format!("Student, year {}", course)
        }
        (Some(Occupation::Worker), _, Some(years)) => {
            format!("Working ({} years of experience)", years)
        }
        (Some(occupation), _, _) => occupation_label(occupation).to_string(),
        (None, _, _) => "not specified".to_string(),
    };

    format!(
        "👤 Your profile\n\nGender: {}\nAge: {}\nOccupation: {}\n\n\
         You are identified only by an anonymous token.",
        gender, age, occupation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_label_round_trips() {
        for g in [Gender::Male, Gender::Female] {
            assert_eq!(gender_from_label(gender_label(g)), Some(g));
        }
        for o in [Occupation::Student, Occupation::Worker] {
            assert_eq!(occupation_from_label(occupation_label(o)), Some(o));
        }
    }

    #[test]
    fn test_label_matching_is_exact() {
        // Case or whitespace variants never resolve
        assert_eq!(gender_from_label("👨 male"), None);
        assert_eq!(gender_from_label("Male"), None);
        assert_eq!(occupation_from_label(" 🎓 University student"), None);
    }

    #[test]
    fn test_profile_summary_branches() {
        let mut respondent = Respondent {
            token: "t".to_string(),
            gender: Some(Gender::Female),
            age: Some(21),
            occupation: Some(Occupation::Student),
            course_number: Some(3),
            experience_years: None,
            profile_complete: true,
            created_at: Utc::now(),
        };
        assert!(profile_summary(&respondent).contains("Student, year 3"));

        respondent.occupation = Some(Occupation::Worker);
        respondent.course_number = None;
        respondent.experience_years = Some(7);
        assert!(profile_summary(&respondent).contains("7 years of experience"));

        respondent.occupation = None;
        respondent.experience_years = None;
        assert!(profile_summary(&respondent).contains("not specified"));
    }
}
