//! Recognized menu commands
//!
//! A closed enumeration of everything the main menu understands.
//! Inbound text resolves to a command by exact match against either
//! the slash form or the rendered button label; anything else is not
//! a command. Labels are presentation only.

/// Commands the conversation accepts outside of answering a question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// First contact / return to the menu
    Start,
    /// Begin (or resume) the active survey
    BeginSurvey,
    /// Show the anonymized profile summary
    MyProfile,
    /// Show completed / in-progress session counts
    MySurveys,
    /// Short note on how anonymity works
    Info,
    /// Abandon the current survey session
    Cancel,
}

impl Command {
    /// Button label shown on the main menu keyboard
    pub fn label(&self) -> &'static str {
        match self {
            Command::Start => "/start",
            Command::BeginSurvey => "📝 Start survey",
            Command::MyProfile => "👤 My profile",
            Command::MySurveys => "📊 My surveys",
            Command::Info => "ℹ️ Info",
            Command::Cancel => "❌ Cancel survey",
        }
    }

    /// Resolve inbound text to a command, exact match only
    pub fn from_input(text: &str) -> Option<Command> {
        match text {
            "/start" => Some(Command::Start),
            "/cancel" => Some(Command::Cancel),
            t if t == Command::BeginSurvey.label() => Some(Command::BeginSurvey),
            t if t == Command::MyProfile.label() => Some(Command::MyProfile),
            t if t == Command::MySurveys.label() => Some(Command::MySurveys),
            t if t == Command::Info.label() => Some(Command::Info),
            t if t == Command::Cancel.label() => Some(Command::Cancel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_commands_resolve() {
        assert_eq!(Command::from_input("/start"), Some(Command::Start));
        assert_eq!(Command::from_input("/cancel"), Some(Command::Cancel));
    }

    #[test]
    fn test_labels_resolve() {
        for cmd in [
            Command::BeginSurvey,
            Command::MyProfile,
            Command::MySurveys,
            Command::Info,
            Command::Cancel,
        ] {
            assert_eq!(Command::from_input(cmd.label()), Some(cmd));
        }
    }

    #[test]
    fn test_no_substring_matching() {
        // A label embedded in a longer answer is ordinary text
        assert_eq!(Command::from_input("please 📝 Start survey now"), None);
        assert_eq!(Command::from_input("start survey"), None);
        assert_eq!(Command::from_input("📝 start survey"), None);
    }
}
