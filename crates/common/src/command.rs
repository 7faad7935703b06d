// Message command grammar.
//
// Prefixes are checked in a fixed order and the first match wins:
// `/me`, `/describe`, `/nick ` (trailing space required), otherwise speech.
// `/me` has no word boundary, so `/meow` is an action reading "ow".

use serde::{Deserialize, Serialize};

const ACTION_PREFIX: &str = "/me";
const DESCRIBE_PREFIX: &str = "/describe";
const RENAME_PREFIX: &str = "/nick ";

/// A message's content, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/me sips cocoa` → the author performs an action.
    Action(String),
    /// `/describe Snow falls.` → narration without an author.
    Describe(String),
    /// `/nick New Name` → the author changes display name.
    Rename(String),
    /// Anything else is spoken by the author.
    Speech(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Action,
    Describe,
    Rename,
    Speech,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Action(_) => CommandKind::Action,
            Self::Describe(_) => CommandKind::Describe,
            Self::Rename(_) => CommandKind::Rename,
            Self::Speech(_) => CommandKind::Speech,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Action(text) | Self::Describe(text) | Self::Rename(text) | Self::Speech(text) => {
                text
            }
        }
    }
}

pub fn interpret(content: &str) -> Command {
    if let Some(rest) = content.strip_prefix(ACTION_PREFIX) {
        return Command::Action(rest.trim().to_string());
    }
    if let Some(rest) = content.strip_prefix(DESCRIBE_PREFIX) {
        return Command::Describe(rest.trim().to_string());
    }
    if let Some(rest) = content.strip_prefix(RENAME_PREFIX) {
        return Command::Rename(rest.trim().to_string());
    }
    Command::Speech(content.to_string())
}

/// Whitespace-only input is never submitted.
pub fn is_blank(content: &str) -> bool {
    content.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_speech_verbatim() {
        assert_eq!(interpret("  hello there "), Command::Speech("  hello there ".into()));
    }

    #[test]
    fn me_prefix_is_action() {
        assert_eq!(interpret("/me sips cocoa"), Command::Action("sips cocoa".into()));
        assert_eq!(interpret("/me"), Command::Action(String::new()));
    }

    #[test]
    fn me_prefix_has_no_word_boundary() {
        assert_eq!(interpret("/meow"), Command::Action("ow".into()));
    }

    #[test]
    fn describe_prefix_is_describe() {
        assert_eq!(
            interpret("/describe  Jingling commences! "),
            Command::Describe("Jingling commences!".into())
        );
    }

    #[test]
    fn nick_requires_trailing_space() {
        assert_eq!(interpret("/nick Holly "), Command::Rename("Holly".into()));
        assert_eq!(interpret("/nick"), Command::Speech("/nick".into()));
        assert_eq!(interpret("/nickname x"), Command::Speech("/nickname x".into()));
    }

    #[test]
    fn prefixes_are_case_sensitive_and_anchored() {
        assert_eq!(interpret("/ME waves"), Command::Speech("/ME waves".into()));
        assert_eq!(interpret(" /me waves"), Command::Speech(" /me waves".into()));
    }

    #[test]
    fn kind_and_text_accessors() {
        let command = interpret("/describe snow");
        assert_eq!(command.kind(), CommandKind::Describe);
        assert_eq!(command.text(), "snow");
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank(" \t\n"));
        assert!(!is_blank(" x "));
    }
}
