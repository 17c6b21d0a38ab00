//! Symbolic classification of a single frame's hand pose.

use serde::{Serialize, Serializer};

/// Text-editing gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Close the current word and append a separator.
    Space,
    /// Backspace.
    Delete,
    /// Close the current word without a separator.
    Finish,
}

impl Control {
    pub fn label(&self) -> &'static str {
        match self {
            Control::Space => "SPACE",
            Control::Delete => "DELETE",
            Control::Finish => "FINISH",
        }
    }
}

/// The classification of one frame.
///
/// Serialises as its textual form (`"A"`, `"7"`, `"HELLO"`, `"SPACE"`,
/// `"Unknown"`), which is also what exercise targets are compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Token {
    /// `A`–`Z`.
    Letter(char),
    /// `0`–`9`.
    Digit(char),
    /// A whole-word sign such as `HELLO` or `THANK YOU`.
    Mannerism(&'static str),
    Control(Control),
    /// No pattern matched, or no hand in frame.
    #[default]
    Unknown,
}

impl Token {
    /// `true` for tokens that append text (letters, digits, mannerisms).
    pub fn is_symbol(&self) -> bool {
        matches!(
            self,
            Token::Letter(_) | Token::Digit(_) | Token::Mannerism(_)
        )
    }

    /// The text appended to the current word when this token is committed.
    ///
    /// `None` for control gestures and `Unknown`.
    pub fn text(&self) -> Option<String> {
        match self {
            Token::Letter(c) | Token::Digit(c) => Some(c.to_string()),
            Token::Mannerism(name) => Some((*name).to_string()),
            Token::Control(_) | Token::Unknown => None,
        }
    }

    /// The letter carried by a `Letter` token.
    pub fn letter(&self) -> Option<char> {
        match self {
            Token::Letter(c) => Some(*c),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Letter(c) | Token::Digit(c) => write!(f, "{c}"),
            Token::Mannerism(name) => f.write_str(name),
            Token::Control(control) => f.write_str(control.label()),
            Token::Unknown => f.write_str("Unknown"),
        }
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textual_forms() {
        assert_eq!(Token::Letter('A').to_string(), "A");
        assert_eq!(Token::Digit('7').to_string(), "7");
        assert_eq!(Token::Mannerism("THANK YOU").to_string(), "THANK YOU");
        assert_eq!(Token::Control(Control::Space).to_string(), "SPACE");
        assert_eq!(Token::Control(Control::Delete).to_string(), "DELETE");
        assert_eq!(Token::Control(Control::Finish).to_string(), "FINISH");
        assert_eq!(Token::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn only_symbols_carry_text() {
        assert_eq!(Token::Letter('C').text().as_deref(), Some("C"));
        assert_eq!(Token::Mannerism("HELLO").text().as_deref(), Some("HELLO"));
        assert!(Token::Control(Control::Finish).text().is_none());
        assert!(Token::Unknown.text().is_none());
        assert!(!Token::Unknown.is_symbol());
    }

    #[test]
    fn serialises_as_label() {
        assert_eq!(
            serde_json::to_string(&Token::Control(Control::Space)).unwrap(),
            "\"SPACE\""
        );
        assert_eq!(serde_json::to_string(&Token::Unknown).unwrap(), "\"Unknown\"");
    }
}
