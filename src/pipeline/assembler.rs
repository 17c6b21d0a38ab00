//! Word / sentence buffers driven by committed tokens.
//!
//! | Event   | Effect                                                    |
//! |---------|-----------------------------------------------------------|
//! | SPACE   | non-empty word → `completed += word + " "`, word cleared  |
//! | DELETE  | pop from word, else pop from completed text, else no-op   |
//! | FINISH  | non-empty word → `completed += word`, word cleared        |
//! | symbol  | `word += text`                                            |

use serde::Serialize;

use crate::gesture::{Control, Token};

/// The in-progress word and the finalised text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBuffer {
    pub current_word: String,
    pub completed_text: String,
}

impl TextBuffer {
    pub fn is_empty(&self) -> bool {
        self.current_word.is_empty() && self.completed_text.is_empty()
    }
}

/// Applies committed tokens to a [`TextBuffer`].
#[derive(Debug, Clone, Default)]
pub struct TextAssembler {
    buffer: TextBuffer,
}

impl TextAssembler {
    /// Word separator appended on SPACE.
    pub const SEPARATOR: char = ' ';

    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from an earlier session's text.
    pub fn with_buffer(buffer: TextBuffer) -> Self {
        Self { buffer }
    }

    /// Apply one committed token.  Returns `true` when the buffer changed.
    pub fn apply(&mut self, token: &Token) -> bool {
        let buf = &mut self.buffer;
        match token {
            Token::Control(Control::Space) => {
                if buf.current_word.is_empty() {
                    return false;
                }
                buf.completed_text.push_str(&buf.current_word);
                buf.completed_text.push(Self::SEPARATOR);
                buf.current_word.clear();
                true
            }
            Token::Control(Control::Delete) => {
                buf.current_word.pop().is_some() || buf.completed_text.pop().is_some()
            }
            Token::Control(Control::Finish) => {
                if buf.current_word.is_empty() {
                    return false;
                }
                let word = std::mem::take(&mut buf.current_word);
                buf.completed_text.push_str(&word);
                true
            }
            Token::Letter(_) | Token::Digit(_) | Token::Mannerism(_) => match token.text() {
                Some(text) => {
                    buf.current_word.push_str(&text);
                    true
                }
                None => false,
            },
            Token::Unknown => false,
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer = TextBuffer::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPACE: Token = Token::Control(Control::Space);
    const DELETE: Token = Token::Control(Control::Delete);
    const FINISH: Token = Token::Control(Control::Finish);

    fn spell(asm: &mut TextAssembler, word: &str) {
        for c in word.chars() {
            asm.apply(&Token::Letter(c));
        }
    }

    #[test]
    fn space_then_delete_round_trip() {
        let mut asm = TextAssembler::new();
        spell(&mut asm, "CAT");
        assert_eq!(asm.buffer().current_word, "CAT");

        assert!(asm.apply(&SPACE));
        assert_eq!(asm.buffer().completed_text, "CAT ");
        assert_eq!(asm.buffer().current_word, "");

        assert!(asm.apply(&DELETE));
        assert_eq!(asm.buffer().completed_text, "CAT");
        assert_eq!(asm.buffer().current_word, "");
    }

    #[test]
    fn delete_on_empty_buffers_is_noop() {
        let mut asm = TextAssembler::new();
        assert!(!asm.apply(&DELETE));
        assert!(asm.buffer().is_empty());
    }

    #[test]
    fn delete_prefers_current_word() {
        let mut asm = TextAssembler::new();
        spell(&mut asm, "HI");
        asm.apply(&SPACE);
        spell(&mut asm, "YO");
        asm.apply(&DELETE);
        assert_eq!(asm.buffer().current_word, "Y");
        assert_eq!(asm.buffer().completed_text, "HI ");
    }

    #[test]
    fn finish_appends_without_separator() {
        let mut asm = TextAssembler::new();
        spell(&mut asm, "DOG");
        assert!(asm.apply(&FINISH));
        assert_eq!(asm.buffer().completed_text, "DOG");
        assert_eq!(asm.buffer().current_word, "");
    }

    #[test]
    fn space_and_finish_on_empty_word_do_nothing() {
        let mut asm = TextAssembler::new();
        assert!(!asm.apply(&SPACE));
        assert!(!asm.apply(&FINISH));
        assert!(asm.buffer().is_empty());
    }

    #[test]
    fn digits_and_mannerisms_append_their_text() {
        let mut asm = TextAssembler::new();
        asm.apply(&Token::Digit('7'));
        asm.apply(&Token::Mannerism("HELLO"));
        assert_eq!(asm.buffer().current_word, "7HELLO");
        assert!(!asm.apply(&Token::Unknown));
    }

    /// Replaying the same events on a fresh assembler gives the same buffer.
    #[test]
    fn replay_is_deterministic() {
        let events = [
            Token::Letter('C'),
            Token::Letter('A'),
            Token::Letter('T'),
            SPACE,
            Token::Letter('D'),
            DELETE,
            DELETE,
            Token::Digit('2'),
            FINISH,
        ];
        let run = || {
            let mut asm = TextAssembler::new();
            for e in &events {
                asm.apply(e);
            }
            asm.buffer().clone()
        };
        let first = run();
        assert_eq!(first, run());
        assert_eq!(first.completed_text, "CAT2");
    }

    #[test]
    fn reset_clears_both_fields() {
        let mut asm = TextAssembler::new();
        spell(&mut asm, "AB");
        asm.apply(&SPACE);
        spell(&mut asm, "C");
        asm.reset();
        assert!(asm.buffer().is_empty());
    }
}
