//! Checks committed tokens against the active exercise target.
//!
//! Single-symbol targets (alphabet / number / mannerism) complete on the
//! first committed token whose text equals the target.  Word-building
//! targets complete once every distinct letter of the word has been
//! committed, in any order; a letter outside the word, or one already
//! consumed, is a non-match and leaves progress untouched.
//!
//! An attempt completes at most once.  After that every token is a
//! non-match until a new target is installed.
//!
//! [`ExerciseMatcher::check_sign`] checks a raw finger pattern instead of a
//! committed token.  Every symbol sharing the pattern is a candidate, so a
//! target such as `A` (which the stream classifier reads as DELETE) can
//! still be completed by showing its sign.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::gesture::{FingerVector, GestureTable, Token};
use crate::pipeline::assembler::TextBuffer;
use crate::pipeline::state::unix_timestamp;

use super::target::{ExerciseKind, ExerciseTarget};

// ---------------------------------------------------------------------------
// CompletionEvent / MatchResult
// ---------------------------------------------------------------------------

/// Handed to the progress recorder when an exercise is completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    pub exercise_kind: ExerciseKind,
    pub target: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

/// Outcome of checking one committed token.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// A required letter was consumed; `remaining` letters are still needed.
    Accepted { letter: char, remaining: usize },
    /// The exercise is now complete.
    Completed(CompletionEvent),
    /// Wrong symbol, repeated letter, or the attempt is already complete.
    NoMatch,
}

// ---------------------------------------------------------------------------
// ExerciseView
// ---------------------------------------------------------------------------

/// Read-only exercise progress, published with every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseView {
    pub kind: ExerciseKind,
    pub target: String,
    pub required_letters: Vec<char>,
    pub consumed_letters: Vec<char>,
    pub complete: bool,
}

// ---------------------------------------------------------------------------
// ExerciseMatcher
// ---------------------------------------------------------------------------

/// Progress of one attempt at one target.
#[derive(Debug, Clone)]
pub struct ExerciseMatcher {
    target: ExerciseTarget,
    consumed: BTreeSet<char>,
    completed: bool,
}

impl ExerciseMatcher {
    pub fn new(target: ExerciseTarget) -> Self {
        Self {
            target,
            consumed: BTreeSet::new(),
            completed: false,
        }
    }

    pub fn check(&mut self, token: &Token) -> MatchResult {
        if self.completed {
            return MatchResult::NoMatch;
        }

        match self.target.kind() {
            ExerciseKind::WordBuilding => self.check_letter(token),
            ExerciseKind::Alphabet | ExerciseKind::Number | ExerciseKind::Mannerism => {
                if token.text().as_deref() == Some(self.target.target()) {
                    self.complete()
                } else {
                    MatchResult::NoMatch
                }
            }
        }
    }

    /// Check one shown pattern.  Returns the symbol it was read as: the
    /// candidate the target wants if there is one, otherwise the
    /// sign-check reading of the pattern.
    pub fn check_sign(&mut self, fingers: FingerVector) -> (Token, MatchResult) {
        let table = GestureTable::standard();
        let wanted = table
            .symbols_for(fingers)
            .into_iter()
            .find(|token| self.wants(token));
        match wanted {
            Some(token) => {
                let result = self.check(&token);
                (token, result)
            }
            None => (table.recognize_sign(fingers), MatchResult::NoMatch),
        }
    }

    fn wants(&self, token: &Token) -> bool {
        if self.completed {
            return false;
        }
        match self.target.kind() {
            ExerciseKind::WordBuilding => token.letter().is_some_and(|letter| {
                self.target.required_letters().contains(&letter)
                    && !self.consumed.contains(&letter)
            }),
            _ => token.text().as_deref() == Some(self.target.target()),
        }
    }

    fn check_letter(&mut self, token: &Token) -> MatchResult {
        let Some(letter) = token.letter() else {
            return MatchResult::NoMatch;
        };
        let required = self.target.required_letters();
        if !required.contains(&letter) || !self.consumed.insert(letter) {
            return MatchResult::NoMatch;
        }

        let remaining = required.len() - self.consumed.len();
        if remaining == 0 {
            self.complete()
        } else {
            MatchResult::Accepted { letter, remaining }
        }
    }

    fn complete(&mut self) -> MatchResult {
        self.completed = true;
        MatchResult::Completed(CompletionEvent {
            exercise_kind: self.target.kind(),
            target: self.target.target().to_string(),
            timestamp: unix_timestamp(),
        })
    }

    pub fn target(&self) -> &ExerciseTarget {
        &self.target
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn view(&self) -> ExerciseView {
        ExerciseView {
            kind: self.target.kind(),
            target: self.target.target().to_string(),
            required_letters: self.target.required_letters().iter().copied().collect(),
            consumed_letters: self.consumed.iter().copied().collect(),
            complete: self.completed,
        }
    }
}

/// `true` when the word being spelled equals `target_word` (case-insensitive).
pub fn word_matches(target_word: &str, buffer: &TextBuffer) -> bool {
    let target = target_word.trim();
    !target.is_empty() && buffer.current_word.eq_ignore_ascii_case(target)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
