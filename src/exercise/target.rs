//! Exercise targets and their validation.
//!
//! Targets arrive from the HTTP layer as loosely typed JSON
//! ([`ExerciseTargetRequest`]) and are only installed once they convert into
//! an [`ExerciseTarget`].  A rejected request leaves the previous target in
//! effect.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gesture::GestureTable;

// ---------------------------------------------------------------------------
// ExerciseKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    /// Sign a single letter.
    Alphabet,
    /// Sign a single digit.
    Number,
    /// Sign a whole-word mannerism such as `HELLO`.
    Mannerism,
    /// Sign every letter of a word, in any order.
    WordBuilding,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Alphabet => "alphabet",
            ExerciseKind::Number => "number",
            ExerciseKind::Mannerism => "mannerism",
            ExerciseKind::WordBuilding => "word_building",
        }
    }
}

impl std::str::FromStr for ExerciseKind {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alphabet" | "letter" => Ok(ExerciseKind::Alphabet),
            "number" | "digit" => Ok(ExerciseKind::Number),
            "mannerism" => Ok(ExerciseKind::Mannerism),
            "word_building" | "word" => Ok(ExerciseKind::WordBuilding),
            other => Err(TargetError::UnknownKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TargetError
// ---------------------------------------------------------------------------

/// Reasons an exercise target is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("unknown exercise kind {0:?}")]
    UnknownKind(String),

    #[error("exercise target is empty")]
    Empty,

    #[error("{target:?} is not a valid {kind} target")]
    InvalidSymbol { kind: ExerciseKind, target: String },

    #[error("word {0:?} must contain only the letters A-Z")]
    InvalidWord(String),

    #[error("letters {letters:?} do not match the letters of {target:?}")]
    LetterMismatch { target: String, letters: Vec<char> },
}

// ---------------------------------------------------------------------------
// ExerciseTarget
// ---------------------------------------------------------------------------

/// A validated exercise target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseTarget {
    kind: ExerciseKind,
    target: String,
    required_letters: BTreeSet<char>,
}

impl ExerciseTarget {
    /// Validate and normalise (trimmed, upper-case) a target.
    pub fn new(kind: ExerciseKind, target: &str) -> Result<Self, TargetError> {
        let target = target.trim().to_ascii_uppercase();
        if target.is_empty() {
            return Err(TargetError::Empty);
        }

        let invalid = || TargetError::InvalidSymbol {
            kind,
            target: target.clone(),
        };
        let single = |pred: fn(&char) -> bool| {
            let mut chars = target.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if pred(&c))
        };

        let required_letters = match kind {
            ExerciseKind::Alphabet => {
                if !single(char::is_ascii_uppercase) {
                    return Err(invalid());
                }
                BTreeSet::new()
            }
            ExerciseKind::Number => {
                if !single(char::is_ascii_digit) {
                    return Err(invalid());
                }
                BTreeSet::new()
            }
            ExerciseKind::Mannerism => {
                if GestureTable::standard().mannerism(&target).is_none() {
                    return Err(invalid());
                }
                BTreeSet::new()
            }
            ExerciseKind::WordBuilding => {
                if !target.chars().all(|c| c.is_ascii_uppercase()) {
                    return Err(TargetError::InvalidWord(target));
                }
                target.chars().collect()
            }
        };

        Ok(Self {
            kind,
            target,
            required_letters,
        })
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    /// Normalised target text.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Distinct letters of a word-building target; empty for other kinds.
    pub fn required_letters(&self) -> &BTreeSet<char> {
        &self.required_letters
    }
}

// ---------------------------------------------------------------------------
// ExerciseTargetRequest
// ---------------------------------------------------------------------------

/// Wire form of `POST /api/set-exercise-target`.
///
/// ```json
/// { "type": "word_building", "target": "cat", "letters": ["C", "A", "T"] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseTargetRequest {
    #[serde(alias = "type")]
    pub kind: String,
    pub target: String,
    /// Optional explicit letter list; must name exactly the target's letters.
    #[serde(default)]
    pub letters: Option<Vec<char>>,
}

impl TryFrom<ExerciseTargetRequest> for ExerciseTarget {
    type Error = TargetError;

    fn try_from(req: ExerciseTargetRequest) -> Result<Self, Self::Error> {
        let kind: ExerciseKind = req.kind.parse()?;
        let target = ExerciseTarget::new(kind, &req.target)?;

        if let Some(letters) = req.letters {
            let given: BTreeSet<char> = letters.iter().map(|c| c.to_ascii_uppercase()).collect();
            let expected: BTreeSet<char> = target.target.chars().filter(|c| *c != ' ').collect();
            if given != expected {
                return Err(TargetError::LetterMismatch {
                    target: target.target,
                    letters,
                });
            }
        }

        Ok(target)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
