//! Chooses the next exercise from a learner's progress.
//!
//! Progression:
//!
//! 1. A beginner with fewer than three completions walks the starter set:
//!    letter `A`, number `1`, mannerism `HELLO`.
//! 2. Fewer than three learned letters: the next unlearned letter, A to Z.
//! 3. Otherwise: a word spelled only from learned letters, asked of the
//!    configured [`WordSource`].  An unusable answer drops back to rule 2
//!    (or letter `A` once every letter is learned).

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ContentConfig;
use crate::gesture::{FingerVector, GestureTable, Token};

use super::fallback::{FallbackWordSource, StaticWordSource};
use super::progress::{Level, ProgressRecord};
use super::source::{ApiWordSource, WordRequest, WordSource};
use super::target::{ExerciseKind, ExerciseTarget, TargetError};

/// Completions needed before a beginner leaves the starter set.
const STARTER_EXERCISES: usize = 3;

/// Learned letters needed before word exercises are offered.
const LETTERS_FOR_WORDS: usize = 3;

/// A proposed exercise, as returned by `POST /api/next-exercise`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    pub target: String,
    pub description: String,
    /// Finger pattern to show the learner; `None` for words.
    pub pattern: Option<FingerVector>,
    /// Letters of a word exercise in spelling order; empty otherwise.
    pub letters: Vec<char>,
    pub level: Level,
}

impl Exercise {
    fn symbol(kind: ExerciseKind, token: Token, level: Level) -> Self {
        let target = token.to_string();
        let description = match kind {
            ExerciseKind::Alphabet => format!("Show the sign for letter {target}"),
            ExerciseKind::Number => format!("Show the sign for number {target}"),
            _ => format!("Show the sign for {target}"),
        };
        Self {
            kind,
            description,
            pattern: GestureTable::standard().pattern_of(&token),
            target,
            letters: Vec::new(),
            level,
        }
    }

    fn letter(letter: char, level: Level) -> Self {
        Self::symbol(ExerciseKind::Alphabet, Token::Letter(letter), level)
    }

    fn word(word: String, level: Level) -> Self {
        Self {
            kind: ExerciseKind::WordBuilding,
            description: format!("Spell the word \"{word}\" using sign language letters"),
            pattern: None,
            letters: word.chars().collect(),
            target: word,
            level,
        }
    }

    /// The validated target to install in the tracking service.
    pub fn to_target(&self) -> Result<ExerciseTarget, TargetError> {
        ExerciseTarget::new(self.kind, &self.target)
    }
}

/// Builds exercises; word content comes from a shared [`WordSource`].
pub struct ExerciseGenerator {
    words: Arc<dyn WordSource>,
}

impl ExerciseGenerator {
    pub fn new(words: Arc<dyn WordSource>) -> Self {
        Self { words }
    }

    /// Content service with built-in fallback when `config.enabled`,
    /// the built-in table alone otherwise.
    pub fn from_config(config: &ContentConfig) -> Self {
        if config.enabled {
            log::info!(
                "content: word service {} (model {})",
                config.base_url,
                config.model
            );
            Self::new(Arc::new(FallbackWordSource::new(ApiWordSource::from_config(
                config,
            ))))
        } else {
            Self::new(Arc::new(StaticWordSource::new()))
        }
    }

    pub async fn next_exercise(&self, progress: &ProgressRecord) -> Exercise {
        let level = progress.level;
        let completed = progress.completed_exercises.len();

        if level == Level::Beginner && completed < STARTER_EXERCISES {
            return match completed {
                0 => Exercise::letter('A', level),
                1 => Exercise::symbol(ExerciseKind::Number, Token::Digit('1'), level),
                _ => Exercise::symbol(ExerciseKind::Mannerism, Token::Mannerism("HELLO"), level),
            };
        }

        let learned = progress.learned_letters();
        if learned.len() < LETTERS_FOR_WORDS {
            return Exercise::letter(next_letter(&learned), level);
        }

        let request = WordRequest {
            level,
            completed,
            learned: learned.iter().copied().collect(),
        };
        match self.words.suggest_word(&request).await {
            Ok(word) if request.accepts(&word) => Exercise::word(word, level),
            Ok(word) => {
                log::warn!("exercise: unusable word {word:?}, offering a letter");
                Exercise::letter(next_letter(&learned), level)
            }
            Err(e) => {
                log::warn!("exercise: no word available ({e}), offering a letter");
                Exercise::letter(next_letter(&learned), level)
            }
        }
    }
}

/// First letter of the alphabet not yet learned; `A` when all are.
fn next_letter(learned: &BTreeSet<char>) -> char {
    ('A'..='Z').find(|c| !learned.contains(c)).unwrap_or('A')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::matcher::CompletionEvent;
    use crate::exercise::source::GeneratorError;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl WordSource for Fixed {
        async fn suggest_word(&self, _: &WordRequest) -> Result<String, GeneratorError> {
            Ok(self.0.to_string())
        }
    }

    struct Down;

    #[async_trait]
    impl WordSource for Down {
        async fn suggest_word(&self, _: &WordRequest) -> Result<String, GeneratorError> {
            Err(GeneratorError::Request("connection refused".into()))
        }
    }

    fn record(done: &[(ExerciseKind, &str)]) -> ProgressRecord {
        let mut record = ProgressRecord::default();
        for (kind, target) in done {
            record.apply(&CompletionEvent {
                exercise_kind: *kind,
                target: target.to_string(),
                timestamp: 0.0,
            });
        }
        record
    }

    fn generator() -> ExerciseGenerator {
        ExerciseGenerator::new(Arc::new(StaticWordSource::new()))
    }

    #[tokio::test]
    async fn starter_set_in_order() {
        let gen = generator();

        let first = gen.next_exercise(&record(&[])).await;
        assert_eq!((first.kind, first.target.as_str()), (ExerciseKind::Alphabet, "A"));
        assert!(first.pattern.is_some());

        let second = gen
            .next_exercise(&record(&[(ExerciseKind::Alphabet, "A")]))
            .await;
        assert_eq!((second.kind, second.target.as_str()), (ExerciseKind::Number, "1"));

        let third = gen
            .next_exercise(&record(&[
                (ExerciseKind::Alphabet, "A"),
                (ExerciseKind::Number, "1"),
            ]))
            .await;
        assert_eq!(
            (third.kind, third.target.as_str()),
            (ExerciseKind::Mannerism, "HELLO")
        );
    }

    #[tokio::test]
    async fn offers_next_unlearned_letter() {
        let progress = record(&[
            (ExerciseKind::Alphabet, "A"),
            (ExerciseKind::Number, "1"),
            (ExerciseKind::Mannerism, "HELLO"),
        ]);
        let ex = generator().next_exercise(&progress).await;
        assert_eq!(ex.kind, ExerciseKind::Alphabet);
        assert_eq!(ex.target, "B");
        assert!(ex.to_target().is_ok());
    }

    #[tokio::test]
    async fn word_from_learned_letters() {
        let progress = record(&[
            (ExerciseKind::Alphabet, "C"),
            (ExerciseKind::Alphabet, "A"),
            (ExerciseKind::Alphabet, "T"),
        ]);
        let ex = generator().next_exercise(&progress).await;
        assert_eq!(ex.kind, ExerciseKind::WordBuilding);
        assert_eq!(ex.target, "CAT");
        assert_eq!(ex.letters, vec!['C', 'A', 'T']);
        assert_eq!(ex.pattern, None);
    }

    #[tokio::test]
    async fn invalid_word_falls_back_to_letter() {
        let progress = record(&[
            (ExerciseKind::Alphabet, "A"),
            (ExerciseKind::Alphabet, "B"),
            (ExerciseKind::Alphabet, "C"),
        ]);
        let gen = ExerciseGenerator::new(Arc::new(Fixed("ZOO")));
        let ex = gen.next_exercise(&progress).await;
        assert_eq!((ex.kind, ex.target.as_str()), (ExerciseKind::Alphabet, "D"));

        let gen = ExerciseGenerator::new(Arc::new(Down));
        let ex = gen.next_exercise(&progress).await;
        assert_eq!(ex.target, "D");
    }

    #[test]
    fn next_letter_wraps_to_a() {
        let all: BTreeSet<char> = ('A'..='Z').collect();
        assert_eq!(next_letter(&all), 'A');
        assert_eq!(next_letter(&BTreeSet::new()), 'A');
    }

    #[test]
    fn disabled_content_uses_table() {
        let gen = ExerciseGenerator::from_config(&ContentConfig::default());
        let ex = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(gen.next_exercise(&record(&[
                (ExerciseKind::WordBuilding, "DOG"),
                (ExerciseKind::Alphabet, "X"),
                (ExerciseKind::Alphabet, "Y"),
            ])));
        assert_eq!(ex.target, "DOG");
    }
}
