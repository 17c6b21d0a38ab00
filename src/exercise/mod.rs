//! Practice exercises: targets, matching, progress and content generation.
//!
//! # Flow
//!
//! ```text
//! ExerciseGenerator ──▶ Exercise ──▶ ExerciseTarget ──▶ ExerciseMatcher
//!        ▲                                                    │
//!   ProgressRecord ◀── ProgressStore ◀── record_completions ◀─┘ CompletionEvent
//! ```

pub mod fallback;
pub mod generator;
pub mod matcher;
pub mod progress;
pub mod source;
pub mod target;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use fallback::{FallbackWordSource, StaticWordSource, STATIC_WORDS};
pub use generator::{Exercise, ExerciseGenerator};
pub use matcher::{word_matches, CompletionEvent, ExerciseMatcher, ExerciseView, MatchResult};
pub use progress::{
    record_completions, CompletedExercise, JsonProgressStore, Level, ProgressError,
    ProgressRecord, ProgressStore,
};
pub use source::{ApiWordSource, GeneratorError, WordRequest, WordSource};
pub use target::{ExerciseKind, ExerciseTarget, ExerciseTargetRequest, TargetError};
