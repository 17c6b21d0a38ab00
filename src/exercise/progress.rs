//! Long-term progress records and the completion recorder task.
//!
//! The capture loop emits a [`CompletionEvent`] for every completed exercise
//! over an unbounded `tokio::sync::mpsc` channel; [`record_completions`]
//! drains it and appends each event to the user's [`ProgressRecord`] through
//! a [`ProgressStore`].
//!
//! Scoring: every completion is worth
//! [`POINTS_PER_EXERCISE`](ProgressRecord::POINTS_PER_EXERCISE); a record with
//! [`PROMOTION_THRESHOLD`](ProgressRecord::PROMOTION_THRESHOLD) or more
//! completions is promoted to [`Level::Intermediate`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use super::matcher::CompletionEvent;
use super::target::ExerciseKind;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
}

/// One entry of a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedExercise {
    pub kind: ExerciseKind,
    pub target: String,
    /// Seconds since the Unix epoch.
    pub completed_at: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    pub level: Level,
    pub completed_exercises: Vec<CompletedExercise>,
    pub total_score: u32,
}

impl ProgressRecord {
    pub const POINTS_PER_EXERCISE: u32 = 10;
    pub const PROMOTION_THRESHOLD: usize = 5;

    /// Append a completion, add its points and re-evaluate the level.
    pub fn apply(&mut self, event: &CompletionEvent) {
        self.completed_exercises.push(CompletedExercise {
            kind: event.exercise_kind,
            target: event.target.clone(),
            completed_at: event.timestamp,
        });
        self.total_score = self.total_score.saturating_add(Self::POINTS_PER_EXERCISE);
        if self.completed_exercises.len() >= Self::PROMOTION_THRESHOLD {
            self.level = Level::Intermediate;
        }
    }

    /// Letters practised so far: single-letter targets plus every letter of
    /// completed words.
    pub fn learned_letters(&self) -> BTreeSet<char> {
        self.completed_exercises
            .iter()
            .filter(|e| matches!(e.kind, ExerciseKind::Alphabet | ExerciseKind::WordBuilding))
            .flat_map(|e| e.target.chars())
            .filter(char::is_ascii_uppercase)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ProgressError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("progress store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt progress record {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize progress record: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid user id {0:?}")]
    InvalidUser(String),
}

// ---------------------------------------------------------------------------
// ProgressStore
// ---------------------------------------------------------------------------

/// Persistence for progress records, keyed by user id.
///
/// Implementations are called from blocking contexts (the recorder runs them
/// on `spawn_blocking`).
pub trait ProgressStore: Send + Sync {
    /// The user's record; a default record for unknown users.
    fn load(&self, user_id: &str) -> Result<ProgressRecord, ProgressError>;

    fn save(&self, user_id: &str, record: &ProgressRecord) -> Result<(), ProgressError>;

    /// Load, apply `event`, save.  Returns the updated record.
    fn record_completion(
        &self,
        user_id: &str,
        event: &CompletionEvent,
    ) -> Result<ProgressRecord, ProgressError> {
        let mut record = self.load(user_id)?;
        record.apply(event);
        self.save(user_id, &record)?;
        Ok(record)
    }
}

/// One pretty-printed `<user_id>.json` file per user.
pub struct JsonProgressStore {
    dir: PathBuf,
    /// Serialises read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user_id: &str) -> Result<PathBuf, ProgressError> {
        let valid = !user_id.is_empty()
            && !user_id.starts_with('.')
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'));
        if !valid {
            return Err(ProgressError::InvalidUser(user_id.to_string()));
        }
        Ok(self.dir.join(format!("{user_id}.json")))
    }

    fn read(&self, user_id: &str) -> Result<ProgressRecord, ProgressError> {
        let path = self.path_for(user_id)?;
        if !path.exists() {
            return Ok(ProgressRecord::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| ProgressError::Corrupt {
            path: path.display().to_string(),
            source,
        })
    }

    fn write(&self, user_id: &str, record: &ProgressRecord) -> Result<(), ProgressError> {
        let path = self.path_for(user_id)?;
        std::fs::create_dir_all(&self.dir)?;
        let content = encode(record)?;
        // Readers only ever see a complete file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, ProgressError> {
    serde_json::to_string_pretty(value).map_err(ProgressError::Serialize)
}

impl ProgressStore for JsonProgressStore {
    fn load(&self, user_id: &str) -> Result<ProgressRecord, ProgressError> {
        self.read(user_id)
    }

    fn save(&self, user_id: &str, record: &ProgressRecord) -> Result<(), ProgressError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write(user_id, record)
    }

    fn record_completion(
        &self,
        user_id: &str,
        event: &CompletionEvent,
    ) -> Result<ProgressRecord, ProgressError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut record = self.read(user_id)?;
        record.apply(event);
        self.write(user_id, &record)?;
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Recorder task
// ---------------------------------------------------------------------------

/// Drain completion events into `store` until every sender is dropped.
///
/// Store failures are logged and the event is dropped; the recorder keeps
/// running.
pub async fn record_completions(
    mut rx: mpsc::UnboundedReceiver<CompletionEvent>,
    store: Arc<dyn ProgressStore>,
    user_id: String,
) {
    while let Some(event) = rx.recv().await {
        let store = Arc::clone(&store);
        let user = user_id.clone();
        let target = event.target.clone();

        let result =
            tokio::task::spawn_blocking(move || store.record_completion(&user, &event)).await;

        match result {
            Ok(Ok(record)) => log::info!(
                "progress: {user_id} completed {target:?} (score {}, {} exercises)",
                record.total_score,
                record.completed_exercises.len()
            ),
            Ok(Err(e)) => log::error!("progress: failed to record {target:?}: {e}"),
            Err(e) => log::error!("progress: recorder task panicked: {e}"),
        }
    }

    log::info!("progress: completion channel closed, recorder shutting down");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
