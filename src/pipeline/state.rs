//! Published tracking state.
//!
//! The capture loop builds one [`Snapshot`] per tick and hands it to the
//! [`SnapshotPublisher`].  Request handlers hold a [`SnapshotReader`] and
//! read the latest snapshot without ever blocking the capture loop.
//!
//! Both ends wrap a `tokio::sync::watch` channel carrying `Arc<Snapshot>`:
//! a publish swaps the whole `Arc`, so a reader sees either the previous or
//! the new snapshot and never a mix of fields from both.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::watch;

use crate::exercise::ExerciseView;
use crate::gesture::{FingerVector, Token};

use super::assembler::TextBuffer;

/// Seconds since the Unix epoch; `0.0` if the clock is before it.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything `GET /api/hand-tracking-status` reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Increments with every publish; `0` for the initial idle snapshot.
    pub sequence: u64,
    pub fingers: FingerVector,
    pub recognized_token: Token,
    /// `true` while the current token has been held for the required run.
    pub stable: bool,
    pub current_word: String,
    pub completed_text: String,
    pub hand_detected: bool,
    pub run_length: u32,
    /// Seconds until another commit is allowed.
    pub cooldown_remaining: f64,
    pub timestamp: f64,
    pub exercise: Option<ExerciseView>,
}

impl Snapshot {
    /// No hand, empty text.
    pub fn idle() -> Self {
        Self {
            sequence: 0,
            fingers: FingerVector::FOLDED,
            recognized_token: Token::Unknown,
            stable: false,
            current_word: String::new(),
            completed_text: String::new(),
            hand_detected: false,
            run_length: 0,
            cooldown_remaining: 0.0,
            timestamp: unix_timestamp(),
            exercise: None,
        }
    }

    pub fn text_buffer(&self) -> TextBuffer {
        TextBuffer {
            current_word: self.current_word.clone(),
            completed_text: self.completed_text.clone(),
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::idle()
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Writer half.  Owned by whoever is currently producing snapshots.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotPublisher {
    /// Replace the published snapshot.  Never blocks and succeeds even when
    /// no reader is alive.
    pub fn publish(&self, snapshot: Snapshot) {
        self.tx.send_replace(Arc::new(snapshot));
    }

    /// The snapshot most recently published.
    pub fn current(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Reader half.  Cheap to clone; one per consumer.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Arc<Snapshot>>,
}

impl SnapshotReader {
    pub fn read(&self) -> Arc<Snapshot> {
        self.rx.borrow().clone()
    }
}

/// A publisher/reader pair seeded with [`Snapshot::idle`].
pub fn snapshot_channel() -> (SnapshotPublisher, SnapshotReader) {
    let (tx, rx) = watch::channel(Arc::new(Snapshot::idle()));
    (SnapshotPublisher { tx }, SnapshotReader { rx })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
