//! Frame acquisition and hand detection boundaries.
//!
//! The capture loop only sees three traits:
//!
//! - [`CaptureBackend`] opens a [`CaptureSource`] when tracking starts and
//!   hands out the [`HandTracker`] that goes with it.
//! - [`CaptureSource::next_frame`] yields one [`Frame`] per tick.
//! - [`HandTracker::detect`] turns a frame into zero or one [`Detection`].
//!
//! The shipped backend is [`replay::ReplayBackend`], which plays a recorded
//! JSON-lines detection script.

pub mod replay;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gesture::FingerVector;

pub use replay::{ReplayBackend, ReplaySource, ReplayTracker};

// ---------------------------------------------------------------------------
// Frame / Detection
// ---------------------------------------------------------------------------

/// One acquired frame.  The payload is opaque to everything except the
/// tracker paired with the source that produced it.
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub captured_at: Instant,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandType {
    Left,
    Right,
}

/// A single detected hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub fingers: FingerVector,
    pub hand: HandType,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to acquire the capture resource at start.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no capture source configured")]
    NoDevice,

    #[error("failed to open capture source {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid detection script: {0}")]
    Script(String),
}

/// Per-tick frame acquisition failure.  Absorbed by the capture loop.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("no frame available")]
    NoFrame,

    #[error("capture stream ended")]
    EndOfStream,

    #[error("frame read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-frame detection failure.  Absorbed by the capture loop.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("undecodable frame payload: {0}")]
    Payload(String),

    #[error("hand tracker failed: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// An open capture resource, owned by the worker thread.
pub trait CaptureSource: Send {
    fn next_frame(&mut self) -> Result<Frame, FrameError>;

    /// Release the underlying device.  Called exactly once when the worker
    /// exits, including when it unwinds.
    fn release(&mut self) {}
}

/// Landmark detection and finger classification for one frame.
pub trait HandTracker: Send {
    /// `Ok(None)` when no hand is in view.
    fn detect(&mut self, frame: &Frame) -> Result<Option<Detection>, TrackerError>;
}

/// Opens capture sources on demand.  Shared by the tracking service.
pub trait CaptureBackend: Send + Sync {
    fn open(&self) -> Result<Box<dyn CaptureSource>, CaptureError>;

    fn tracker(&self) -> Box<dyn HandTracker>;
}
