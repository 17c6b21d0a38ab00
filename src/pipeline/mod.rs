//! Real-time gesture pipeline: stabilisation, text assembly and the capture
//! worker that drives them.
//!
//! # Architecture
//!
//! ```text
//! HTTP handlers ──▶ TrackingService ──(WorkerCommand)──▶ CaptureLoop  [OS thread]
//!       ▲                                                    │
//!       │                                 classify → StabilityFilter
//!       │                                                    │ commit
//!       │                                      TextAssembler + ExerciseMatcher
//!       │                                                    │
//!       └──────── SnapshotReader ◀── SnapshotPublisher ◀─────┘  (every tick)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use fingerspell::capture::ReplayBackend;
//! use fingerspell::config::TrackingConfig;
//! use fingerspell::pipeline::{snapshot_channel, TrackingService};
//!
//! let config = TrackingConfig::default();
//! let (publisher, reader) = snapshot_channel();
//! let (completions, _completion_rx) = mpsc::unbounded_channel();
//! let service = TrackingService::new(
//!     Arc::new(ReplayBackend::from_config(&config)),
//!     config,
//!     publisher,
//!     completions,
//! );
//!
//! service.start().unwrap();
//! println!("{}", reader.read().current_word);
//! service.stop().unwrap();
//! ```

pub mod assembler;
pub mod runner;
pub mod service;
pub mod stability;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use assembler::{TextAssembler, TextBuffer};
pub use runner::{CaptureLoop, WorkerCommand};
pub use service::{SignCheck, StartOutcome, StopOutcome, TrackingError, TrackingService};
pub use stability::{CommittedEvent, StabilityFilter};
pub use state::{snapshot_channel, unix_timestamp, Snapshot, SnapshotPublisher, SnapshotReader};
