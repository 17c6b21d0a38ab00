//! Tracking service: owns the capture worker's lifecycle.
//!
//! One [`TrackingService`] exists per process and is shared with the HTTP
//! layer through an `Arc`.  It starts and stops the worker thread running
//! [`CaptureLoop`], forwards commands into it, and hands out snapshot reads
//! that never wait on the worker.
//!
//! `start` and `stop` are idempotent.  Both block for at most one tick
//! (stop joins the worker), so async callers should use `spawn_blocking`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::capture::{CaptureBackend, CaptureError};
use crate::config::TrackingConfig;
use crate::exercise::{
    word_matches, CompletionEvent, ExerciseKind, ExerciseMatcher, ExerciseTarget,
    ExerciseTargetRequest, ExerciseView, MatchResult, TargetError,
};
use crate::gesture::{recognize_sign, FingerVector, Token};

use super::runner::{CaptureLoop, WorkerCommand};
use super::state::{unix_timestamp, Snapshot, SnapshotPublisher, SnapshotReader};

// ---------------------------------------------------------------------------
// Errors / outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(#[from] CaptureError),

    #[error("failed to spawn capture worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("capture worker panicked")]
    WorkerPanicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Result of [`TrackingService::check_sign`].
#[derive(Debug, Clone, PartialEq)]
pub struct SignCheck {
    pub recognized: Token,
    pub result: MatchResult,
    /// `None` when no target is installed.
    pub exercise: Option<ExerciseView>,
}

// ---------------------------------------------------------------------------
// TrackingService
// ---------------------------------------------------------------------------

struct Worker {
    stop: Arc<AtomicBool>,
    commands: std_mpsc::Sender<WorkerCommand>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct ServiceInner {
    worker: Option<Worker>,
    /// Survives restarts; reinstalled into every new worker.
    target: Option<ExerciseTarget>,
    /// Attempt driven by [`TrackingService::check_sign`], separate from the
    /// worker's stream attempt.  Cleared when a target is installed.
    sign_attempt: Option<ExerciseMatcher>,
}

pub struct TrackingService {
    backend: Arc<dyn CaptureBackend>,
    config: TrackingConfig,
    publisher: Arc<SnapshotPublisher>,
    reader: SnapshotReader,
    completions: mpsc::UnboundedSender<CompletionEvent>,
    inner: Mutex<ServiceInner>,
}

impl TrackingService {
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        config: TrackingConfig,
        publisher: SnapshotPublisher,
        completions: mpsc::UnboundedSender<CompletionEvent>,
    ) -> Self {
        let reader = publisher.reader();
        Self {
            backend,
            config,
            publisher: Arc::new(publisher),
            reader,
            completions,
            inner: Mutex::new(ServiceInner::default()),
        }
    }

    fn inner(&self) -> MutexGuard<'_, ServiceInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Acquire the capture source and spawn the worker.  On
    /// [`TrackingError::CaptureUnavailable`] no worker is left behind.
    pub fn start(&self) -> Result<StartOutcome, TrackingError> {
        let mut inner = self.inner();

        if let Some(worker) = inner.worker.take() {
            if !worker.handle.is_finished() {
                inner.worker = Some(worker);
                return Ok(StartOutcome::AlreadyRunning);
            }
            if worker.handle.join().is_err() {
                log::error!("tracking: previous capture worker panicked, restarting");
            }
        }

        let source = self.backend.open()?;
        let tracker = self.backend.tracker();

        let stop = Arc::new(AtomicBool::new(false));
        let (commands, command_rx) = std_mpsc::channel();
        let capture = CaptureLoop::new(
            &self.config,
            Arc::clone(&self.publisher),
            self.completions.clone(),
        )
        .with_target(inner.target.clone());

        let handle = {
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("capture-loop".into())
                .spawn(move || capture.run(source, tracker, stop, command_rx))
                .map_err(TrackingError::Spawn)?
        };

        inner.worker = Some(Worker {
            stop,
            commands,
            handle,
        });
        log::info!("tracking: started");
        Ok(StartOutcome::Started)
    }

    /// Signal the worker and wait for it to exit.  The capture source has
    /// been released by the time this returns.
    pub fn stop(&self) -> Result<StopOutcome, TrackingError> {
        let mut inner = self.inner();
        let Some(worker) = inner.worker.take() else {
            return Ok(StopOutcome::NotRunning);
        };

        worker.stop.store(true, Ordering::Relaxed);
        let joined = worker.handle.join();
        self.publish_with(|snap| {
            snap.fingers = FingerVector::FOLDED;
            snap.recognized_token = Token::Unknown;
            snap.hand_detected = false;
            snap.stable = false;
            snap.run_length = 0;
            snap.cooldown_remaining = 0.0;
        });

        match joined {
            Ok(()) => {
                log::info!("tracking: stopped");
                Ok(StopOutcome::Stopped)
            }
            Err(_) => {
                log::error!("tracking: capture worker panicked");
                Err(TrackingError::WorkerPanicked)
            }
        }
    }

    /// `true` while a live worker exists.
    pub fn is_running(&self) -> bool {
        Self::is_live(&self.inner())
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Clear the text buffers and the stability state.
    pub fn reset_text(&self) {
        // Held until published, so a concurrent `start` sees the cleared text.
        let inner = self.inner();
        if !Self::forward(&inner, WorkerCommand::ResetText) {
            self.publish_with(|snap| {
                snap.current_word.clear();
                snap.completed_text.clear();
                snap.run_length = 0;
                snap.stable = false;
            });
        }
    }

    /// Validate and install a target.  On error the previous target stays.
    pub fn set_exercise_target(
        &self,
        request: ExerciseTargetRequest,
    ) -> Result<ExerciseTarget, TargetError> {
        let target = ExerciseTarget::try_from(request)?;
        self.install_target(target.clone());
        Ok(target)
    }

    /// Install an already validated target as a fresh attempt.
    pub fn install_target(&self, target: ExerciseTarget) {
        log::info!("tracking: exercise target {} {:?}", target.kind(), target.target());
        let view = ExerciseMatcher::new(target.clone()).view();
        let mut inner = self.inner();
        inner.target = Some(target.clone());
        inner.sign_attempt = None;
        if !Self::forward(&inner, WorkerCommand::SetTarget(target)) {
            self.publish_with(|snap| snap.exercise = Some(view));
        }
    }

    /// Check one shown finger pattern against the installed target.
    ///
    /// Letters, digits and mannerisms are tried before control gestures, and
    /// a symbol the target needs wins over others sharing its pattern.  A
    /// completion is handed to the progress recorder.
    pub fn check_sign(&self, fingers: FingerVector) -> SignCheck {
        let mut inner = self.inner();
        let Some(target) = inner.target.clone() else {
            return SignCheck {
                recognized: recognize_sign(fingers),
                result: MatchResult::NoMatch,
                exercise: None,
            };
        };

        let attempt = inner
            .sign_attempt
            .get_or_insert_with(|| ExerciseMatcher::new(target));
        let (recognized, result) = attempt.check_sign(fingers);
        let view = attempt.view();

        if let MatchResult::Completed(event) = &result {
            log::info!("tracking: sign {recognized} completed {:?}", event.target);
            if self.completions.send(event.clone()).is_err() {
                log::warn!("tracking: progress recorder is gone, completion dropped");
            }
        }
        if !Self::is_live(&inner) {
            self.publish_with(|snap| snap.exercise = Some(view.clone()));
        }

        SignCheck {
            recognized,
            result,
            exercise: Some(view),
        }
    }

    /// Compare the word being spelled with `target_word`.  A match records a
    /// word-building completion and clears the text.
    pub fn check_word_match(&self, target_word: &str) -> Result<bool, TargetError> {
        let target = ExerciseTarget::new(ExerciseKind::WordBuilding, target_word)?;
        let snapshot = self.reader.read();
        if !word_matches(target.target(), &snapshot.text_buffer()) {
            return Ok(false);
        }

        log::info!("tracking: word {:?} spelled", target.target());
        let event = CompletionEvent {
            exercise_kind: ExerciseKind::WordBuilding,
            target: target.target().to_string(),
            timestamp: unix_timestamp(),
        };
        if self.completions.send(event).is_err() {
            log::warn!("tracking: progress recorder is gone, completion dropped");
        }
        self.reset_text();
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.reader.read()
    }

    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn is_live(inner: &ServiceInner) -> bool {
        inner
            .worker
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Forward a command to a live worker.  `false` when there is none.
    fn forward(inner: &ServiceInner, command: WorkerCommand) -> bool {
        match &inner.worker {
            Some(worker) if !worker.handle.is_finished() => {
                worker.commands.send(command).is_ok()
            }
            _ => false,
        }
    }

    /// Publish an edited copy of the current snapshot.  Only used while no
    /// worker is publishing, with the `inner` lock held.
    fn publish_with(&self, edit: impl FnOnce(&mut Snapshot)) {
        let mut snap = Snapshot::clone(&self.publisher.current());
        edit(&mut snap);
        snap.sequence += 1;
        snap.timestamp = unix_timestamp();
        self.publisher.publish(snap);
    }
}

impl Drop for TrackingService {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("tracking: error while shutting down: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
