//! Capture loop: drives acquire → detect → classify → filter → assemble.
//!
//! [`CaptureLoop`] owns the stability state, the text buffer and the active
//! exercise attempt.  It runs on a dedicated OS thread (see
//! [`TrackingService`](super::service::TrackingService)) and talks to the
//! rest of the process through three channels only:
//!
//! ```text
//! std mpsc  WorkerCommand ──▶ CaptureLoop ──▶ SnapshotPublisher   (every tick)
//!                                  │
//!                                  └─▶ tokio mpsc CompletionEvent (on completion)
//! ```
//!
//! # Tick
//!
//! ```text
//! drain commands
//!   └─▶ source.next_frame()      Err → treated as "no hand"
//!         └─▶ tracker.detect()   Err → treated as "no hand"
//!               ├─ None       → filter.hand_lost()
//!               └─ Some(hand) → classify → filter.observe()
//!                                 └─ commit → assembler.apply + matcher.check
//! publish snapshot
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::capture::{CaptureSource, Detection, HandTracker};
use crate::config::TrackingConfig;
use crate::exercise::{CompletionEvent, ExerciseMatcher, ExerciseTarget, MatchResult};
use crate::gesture::{classify, FingerVector, Token};

use super::assembler::TextAssembler;
use super::stability::{CommittedEvent, StabilityFilter};
use super::state::{unix_timestamp, Snapshot, SnapshotPublisher};

// ---------------------------------------------------------------------------
// WorkerCommand
// ---------------------------------------------------------------------------

/// Requests into the worker, applied at the start of the next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerCommand {
    /// Clear the text buffer and the stability state.
    ResetText,
    /// Start a fresh attempt at a target.
    SetTarget(ExerciseTarget),
    ClearTarget,
}

// ---------------------------------------------------------------------------
// SourceGuard
// ---------------------------------------------------------------------------

/// Releases the capture source when dropped, so unwinding out of the loop
/// still frees the device.
struct SourceGuard(Box<dyn CaptureSource>);

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

// ---------------------------------------------------------------------------
// CaptureLoop
// ---------------------------------------------------------------------------

pub struct CaptureLoop {
    filter: StabilityFilter,
    assembler: TextAssembler,
    matcher: Option<ExerciseMatcher>,
    publisher: Arc<SnapshotPublisher>,
    completions: mpsc::UnboundedSender<CompletionEvent>,
    tick: Duration,
    sequence: u64,
    frame_failures: u32,
    tracker_failures: u32,
}

impl CaptureLoop {
    /// A loop that resumes the text and sequence of the last published
    /// snapshot with a fresh stability state.
    pub fn new(
        config: &TrackingConfig,
        publisher: Arc<SnapshotPublisher>,
        completions: mpsc::UnboundedSender<CompletionEvent>,
    ) -> Self {
        let last = publisher.current();
        Self {
            filter: StabilityFilter::from_config(config),
            assembler: TextAssembler::with_buffer(last.text_buffer()),
            matcher: None,
            publisher,
            completions,
            tick: config.tick_period(),
            sequence: last.sequence,
            frame_failures: 0,
            tracker_failures: 0,
        }
    }

    pub fn with_target(mut self, target: Option<ExerciseTarget>) -> Self {
        self.matcher = target.map(ExerciseMatcher::new);
        self
    }

    pub fn handle_command(&mut self, command: WorkerCommand) {
        match command {
            WorkerCommand::ResetText => {
                self.assembler.reset();
                self.filter.reset();
                log::debug!("tracking: text reset");
            }
            WorkerCommand::SetTarget(target) => {
                log::debug!("tracking: target set to {} {:?}", target.kind(), target.target());
                self.matcher = Some(ExerciseMatcher::new(target));
            }
            WorkerCommand::ClearTarget => self.matcher = None,
        }
    }

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------

    /// Run until `stop` is set.  The flag is checked between ticks, so the
    /// loop exits within one tick period.  `source` is released on every exit
    /// path, unwinding included.
    pub fn run(
        mut self,
        source: Box<dyn CaptureSource>,
        mut tracker: Box<dyn HandTracker>,
        stop: Arc<AtomicBool>,
        commands: std_mpsc::Receiver<WorkerCommand>,
    ) {
        let mut source = SourceGuard(source);
        log::info!("tracking: capture loop started ({:?} per tick)", self.tick);

        while !stop.load(Ordering::Relaxed) {
            let started = Instant::now();

            while let Ok(command) = commands.try_recv() {
                self.handle_command(command);
            }

            self.tick(source.0.as_mut(), tracker.as_mut(), started);

            let elapsed = started.elapsed();
            if elapsed < self.tick {
                std::thread::sleep(self.tick - elapsed);
            }
        }

        log::info!("tracking: capture loop stopped after {} ticks", self.sequence);
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// One pass of the pipeline.  Always publishes a snapshot; returns the
    /// committed event, if any.
    pub fn tick(
        &mut self,
        source: &mut dyn CaptureSource,
        tracker: &mut dyn HandTracker,
        now: Instant,
    ) -> Option<CommittedEvent> {
        let detection = self.detect(source, tracker);

        let (fingers, token, committed) = match detection {
            Some(hand) => {
                let token = classify(hand.fingers);
                (hand.fingers, token, self.filter.observe(token, now))
            }
            None => {
                self.filter.hand_lost();
                (FingerVector::FOLDED, Token::Unknown, None)
            }
        };

        if let Some(event) = &committed {
            self.commit(event);
        }

        self.publish(fingers, token, detection.is_some(), committed.is_some(), now);
        committed
    }

    fn detect(
        &mut self,
        source: &mut dyn CaptureSource,
        tracker: &mut dyn HandTracker,
    ) -> Option<Detection> {
        let frame = match source.next_frame() {
            Ok(frame) => {
                if self.frame_failures > 0 {
                    log::info!(
                        "tracking: frames recovered after {} failed ticks",
                        self.frame_failures
                    );
                    self.frame_failures = 0;
                }
                frame
            }
            Err(e) => {
                if self.frame_failures == 0 {
                    log::warn!("tracking: frame acquisition failed: {e}");
                }
                self.frame_failures = self.frame_failures.saturating_add(1);
                return None;
            }
        };

        match tracker.detect(&frame) {
            Ok(detection) => {
                self.tracker_failures = 0;
                detection
            }
            Err(e) => {
                if self.tracker_failures == 0 {
                    log::warn!("tracking: hand tracker failed on frame {}: {e}", frame.sequence);
                }
                self.tracker_failures = self.tracker_failures.saturating_add(1);
                None
            }
        }
    }

    fn commit(&mut self, event: &CommittedEvent) {
        log::debug!("tracking: committed {}", event.token);
        self.assembler.apply(&event.token);

        let Some(matcher) = self.matcher.as_mut() else {
            return;
        };
        match matcher.check(&event.token) {
            MatchResult::Completed(completion) => {
                log::info!(
                    "tracking: exercise {} {:?} completed",
                    completion.exercise_kind,
                    completion.target
                );
                if self.completions.send(completion).is_err() {
                    log::warn!("tracking: progress recorder is gone, completion dropped");
                }
            }
            MatchResult::Accepted { letter, remaining } => {
                log::debug!("tracking: letter {letter} accepted, {remaining} to go");
            }
            MatchResult::NoMatch => {}
        }
    }

    fn publish(
        &mut self,
        fingers: FingerVector,
        token: Token,
        hand_detected: bool,
        committed: bool,
        now: Instant,
    ) {
        self.sequence += 1;
        let buffer = self.assembler.buffer();
        self.publisher.publish(Snapshot {
            sequence: self.sequence,
            fingers,
            recognized_token: token,
            stable: committed || self.filter.is_stable(),
            current_word: buffer.current_word.clone(),
            completed_text: buffer.completed_text.clone(),
            hand_detected,
            run_length: self.filter.run_length(),
            cooldown_remaining: self.filter.cooldown_remaining(now).as_secs_f64(),
            timestamp: unix_timestamp(),
            exercise: self.matcher.as_ref().map(ExerciseMatcher::view),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
