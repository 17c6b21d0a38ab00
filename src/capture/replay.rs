//! Recorded detection scripts as a capture backend.
//!
//! A script is JSON lines, one step per line:
//!
//! ```text
//! {"fingers":[1,0,0,0,0],"hand":"Right","repeat":20}
//! {"hand":null,"repeat":5}
//! # comment lines and blank lines are skipped
//! ```
//!
//! Each step plays for `repeat` frames (default 1); `"repeat": 0` skips the
//! step.  Steps are kept once and counted down while playing, so a large
//! `repeat` costs no memory.  A step without `fingers`,
//! or with `"hand": null`, is a frame with no hand in view; `hand` defaults to
//! `"Right"`.  Finger values are validated when the script is opened.

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::TrackingConfig;
use crate::gesture::FingerVector;

use super::{
    CaptureBackend, CaptureError, CaptureSource, Detection, Frame, FrameError, HandTracker,
    HandType, TrackerError,
};

// ---------------------------------------------------------------------------
// Script format
// ---------------------------------------------------------------------------

fn right_hand() -> Option<HandType> {
    Some(HandType::Right)
}

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptStep {
    #[serde(default)]
    fingers: Option<FingerVector>,
    #[serde(default = "right_hand")]
    hand: Option<HandType>,
    #[serde(default = "one")]
    repeat: u32,
}

/// What a replay frame carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FramePayload {
    fingers: Option<FingerVector>,
    hand: Option<HandType>,
}

/// One encoded payload and how many consecutive frames carry it.
#[derive(Debug, Clone)]
struct Step {
    payload: Vec<u8>,
    repeat: u32,
}

fn parse_script(text: &str) -> Result<Vec<Step>, CaptureError> {
    let mut steps = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step: ScriptStep = serde_json::from_str(line)
            .map_err(|e| CaptureError::Script(format!("line {}: {e}", index + 1)))?;
        let payload = serde_json::to_vec(&FramePayload {
            fingers: step.fingers,
            hand: step.hand,
        })
        .map_err(|e| CaptureError::Script(format!("line {}: {e}", index + 1)))?;
        if step.repeat > 0 {
            steps.push(Step {
                payload,
                repeat: step.repeat,
            });
        }
    }
    if steps.is_empty() {
        return Err(CaptureError::Script("script contains no frames".into()));
    }
    Ok(steps)
}

// ---------------------------------------------------------------------------
// ReplayBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum ScriptOrigin {
    None,
    File(PathBuf),
    Inline(String),
}

/// Opens a fresh [`ReplaySource`] over the same script on every start.
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    origin: ScriptOrigin,
    looping: bool,
}

impl ReplayBackend {
    /// Backend reading `path` at every [`open`](CaptureBackend::open).
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: ScriptOrigin::File(path.into()),
            looping: false,
        }
    }

    /// Backend over an in-memory script.
    pub fn from_script(script: impl Into<String>) -> Self {
        Self {
            origin: ScriptOrigin::Inline(script.into()),
            looping: false,
        }
    }

    /// Backend with nothing to play; every `open` fails with `NoDevice`.
    pub fn unavailable() -> Self {
        Self {
            origin: ScriptOrigin::None,
            looping: false,
        }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        let backend = match &config.replay_script {
            Some(path) => Self::from_file(path),
            None => Self::unavailable(),
        };
        backend.looping(config.replay_loop)
    }

    /// Restart the script at end of stream instead of reporting
    /// [`FrameError::EndOfStream`].
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

impl CaptureBackend for ReplayBackend {
    fn open(&self) -> Result<Box<dyn CaptureSource>, CaptureError> {
        let text = match &self.origin {
            ScriptOrigin::None => return Err(CaptureError::NoDevice),
            ScriptOrigin::Inline(text) => text.clone(),
            ScriptOrigin::File(path) => {
                std::fs::read_to_string(path).map_err(|source| CaptureError::Open {
                    path: path.display().to_string(),
                    source,
                })?
            }
        };
        let steps = parse_script(&text)?;
        let frames: u64 = steps.iter().map(|s| u64::from(s.repeat)).sum();
        log::info!(
            "capture: replay script opened ({} steps, {frames} frames, loop={})",
            steps.len(),
            self.looping
        );
        Ok(Box::new(ReplaySource::new(steps, self.looping)))
    }

    fn tracker(&self) -> Box<dyn HandTracker> {
        Box::new(ReplayTracker)
    }
}

// ---------------------------------------------------------------------------
// ReplaySource
// ---------------------------------------------------------------------------

pub struct ReplaySource {
    steps: Vec<Step>,
    /// Index of the step being played.
    position: usize,
    /// Frames already emitted from `steps[position]`.
    emitted: u32,
    looping: bool,
    sequence: u64,
    released: bool,
}

impl ReplaySource {
    fn new(steps: Vec<Step>, looping: bool) -> Self {
        Self {
            steps,
            position: 0,
            emitted: 0,
            looping,
            sequence: 0,
            released: false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl CaptureSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Frame, FrameError> {
        if self.released {
            return Err(FrameError::NoFrame);
        }
        if self.position >= self.steps.len() {
            if !self.looping || self.steps.is_empty() {
                return Err(FrameError::EndOfStream);
            }
            self.position = 0;
        }
        let step = &self.steps[self.position];
        let data = step.payload.clone();
        self.emitted += 1;
        if self.emitted >= step.repeat {
            self.position += 1;
            self.emitted = 0;
        }
        self.sequence += 1;
        Ok(Frame {
            sequence: self.sequence,
            captured_at: Instant::now(),
            data,
        })
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.steps.clear();
            log::debug!("capture: replay source released after {} frames", self.sequence);
        }
    }
}

// ---------------------------------------------------------------------------
// ReplayTracker
// ---------------------------------------------------------------------------

/// Decodes the payload written by [`ReplaySource`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayTracker;

impl HandTracker for ReplayTracker {
    fn detect(&mut self, frame: &Frame) -> Result<Option<Detection>, TrackerError> {
        let payload: FramePayload = serde_json::from_slice(&frame.data)
            .map_err(|e| TrackerError::Payload(e.to_string()))?;
        Ok(match (payload.fingers, payload.hand) {
            (Some(fingers), Some(hand)) => Some(Detection { fingers, hand }),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SCRIPT: &str = r#"
# thumb only, then nothing
{"fingers":[1,0,0,0,0],"hand":"Left","repeat":2}
{"hand":null}
{"fingers":[0,1,0,0,0]}
"#;

    fn drain(
        source: &mut dyn CaptureSource,
        tracker: &mut dyn HandTracker,
        n: usize,
    ) -> Vec<Option<Detection>> {
        (0..n)
            .map(|_| {
                let frame = source.next_frame().unwrap();
                tracker.detect(&frame).unwrap()
            })
            .collect()
    }

    #[test]
    fn plays_script_with_repeats() {
        let backend = ReplayBackend::from_script(SCRIPT);
        let mut source = backend.open().unwrap();
        let mut tracker = backend.tracker();

        let seen = drain(source.as_mut(), tracker.as_mut(), 4);
        let thumb = FingerVector::new([1, 0, 0, 0, 0]).unwrap();
        assert_eq!(seen[0], Some(Detection { fingers: thumb, hand: HandType::Left }));
        assert_eq!(seen[1], seen[0]);
        assert_eq!(seen[2], None);
        assert_eq!(
            seen[3],
            Some(Detection {
                fingers: FingerVector::new([0, 1, 0, 0, 0]).unwrap(),
                hand: HandType::Right,
            })
        );

        assert!(matches!(source.next_frame(), Err(FrameError::EndOfStream)));
    }

    #[test]
    fn looping_restarts_and_sequences_keep_counting() {
        let backend = ReplayBackend::from_script(r#"{"fingers":[0,0,0,0,1]}"#).looping(true);
        let mut source = backend.open().unwrap();
        let sequences: Vec<u64> = (0..3).map(|_| source.next_frame().unwrap().sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn huge_repeat_opens_without_expanding() {
        let backend = ReplayBackend::from_script(
            r#"{"fingers":[0,1,0,0,0],"repeat":4000000000}
{"hand":null}"#,
        );
        let mut source = backend.open().unwrap();
        let mut tracker = backend.tracker();

        let index = FingerVector::new([0, 1, 0, 0, 0]).unwrap();
        let seen = drain(source.as_mut(), tracker.as_mut(), 1000);
        assert!(seen.iter().all(|d| d.as_ref().map(|d| d.fingers) == Some(index)));
        assert_eq!(source.next_frame().unwrap().sequence, 1001);
    }

    #[test]
    fn zero_repeat_steps_are_skipped_and_loops_wrap_per_step() {
        let script = r#"{"fingers":[1,1,1,0,0],"repeat":2}
{"fingers":[0,0,0,0,1],"repeat":0}
{"hand":null}"#;
        let backend = ReplayBackend::from_script(script).looping(true);
        let mut source = backend.open().unwrap();
        let mut tracker = backend.tracker();

        let c = Some(Detection {
            fingers: FingerVector::new([1, 1, 1, 0, 0]).unwrap(),
            hand: HandType::Right,
        });
        let seen = drain(source.as_mut(), tracker.as_mut(), 6);
        assert_eq!(seen, vec![c, c, None, c, c, None]);

        let only_zero = ReplayBackend::from_script(r#"{"fingers":[1,0,0,0,0],"repeat":0}"#);
        assert!(matches!(only_zero.open(), Err(CaptureError::Script(_))));
    }

    #[test]
    fn invalid_scripts_are_rejected_at_open() {
        let bad_value = ReplayBackend::from_script(r#"{"fingers":[2,0,0,0,0]}"#);
        assert!(matches!(bad_value.open(), Err(CaptureError::Script(_))));

        let short = ReplayBackend::from_script(r#"{"fingers":[1,0]}"#);
        assert!(matches!(short.open(), Err(CaptureError::Script(_))));

        let empty = ReplayBackend::from_script("# nothing\n");
        assert!(matches!(empty.open(), Err(CaptureError::Script(_))));
    }

    #[test]
    fn unavailable_and_missing_file_fail_to_open() {
        assert!(matches!(
            ReplayBackend::unavailable().open(),
            Err(CaptureError::NoDevice)
        ));

        let dir = tempdir().expect("temp dir");
        let missing = ReplayBackend::from_file(dir.path().join("none.jsonl"));
        assert!(matches!(missing.open(), Err(CaptureError::Open { .. })));
    }

    #[test]
    fn opens_script_file_from_config() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("session.jsonl");
        std::fs::write(&path, SCRIPT).unwrap();

        let config = TrackingConfig {
            replay_script: Some(path),
            ..TrackingConfig::default()
        };
        let mut source = ReplayBackend::from_config(&config).open().unwrap();
        assert_eq!(source.next_frame().unwrap().sequence, 1);
    }

    #[test]
    fn release_stops_frames() {
        let step = Step {
            payload: b"{}".to_vec(),
            repeat: 1,
        };
        let mut source = ReplaySource::new(vec![step], true);
        source.release();
        assert!(source.is_released());
        assert!(matches!(source.next_frame(), Err(FrameError::NoFrame)));
    }

    #[test]
    fn tracker_rejects_foreign_payload() {
        let frame = Frame {
            sequence: 1,
            captured_at: Instant::now(),
            data: vec![0xff, 0x00],
        };
        assert!(matches!(
            ReplayTracker.detect(&frame),
            Err(TrackerError::Payload(_))
        ));
    }
}
