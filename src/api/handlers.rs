//! Request handlers.  Each one only reads snapshots or forwards a request to
//! the tracking service; none of them touches the capture worker directly.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::exercise::{ExerciseTargetRequest, MatchResult};
use crate::gesture::FingerVector;
use crate::pipeline::{Snapshot, StartOutcome, StopOutcome};

use super::{ApiError, ApiState};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// `GET|POST /api/hand-tracking-status`
pub async fn tracking_status(State(state): State<ApiState>) -> Json<Snapshot> {
    Json(Snapshot::clone(&state.tracking.snapshot()))
}

/// `POST /api/start-tracking`
pub async fn start_tracking(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let tracking = Arc::clone(&state.tracking);
    let outcome = tokio::task::spawn_blocking(move || tracking.start()).await??;
    let message = match outcome {
        StartOutcome::Started => "Hand tracking started",
        StartOutcome::AlreadyRunning => "Hand tracking already running",
    };
    Ok(Json(json!({ "success": true, "status": outcome, "message": message })))
}

/// `POST /api/stop-tracking`.  Answers once the capture source is released.
pub async fn stop_tracking(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let tracking = Arc::clone(&state.tracking);
    let outcome = tokio::task::spawn_blocking(move || tracking.stop()).await??;
    let message = match outcome {
        StopOutcome::Stopped => "Hand tracking stopped",
        StopOutcome::NotRunning => "Hand tracking was not running",
    };
    Ok(Json(json!({ "success": true, "status": outcome, "message": message })))
}

/// `POST /api/reset-text`
pub async fn reset_text(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let tracking = Arc::clone(&state.tracking);
    tokio::task::spawn_blocking(move || tracking.reset_text()).await?;
    Ok(Json(json!({ "success": true, "message": "Text reset" })))
}

/// `POST /api/set-exercise-target`
pub async fn set_exercise_target(
    State(state): State<ApiState>,
    payload: Result<Json<ExerciseTargetRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = body(payload)?;
    let tracking = Arc::clone(&state.tracking);
    let target =
        tokio::task::spawn_blocking(move || tracking.set_exercise_target(request)).await??;
    Ok(Json(json!({ "success": true, "target": target })))
}

#[derive(Debug, Deserialize)]
pub struct CheckSignRequest {
    pub fingers: FingerVector,
}

/// `POST /api/check-sign`: check one shown pattern against the target.
pub async fn check_sign(
    State(state): State<ApiState>,
    payload: Result<Json<CheckSignRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let CheckSignRequest { fingers } = body(payload)?;
    let tracking = Arc::clone(&state.tracking);
    let check = tokio::task::spawn_blocking(move || tracking.check_sign(fingers)).await?;

    let (correct, complete) = match &check.result {
        MatchResult::Completed(_) => (true, true),
        MatchResult::Accepted { .. } => (true, false),
        MatchResult::NoMatch => (false, false),
    };
    let message = match (&check.exercise, &check.result) {
        (None, _) => "No exercise target set".to_string(),
        (Some(_), MatchResult::Completed(_)) => "Exercise complete".to_string(),
        (Some(_), MatchResult::Accepted { remaining, .. }) => {
            format!("Correct, {remaining} letter(s) to go")
        }
        (Some(view), MatchResult::NoMatch) if view.complete => {
            "Exercise already complete".to_string()
        }
        (Some(view), MatchResult::NoMatch) => format!("Try showing the sign for {}", view.target),
    };

    Ok(Json(json!({
        "success": true,
        "recognized": check.recognized,
        "correct": correct,
        "exerciseComplete": complete,
        "exercise": check.exercise,
        "message": message,
    })))
}

/// `POST /api/next-exercise`: generate from progress and install as target.
pub async fn next_exercise(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let store = Arc::clone(&state.progress);
    let user = Arc::clone(&state.user_id);
    let record = tokio::task::spawn_blocking(move || store.load(&user)).await??;

    let exercise = state.generator.next_exercise(&record).await;
    let target = exercise.to_target()?;
    let tracking = Arc::clone(&state.tracking);
    tokio::task::spawn_blocking(move || tracking.install_target(target)).await?;

    Ok(Json(json!({ "success": true, "exercise": exercise })))
}

/// `GET /api/progress`
pub async fn progress(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let store = Arc::clone(&state.progress);
    let user = Arc::clone(&state.user_id);
    let record = tokio::task::spawn_blocking(move || store.load(&user)).await??;
    Ok(Json(json!({ "success": true, "progress": record })))
}

#[derive(Debug, Deserialize)]
pub struct WordMatchRequest {
    #[serde(alias = "targetWord")]
    pub target_word: String,
}

/// `POST /api/check-word-match`
pub async fn check_word_match(
    State(state): State<ApiState>,
    payload: Result<Json<WordMatchRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = body(payload)?;
    let current = state.tracking.snapshot().current_word.clone();
    let target = request.target_word.trim().to_ascii_uppercase();

    let tracking = Arc::clone(&state.tracking);
    let word = target.clone();
    if tokio::task::spawn_blocking(move || tracking.check_word_match(&word)).await?? {
        Ok(Json(json!({
            "success": true,
            "match": true,
            "message": format!("Congratulations! You spelled \"{target}\" correctly!"),
        })))
    } else {
        Ok(Json(json!({
            "success": true,
            "match": false,
            "currentWord": current,
            "targetWord": target,
            "message": format!("Current: \"{current}\" | Target: \"{target}\""),
        })))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ReplayBackend;
    use crate::config::TrackingConfig;
    use crate::exercise::CompletionEvent;
    use crate::exercise::{
        ExerciseGenerator, ExerciseKind, JsonProgressStore, ProgressStore, StaticWordSource,
    };
    use crate::pipeline::{snapshot_channel, TrackingService};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::mpsc;

    fn state(backend: ReplayBackend) -> (ApiState, TempDir) {
        let (state, _rx, dir) = state_with_completions(backend);
        (state, dir)
    }

    fn state_with_completions(
        backend: ReplayBackend,
    ) -> (ApiState, mpsc::UnboundedReceiver<CompletionEvent>, TempDir) {
        let dir = tempdir().expect("temp dir");
        let (publisher, _reader) = snapshot_channel();
        let (tx, rx) = mpsc::unbounded_channel();
        let config = TrackingConfig {
            tick_hz: 100.0,
            ..TrackingConfig::default()
        };
        let progress: Arc<dyn ProgressStore> = Arc::new(JsonProgressStore::new(dir.path()));
        let state = ApiState {
            tracking: Arc::new(TrackingService::new(Arc::new(backend), config, publisher, tx)),
            progress,
            generator: Arc::new(ExerciseGenerator::new(Arc::new(StaticWordSource::new()))),
            user_id: Arc::from("tester"),
        };
        (state, rx, dir)
    }

    fn target_request(
        kind: &str,
        target: &str,
    ) -> Result<Json<ExerciseTargetRequest>, JsonRejection> {
        Ok(Json(ExerciseTargetRequest {
            kind: kind.into(),
            target: target.into(),
            letters: None,
        }))
    }

    #[tokio::test]
    async fn status_reports_idle_snapshot() {
        let (state, _dir) = state(ReplayBackend::unavailable());
        let Json(snap) = tracking_status(State(state)).await;
        assert_eq!(snap.sequence, 0);
        assert!(!snap.hand_detected);
    }

    #[tokio::test]
    async fn start_without_capture_is_503() {
        let (state, _dir) = state(ReplayBackend::unavailable());
        let err = start_tracking(State(state.clone())).await.unwrap_err();
        assert!(matches!(err, ApiError::Unavailable(_)));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!state.tracking.is_running());
    }

    #[tokio::test]
    async fn start_then_stop_round_trip() {
        let (state, _dir) = state(ReplayBackend::from_script(r#"{"hand":null}"#).looping(true));

        let Json(started) = start_tracking(State(state.clone())).await.unwrap();
        assert_eq!(started["status"], "started");
        let Json(again) = start_tracking(State(state.clone())).await.unwrap();
        assert_eq!(again["status"], "already_running");

        let Json(stopped) = stop_tracking(State(state.clone())).await.unwrap();
        assert_eq!(stopped["status"], "stopped");
        let Json(idle) = stop_tracking(State(state)).await.unwrap();
        assert_eq!(idle["status"], "not_running");
    }

    #[tokio::test]
    async fn invalid_target_is_400() {
        let (state, _dir) = state(ReplayBackend::unavailable());
        set_exercise_target(State(state.clone()), target_request("alphabet", "C"))
            .await
            .unwrap();

        let err = set_exercise_target(State(state.clone()), target_request("alphabet", "CC"))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let exercise = state.tracking.snapshot().exercise.clone().expect("target kept");
        assert_eq!(exercise.target, "C");
    }

    #[tokio::test]
    async fn next_exercise_installs_starter_letter() {
        let (state, _dir) = state(ReplayBackend::unavailable());
        let Json(reply) = next_exercise(State(state.clone())).await.unwrap();
        assert_eq!(reply["exercise"]["type"], "alphabet");
        assert_eq!(reply["exercise"]["target"], "A");

        let exercise = state.tracking.snapshot().exercise.clone().expect("installed");
        assert_eq!(exercise.target, "A");
    }

    #[tokio::test]
    async fn first_exercise_completes_through_check_sign() {
        let (state, mut rx, _dir) = state_with_completions(ReplayBackend::unavailable());
        let Json(reply) = next_exercise(State(state.clone())).await.unwrap();
        let pattern: FingerVector = serde_json::from_value(reply["exercise"]["pattern"].clone())
            .expect("starter exercise has a pattern");

        let show = |fingers| -> Result<Json<CheckSignRequest>, JsonRejection> {
            Ok(Json(CheckSignRequest { fingers }))
        };
        let Json(checked) = check_sign(State(state.clone()), show(pattern)).await.unwrap();
        assert_eq!(checked["recognized"], "A");
        assert_eq!(checked["correct"], true);
        assert_eq!(checked["exerciseComplete"], true);
        assert_eq!(checked["exercise"]["complete"], true);

        let event = rx.try_recv().expect("completion sent to recorder");
        assert_eq!(event.exercise_kind, ExerciseKind::Alphabet);
        assert_eq!(event.target, "A");

        let Json(again) = check_sign(State(state), show(pattern)).await.unwrap();
        assert_eq!(again["correct"], false);
        assert_eq!(again["message"], "Exercise already complete");
    }

    #[tokio::test]
    async fn check_sign_without_target_reports_reading() {
        let (state, _dir) = state(ReplayBackend::unavailable());
        let fingers = FingerVector::new([1, 1, 1, 1, 0]).unwrap();
        let Json(reply) = check_sign(State(state), Ok(Json(CheckSignRequest { fingers })))
            .await
            .unwrap();
        assert_eq!(reply["recognized"], "9");
        assert_eq!(reply["correct"], false);
        assert!(reply["exercise"].is_null());
    }

    #[tokio::test]
    async fn reset_text_publishes_while_stopped() {
        let (state, _dir) = state(ReplayBackend::unavailable());
        let before = state.tracking.snapshot().sequence;
        let Json(reply) = reset_text(State(state.clone())).await.unwrap();
        assert_eq!(reply["success"], true);

        let snap = state.tracking.snapshot();
        assert_eq!(snap.sequence, before + 1);
        assert!(snap.text_buffer().is_empty());
    }

    #[tokio::test]
    async fn progress_defaults_for_new_user() {
        let (state, _dir) = state(ReplayBackend::unavailable());
        let Json(reply) = progress(State(state)).await.unwrap();
        assert_eq!(reply["progress"]["totalScore"], 0);
        assert_eq!(reply["progress"]["level"], "beginner");
    }

    #[tokio::test]
    async fn word_match_reports_both_outcomes() {
        let (state, _dir) = state(ReplayBackend::unavailable());
        let ask = |word: &str| -> Result<Json<WordMatchRequest>, JsonRejection> {
            Ok(Json(WordMatchRequest {
                target_word: word.into(),
            }))
        };

        let Json(miss) = check_word_match(State(state.clone()), ask("cat")).await.unwrap();
        assert_eq!(miss["match"], false);
        assert_eq!(miss["targetWord"], "CAT");

        let err = check_word_match(State(state), ask("")).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn router_builds() {
        let (state, _dir) = state(ReplayBackend::unavailable());
        let _router = super::super::router(state);
    }
}
