//! JSON-over-HTTP surface, polled by the browser front end.
//!
//! | Route                            | Method     | Handler                       |
//! |----------------------------------|------------|-------------------------------|
//! | `/api/hand-tracking-status`      | GET, POST  | [`handlers::tracking_status`] |
//! | `/api/start-tracking`            | POST       | [`handlers::start_tracking`]  |
//! | `/api/stop-tracking`             | POST       | [`handlers::stop_tracking`]   |
//! | `/api/reset-text`                | POST       | [`handlers::reset_text`]      |
//! | `/api/set-exercise-target`       | POST       | [`handlers::set_exercise_target`] |
//! | `/api/check-sign`                | POST       | [`handlers::check_sign`]      |
//! | `/api/next-exercise`             | POST       | [`handlers::next_exercise`]   |
//! | `/api/progress`                  | GET        | [`handlers::progress`]        |
//! | `/api/check-word-match`          | POST       | [`handlers::check_word_match`] |
//!
//! Failures answer `{"success": false, "error": "..."}` with a 4xx/5xx status.

pub mod handlers;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::exercise::{ExerciseGenerator, ProgressError, ProgressStore, TargetError};
use crate::pipeline::{TrackingError, TrackingService};

// ---------------------------------------------------------------------------
// ApiState
// ---------------------------------------------------------------------------

/// Shared by every handler.  Cheap to clone.
#[derive(Clone)]
pub struct ApiState {
    pub tracking: Arc<TrackingService>,
    pub progress: Arc<dyn ProgressStore>,
    pub generator: Arc<ExerciseGenerator>,
    pub user_id: Arc<str>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/api/hand-tracking-status",
            get(handlers::tracking_status).post(handlers::tracking_status),
        )
        .route("/api/start-tracking", post(handlers::start_tracking))
        .route("/api/stop-tracking", post(handlers::stop_tracking))
        .route("/api/reset-text", post(handlers::reset_text))
        .route("/api/set-exercise-target", post(handlers::set_exercise_target))
        .route("/api/check-sign", post(handlers::check_sign))
        .route("/api/next-exercise", post(handlers::next_exercise))
        .route("/api/progress", get(handlers::progress))
        .route("/api/check-word-match", post(handlers::check_word_match))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m) | ApiError::Unavailable(m) | ApiError::Internal(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "success": false, "error": self.message() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<TrackingError> for ApiError {
    fn from(e: TrackingError) -> Self {
        match e {
            TrackingError::CaptureUnavailable(_) => ApiError::Unavailable(e.to_string()),
            TrackingError::Spawn(_) | TrackingError::WorkerPanicked => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<TargetError> for ApiError {
    fn from(e: TargetError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<ProgressError> for ApiError {
    fn from(e: ProgressError) -> Self {
        match e {
            ProgressError::InvalidUser(_) => ApiError::BadRequest(e.to_string()),
            ProgressError::Io(_)
            | ProgressError::Corrupt { .. }
            | ProgressError::Serialize(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("background task failed: {e}"))
    }
}
