//! Producer-side live endpoints: heartbeat and MJPEG stream

use axum::{
    body::Body,
    extract::State,
    http::{self, header},
    response::{IntoResponse, Response},
    Json,
};

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::liveness::HeartbeatSample;
use crate::stream::mjpeg;

/// Current frame sequence number and the epoch ms of the last frame
#[utoipa::path(
    get,
    path = "/api/live/heartbeat",
    tag = "live",
    responses(
        (status = 200, description = "Latest heartbeat", body = HeartbeatSample),
    )
)]
pub async fn heartbeat(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(state.frames.heartbeat()),
    )
}

/// MJPEG stream of the frame store
#[utoipa::path(
    get,
    path = "/stream.mjpg",
    tag = "live",
    responses(
        (status = 200, description = "multipart/x-mixed-replace JPEG stream"),
    )
)]
pub async fn stream(State(state): State<AppState>) -> AppResult<Response> {
    tracing::debug!("MJPEG client connected");

    http::Response::builder()
        .header(header::CONTENT_TYPE, mjpeg::content_type())
        .header(header::CACHE_CONTROL, "no-store")
        .header(header::PRAGMA, "no-cache")
        .body(Body::from_stream(mjpeg::frame_stream(&state.frames)))
        .map_err(|e| AppError::internal(&format!("Failed to build stream response: {}", e)))
}
