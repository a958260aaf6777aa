//! Error types shared across the service

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::response::ApiResponse;

/// Invalid estimator or monitor settings.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("smoothing factor must be in (0, 1], got {0}")]
    SmoothingFactor(f64),
    #[error("stale threshold must be non-negative, got {0}ms")]
    StaleThreshold(i64),
    #[error("poll interval must be positive")]
    PollInterval,
    #[error("invalid monitor target '{0}', expected name=url")]
    MonitorTarget(String),
}

/// Failures while talking to a heartbeat endpoint.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("heartbeat endpoint returned HTTP {0}")]
    Status(u16),
    #[error("malformed heartbeat: {0}")]
    Decode(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Monitor(#[from] MonitorError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(msg: &str) -> Self {
        AppError::NotFound(msg.to_string())
    }

    pub fn bad_request(msg: &str) -> Self {
        AppError::BadRequest(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }

    /// Machine-readable code carried in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Monitor(MonitorError::InvalidEndpoint(_)) => "VALIDATION_ERROR",
            AppError::Monitor(_) => "UPSTREAM_ERROR",
            AppError::Config(_) => "VALIDATION_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(msg) = &self {
            tracing::error!(error = %msg, "Internal error");
        }
        ApiResponse::error(self.code(), self.to_string()).into_response()
    }
}
