//! Monitor management API
//!
//! Registers heartbeat sources by base URL and reports their live status.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::monitor::{Endpoint, MonitorStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMonitorRequest {
    /// Unique monitor name
    pub name: String,
    /// Base URL of the source, e.g. `http://camera.local:8080/`
    pub base_url: String,
}

/// List all monitors
#[utoipa::path(
    get,
    path = "/api/monitors",
    tag = "monitors",
    responses(
        (status = 200, description = "Status of every monitor", body = Vec<MonitorStatus>),
    )
)]
pub async fn list(State(state): State<AppState>) -> ApiResponse<Vec<MonitorStatus>> {
    ApiResponse::success(state.monitors.list().await)
}

/// Register or re-point a monitor
#[utoipa::path(
    post,
    path = "/api/monitors",
    tag = "monitors",
    request_body = CreateMonitorRequest,
    responses(
        (status = 200, description = "Monitor started", body = MonitorStatus),
        (status = 400, description = "Invalid name or URL"),
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateMonitorRequest>,
) -> AppResult<ApiResponse<MonitorStatus>> {
    let endpoint = Endpoint::parse(&req.base_url)?;
    info!(monitor = %req.name, endpoint = %endpoint, "Registering monitor");

    let status = state.monitors.insert(&req.name, endpoint).await?;
    Ok(ApiResponse::success(status))
}

/// Get one monitor
#[utoipa::path(
    get,
    path = "/api/monitors/{name}",
    tag = "monitors",
    params(("name" = String, Path, description = "Monitor name")),
    responses(
        (status = 200, description = "Monitor status", body = MonitorStatus),
        (status = 404, description = "Unknown monitor"),
    )
)]
pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<ApiResponse<MonitorStatus>> {
    state
        .monitors
        .get(&name)
        .await
        .map(ApiResponse::success)
        .ok_or_else(|| AppError::not_found(&format!("Monitor {} not found", name)))
}

/// Stop and remove a monitor
#[utoipa::path(
    delete,
    path = "/api/monitors/{name}",
    tag = "monitors",
    params(("name" = String, Path, description = "Monitor name")),
    responses(
        (status = 200, description = "Monitor removed"),
        (status = 404, description = "Unknown monitor"),
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<ApiResponse<String>> {
    if state.monitors.remove(&name).await {
        Ok(ApiResponse::success(name))
    } else {
        Err(AppError::not_found(&format!("Monitor {} not found", name)))
    }
}

/// Reopen a monitor's stream
#[utoipa::path(
    post,
    path = "/api/monitors/{name}/reconnect",
    tag = "monitors",
    params(("name" = String, Path, description = "Monitor name")),
    responses(
        (status = 200, description = "Reconnect requested", body = MonitorStatus),
        (status = 404, description = "Unknown monitor"),
    )
)]
pub async fn reconnect(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<ApiResponse<MonitorStatus>> {
    state
        .monitors
        .reconnect(&name)
        .await
        .map(ApiResponse::success)
        .ok_or_else(|| AppError::not_found(&format!("Monitor {} not found", name)))
}
