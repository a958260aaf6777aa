//! Livewatch Library
//!
//! Heartbeat-driven liveness monitoring for live media sources, plus the
//! frame server that produces those heartbeats.

pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod indicator;
pub mod liveness;
pub mod monitor;
pub mod stream;

use axum::http::{header, Method};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::openapi::ApiDoc;
use crate::api::AppState;

/// Create the application router with the given state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Live source
        .route("/api/live/heartbeat", get(api::live::heartbeat))
        .route("/stream.mjpg", get(api::live::stream))
        // Monitors
        .route("/api/monitors", get(api::monitors::list))
        .route("/api/monitors", post(api::monitors::create))
        .route(
            "/api/monitors/:name",
            get(api::monitors::get).delete(api::monitors::delete),
        )
        .route("/api/monitors/:name/reconnect", post(api::monitors::reconnect))
        // Metrics (Prometheus)
        .route("/metrics", get(api::metrics::metrics_handler))
        // OpenAPI / Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Create CORS layer for browser dashboards polling the heartbeat
fn cors_layer() -> CorsLayer {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string());

    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(86400))
}
