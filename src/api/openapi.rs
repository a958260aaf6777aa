//! OpenAPI documentation for the Livewatch API

use utoipa::OpenApi;

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Livewatch API",
        version = "1.0.0",
        description = "Live heartbeat monitoring and MJPEG frame serving.\n\n## Features\n- Heartbeat endpoint reporting frame sequence and last update time\n- MJPEG stream of the latest frames\n- Liveness/FPS monitors for remote sources",
        license(name = "MIT"),
        contact(name = "Livewatch Team")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "live", description = "Heartbeat and MJPEG stream"),
        (name = "monitors", description = "Remote source liveness monitors"),
        (name = "metrics", description = "Prometheus metrics"),
        (name = "health", description = "Service health")
    ),
    paths(
        crate::api::health::health_check,
        crate::api::live::heartbeat,
        crate::api::live::stream,
        crate::api::monitors::list,
        crate::api::monitors::create,
        crate::api::monitors::get,
        crate::api::monitors::delete,
        crate::api::monitors::reconnect,
        crate::api::metrics::metrics_handler,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::api::monitors::CreateMonitorRequest,
            crate::api::response::ApiError,
            crate::liveness::HeartbeatSample,
            crate::liveness::Observation,
            crate::indicator::LinkState,
            crate::monitor::MonitorStatus,
        )
    )
)]
pub struct ApiDoc;
