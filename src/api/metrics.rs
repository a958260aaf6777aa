use axum::{extract::State, response::IntoResponse};

use crate::api::AppState;

/// Prometheus metrics endpoint
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "metrics",
    responses(
        (status = 200, description = "Prometheus text exposition"),
    )
)]
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut body = format!(
        "# HELP livewatch_info Livewatch build info\n# TYPE livewatch_info gauge\nlivewatch_info{{version=\"{}\"}} 1\n",
        env!("CARGO_PKG_VERSION")
    );

    // Recorder is only installed by the binary
    if let Some(handle) = &state.prometheus {
        body.push_str(&handle.render());
    }

    ([("content-type", "text/plain; charset=utf-8")], body)
}
