pub mod health;
pub mod live;
pub mod metrics;
pub mod monitors;
pub mod openapi;
pub mod response;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::monitor::MonitorRegistry;
use crate::stream::FrameStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub frames: FrameStore,
    pub monitors: MonitorRegistry,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(monitors: MonitorRegistry) -> Self {
        Self {
            frames: FrameStore::new(),
            monitors,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
