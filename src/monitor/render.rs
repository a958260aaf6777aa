//! Presentation seam for monitor results

use tracing::{debug, info, warn};

use super::MonitorStatus;
use crate::indicator::LinkState;

/// Receives every status update produced by a monitor.
#[cfg_attr(test, mockall::automock)]
pub trait LiveRenderer: Send + 'static {
    fn render(&mut self, status: &MonitorStatus);

    /// The source came back online; reopen the stream at `url`.
    fn reconnect(&mut self, url: &str);
}

/// Logs state changes through `tracing`, per-poll stats at debug level.
#[derive(Debug, Default)]
pub struct TracingRenderer {
    last_state: Option<LinkState>,
}

impl TracingRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LiveRenderer for TracingRenderer {
    fn render(&mut self, status: &MonitorStatus) {
        if self.last_state != Some(status.state) {
            match status.state {
                LinkState::Live => info!(
                    monitor = %status.name,
                    stats = %status.stats,
                    "Source is LIVE"
                ),
                LinkState::Offline => warn!(
                    monitor = %status.name,
                    stats = %status.stats,
                    error = status.last_error.as_deref().unwrap_or("stale heartbeat"),
                    "Source is OFFLINE"
                ),
            }
            self.last_state = Some(status.state);
        }
        debug!(monitor = %status.name, state = %status.state, "{}", status.stats);
    }

    fn reconnect(&mut self, url: &str) {
        info!(url = %url, "Reconnecting stream");
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl LiveRenderer for NullRenderer {
    fn render(&mut self, _status: &MonitorStatus) {}

    fn reconnect(&mut self, _url: &str) {}
}
