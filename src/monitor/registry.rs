//! Named set of running monitors

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::info;

use super::{
    spawn_monitor, Endpoint, HeartbeatSource, HttpHeartbeatSource, LiveMonitor, LiveRenderer,
    MonitorHandle, MonitorSettings, MonitorStatus, TracingRenderer,
};
use crate::error::{AppError, AppResult, MonitorError};

/// Shared registry of monitors keyed by name.
///
/// Each entry owns its polling task; replacing or removing an entry stops it.
#[derive(Clone)]
pub struct MonitorRegistry {
    settings: MonitorSettings,
    client: Client,
    monitors: Arc<RwLock<BTreeMap<String, MonitorHandle>>>,
}

impl MonitorRegistry {
    pub fn new(settings: MonitorSettings) -> Result<Self, MonitorError> {
        let client = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self {
            settings,
            client,
            monitors: Arc::new(RwLock::new(BTreeMap::new())),
        })
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Register (or re-point) an HTTP monitor for the source at `endpoint`.
    pub async fn insert(&self, name: &str, endpoint: Endpoint) -> AppResult<MonitorStatus> {
        let source =
            HttpHeartbeatSource::with_client(self.client.clone(), endpoint.heartbeat_url()?);
        self.insert_with(name, endpoint, source, TracingRenderer::new())
            .await
    }

    pub async fn insert_with<S, R>(
        &self,
        name: &str,
        endpoint: Endpoint,
        source: S,
        renderer: R,
    ) -> AppResult<MonitorStatus>
    where
        S: HeartbeatSource,
        R: LiveRenderer,
    {
        let name = validate_name(name)?;
        let monitor = LiveMonitor::new(&name, &endpoint, self.settings.estimator, renderer)?;
        let handle = spawn_monitor(monitor, endpoint, source, self.settings.poll_interval);
        let status = handle.status();

        let previous = self.monitors.write().await.insert(name.clone(), handle);
        if let Some(old) = previous {
            info!(monitor = %name, old_endpoint = %old.endpoint(), "Replaced monitor");
        }

        Ok(status)
    }

    pub async fn remove(&self, name: &str) -> bool {
        let removed = self.monitors.write().await.remove(name.trim());
        if let Some(handle) = &removed {
            handle.stop();
            info!(monitor = %handle.name(), "Removed monitor");
        }
        removed.is_some()
    }

    pub async fn get(&self, name: &str) -> Option<MonitorStatus> {
        self.monitors
            .read()
            .await
            .get(name.trim())
            .map(MonitorHandle::status)
    }

    pub async fn list(&self) -> Vec<MonitorStatus> {
        self.monitors
            .read()
            .await
            .values()
            .map(MonitorHandle::status)
            .collect()
    }

    /// Reopen the stream of the named monitor. Returns its status, or `None` if unknown.
    pub async fn reconnect(&self, name: &str) -> Option<MonitorStatus> {
        let monitors = self.monitors.read().await;
        let handle = monitors.get(name.trim())?;
        handle.reconnect();
        Some(handle.status())
    }

    pub async fn len(&self) -> usize {
        self.monitors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.monitors.read().await.is_empty()
    }

    /// Stop every monitor, e.g. on shutdown.
    pub async fn clear(&self) {
        let mut monitors = self.monitors.write().await;
        for handle in monitors.values() {
            handle.stop();
        }
        monitors.clear();
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Monitor name must not be empty"));
    }
    if name.contains('/') {
        return Err(AppError::bad_request("Monitor name must not contain '/'"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liveness::HeartbeatSample;
    use crate::monitor::NullRenderer;

    struct FixedSource(HeartbeatSample);

    impl HeartbeatSource for FixedSource {
        async fn fetch(&self) -> Result<HeartbeatSample, MonitorError> {
            Ok(self.0)
        }
    }

    fn registry() -> MonitorRegistry {
        MonitorRegistry::new(MonitorSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let reg = registry();
        let ep = Endpoint::parse("http://cam.test/").unwrap();

        let status = reg
            .insert_with(" front ", ep, FixedSource(HeartbeatSample::new(1, 1)), NullRenderer)
            .await
            .unwrap();
        assert_eq!(status.name, "front");
        assert_eq!(status.endpoint, "http://cam.test/");
        assert_eq!(reg.len().await, 1);
        assert!(reg.get("front").await.is_some());

        assert!(reg.remove("front").await);
        assert!(!reg.remove("front").await);
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn test_insert_replaces_same_name() {
        let reg = registry();
        for url in ["http://a.test/", "http://b.test/"] {
            reg.insert_with(
                "cam",
                Endpoint::parse(url).unwrap(),
                FixedSource(HeartbeatSample::new(0, 0)),
                NullRenderer,
            )
            .await
            .unwrap();
        }

        let list = reg.list().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].endpoint, "http://b.test/");
    }

    #[tokio::test]
    async fn test_reconnect_unknown_monitor() {
        let reg = registry();
        assert!(reg.reconnect("missing").await.is_none());

        reg.insert_with(
            "cam",
            Endpoint::parse("http://cam.test/").unwrap(),
            FixedSource(HeartbeatSample::new(0, 0)),
            NullRenderer,
        )
        .await
        .unwrap();
        let status = reg.reconnect(" cam ").await.unwrap();
        assert_eq!(status.name, "cam");
    }

    #[tokio::test]
    async fn test_rejects_empty_name() {
        let reg = registry();
        let err = reg
            .insert_with(
                "   ",
                Endpoint::parse("http://cam.test/").unwrap(),
                FixedSource(HeartbeatSample::new(0, 0)),
                NullRenderer,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
