//! Heartbeat sources

use std::future::Future;

use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, Url};

use crate::error::MonitorError;
use crate::liveness::HeartbeatSample;

/// Something that can be asked for the current heartbeat.
pub trait HeartbeatSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<HeartbeatSample, MonitorError>> + Send;
}

/// Polls `GET <url>?ts=<now>` and decodes `{seq, last_epoch_ms}`.
#[derive(Clone)]
pub struct HttpHeartbeatSource {
    client: Client,
    url: Url,
}

impl HttpHeartbeatSource {
    pub fn with_client(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

impl HeartbeatSource for HttpHeartbeatSource {
    async fn fetch(&self) -> Result<HeartbeatSample, MonitorError> {
        let ts = chrono::Utc::now().timestamp_millis().to_string();
        let response = self
            .client
            .get(self.url.clone())
            .query(&[("ts", ts.as_str())])
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| MonitorError::Decode(e.to_string()))
    }
}
