//! Validated base URLs for monitored sources

use std::fmt;

use reqwest::Url;
use serde::{Serialize, Serializer};

use crate::error::MonitorError;

/// Path of the heartbeat endpoint relative to a source's base URL.
pub const HEARTBEAT_PATH: &str = "api/live/heartbeat";
/// Path of the MJPEG stream relative to a source's base URL.
pub const STREAM_PATH: &str = "stream.mjpg";

/// Absolute http(s) base URL, without query or fragment, always ending in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    pub fn parse(text: &str) -> Result<Self, MonitorError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MonitorError::InvalidEndpoint(
                "URL is empty, e.g. http://localhost:8080/".to_string(),
            ));
        }

        let mut url = Url::parse(text)
            .map_err(|e| MonitorError::InvalidEndpoint(format!("'{}': {}", text, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(MonitorError::InvalidEndpoint(format!(
                "'{}': only http and https are supported",
                text
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(MonitorError::InvalidEndpoint(format!("'{}': missing host", text)));
        }

        url.set_query(None);
        url.set_fragment(None);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self { base: url })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a path relative to the base, e.g. `join("stream.mjpg")`.
    pub fn join(&self, relative: &str) -> Result<Url, MonitorError> {
        self.base
            .join(relative.trim_start_matches('/'))
            .map_err(|e| MonitorError::InvalidEndpoint(e.to_string()))
    }

    pub fn heartbeat_url(&self) -> Result<Url, MonitorError> {
        self.join(HEARTBEAT_PATH)
    }

    pub fn stream_url(&self) -> Result<Url, MonitorError> {
        self.join(STREAM_PATH)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.base.as_str())
    }
}
