//! Live monitors
//!
//! A monitor owns one [`LivenessEstimator`] and one [`LinkIndicator`] for a
//! single heartbeat source. It polls the source on a fixed cadence, renders
//! every result through a [`LiveRenderer`] and publishes the latest
//! [`MonitorStatus`] on a watch channel. The polling task lives exactly as
//! long as its [`MonitorHandle`].

pub mod endpoint;
pub mod registry;
pub mod render;
pub mod source;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use reqwest::Url;
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::config::Config;
use crate::display;
use crate::error::{ConfigError, MonitorError};
use crate::indicator::{LinkIndicator, LinkState};
use crate::liveness::{EstimatorConfig, HeartbeatSample, LivenessEstimator};

pub use endpoint::Endpoint;
pub use registry::MonitorRegistry;
pub use render::{LiveRenderer, NullRenderer, TracingRenderer};
pub use source::{HeartbeatSource, HttpHeartbeatSource};

/// Per-monitor settings derived from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub estimator: EstimatorConfig,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        if config.poll_interval_ms == 0 {
            return Err(ConfigError::PollInterval);
        }
        Ok(Self {
            estimator: EstimatorConfig::new(config.smoothing_factor, config.stale_threshold_ms)?,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            poll_interval: Duration::from_millis(500),
            request_timeout: Duration::from_millis(1500),
        }
    }
}

/// Snapshot published after every poll.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonitorStatus {
    pub name: String,
    pub endpoint: String,
    pub state: LinkState,
    pub alive: bool,
    pub fps_ema: f64,
    /// `null` when the source never reported an update
    pub age_ms: Option<i64>,
    pub stats: String,
    pub reconnects: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl MonitorStatus {
    fn initial(name: &str, endpoint: &Endpoint) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            state: LinkState::default(),
            alive: false,
            fps_ema: 0.0,
            age_ms: None,
            stats: display::unreachable_line(),
            reconnects: 0,
            last_error: None,
            observed_at: None,
        }
    }
}

pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// State and presentation wiring for one heartbeat source.
pub struct LiveMonitor<R> {
    name: String,
    stream_url: Url,
    estimator: LivenessEstimator,
    indicator: LinkIndicator,
    renderer: R,
    reconnects: u64,
    status_tx: watch::Sender<MonitorStatus>,
}

impl<R: LiveRenderer> LiveMonitor<R> {
    pub fn new(
        name: &str,
        endpoint: &Endpoint,
        estimator: EstimatorConfig,
        renderer: R,
    ) -> Result<Self, MonitorError> {
        let stream_url = endpoint.stream_url()?;
        let (status_tx, _) = watch::channel(MonitorStatus::initial(name, endpoint));
        Ok(Self {
            name: name.to_string(),
            stream_url,
            estimator: LivenessEstimator::new(estimator),
            indicator: LinkIndicator::new(),
            renderer,
            reconnects: 0,
            status_tx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LinkState {
        self.indicator.state()
    }

    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorStatus> {
        self.status_tx.subscribe()
    }

    /// Open the stream for the first time.
    pub fn start(&mut self, now: i64) {
        self.renderer.reconnect(&self.cache_busted_stream_url(now));
    }

    /// Reopen the stream on request, whatever the current state.
    ///
    /// Only OFFLINE to LIVE transitions count towards `reconnects`.
    pub fn reconnect(&mut self, now: i64) {
        info!(monitor = %self.name, state = %self.indicator.state(), "Manual reconnect");
        self.renderer.reconnect(&self.cache_busted_stream_url(now));
    }

    /// Feed one poll result (a sample or the transport failure) into the monitor.
    pub fn step(&mut self, now: i64, outcome: Result<HeartbeatSample, MonitorError>) -> MonitorStatus {
        let mut status = self.status_tx.borrow().clone();
        status.observed_at = DateTime::from_timestamp_millis(now);

        match outcome {
            Ok(sample) => {
                let obs = self.estimator.observe(sample, now);
                let transition = self.indicator.apply(obs.alive);

                status.alive = obs.alive;
                status.fps_ema = obs.fps_ema;
                status.age_ms = obs.age_ms;
                status.stats = display::stats_line(&obs);
                status.last_error = None;

                if transition.reconnect() {
                    self.reconnects += 1;
                    counter!("livewatch_monitor_reconnects_total", 1, "monitor" => self.name.clone());
                    self.renderer.reconnect(&self.cache_busted_stream_url(now));
                }
            }
            Err(e) => {
                debug!(monitor = %self.name, error = %e, "Heartbeat poll failed");
                self.indicator.mark_offline();

                status.alive = false;
                status.age_ms = None;
                status.stats = display::unreachable_line();
                status.last_error = Some(e.to_string());
            }
        }

        status.state = self.indicator.state();
        status.reconnects = self.reconnects;

        gauge!("livewatch_monitor_fps", status.fps_ema, "monitor" => self.name.clone());
        gauge!(
            "livewatch_monitor_alive",
            if status.alive { 1.0 } else { 0.0 },
            "monitor" => self.name.clone()
        );

        self.renderer.render(&status);
        self.status_tx.send_replace(status.clone());
        status
    }

    fn cache_busted_stream_url(&self, now: i64) -> String {
        let mut url = self.stream_url.clone();
        url.query_pairs_mut().append_pair("ts", &now.to_string());
        url.to_string()
    }
}

/// Owner of a running monitor task. Stopping or dropping it halts polling.
pub struct MonitorHandle {
    name: String,
    endpoint: Endpoint,
    status: watch::Receiver<MonitorStatus>,
    reconnect: Arc<Notify>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn status(&self) -> MonitorStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorStatus> {
        self.status.clone()
    }

    /// Ask the polling task to reopen the stream.
    pub fn reconnect(&self) {
        self.reconnect.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!(monitor = %self.name, "Monitor stopped");
    }
}

/// Start polling `source` every `poll_interval` on the current tokio runtime.
pub fn spawn_monitor<S, R>(
    mut monitor: LiveMonitor<R>,
    endpoint: Endpoint,
    source: S,
    poll_interval: Duration,
) -> MonitorHandle
where
    S: HeartbeatSource,
    R: LiveRenderer,
{
    let name = monitor.name().to_string();
    let status = monitor.subscribe();
    let reconnect = Arc::new(Notify::new());
    let reconnect_requests = reconnect.clone();

    info!(
        monitor = %name,
        endpoint = %endpoint,
        poll_ms = poll_interval.as_millis() as u64,
        "Starting live monitor"
    );

    let task = tokio::spawn(async move {
        monitor.start(now_epoch_ms());

        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = source.fetch().await;
                    monitor.step(now_epoch_ms(), outcome);
                }
                _ = reconnect_requests.notified() => monitor.reconnect(now_epoch_ms()),
            }
        }
    });

    MonitorHandle {
        name,
        endpoint,
        status,
        reconnect,
        task,
    }
}
