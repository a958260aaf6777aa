//! Heartbeat liveness and frame-rate estimation
//!
//! A [`LivenessEstimator`] turns a stream of heartbeat samples into a smoothed
//! frames-per-second estimate (exponential moving average over the sequence
//! counter) and an online/offline verdict based on how old the source's last
//! update is.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ConfigError;

/// Default weight given to the newest instantaneous rate.
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.25;

/// Default maximum heartbeat age before the source is considered offline.
pub const DEFAULT_STALE_THRESHOLD_MS: i64 = 2000;

/// One heartbeat as reported by a media source.
///
/// `last_epoch_ms <= 0` means the source has never produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HeartbeatSample {
    #[serde(rename = "seq")]
    pub sequence: u64,
    #[serde(rename = "last_epoch_ms")]
    pub last_update_epoch_ms: i64,
}

impl HeartbeatSample {
    pub fn new(sequence: u64, last_update_epoch_ms: i64) -> Self {
        Self {
            sequence,
            last_update_epoch_ms,
        }
    }
}

/// Estimator settings, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    pub smoothing_factor: f64,
    pub stale_threshold_ms: i64,
}

impl EstimatorConfig {
    pub fn new(smoothing_factor: f64, stale_threshold_ms: i64) -> Result<Self, ConfigError> {
        if !smoothing_factor.is_finite() || smoothing_factor <= 0.0 || smoothing_factor > 1.0 {
            return Err(ConfigError::SmoothingFactor(smoothing_factor));
        }
        if stale_threshold_ms < 0 {
            return Err(ConfigError::StaleThreshold(stale_threshold_ms));
        }
        Ok(Self {
            smoothing_factor,
            stale_threshold_ms,
        })
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            stale_threshold_ms: DEFAULT_STALE_THRESHOLD_MS,
        }
    }
}

/// Result of a single [`LivenessEstimator::observe`] call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Observation {
    pub alive: bool,
    pub fps_ema: f64,
    /// Milliseconds since the source's last update; `None` if it never updated.
    pub age_ms: Option<i64>,
}

/// Smoothed rate and staleness tracker for one heartbeat source.
///
/// Not shared: each monitor owns its own estimator and is the only caller of
/// [`observe`](Self::observe).
#[derive(Debug, Clone)]
pub struct LivenessEstimator {
    config: EstimatorConfig,
    last_sequence: Option<u64>,
    last_sample_at: Option<i64>,
    fps_ema: f64,
}

impl LivenessEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            last_sequence: None,
            last_sample_at: None,
            fps_ema: 0.0,
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn fps_ema(&self) -> f64 {
        self.fps_ema
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    pub fn last_sample_at(&self) -> Option<i64> {
        self.last_sample_at
    }

    /// Fold one sample, observed at wall-clock `now` (epoch ms), into the estimate.
    pub fn observe(&mut self, sample: HeartbeatSample, now: i64) -> Observation {
        let age_ms = (sample.last_update_epoch_ms > 0)
            .then(|| now.saturating_sub(sample.last_update_epoch_ms));
        let alive = age_ms.is_some_and(|age| age <= self.config.stale_threshold_ms);

        if let (Some(prev_seq), Some(prev_at)) = (self.last_sequence, self.last_sample_at) {
            // A counter that went backwards (restart, reordering) carries no rate.
            let delta_seq = sample.sequence.checked_sub(prev_seq);
            // Time must move forward, and an unrepresentable gap carries no rate either.
            let elapsed_ms = now.checked_sub(prev_at).filter(|dt| *dt > 0);
            if let (Some(delta_seq), Some(elapsed_ms)) = (delta_seq, elapsed_ms) {
                let dt_secs = elapsed_ms as f64 / 1000.0;
                let instant_rate = delta_seq as f64 / dt_secs;
                self.fps_ema = if self.fps_ema == 0.0 {
                    instant_rate
                } else {
                    self.config.smoothing_factor * instant_rate
                        + (1.0 - self.config.smoothing_factor) * self.fps_ema
                };
            }
        }

        self.last_sequence = Some(sample.sequence);
        self.last_sample_at = Some(now);

        Observation {
            alive,
            fps_ema: self.fps_ema,
            age_ms,
        }
    }

    /// Forget all history, keeping the configuration.
    pub fn reset(&mut self) {
        self.last_sequence = None;
        self.last_sample_at = None;
        self.fps_ema = 0.0;
    }
}

impl Default for LivenessEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}
