//! Latest-frame store backing the heartbeat and MJPEG endpoints
//!
//! Producers publish whole JPEG frames; every publish bumps the sequence
//! counter and stamps the wall-clock time, which is exactly what the
//! heartbeat endpoint reports. Stream consumers are woken through a watch
//! channel and only ever see the most recent frame.

pub mod mjpeg;
pub mod player;

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use tokio::sync::watch;

use crate::liveness::HeartbeatSample;

pub use player::{list_jpegs_sorted, spawn_folder_player};

/// Most recent frame and its bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSnapshot {
    pub seq: u64,
    /// Epoch ms of the last publish, 0 before the first frame.
    pub last_epoch_ms: i64,
    pub jpeg: Bytes,
}

#[derive(Debug, Default)]
struct Latest {
    frame: FrameSnapshot,
    closed: bool,
}

#[derive(Clone)]
pub struct FrameStore {
    tx: Arc<watch::Sender<Latest>>,
}

impl FrameStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Latest::default());
        Self { tx: Arc::new(tx) }
    }

    /// Replace the latest frame, stamped with the current time.
    pub fn publish(&self, jpeg: Bytes) -> u64 {
        self.publish_at(jpeg, chrono::Utc::now().timestamp_millis())
    }

    pub fn publish_at(&self, jpeg: Bytes, epoch_ms: i64) -> u64 {
        let mut seq = 0;
        self.tx.send_modify(|latest| {
            latest.frame.seq += 1;
            latest.frame.last_epoch_ms = epoch_ms;
            latest.frame.jpeg = jpeg;
            seq = latest.frame.seq;
        });
        counter!("livewatch_frames_published_total", 1);
        seq
    }

    pub fn heartbeat(&self) -> HeartbeatSample {
        let latest = self.tx.borrow();
        HeartbeatSample::new(latest.frame.seq, latest.frame.last_epoch_ms)
    }

    pub fn latest(&self) -> FrameSnapshot {
        self.tx.borrow().frame.clone()
    }

    /// End every open stream and stop the player.
    pub fn close(&self) {
        self.tx.send_modify(|latest| latest.closed = true);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.borrow().closed
    }

    pub fn subscribe(&self) -> FrameSubscription {
        FrameSubscription {
            rx: self.tx.subscribe(),
            last_seq: 0,
        }
    }
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer cursor over a [`FrameStore`]; yields each new frame at most once.
pub struct FrameSubscription {
    rx: watch::Receiver<Latest>,
    last_seq: u64,
}

impl FrameSubscription {
    /// Wait for a frame newer than the last one returned. `None` once the store is closed.
    pub async fn next(&mut self) -> Option<FrameSnapshot> {
        loop {
            {
                let latest = self.rx.borrow_and_update();
                if latest.closed {
                    return None;
                }
                if latest.frame.seq != self.last_seq {
                    self.last_seq = latest.frame.seq;
                    return Some(latest.frame.clone());
                }
            }
            self.rx.changed().await.ok()?;
        }
    }
}
