//! Plays a folder of JPEG files into the frame store at a fixed rate

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::FrameStore;

const FALLBACK_FPS: f64 = 10.0;

fn has_jpeg_ext(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

/// Regular `.jpg`/`.jpeg` files in `dir`, sorted by file name.
///
/// A missing or unreadable directory yields an empty list.
pub async fn list_jpegs_sorted(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Cannot read frames directory");
            return files;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        let path = entry.path();
        if is_file && has_jpeg_ext(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

const MIN_FRAME_PERIOD: Duration = Duration::from_millis(1);

/// Period between frames at `fps`; unusable rates fall back to 10 fps.
fn frame_period(fps: f64) -> Duration {
    let fallback = || Duration::from_secs_f64(1.0 / FALLBACK_FPS);
    if !(fps.is_finite() && fps > 0.0) {
        return fallback();
    }
    match Duration::try_from_secs_f64(1.0 / fps) {
        Ok(period) => period.max(MIN_FRAME_PERIOD),
        Err(e) => {
            warn!(fps, error = %e, "Frame rate out of range, using fallback");
            fallback()
        }
    }
}

/// Loop over the JPEGs in `dir` forever, publishing one per frame period.
///
/// Returns immediately if the directory holds no JPEGs, and once the store is closed.
pub async fn run_folder_player(store: FrameStore, dir: PathBuf, fps: f64) {
    let files = list_jpegs_sorted(&dir).await;
    if files.is_empty() {
        warn!(dir = %dir.display(), "No JPEG files found, frame player disabled");
        return;
    }

    let period = frame_period(fps);
    info!(
        dir = %dir.display(),
        frames = files.len(),
        period_ms = period.as_millis() as u64,
        "Starting frame player"
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    for path in files.iter().cycle() {
        ticker.tick().await;
        if store.is_closed() {
            break;
        }

        match tokio::fs::read(path).await {
            Ok(data) if !data.is_empty() => {
                store.publish(Bytes::from(data));
            }
            Ok(_) => debug!(file = %path.display(), "Skipping empty frame"),
            Err(e) => debug!(file = %path.display(), error = %e, "Skipping unreadable frame"),
        }
    }

    info!("Frame player stopped");
}

pub fn spawn_folder_player(store: FrameStore, dir: PathBuf, fps: f64) -> JoinHandle<()> {
    tokio::spawn(run_folder_player(store, dir, fps))
}
