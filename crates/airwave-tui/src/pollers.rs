//! Background pollers: stream-title metadata and audio-level sampling.
//!
//! Both treat every collaborator failure (timeout, non-zero exit,
//! unparsable output) as non-fatal: log and retry next cycle. They run for
//! the whole session and are aborted explicitly at shutdown.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use airwave_core::config::{MetadataConfig, MeterConfig};
use airwave_core::probe;
use airwave_core::session::SessionHandle;

use crate::app::AppMessage;
use crate::meter;

/// Periodically probe the stream title and publish changes into the
/// session. Skips cycles while a modal prompt owns input. The session's
/// `publish_title` discards results that raced with a station switch and
/// suppresses duplicates.
pub fn spawn_metadata_poller(
    session: SessionHandle,
    tx: mpsc::Sender<AppMessage>,
    config: MetadataConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interval = config.poll_interval();
        let timeout = config.probe_timeout();
        loop {
            tokio::time::sleep(interval).await;
            if session.input_active().await {
                continue;
            }
            let url = session.stream_url().await;
            if url.is_empty() {
                continue;
            }
            match probe::stream_title(&url, timeout).await {
                Ok(title) => {
                    if session.publish_title(&url, &title).await {
                        debug!("metadata: title → {}", title);
                        if tx.send(AppMessage::Redraw).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => debug!("metadata: probe failed: {}", e),
            }
        }
    })
}

/// Continuously run short external level-detection passes, map the decibel
/// reading onto `[1, 10]`, and feed jittered copies to the meter. Sleeps
/// while playback is paused instead of busy-polling.
pub fn spawn_level_sampler(
    session: SessionHandle,
    tx: mpsc::Sender<AppMessage>,
    config: MeterConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let window = std::time::Duration::from_secs_f64(config.sample_window_secs.max(0.2));
        let timeout = window + std::time::Duration::from_secs(3);
        loop {
            if session.is_paused().await {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                continue;
            }
            let url = session.stream_url().await;
            if url.is_empty() {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                continue;
            }
            match probe::sample_level_db(&url, window, timeout).await {
                Ok(db) => {
                    let level = meter::db_to_level(db, config.floor_db, config.ceil_db);
                    debug!("sampler: {:.1} dB → level {}", db, level);
                    let copies = meter::jittered_copies(level, 4, &mut rand::thread_rng());
                    for copy in copies {
                        if tx.send(AppMessage::LevelSample(copy)).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    debug!("sampler: pass failed: {}", e);
                    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        }
    })
}
