//! Recorder process manager: Idle → Recording → Idle, toggled by one key.
//!
//! The external recorder is ffmpeg with `-progress pipe:1`, which emits
//! newline-delimited `key=value` pairs on stdout; the `progress` key marks
//! the end of each snapshot. A watcher task folds snapshots into a status
//! line for the info panel.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use airwave_core::config::RecordingConfig;
use airwave_core::{platform, probe};

use crate::app::AppMessage;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("ffmpeg binary not found")]
    BinaryMissing,
    /// Both the configured directory and the fallback failed; session-fatal.
    #[error("cannot create recording directory {0:?}: {1}")]
    Directory(PathBuf, std::io::Error),
    #[error("failed to start recorder: {0}")]
    Spawn(std::io::Error),
}

pub struct Recorder {
    child: Option<Child>,
    output_path: PathBuf,
    stop_grace: Duration,
}

impl Recorder {
    pub fn new(stop_grace: Duration) -> Self {
        Self {
            child: None,
            output_path: PathBuf::new(),
            stop_grace,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// True while the recorder process is alive. Reaps a naturally-exited
    /// process as a side effect.
    pub fn is_recording(&mut self) -> bool {
        match &mut self.child {
            None => false,
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    warn!("recorder: process exited with {}", status);
                    self.child = None;
                    false
                }
                Err(e) => {
                    warn!("recorder: liveness check failed: {}", e);
                    self.child = None;
                    false
                }
            },
        }
    }

    /// Start recording `url`. Returns the output path and the progress
    /// stream for [`watch_progress`].
    ///
    /// At most one recording can be active; callers toggle through
    /// [`Recorder::stop`] first.
    pub async fn start(
        &mut self,
        url: &str,
        station_name: &str,
        file_stem: Option<String>,
        config: &RecordingConfig,
        probe_timeout: Duration,
    ) -> Result<(PathBuf, ChildStdout), RecorderError> {
        let (extension, force_mp3) = resolve_codec(&config.codec, url, probe_timeout).await;
        let dir = resolve_output_dir(config.directory.as_deref())?;

        let stem = file_stem
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_filename(station_name, Local::now()));
        let out = dir.join(format!("{}.{}", stem, extension));

        let bin = platform::find_ffmpeg_binary().ok_or(RecorderError::BinaryMissing)?;
        let codec_arg = if force_mp3 { "libmp3lame" } else { "copy" };
        let mut child = Command::new(bin)
            .arg("-nostdin")
            .arg("-y")
            .args(["-i", url])
            .arg("-vn")
            .args(["-progress", "pipe:1"])
            .args(["-stats_period", "1"])
            .args(["-c:a", codec_arg])
            .args(["-loglevel", "error", "-hide_banner"])
            .arg(&out)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(RecorderError::Spawn)?;

        let stdout = child
            .stdout
            .take()
            .expect("recorder stdout was requested piped");
        info!("recorder: started pid={:?} out={:?}", child.id(), out);
        self.child = Some(child);
        self.output_path = out.clone();
        Ok((out, stdout))
    }

    /// Request graceful termination, wait briefly, force-kill on expiry.
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!("recorder: stopping pid={:?}", child.id());
            #[cfg(unix)]
            if let Some(pid) = child.id() {
                // SAFETY: pid belongs to a child we still own.
                unsafe {
                    libc::kill(pid as i32, libc::SIGTERM);
                }
            }
            #[cfg(not(unix))]
            {
                let _ = child.start_kill();
            }
            match tokio::time::timeout(self.stop_grace, child.wait()).await {
                Ok(_) => debug!("recorder: exited within grace period"),
                Err(_) => {
                    warn!("recorder: did not exit in time, killing");
                    let _ = child.kill().await;
                }
            }
        }
    }
}

/// Resolve the output codec: explicit mp3, probed when "auto", mp3 fallback
/// for probe failures and unrecognized requests. Returns (extension,
/// re-encode to mp3?).
async fn resolve_codec(requested: &str, url: &str, probe_timeout: Duration) -> (String, bool) {
    match requested.trim() {
        "mp3" | "" => ("mp3".to_string(), true),
        "auto" => match probe::stream_codec(url, probe_timeout).await {
            Ok(codec) => {
                debug!("recorder: probed codec {}", codec);
                (codec, false)
            }
            Err(e) => {
                warn!("recorder: codec probe failed ({}), falling back to mp3", e);
                ("mp3".to_string(), true)
            }
        },
        other => {
            warn!("recorder: unsupported codec {:?}, falling back to mp3", other);
            ("mp3".to_string(), true)
        }
    }
}

/// Resolve and create the output directory, falling back to the profile
/// directory; failure of both is fatal.
fn resolve_output_dir(configured: Option<&Path>) -> Result<PathBuf, RecorderError> {
    if let Some(dir) = configured {
        let dir = platform::normalize_record_path(dir);
        match std::fs::create_dir_all(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) => warn!("recorder: cannot use {:?} ({}), falling back", dir, e),
        }
    }
    let fallback = platform::fallback_record_dir();
    std::fs::create_dir_all(&fallback)
        .map_err(|e| RecorderError::Directory(fallback.clone(), e))?;
    Ok(fallback)
}

/// Timestamped default filename: `{station}-{DD-MON-YYYY}@{HH-MM-SS-AMPM}`
/// with spaces replaced by hyphens.
pub fn default_filename(station_name: &str, now: DateTime<Local>) -> String {
    let month = now.format("%b").to_string().to_ascii_uppercase();
    let stamp = format!(
        "{}-{}-{}@{}",
        now.format("%d"),
        month,
        now.format("%Y"),
        now.format("%I-%M-%S-%p"),
    );
    format!("{}-{}", station_name.trim(), stamp).replace(' ', "-")
}

// ── Progress stream ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ProgressSnapshot {
    out_time: Option<String>,
    total_size: Option<u64>,
    bitrate: Option<String>,
    speed: Option<String>,
}

impl ProgressSnapshot {
    /// Fold one progress line into the snapshot. Returns true when the
    /// end-of-snapshot sentinel was seen. Malformed lines are ignored.
    pub fn absorb(&mut self, line: &str) -> bool {
        let Some((key, value)) = line.trim().split_once('=') else {
            return false;
        };
        let value = value.trim();
        match key.trim() {
            "out_time" => self.out_time = Some(value.to_string()),
            "total_size" => self.total_size = value.parse().ok(),
            "bitrate" => self.bitrate = Some(value.to_string()),
            "speed" => self.speed = Some(value.to_string()),
            "progress" => return true,
            _ => {}
        }
        false
    }

    /// Human-readable status line for the info panel.
    pub fn status_line(&self) -> String {
        let elapsed = self
            .out_time
            .as_deref()
            .map(|t| t.split('.').next().unwrap_or(t).to_string())
            .unwrap_or_else(|| "--:--:--".to_string());
        let size = self
            .total_size
            .map(format_size)
            .unwrap_or_else(|| "--".to_string());
        let bitrate = self.bitrate.as_deref().unwrap_or("--");
        let speed = self.speed.as_deref().unwrap_or("--");
        format!("● REC {}  {}  {}  {}", elapsed, size, bitrate, speed)
    }
}

/// Scale a byte count to KiB/MiB for display.
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{} KiB", bytes / KIB)
    } else {
        format!("{} B", bytes)
    }
}

/// Read the recorder's progress stream until it closes, republishing a
/// status line after each complete snapshot.
pub async fn watch_progress(stdout: ChildStdout, tx: mpsc::Sender<AppMessage>) {
    let mut lines = BufReader::new(stdout).lines();
    let mut snapshot = ProgressSnapshot::default();
    while let Ok(Some(line)) = lines.next_line().await {
        if snapshot.absorb(&line) {
            if tx
                .send(AppMessage::RecorderStatus(snapshot.status_line()))
                .await
                .is_err()
            {
                return;
            }
            snapshot = ProgressSnapshot::default();
        }
    }
    debug!("recorder: progress stream closed");
    let _ = tx.send(AppMessage::RecorderExited).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_filename_matches_documented_pattern() {
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 5).unwrap();
        let name = default_filename("Jazz FM", at);
        assert_eq!(name, "Jazz-FM-05-MAR-2024@02-30-05-PM");
        assert!(!name.contains(' '));
    }

    #[test]
    fn test_default_filename_morning_uses_am() {
        let at = Local.with_ymd_and_hms(2024, 12, 31, 0, 5, 9).unwrap();
        let name = default_filename(" News 24 ", at);
        assert_eq!(name, "News-24-31-DEC-2024@12-05-09-AM");
    }

    #[test]
    fn test_snapshot_accumulates_until_sentinel() {
        let mut snap = ProgressSnapshot::default();
        assert!(!snap.absorb("out_time=00:01:23.456000"));
        assert!(!snap.absorb("total_size=1356800"));
        assert!(!snap.absorb("bitrate= 128.0kbits/s"));
        assert!(!snap.absorb("speed=1.01x"));
        assert!(!snap.absorb("this line is noise"));
        assert!(snap.absorb("progress=continue"));
        assert_eq!(
            snap.status_line(),
            "● REC 00:01:23  1.3 MiB  128.0kbits/s  1.01x"
        );
    }

    #[test]
    fn test_snapshot_tolerates_missing_fields() {
        let snap = ProgressSnapshot::default();
        assert_eq!(snap.status_line(), "● REC --:--:--  --  --  --");
    }

    #[test]
    fn test_format_size_scales() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(8 * 1024), "8 KiB");
        assert_eq!(format_size(1_356_800), "1.3 MiB");
    }
}
