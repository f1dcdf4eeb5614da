//! External playback process (ffplay) lifecycle.

use std::process::Stdio;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use airwave_core::platform;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("ffplay binary not found")]
    BinaryMissing,
    #[error("failed to start playback: {0}")]
    Spawn(#[from] std::io::Error),
}

pub struct Player {
    child: Option<Child>,
    url: String,
    paused: bool,
}

impl Player {
    pub fn new() -> Self {
        Self {
            child: None,
            url: String::new(),
            paused: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Start playing `url`, replacing any current playback.
    pub async fn play(&mut self, url: &str) -> Result<(), PlayerError> {
        self.stop().await;
        let bin = platform::find_ffplay_binary().ok_or(PlayerError::BinaryMissing)?;
        let child = Command::new(bin)
            .args(["-nodisp", "-loglevel", "error", "-vn", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        info!("player: started ffplay pid={:?} url={}", child.id(), url);
        self.child = Some(child);
        self.url = url.to_string();
        self.paused = false;
        Ok(())
    }

    /// Stop playback and reap the process. Safe to call when idle.
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!("player: stopping pid={:?}", child.id());
            let _ = child.kill().await;
        }
        self.paused = false;
    }

    /// Toggle pause. Returns the new paused state.
    ///
    /// On unix the process is suspended in place; elsewhere pause stops the
    /// process and resume respawns it against the remembered URL.
    pub async fn toggle_pause(&mut self) -> Result<bool, PlayerError> {
        #[cfg(unix)]
        {
            if let Some(child) = &self.child {
                if let Some(pid) = child.id() {
                    let signal = if self.paused {
                        libc::SIGCONT
                    } else {
                        libc::SIGSTOP
                    };
                    // SAFETY: pid comes from a child we own; kill(2) with
                    // SIGSTOP/SIGCONT does not reparent or reap it.
                    unsafe {
                        libc::kill(pid as i32, signal);
                    }
                    self.paused = !self.paused;
                    debug!("player: paused={} url={}", self.paused, self.url);
                } else {
                    tracing::warn!("player: toggle_pause on exited process");
                }
            }
            Ok(self.paused)
        }
        #[cfg(not(unix))]
        {
            if self.paused {
                let url = self.url.clone();
                self.play(&url).await?;
            } else if self.child.is_some() {
                if let Some(mut child) = self.child.take() {
                    let _ = child.kill().await;
                }
                self.paused = true;
            }
            Ok(self.paused)
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}
