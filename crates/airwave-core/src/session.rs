//! SessionState — the single shared mutable model of the live session.
//!
//! Every task reads it through a `SessionHandle`, but each field has exactly
//! one designated writer:
//!
//! - `station_name` / `stream_url` — the dispatcher, on station switch
//! - `track_title` — the metadata poller (via `publish_title`)
//! - `info` / `hints` / `input_active` — the dispatcher and its modal modes
//! - `paused` / `meter_visible` — the dispatcher
//! - `recording_path` — the recorder manager
//!
//! A coarse RwLock around the whole struct is sufficient under that
//! discipline; the render loop only ever takes snapshots.

use std::sync::Arc;
use tokio::sync::RwLock;

/// Info-panel content. One enum so the "lines or table, never both"
/// invariant holds by construction: setting either replaces the other.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InfoContent {
    #[default]
    Empty,
    Lines(Vec<String>),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub station_name: String,
    pub stream_url: String,
    /// Last known metadata title; empty until the first successful probe.
    pub track_title: String,
    /// Formatted key legend for the hint bar.
    pub hints: String,
    pub info: InfoContent,
    /// True while a modal prompt owns the key stream.
    pub input_active: bool,
    pub paused: bool,
    pub meter_visible: bool,
    /// Output path of the active recording, if any.
    pub recording_path: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            station_name: String::new(),
            stream_url: String::new(),
            track_title: String::new(),
            hints: String::new(),
            info: InfoContent::Empty,
            input_active: false,
            paused: false,
            meter_visible: true,
            recording_path: None,
        }
    }
}

/// Cheaply cloneable handle to the shared session state.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.inner.read().await.clone()
    }

    /// Switch the playback target. Name, URL, and the stale-title clear land
    /// in one critical section so no poller or renderer can observe the old
    /// title against the new station.
    pub async fn set_station(&self, name: &str, url: &str) {
        let mut state = self.inner.write().await;
        state.station_name = name.to_string();
        state.stream_url = url.to_string();
        state.track_title.clear();
        state.info = InfoContent::Empty;
    }

    /// Publish a probed title. Returns true if the displayed title changed.
    ///
    /// `for_url` is the URL the probe ran against; a result that raced with
    /// a station switch is discarded. Empty and unchanged titles are
    /// suppressed.
    pub async fn publish_title(&self, for_url: &str, title: &str) -> bool {
        let mut state = self.inner.write().await;
        if state.stream_url != for_url {
            return false;
        }
        let title = title.trim();
        if title.is_empty() || state.track_title == title {
            return false;
        }
        state.track_title = title.to_string();
        true
    }

    pub async fn stream_url(&self) -> String {
        self.inner.read().await.stream_url.clone()
    }

    pub async fn set_hints(&self, hints: &str) {
        self.inner.write().await.hints = hints.to_string();
    }

    pub async fn set_info_lines(&self, lines: Vec<String>) {
        self.inner.write().await.info = InfoContent::Lines(lines);
    }

    pub async fn set_info_table(&self, headers: Vec<String>, rows: Vec<Vec<String>>) {
        self.inner.write().await.info = InfoContent::Table { headers, rows };
    }

    pub async fn clear_info(&self) {
        self.inner.write().await.info = InfoContent::Empty;
    }

    pub async fn set_input_active(&self, active: bool) {
        self.inner.write().await.input_active = active;
    }

    pub async fn input_active(&self) -> bool {
        self.inner.read().await.input_active
    }

    pub async fn set_paused(&self, paused: bool) {
        self.inner.write().await.paused = paused;
    }

    pub async fn is_paused(&self) -> bool {
        self.inner.read().await.paused
    }

    pub async fn toggle_meter_visible(&self) -> bool {
        let mut state = self.inner.write().await;
        state.meter_visible = !state.meter_visible;
        state.meter_visible
    }

    pub async fn set_recording_path(&self, path: Option<String>) {
        self.inner.write().await.recording_path = path;
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_titles_are_suppressed() {
        let handle = SessionHandle::new();
        handle.set_station("Jazz FM", "http://x/jazz").await;

        assert!(handle.publish_title("http://x/jazz", "Song A").await);
        assert!(!handle.publish_title("http://x/jazz", "Song A").await);
        assert!(handle.publish_title("http://x/jazz", "Song B").await);
        assert_eq!(handle.snapshot().await.track_title, "Song B");
    }

    #[tokio::test]
    async fn test_empty_titles_never_published() {
        let handle = SessionHandle::new();
        handle.set_station("Jazz FM", "http://x/jazz").await;
        assert!(!handle.publish_title("http://x/jazz", "   ").await);
        assert_eq!(handle.snapshot().await.track_title, "");
    }

    #[tokio::test]
    async fn test_station_switch_clears_title_and_rejects_stale_probe() {
        let handle = SessionHandle::new();
        handle.set_station("Jazz FM", "http://x/jazz").await;
        handle.publish_title("http://x/jazz", "Song A").await;

        handle.set_station("News 24", "http://x/news").await;
        let state = handle.snapshot().await;
        assert_eq!(state.station_name, "News 24");
        assert_eq!(state.track_title, "");

        // A probe that started against the old URL must not land.
        assert!(!handle.publish_title("http://x/jazz", "Song A").await);
        assert_eq!(handle.snapshot().await.track_title, "");
    }

    #[tokio::test]
    async fn test_info_content_is_mutually_exclusive() {
        let handle = SessionHandle::new();
        handle.set_info_lines(vec!["hello".into()]).await;
        handle
            .set_info_table(vec!["Station".into()], vec![vec!["Jazz FM".into()]])
            .await;
        match handle.snapshot().await.info {
            InfoContent::Table { headers, .. } => assert_eq!(headers, vec!["Station"]),
            other => panic!("expected table, got {:?}", other),
        }

        handle.set_info_lines(vec!["back to lines".into()]).await;
        assert!(matches!(
            handle.snapshot().await.info,
            InfoContent::Lines(_)
        ));
    }
}
