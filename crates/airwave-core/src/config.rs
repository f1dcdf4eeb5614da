use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub meter: MeterConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Seconds between stream-title probes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Per-probe timeout; expiry counts as probe failure, not a fatal error.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

/// dB bounds for the level map are empirically chosen, not acoustically
/// principled; they are exposed here so they can be tuned per stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterConfig {
    /// Number of meter columns.
    #[serde(default = "default_meter_bars")]
    pub bars: usize,
    /// Reading at or below this maps to level 1.
    #[serde(default = "default_floor_db")]
    pub floor_db: f32,
    /// Reading at or above this maps to level 10.
    #[serde(default = "default_ceil_db")]
    pub ceil_db: f32,
    /// Length of one external level-detection pass, in seconds.
    #[serde(default = "default_sample_window_secs")]
    pub sample_window_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Output directory. None = fallback under the user's profile.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// "auto" probes the stream codec; anything unrecognized falls back to mp3.
    #[serde(default = "default_codec")]
    pub codec: String,
    /// How long to wait for the recorder after a graceful stop request.
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Dashboard refresh rate, frames per second.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u8,
    /// Idle time after the last digit before a quick-pick auto-finalizes.
    #[serde(default = "default_quick_pick_timeout_ms")]
    pub quick_pick_timeout_ms: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            bars: default_meter_bars(),
            floor_db: default_floor_db(),
            ceil_db: default_ceil_db(),
            sample_window_secs: default_sample_window_secs(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            codec: default_codec(),
            stop_grace_secs: default_stop_grace_secs(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            frame_rate: default_frame_rate(),
            quick_pick_timeout_ms: default_quick_pick_timeout_ms(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    15
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_meter_bars() -> usize {
    24
}

fn default_floor_db() -> f32 {
    -50.0
}

fn default_ceil_db() -> f32 {
    10.0
}

fn default_sample_window_secs() -> f64 {
    1.0
}

fn default_codec() -> String {
    "auto".to_string()
}

fn default_stop_grace_secs() -> u64 {
    5
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_frame_rate() -> u8 {
    8
}

fn default_quick_pick_timeout_ms() -> u64 {
    700
}

impl MetadataConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}

impl UiConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.frame_rate.max(1)))
    }

    pub fn quick_pick_timeout(&self) -> Duration {
        Duration::from_millis(self.quick_pick_timeout_ms.max(50))
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.metadata.poll_interval_secs, 15);
        assert_eq!(config.meter.floor_db, -50.0);
        assert_eq!(config.meter.ceil_db, 10.0);
        assert_eq!(config.recording.codec, "auto");
        assert_eq!(config.ui.frame_rate, 8);
        assert_eq!(config.ui.quick_pick_timeout_ms, 700);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[metadata]\npoll_interval_secs = 30\n").unwrap();
        assert_eq!(config.metadata.poll_interval_secs, 30);
        assert_eq!(config.metadata.probe_timeout_secs, 5);
        assert_eq!(config.ui.theme, "dark");
    }

    #[test]
    fn test_frame_interval_at_8_fps() {
        let ui = UiConfig::default();
        assert_eq!(ui.frame_interval(), Duration::from_millis(125));
    }
}
