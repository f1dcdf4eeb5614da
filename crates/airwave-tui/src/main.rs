mod app;
mod components;
mod meter;
mod modal;
mod player;
mod pollers;
mod recorder;
mod theme;

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;

use airwave_core::config::Config;
use airwave_core::favorites::{self, Favorites};
use airwave_core::probe;
use airwave_core::session::SessionHandle;
use airwave_core::platform;

use app::{App, AppMessage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("airwave.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG override; default keeps app debug but not dependency noise.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("airwave log: {}", log_path.display());

    tracing::info!("airwave starting…");

    let config = Config::load().unwrap_or_default();
    let favorites = Favorites::load(platform::config_dir().join("favorites.toml"));
    let last_station_path = data_dir.join("last_station.toml");

    let initial = resolve_initial(
        &favorites,
        &last_station_path,
        std::env::args().nth(1),
        config.metadata.probe_timeout(),
    )
    .await;

    let session = SessionHandle::new();
    let (tx, rx) = mpsc::channel::<AppMessage>(256);

    let app = App::new(config, session, favorites, last_station_path, tx);
    app.run(rx, initial).await
}

/// Resolve what to play at startup: a URL or favorite name given on the
/// command line, else the last played station, else start idle.
async fn resolve_initial(
    favorites: &Favorites,
    last_station_path: &Path,
    arg: Option<String>,
    probe_timeout: Duration,
) -> Option<(String, String)> {
    if let Some(arg) = arg {
        let arg = arg.trim().to_string();
        if arg.contains("://") {
            let name = probe::station_name(&arg, probe_timeout)
                .await
                .unwrap_or_else(|_| "Unknown Station".to_string());
            return Some((name, arg));
        }
        if let Some(entry) = favorites.search(&arg) {
            if entry.uuid_or_url.contains("://") {
                return Some((entry.name.clone(), entry.uuid_or_url.clone()));
            }
            eprintln!("favorite {:?} is not a direct stream URL", entry.name);
            return None;
        }
        eprintln!("no favorite named {:?}", arg);
        return None;
    }

    favorites::load_last_station(last_station_path)
        .filter(|s| s.uuid_or_url.contains("://"))
        .map(|s| (s.name, s.uuid_or_url))
}
