//! Favorite stations and last-played-station files (TOML on disk).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub name: String,
    pub uuid_or_url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FavoritesFile {
    #[serde(default)]
    station: Vec<FavoriteEntry>,
}

pub struct Favorites {
    path: PathBuf,
    entries: Vec<FavoriteEntry>,
}

impl Favorites {
    /// Load the favorites list; a missing or unreadable file is an empty list.
    pub fn load(path: PathBuf) -> Self {
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| toml::from_str::<FavoritesFile>(&content).ok())
            .map(|file| file.station)
            .unwrap_or_default();
        debug!("favorites: loaded {} entries from {:?}", entries.len(), path);
        Self { path, entries }
    }

    pub fn entries(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    /// Add an entry. Returns false without modifying the list when the name
    /// is already taken.
    pub fn add(&mut self, name: &str, uuid_or_url: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.entries.iter().any(|e| e.name == name) {
            return false;
        }
        self.entries.push(FavoriteEntry {
            name: name.to_string(),
            uuid_or_url: uuid_or_url.trim().to_string(),
        });
        true
    }

    pub fn search(&self, name: &str) -> Option<&FavoriteEntry> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = FavoritesFile {
            station: self.entries.clone(),
        };
        std::fs::write(&self.path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }
}

/// The station that was playing when the previous session ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastStation {
    pub name: String,
    pub uuid_or_url: String,
}

pub fn load_last_station(path: &Path) -> Option<LastStation> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

pub fn save_last_station(path: &Path, station: &LastStation) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(station)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_duplicate_names() {
        let mut favorites = Favorites {
            path: PathBuf::from("/nonexistent"),
            entries: Vec::new(),
        };
        assert!(favorites.add("Jazz FM", "http://example.com/jazz"));
        assert!(!favorites.add("Jazz FM", "http://example.com/other"));
        assert!(!favorites.add("  ", "http://example.com/blank"));
        assert_eq!(favorites.entries().len(), 1);
    }

    #[test]
    fn test_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.toml");

        let mut favorites = Favorites::load(path.clone());
        favorites.add("Jazz FM", "http://example.com/jazz");
        favorites.add("News 24", "9b6b9cf3-9813-4d81-9d5e-30c35b5cbb04");
        favorites.save().unwrap();

        let reloaded = Favorites::load(path);
        assert_eq!(reloaded.entries().len(), 2);
        assert_eq!(
            reloaded.search("jazz fm").map(|e| e.uuid_or_url.as_str()),
            Some("http://example.com/jazz")
        );
    }

    #[test]
    fn test_last_station_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_station.toml");
        assert!(load_last_station(&path).is_none());

        let station = LastStation {
            name: "Jazz FM".to_string(),
            uuid_or_url: "http://example.com/jazz".to_string(),
        };
        save_last_station(&path, &station).unwrap();
        let loaded = load_last_station(&path).unwrap();
        assert_eq!(loaded.name, "Jazz FM");
    }
}
