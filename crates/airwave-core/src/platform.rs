use std::path::{Path, PathBuf};

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/airwave/ (XDG standard)
    // instead of macOS Application Support for consistency
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("airwave")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("airwave")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("airwave")
    }
    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("airwave")
    }
}

/// Fallback directory for recordings when the configured one cannot be used.
pub fn fallback_record_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::env::temp_dir())
        .join("Music")
        .join("airwave")
}

/// Normalize a user-supplied recording path: expand `~`, and on Windows map
/// Linux-style `/home/<user>/rest` onto the local profile directory.
pub fn normalize_record_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy().to_string();

    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    #[cfg(windows)]
    if let Some(rest) = raw.strip_prefix("/home/") {
        // Drop the foreign user segment; keep the remainder under the profile.
        if let Some((_user, remainder)) = rest.split_once('/') {
            if let Some(home) = dirs::home_dir() {
                let mapped: PathBuf = remainder.split('/').collect();
                return home.join(mapped);
            }
        }
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }

    path.to_path_buf()
}

#[cfg(unix)]
fn ffplay_binary_names() -> &'static [&'static str] {
    &["ffplay"]
}

#[cfg(windows)]
fn ffplay_binary_names() -> &'static [&'static str] {
    &["ffplay.exe", "ffplay"]
}

#[cfg(unix)]
fn ffmpeg_binary_names() -> &'static [&'static str] {
    &["ffmpeg"]
}

#[cfg(windows)]
fn ffmpeg_binary_names() -> &'static [&'static str] {
    &["ffmpeg.exe", "ffmpeg"]
}

#[cfg(unix)]
fn ffprobe_binary_names() -> &'static [&'static str] {
    &["ffprobe"]
}

#[cfg(windows)]
fn ffprobe_binary_names() -> &'static [&'static str] {
    &["ffprobe.exe", "ffprobe"]
}

fn find_beside_exe(names: &[&str]) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    for name in names {
        let p = dir.join(name);
        if p.exists() {
            return Some(p);
        }
        let p = dir.join("external").join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var("PATH").ok()?;
    #[cfg(unix)]
    let sep = ":";
    #[cfg(windows)]
    let sep = ";";
    for dir in path.split(sep) {
        for name in names {
            let p = PathBuf::from(dir).join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }
    None
}

/// Find ffplay for stream playback.
pub fn find_ffplay_binary() -> Option<PathBuf> {
    if let Some(p) = find_beside_exe(ffplay_binary_names()) {
        return Some(p);
    }
    find_on_path(ffplay_binary_names())
}

/// Find ffmpeg for recording and level sampling.
pub fn find_ffmpeg_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("FFMPEG_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }
    if let Some(p) = find_beside_exe(ffmpeg_binary_names()) {
        return Some(p);
    }
    find_on_path(ffmpeg_binary_names())
}

/// Find ffprobe for metadata probing.
pub fn find_ffprobe_binary() -> Option<PathBuf> {
    if let Some(p) = find_beside_exe(ffprobe_binary_names()) {
        return Some(p);
    }
    find_on_path(ffprobe_binary_names())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_record_dir_under_profile() {
        let dir = fallback_record_dir();
        assert!(dir.ends_with(Path::new("Music").join("airwave")));
    }

    #[test]
    fn test_normalize_tilde_expansion() {
        let normalized = normalize_record_path(Path::new("~/Recordings"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(normalized, home.join("Recordings"));
        }
    }

    #[test]
    fn test_normalize_plain_path_unchanged() {
        let p = Path::new("/var/tmp/rec");
        assert_eq!(normalize_record_path(p), p.to_path_buf());
    }
}
