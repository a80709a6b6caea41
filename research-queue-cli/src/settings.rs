//! Application settings persistence for Research Queue.
//!
//! Stores user preferences (cache location, published-snapshot source, the
//! status set offered for topics) in a JSON file at an OS-appropriate location.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where published snapshots are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteSettings {
    /// A directory containing `data/index.json` and `data/<quarter>/queue.json`.
    Directory(PathBuf),
    /// A base URL serving the same layout.
    Url(String),
}

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// SQLite file holding the local cache.
    pub data_file: PathBuf,
    /// Published snapshot source; `None` disables the remote tier.
    pub remote: Option<RemoteSettings>,
    /// Status tokens a topic may be set to.
    pub statuses: Vec<String>,
    /// Log specification, e.g. `warn` or `info,research_queue_core=debug`.
    pub log_level: String,
    /// Quiet period for debounced text edits, in milliseconds.
    pub edit_debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            remote: None,
            statuses: vec![
                "queued".to_string(),
                "in_progress".to_string(),
                "done".to_string(),
            ],
            log_level: "warn".to_string(),
            edit_debounce_ms: 300,
        }
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/research-queue/settings.json`
/// - Windows: `%APPDATA%/ResearchQueue/settings.json`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("ResearchQueue").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("research-queue").join("settings.json")
    }
}

/// Returns the default cache file: `<data dir>/research-queue/cache.sqlite3`.
pub fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join("research-queue")
        .join("cache.sqlite3")
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => Settings::default(),
    }
}

/// Saves settings to `path`, creating parent directories as needed.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create settings directory: {e}"))?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, json).map_err(|e| format!("Failed to write settings: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings(&dir.path().join("absent.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.edit_debounce_ms, 300);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ nope").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"remote":{"directory":"/srv/queue"},"statuses":["queued","parked"]}"#)
            .unwrap();

        let settings = load_settings(&path);
        assert_eq!(
            settings.remote,
            Some(RemoteSettings::Directory(PathBuf::from("/srv/queue")))
        );
        assert_eq!(settings.statuses, vec!["queued", "parked"]);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            remote: Some(RemoteSettings::Url("https://example.org/queue".to_string())),
            ..Settings::default()
        };
        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path), settings);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"url\""));
        assert!(written.contains("\"editDebounceMs\""));
    }
}
