use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{HearthError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Rows of the scored table shown after an upload.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    /// Stored uploads kept after each new upload; 0 keeps all of them.
    #[serde(default = "default_keep_uploads")]
    pub keep_uploads: usize,
}

fn default_preview_rows() -> usize {
    10
}

fn default_keep_uploads() -> usize {
    20
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            preview_rows: default_preview_rows(),
            keep_uploads: default_keep_uploads(),
        }
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    home().join("Documents").join("hearth")
}

/// A settings.json on disk.
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    /// `~/.config/hearth/settings.json`
    pub fn user() -> Self {
        Self::at(home().join(".config").join("hearth").join("settings.json"))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Missing fields take their defaults. An unreadable or malformed file
    /// yields `Settings::default()`.
    pub fn load(&self) -> Settings {
        if !self.exists() {
            return Settings::default();
        }
        let parsed = std::fs::read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
        match parsed {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable settings");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| HearthError::Settings(e.to_string()))?;
        std::fs::write(&self.path, format!("{json}\n"))?;
        Ok(())
    }
}

pub fn load_settings() -> Settings {
    SettingsFile::user().load()
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    SettingsFile::user().save(settings)
}

pub fn settings_file_exists() -> bool {
    SettingsFile::user().exists()
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
