use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use match_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_BOARD_ROWS: usize = 10;
pub const DEFAULT_BOARD_COLS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write settings file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardSettings {
    pub rows: usize,
    pub cols: usize,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            rows: DEFAULT_BOARD_ROWS,
            cols: DEFAULT_BOARD_COLS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub board: BoardSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            engine: EngineConfig::default(),
            board: BoardSettings::default(),
        }
    }
}

impl Settings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.engine = self.engine.sanitized();
        self.board.rows = self.board.rows.max(1);
        self.board.cols = self.board.cols.max(1);
        self
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os("BALLFALL_SETTINGS_PATH") {
            return Self::at(explicit);
        }

        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::at(base.join("ballfall").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load(&self) -> Settings {
        match self.load_strict() {
            Ok(settings) => settings,
            Err(SettingsError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Settings::default()
            }
            Err(err) => {
                warn!(%err, "using default settings");
                Settings::default()
            }
        }
    }

    pub fn load_strict(&self) -> Result<Settings, SettingsError> {
        let bytes = fs::read(&self.path).map_err(|source| SettingsError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_slice::<Settings>(&bytes)
            .map(Settings::sanitized)
            .map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Writes default settings when no file exists yet and returns what is
    /// now on disk. An existing file is loaded strictly and left untouched.
    pub fn init(&self) -> Result<Settings, SettingsError> {
        if self.path.exists() {
            return self.load_strict();
        }
        let settings = Settings::default();
        self.save(&settings)?;
        info!(path = %self.path.display(), "wrote default settings");
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let text = serde_json::to_string_pretty(settings)
            .map_err(|e| write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        fs::write(&self.path, text).map_err(write_err)
    }
}
