// Client configuration file.
//
// Location: `~/.twodays/config.toml`. Missing fields take their defaults,
// so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::view::projector::RenameDisplay;

/// Workspace joined when nothing else is configured.
pub const DEFAULT_WORKSPACE: &str = "+plaza.prm27p8eg65c";

/// Relays tried when nothing else is configured.
pub const DEFAULT_RELAYS: [&str; 2] = [
    "https://earthstar-demo-pub-6b.fly.dev",
    "https://earthstar-demo-pub-v6-a.glitch.me",
];

/// Root directory for client state: `~/.twodays/`.
pub fn state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".twodays"))
}

/// Path to the config file: `~/.twodays/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    state_dir().map(|d| d.join("config.toml"))
}

/// Default mirror location: `~/.twodays/mirror.db`.
pub fn default_mirror_path() -> PathBuf {
    state_dir().unwrap_or_else(|| PathBuf::from(".twodays")).join("mirror.db")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Workspace address, e.g. `+plaza.prm27p8eg65c`.
    pub workspace: String,
    /// Relay URLs shown as "pockets" while online.
    pub relays: Vec<String>,
    /// SQLite file backing the local mirror.
    pub mirror_path: PathBuf,
    pub rename_display: RenameDisplay,
    /// Re-render interval for fade updates.
    pub tick_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            workspace: DEFAULT_WORKSPACE.into(),
            relays: DEFAULT_RELAYS.iter().map(|relay| relay.to_string()).collect(),
            mirror_path: default_mirror_path(),
            rename_display: RenameDisplay::default(),
            tick_interval_ms: 1_000,
        }
    }
}

impl ClientConfig {
    /// Load from `~/.twodays/config.toml`. Returns defaults if the file
    /// doesn't exist or can't be parsed.
    pub fn load() -> Self {
        config_path().and_then(|p| Self::load_from(&p).ok()).unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save to `~/.twodays/config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path().ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine home directory",
            ))
        })?;
        self.save_to(&path)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
            Self::Serialize(e) => write!(f, "config serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
