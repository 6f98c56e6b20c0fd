// ABOUTME: Configuration types and parsing for slipway.yml.
// ABOUTME: Handles YAML parsing, defaults, discovery, and environment overrides.

mod deserialize;
mod env_value;
mod init;
mod manifest;
mod sections;

pub use env_value::{EnvValue, resolve_env_entries};
pub use init::init_config;
pub use manifest::{Manifest, SourceSpec};
pub use sections::{DeploySettings, LogSettings, StoreSettings, Timeouts};

use crate::error::{Error, Result};
use crate::runtime::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "slipway.yml";
pub const CONFIG_FILENAME_ALT: &str = "slipway.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".slipway/config.yml";

/// Overrides the runtime socket path.
pub const SOCKET_ENV: &str = "SLIPWAY_SOCKET";
/// Overrides the record file path.
pub const STORE_ENV: &str = "SLIPWAY_STORE";

/// Control-plane settings. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub timeouts: Timeouts,

    #[serde(default)]
    pub deploy: DeploySettings,

    #[serde(default)]
    pub logs: LogSettings,
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty or comment-only file is all defaults.
        if serde_yaml::from_str::<serde_yaml::Value>(yaml)?.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find a settings file in `dir`, falling back to defaults when there is none.
    ///
    /// A relative store path is taken relative to `dir`.
    pub fn discover(dir: &Path) -> Result<Self> {
        let mut settings = match Self::find(dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading settings");
                Self::load(&path)?
            }
            None => {
                tracing::debug!(dir = %dir.display(), "no settings file, using defaults");
                Self::default()
            }
        };
        if settings.store.path.is_relative() {
            settings.store.path = dir.join(&settings.store.path);
        }
        Ok(settings)
    }

    /// The first settings file present in `dir`.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        [CONFIG_FILENAME, CONFIG_FILENAME_ALT, CONFIG_FILENAME_DIR]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Apply `SLIPWAY_SOCKET` and `SLIPWAY_STORE` from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(socket) = std::env::var(SOCKET_ENV)
            && !socket.is_empty()
        {
            self.runtime.socket = Some(socket);
        }
        if let Ok(path) = std::env::var(STORE_ENV)
            && !path.is_empty()
        {
            self.store.path = PathBuf::from(path);
        }
        self
    }
}
