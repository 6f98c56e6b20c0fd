// ABOUTME: Settings sections: record store, per-call timeouts, deploy and log defaults.
// ABOUTME: Durations are written in humantime form ("30m", "10s").

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    /// JSON file holding application records.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".slipway/applications.json")
}

/// Upper bounds for individual engine calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeouts {
    #[serde(default = "default_build", with = "humantime_serde")]
    pub build: Duration,
    #[serde(default = "default_inspect", with = "humantime_serde")]
    pub inspect: Duration,
    #[serde(default = "default_lifecycle", with = "humantime_serde")]
    pub create: Duration,
    #[serde(default = "default_lifecycle", with = "humantime_serde")]
    pub start: Duration,
    #[serde(default = "default_lifecycle", with = "humantime_serde")]
    pub stop: Duration,
    #[serde(default = "default_short", with = "humantime_serde")]
    pub remove: Duration,
    #[serde(default = "default_short", with = "humantime_serde")]
    pub pause: Duration,
    #[serde(default = "default_short", with = "humantime_serde")]
    pub logs: Duration,
    #[serde(default = "default_short", with = "humantime_serde")]
    pub list: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            build: default_build(),
            inspect: default_inspect(),
            create: default_lifecycle(),
            start: default_lifecycle(),
            stop: default_lifecycle(),
            remove: default_short(),
            pause: default_short(),
            logs: default_short(),
            list: default_short(),
        }
    }
}

impl Timeouts {
    /// The longest limit, used as the engine client's own request timeout.
    pub fn longest(&self) -> Duration {
        [
            self.build,
            self.inspect,
            self.create,
            self.start,
            self.stop,
            self.remove,
            self.pause,
            self.logs,
            self.list,
        ]
        .into_iter()
        .max()
        .unwrap_or(self.build)
    }
}

fn default_build() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_inspect() -> Duration {
    Duration::from_secs(10)
}

fn default_lifecycle() -> Duration {
    Duration::from_secs(60)
}

fn default_short() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploySettings {
    /// How long the engine waits after SIGTERM before killing.
    #[serde(default = "default_stop_grace", with = "humantime_serde")]
    pub stop_grace: Duration,

    /// Age after which a deploy claim is considered abandoned.
    #[serde(default = "default_stale_after", with = "humantime_serde")]
    pub stale_after: Duration,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            stop_grace: default_stop_grace(),
            stale_after: default_stale_after(),
        }
    }
}

fn default_stop_grace() -> Duration {
    Duration::from_secs(10)
}

fn default_stale_after() -> Duration {
    Duration::from_secs(60 * 60)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    #[serde(default = "default_lines")]
    pub default_lines: u64,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_lines: default_lines(),
        }
    }
}

fn default_lines() -> u64 {
    100
}
