// ABOUTME: Settings scaffolding for new installations.
// ABOUTME: Writes a commented slipway.yml showing every default.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

/// Write a template `slipway.yml` into `dir`. Refuses to overwrite unless `force`.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, TEMPLATE)?;
    Ok(config_path)
}

const TEMPLATE: &str = r#"# slipway settings. Every key is optional; the values shown are the defaults.

# runtime:
#   runtime: docker            # or podman; auto-detected when unset
#   socket: /var/run/docker.sock

store:
  path: .slipway/applications.json

timeouts:
  build: 30m
  inspect: 10s
  create: 60s
  start: 60s
  stop: 60s
  remove: 30s
  pause: 30s
  logs: 30s
  list: 30s

deploy:
  stop_grace: 10s
  stale_after: 1h

logs:
  default_lines: 100
"#;
