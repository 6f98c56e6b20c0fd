// ABOUTME: Shared helper for connecting to the local container runtime and record store.
// ABOUTME: Every command that touches applications goes through connect().

use slipway::Orchestrator;
use slipway::config::Settings;
use slipway::error::Result;
use slipway::output::Output;
use slipway::runtime::{
    BollardRuntime, ConnectionSnafu, PingTimedOutSnafu, RuntimeError, RuntimeInfo,
    UnreachableSnafu, detect,
};
use slipway::store::FileStore;
use snafu::{OptionExt, ResultExt};
use std::sync::Arc;

pub type App = Orchestrator<BollardRuntime, FileStore>;

/// Detect the runtime, check it answers, and open the record file.
pub async fn connect(settings: Settings, output: &Output) -> Result<App> {
    output.progress("  → Detecting runtime...");
    let endpoint = detect(&settings.runtime).map_err(RuntimeError::from)?;
    let socket = endpoint.socket_path.clone();

    output.progress(&format!("  → Found {} at {}", endpoint.runtime_type, socket));

    let runtime = BollardRuntime::connect(&endpoint, settings.timeouts.longest())
        .context(ConnectionSnafu {
            socket: socket.as_str(),
        })?;

    let ping_limit = settings.timeouts.inspect;
    tokio::time::timeout(ping_limit, runtime.ping())
        .await
        .ok()
        .context(PingTimedOutSnafu {
            socket: socket.as_str(),
            after: ping_limit,
        })?
        .context(UnreachableSnafu {
            socket: socket.as_str(),
        })?;

    let store = FileStore::open(settings.store.path.clone()).await?;

    tracing::debug!(store = %store.path().display(), "record store opened");
    Ok(Orchestrator::new(Arc::new(runtime), Arc::new(store), settings))
}
