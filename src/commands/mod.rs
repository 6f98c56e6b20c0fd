// ABOUTME: Command module aggregator for the slipway CLI.
// ABOUTME: Re-exports the handlers and the runtime connection helper.

mod applications;
mod deploy;
mod lifecycle;
mod runtime_connection;

pub use applications::{delete, list, logs, orphans, rotate_token, show};
pub use deploy::{create, notify};
pub use lifecycle::{Action, lifecycle};
pub use runtime_connection::connect;

use slipway::error::{Error, Result};
use slipway::types::AppName;

fn app_name(raw: &str) -> Result<AppName> {
    AppName::new(raw).map_err(|e| Error::InvalidRequest(e.to_string()))
}
