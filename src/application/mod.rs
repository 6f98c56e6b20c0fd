// ABOUTME: Application data model: persisted record, observed view, and value codecs.
// ABOUTME: Codecs convert between these values and the engine's native shapes.

pub mod env_var;
mod observed;
pub mod port_binding;
mod record;

use std::collections::HashMap;

pub use env_var::EnvVar;
pub use observed::{ObservedApplication, ObservedStatus};
pub use port_binding::{PortBinding, PortBindingError};
pub use record::{ApplicationConfig, ContainerTemplate, NewApplication};

use crate::types::AppName;

/// Label marking containers this tool created.
pub const MANAGED_LABEL: &str = "slipway.managed";

/// Label carrying the owning application's name.
pub const APPLICATION_LABEL: &str = "slipway.application";

/// Labels attached to every container created for `name`.
pub fn container_labels(name: &AppName) -> HashMap<String, String> {
    HashMap::from([
        (MANAGED_LABEL.to_string(), "true".to_string()),
        (APPLICATION_LABEL.to_string(), name.to_string()),
    ])
}
