// ABOUTME: Live-derived view of an application: its record plus what the engine reports.
// ABOUTME: Rebuilt on every read and never stored.

use super::env_var::{self, EnvVar};
use super::port_binding::{self, PortBinding};
use super::record::{ApplicationConfig, ContainerTemplate};
use crate::runtime::ContainerDetails;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Status as observed from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedStatus {
    /// No container was ever created.
    NotBuilt,
    Running,
    Paused,
    Exited,
    /// The record points at a container the engine no longer has.
    ContainerNotFound,
    /// Any other engine state, verbatim.
    Other(String),
}

impl ObservedStatus {
    /// Map an engine state string.
    pub fn from_engine(state: &str) -> Self {
        match state {
            "running" => ObservedStatus::Running,
            "paused" => ObservedStatus::Paused,
            "exited" => ObservedStatus::Exited,
            other => ObservedStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ObservedStatus::NotBuilt => "not_built",
            ObservedStatus::Running => "running",
            ObservedStatus::Paused => "paused",
            ObservedStatus::Exited => "exited",
            ObservedStatus::ContainerNotFound => "container_not_found",
            ObservedStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for ObservedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ObservedStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ObservedStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "not_built" => ObservedStatus::NotBuilt,
            "container_not_found" => ObservedStatus::ContainerNotFound,
            other => ObservedStatus::from_engine(other),
        })
    }
}

/// A record together with its live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedApplication {
    #[serde(flatten)]
    pub config: ApplicationConfig,
    pub status: ObservedStatus,
    pub is_running: bool,
    pub port_bindings: Vec<PortBinding>,
    pub env_vars: Vec<EnvVar>,
    pub volumes: Vec<String>,
}

impl ObservedApplication {
    pub fn not_built(config: ApplicationConfig) -> Self {
        Self::without_container(config, ObservedStatus::NotBuilt)
    }

    pub fn container_not_found(config: ApplicationConfig) -> Self {
        Self::without_container(config, ObservedStatus::ContainerNotFound)
    }

    fn without_container(config: ApplicationConfig, status: ObservedStatus) -> Self {
        Self {
            config,
            status,
            is_running: false,
            port_bindings: Vec::new(),
            env_vars: Vec::new(),
            volumes: Vec::new(),
        }
    }

    pub fn from_details(config: ApplicationConfig, details: &ContainerDetails) -> Self {
        Self {
            config,
            status: ObservedStatus::from_engine(&details.status),
            is_running: details.running,
            port_bindings: port_binding::from_native(&details.port_bindings),
            env_vars: env_var::from_native(&details.env),
            volumes: details.binds.clone(),
        }
    }

    /// Whether a container currently backs this application.
    pub fn has_container(&self) -> bool {
        !matches!(
            self.status,
            ObservedStatus::NotBuilt | ObservedStatus::ContainerNotFound
        )
    }

    /// The live container settings, for reuse by a redeploy.
    pub fn template(&self) -> ContainerTemplate {
        ContainerTemplate {
            env: self.env_vars.clone(),
            ports: self.port_bindings.clone(),
            volumes: self.volumes.clone(),
        }
    }
}
