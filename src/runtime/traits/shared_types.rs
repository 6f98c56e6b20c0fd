// ABOUTME: Engine-facing value types shared by the runtime capability traits.
// ABOUTME: Mirrors the engine's own shapes so adapters convert field-for-field.

use crate::types::{ContainerId, ImageRef};
use std::collections::HashMap;

/// One host-side record of the engine's port-binding map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostPort {
    pub host_ip: Option<String>,
    pub host_port: Option<String>,
}

/// The engine's port-binding map: `"80/tcp" -> [HostPort, ...]`.
pub type NativePortBindings = HashMap<String, Option<Vec<HostPort>>>;

/// Everything needed to create a container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: String,
    pub image: ImageRef,
    /// `KEY=VALUE` entries, in order.
    pub env: Vec<String>,
    pub port_bindings: NativePortBindings,
    /// Bind-mount specs such as `/srv/data:/data:ro`.
    pub binds: Vec<String>,
    pub labels: HashMap<String, String>,
}

/// Result of inspecting a container.
#[derive(Debug, Clone)]
pub struct ContainerDetails {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    /// Engine state string (`running`, `exited`, ...), verbatim.
    pub status: String,
    pub running: bool,
    pub env: Vec<String>,
    pub port_bindings: NativePortBindings,
    pub binds: Vec<String>,
    pub labels: HashMap<String, String>,
}

/// Engine version details.
#[derive(Debug, Clone)]
pub struct RuntimeMetadata {
    pub name: String,
    pub version: String,
    pub api_version: String,
    pub os: String,
    pub arch: String,
}
