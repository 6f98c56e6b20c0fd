// ABOUTME: Pipeline state types for the type state pattern.
// ABOUTME: States carry their own data; a created or started run always has its container id.

use crate::types::ContainerId;

/// Claim held, nothing done yet.
/// Available actions: `build_image()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Image built and tagged.
/// Available actions: `retire_old()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageBuilt;

/// Previous container stopped and removed, as far as that succeeded.
/// Available actions: `create_container()`
#[derive(Debug, Clone, Copy, Default)]
pub struct OldRetired;

/// New container exists but is not running yet.
/// Available actions: `start_container()`
#[derive(Debug, Clone)]
pub struct ContainerCreated {
    container_id: ContainerId,
}

impl ContainerCreated {
    pub(crate) fn new(container_id: ContainerId) -> Self {
        Self { container_id }
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.container_id
    }
}

/// New container running.
#[derive(Debug, Clone)]
pub struct Started {
    container_id: ContainerId,
}

impl Started {
    pub(crate) fn new(container_id: ContainerId) -> Self {
        Self { container_id }
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.container_id
    }
}
