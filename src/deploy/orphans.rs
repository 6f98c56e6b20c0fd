// ABOUTME: Orphan container detection and cleanup.
// ABOUTME: Finds slipway-labelled containers that no application record points at.

use std::collections::HashMap;

use serde::Serialize;

use crate::application::MANAGED_LABEL;
use crate::config::Settings;
use crate::runtime::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary, bounded};
use crate::types::ContainerId;

/// Detect orphaned containers.
///
/// An orphan is a container that:
/// - Is managed by slipway (`slipway.managed=true`)
/// - Is not the `runtime_id` of any record in `known_containers`
///
/// Ids are compared by prefix so short and full ids match each other.
pub async fn detect_orphans<R>(
    runtime: &R,
    known_containers: &[ContainerId],
    settings: &Settings,
) -> Result<Vec<ContainerSummary>, ContainerError>
where
    R: ContainerOps + ?Sized,
{
    let filters = ContainerFilters {
        labels: HashMap::from([(MANAGED_LABEL.to_string(), "true".to_string())]),
        all: true,
        ..Default::default()
    };

    let containers = bounded("list", settings.timeouts.list, runtime.list_containers(&filters)).await?;

    Ok(containers
        .into_iter()
        .filter(|c| !known_containers.iter().any(|k| same_container(k, &c.id)))
        .collect())
}

fn same_container(a: &ContainerId, b: &ContainerId) -> bool {
    let (a, b) = (a.as_str(), b.as_str());
    !a.is_empty() && !b.is_empty() && (a.starts_with(b) || b.starts_with(a))
}

/// Outcome of an orphan cleanup.
#[derive(Debug, Default, Serialize)]
pub struct CleanupResult {
    pub removed: Vec<ContainerId>,
    pub failures: Vec<CleanupFailure>,
}

/// A container that could not be removed.
#[derive(Debug, Serialize)]
pub struct CleanupFailure {
    pub container: ContainerId,
    pub error: String,
}

/// Stop (best effort) and force-remove each container.
pub async fn cleanup_orphans<R>(
    runtime: &R,
    orphans: &[ContainerId],
    settings: &Settings,
) -> CleanupResult
where
    R: ContainerOps + ?Sized,
{
    let mut result = CleanupResult::default();

    for container_id in orphans {
        let stop = runtime.stop_container(container_id, settings.deploy.stop_grace);
        if let Err(e) = bounded("stop", settings.timeouts.stop, stop).await {
            tracing::debug!(container = %container_id.short(), error = %e, "orphan stop failed");
        }

        let remove = runtime.remove_container(container_id, true);
        match bounded("remove", settings.timeouts.remove, remove).await {
            Ok(()) | Err(ContainerError::NotFound(_)) => {
                tracing::info!(container = %container_id.short(), "removed orphan container");
                result.removed.push(container_id.clone());
            }
            Err(e) => result.failures.push(CleanupFailure {
                container: container_id.clone(),
                error: e.to_string(),
            }),
        }
    }

    result
}
