// ABOUTME: Error types for pipeline runs.
// ABOUTME: Fatal build, create, and start failures plus claim and store problems.

use chrono::{DateTime, Utc};

use crate::runtime::{BuildError, ContainerError};
use crate::store::StoreError;
use crate::types::AppName;

/// Errors that end a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Building the image failed; nothing else was touched.
    #[error("failed to build image: {0}")]
    BuildFailed(#[source] BuildError),

    /// Creating the new container failed after the old one was retired.
    #[error("failed to create container: {0}")]
    CreateFailed(#[source] ContainerError),

    /// The new container exists but would not start.
    #[error("failed to start container: {0}")]
    StartFailed(#[source] ContainerError),

    /// Another run holds the deploy claim.
    #[error("application {app} is already deploying (since {since:?})")]
    Busy {
        app: AppName,
        since: Option<DateTime<Utc>>,
    },

    /// Reading or writing the record failed.
    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// The run panicked; the claim was still released.
    #[error("deployment task panicked: {0}")]
    Panicked(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Build,
    Create,
    Start,
    Busy,
    Store,
    Panicked,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::BuildFailed(_) => DeployErrorKind::Build,
            DeployError::CreateFailed(_) => DeployErrorKind::Create,
            DeployError::StartFailed(_) => DeployErrorKind::Start,
            DeployError::Busy { .. } => DeployErrorKind::Busy,
            DeployError::Store(_) => DeployErrorKind::Store,
            DeployError::Panicked(_) => DeployErrorKind::Panicked,
        }
    }

    /// Whether the engine itself could not be reached.
    pub fn is_runtime_unavailable(&self) -> bool {
        matches!(
            self,
            DeployError::BuildFailed(BuildError::Unavailable(_))
                | DeployError::CreateFailed(ContainerError::Unavailable(_))
                | DeployError::StartFailed(ContainerError::Unavailable(_))
        )
    }

    /// Whether a step ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            DeployError::BuildFailed(BuildError::TimedOut { .. })
                | DeployError::CreateFailed(ContainerError::TimedOut { .. })
                | DeployError::StartFailed(ContainerError::TimedOut { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn kinds_and_classifiers() {
        let err = DeployError::BuildFailed(BuildError::Unavailable("no socket".into()));
        assert_eq!(err.kind(), DeployErrorKind::Build);
        assert!(err.is_runtime_unavailable());
        assert!(!err.is_timeout());

        let err = DeployError::StartFailed(ContainerError::TimedOut {
            operation: "start",
            after: Duration::from_secs(60),
        });
        assert_eq!(err.kind(), DeployErrorKind::Start);
        assert!(err.is_timeout());
        assert!(err.to_string().contains("start timed out"));
    }
}
