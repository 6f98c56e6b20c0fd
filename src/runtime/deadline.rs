// ABOUTME: Per-call time limits for runtime operations.
// ABOUTME: An elapsed limit becomes the operation's own TimedOut error variant.

use std::future::Future;
use std::time::Duration;

use super::traits::{BuildError, ContainerError, LogError};

/// Errors that can express "this operation ran out of time".
pub trait Deadline {
    fn timed_out(operation: &'static str, after: Duration) -> Self;
}

impl Deadline for ContainerError {
    fn timed_out(operation: &'static str, after: Duration) -> Self {
        ContainerError::TimedOut { operation, after }
    }
}

impl Deadline for BuildError {
    fn timed_out(operation: &'static str, after: Duration) -> Self {
        BuildError::TimedOut { operation, after }
    }
}

impl Deadline for LogError {
    fn timed_out(operation: &'static str, after: Duration) -> Self {
        LogError::TimedOut { operation, after }
    }
}

/// Run `fut`, failing with `E::timed_out` if it takes longer than `limit`.
pub async fn bounded<T, E, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Deadline,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, limit = ?limit, "runtime call timed out");
            Err(E::timed_out(operation, limit))
        }
    }
}
