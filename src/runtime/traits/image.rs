// ABOUTME: Image build operations for container runtimes.
// ABOUTME: Builds an image from a remote git locator and tags it.

use crate::types::{ImageId, ImageRef};
use async_trait::async_trait;
use std::time::Duration;

/// Image operations.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Build an image from a remote source (`<url>#<ref>[:<dir>]`), tagged `request.tag`.
    ///
    /// Resolves once the engine has finished the build; progress output is
    /// collected into the returned outcome.
    async fn build_image(&self, request: &BuildRequest) -> Result<BuildOutcome, BuildError>;
}

/// Parameters for a remote build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub tag: ImageRef,
    pub remote: String,
}

/// What a finished build reported.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    /// Image id, when the engine reports one.
    pub image_id: Option<ImageId>,
    /// Build output lines.
    pub output: Vec<String>,
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build of {tag} failed: {message}")]
    Failed { tag: String, message: String },

    #[error("container runtime unreachable: {0}")]
    Unavailable(String),

    #[error("{operation} timed out after {after:?}")]
    TimedOut {
        operation: &'static str,
        after: Duration,
    },

    #[error("runtime error: {0}")]
    Runtime(String),
}
