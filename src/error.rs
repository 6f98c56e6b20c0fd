// ABOUTME: Application-wide error types for slipway.
// ABOUTME: Facade failures map onto a small taxonomy exposed through ErrorKind.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::runtime::{BuildError, ContainerError, LogError, RuntimeError};
use crate::store::StoreError;
use crate::types::AppName;

#[derive(Debug, Error)]
pub enum Error {
    #[error("application not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("image build failed: {0}")]
    BuildFailed(String),

    #[error("container {operation} failed: {message}")]
    ContainerOperationFailed {
        operation: &'static str,
        message: String,
    },

    #[error("application {0} has no container")]
    ContainerNotFound(AppName),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    RuntimeUnavailable,
    BuildFailed,
    ContainerOperationFailed,
    ContainerNotFound,
    InvalidRequest,
    Store,
    Config,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::RuntimeUnavailable(_) | Error::Runtime(_) => ErrorKind::RuntimeUnavailable,
            Error::BuildFailed(_) => ErrorKind::BuildFailed,
            Error::ContainerOperationFailed { .. } => ErrorKind::ContainerOperationFailed,
            Error::ContainerNotFound(_) => ErrorKind::ContainerNotFound,
            Error::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Error::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Error::Store(StoreError::AlreadyExists(_) | StoreError::TokenTaken(_)) => {
                ErrorKind::Conflict
            }
            Error::Store(_) => ErrorKind::Store,
            Error::AlreadyExists(_)
            | Error::MissingEnvVar(_)
            | Error::InvalidConfig(_)
            | Error::Yaml(_) => ErrorKind::Config,
            Error::Io(_) | Error::Json(_) => ErrorKind::Io,
        }
    }

    /// Wrap a failed container call, keeping the engine's message verbatim.
    pub fn container(operation: &'static str, err: ContainerError) -> Self {
        match err {
            ContainerError::Unavailable(message) => Error::RuntimeUnavailable(message),
            other => Error::ContainerOperationFailed {
                operation,
                message: other.to_string(),
            },
        }
    }

    pub fn not_found(name: impl std::fmt::Display) -> Self {
        Error::NotFound(name.to_string())
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Unavailable(message) => Error::RuntimeUnavailable(message),
            other => Error::BuildFailed(other.to_string()),
        }
    }
}

impl From<LogError> for Error {
    fn from(err: LogError) -> Self {
        match err {
            LogError::Unavailable(message) => Error::RuntimeUnavailable(message),
            other => Error::ContainerOperationFailed {
                operation: "logs",
                message: other.to_string(),
            },
        }
    }
}

impl From<DeployError> for Error {
    fn from(err: DeployError) -> Self {
        match err {
            DeployError::BuildFailed(e) => e.into(),
            DeployError::CreateFailed(e) => Error::container("create", e),
            DeployError::StartFailed(e) => Error::container("start", e),
            e @ DeployError::Busy { .. } => Error::Conflict(e.to_string()),
            DeployError::Store(e) => Error::Store(e),
            e @ DeployError::Panicked(_) => Error::ContainerOperationFailed {
                operation: "deploy",
                message: e.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_engine_is_runtime_unavailable() {
        let err = Error::container("stop", ContainerError::Unavailable("refused".into()));
        assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable);

        let err: Error = BuildError::Unavailable("refused".into()).into();
        assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable);
    }

    #[test]
    fn engine_message_is_kept_verbatim() {
        let err = Error::container(
            "pause",
            ContainerError::NotRunning("container abc is not running".into()),
        );
        assert_eq!(err.kind(), ErrorKind::ContainerOperationFailed);
        assert!(err.to_string().contains("container abc is not running"));
    }

    #[test]
    fn busy_deploy_is_a_conflict() {
        let err: Error = DeployError::Busy {
            app: AppName::new("api").unwrap(),
            since: None,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn shared_webhook_token_is_a_conflict() {
        let err: Error = StoreError::TokenTaken(AppName::new("api").unwrap()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn store_not_found_reports_not_found() {
        let err: Error = StoreError::NotFound(AppName::new("api").unwrap()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
