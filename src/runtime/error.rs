// ABOUTME: Errors from reaching a container runtime, built with snafu context selectors.
// ABOUTME: Covers detection, client setup, and the ping done before any command.

use snafu::Snafu;
use std::time::Duration;

use super::detection::DetectionError;
use super::traits::RuntimeInfoError;

/// Failure to get a usable runtime connection.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("runtime detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("cannot open runtime socket {socket}: {source}"))]
    Connection {
        socket: String,
        source: RuntimeInfoError,
    },

    #[snafu(display("runtime at {socket} is not answering: {source}"))]
    Unreachable {
        socket: String,
        source: RuntimeInfoError,
    },

    #[snafu(display("runtime at {socket} did not answer within {after:?}"))]
    PingTimedOut { socket: String, after: Duration },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// No container runtime found on the system.
    NoRuntimeFound,
    /// The configured socket path does not exist.
    SocketMissing,
    /// The client could not be set up for the socket.
    ConnectionFailed,
    /// The socket exists but the daemon behind it does not respond.
    Unresponsive,
}

impl RuntimeError {
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Detection { source } => match source {
                DetectionError::NoRuntimeFound => RuntimeErrorKind::NoRuntimeFound,
                DetectionError::SocketMissing(_) => RuntimeErrorKind::SocketMissing,
            },
            RuntimeError::Connection { .. } => RuntimeErrorKind::ConnectionFailed,
            RuntimeError::Unreachable { .. } | RuntimeError::PingTimedOut { .. } => {
                RuntimeErrorKind::Unresponsive
            }
        }
    }

    /// The socket involved, when one was chosen.
    pub fn socket(&self) -> Option<&str> {
        match self {
            RuntimeError::Detection { source } => match source {
                DetectionError::SocketMissing(socket) => Some(socket.as_str()),
                DetectionError::NoRuntimeFound => None,
            },
            RuntimeError::Connection { socket, .. }
            | RuntimeError::Unreachable { socket, .. }
            | RuntimeError::PingTimedOut { socket, .. } => Some(socket.as_str()),
        }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snafu::ResultExt;

    #[test]
    fn kind_separates_missing_runtime_from_silent_daemon() {
        let err = RuntimeError::from(DetectionError::NoRuntimeFound);
        assert_eq!(err.kind(), RuntimeErrorKind::NoRuntimeFound);
        assert_eq!(err.socket(), None);

        let ping: Result<(), RuntimeInfoError> =
            Err(RuntimeInfoError::ConnectionFailed("connection refused".into()));
        let err = ping
            .context(UnreachableSnafu {
                socket: "/var/run/docker.sock",
            })
            .unwrap_err();
        assert_eq!(err.kind(), RuntimeErrorKind::Unresponsive);
        assert_eq!(err.socket(), Some("/var/run/docker.sock"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn ping_timeout_names_the_socket() {
        let err = RuntimeError::PingTimedOut {
            socket: "/run/podman/podman.sock".to_string(),
            after: Duration::from_secs(10),
        };
        assert_eq!(
            err.to_string(),
            "runtime at /run/podman/podman.sock did not answer within 10s"
        );
    }
}
