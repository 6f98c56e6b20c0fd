// ABOUTME: Log retrieval for container runtimes and the engine's stream framing.
// ABOUTME: Multiplexed log frames carry an 8-byte header that demux_frames strips.

use crate::types::ContainerId;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Log retrieval operations.
#[async_trait]
pub trait LogOps: Send + Sync {
    /// Fetch the logs currently retained for a container, without following.
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<Vec<LogLine>, LogError>;
}

/// Options for log retrieval.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub stdout: bool,
    pub stderr: bool,
    /// Prefix each line with the engine's RFC 3339 timestamp.
    pub timestamps: bool,
    /// Number of lines to return from the end (`None` = all).
    pub tail: Option<u64>,
}

impl LogOptions {
    /// Combined stdout/stderr, last `n` lines.
    pub fn tail(n: u64) -> Self {
        Self {
            stdout: true,
            stderr: true,
            timestamps: false,
            tail: Some(n),
        }
    }

    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }
}

/// A chunk of log output from one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub stream: LogStream,
    pub content: String,
}

/// Log stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdin,
    Stdout,
    Stderr,
    /// Unframed output from a TTY container.
    Console,
}

/// Errors from log operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("stream error: {0}")]
    StreamError(String),

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

/// Size of the frame header: stream byte, three zero bytes, big-endian u32 length.
pub const FRAME_HEADER_LEN: usize = 8;

/// Split a multiplexed log payload into its frames, dropping each 8-byte header.
///
/// Returns `None` when `raw` does not start with a valid header, which is how
/// unframed (TTY) output is told apart. A truncated trailing frame keeps
/// whatever payload bytes arrived.
pub fn demux_frames(raw: &[u8]) -> Option<Vec<LogLine>> {
    let mut lines = Vec::new();
    let mut rest = raw;

    while !rest.is_empty() {
        if rest.len() < FRAME_HEADER_LEN {
            return if lines.is_empty() { None } else { Some(lines) };
        }
        let stream = match rest[0] {
            0 => LogStream::Stdin,
            1 => LogStream::Stdout,
            2 => LogStream::Stderr,
            _ => return if lines.is_empty() { None } else { Some(lines) },
        };
        if rest[1..4] != [0, 0, 0] {
            return if lines.is_empty() { None } else { Some(lines) };
        }
        let len = u32::from_be_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        let end = (FRAME_HEADER_LEN + len).min(rest.len());
        lines.push(LogLine {
            stream,
            content: String::from_utf8_lossy(&rest[FRAME_HEADER_LEN..end]).into_owned(),
        });
        rest = &rest[end..];
    }

    Some(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(stream: u8, payload: &str) -> Vec<u8> {
        let mut out = vec![stream, 0, 0, 0];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload.as_bytes());
        out
    }

    #[test]
    fn strips_headers_from_each_frame() {
        let mut raw = frame(1, "listening on :8080\n");
        raw.extend(frame(2, "warn: cache cold\n"));

        let lines = demux_frames(&raw).unwrap();
        assert_eq!(
            lines,
            vec![
                LogLine {
                    stream: LogStream::Stdout,
                    content: "listening on :8080\n".to_string()
                },
                LogLine {
                    stream: LogStream::Stderr,
                    content: "warn: cache cold\n".to_string()
                },
            ]
        );
    }

    #[test]
    fn unframed_output_is_rejected() {
        assert!(demux_frames(b"plain tty output\n").is_none());
    }

    #[test]
    fn truncated_frame_keeps_partial_payload() {
        let mut raw = frame(1, "complete\n");
        let mut partial = frame(1, "partial line\n");
        partial.truncate(12);
        raw.extend(partial);

        let lines = demux_frames(&raw).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].content, "part");
    }

    #[test]
    fn tail_options_read_both_streams() {
        let opts = LogOptions::tail(100).with_timestamps(true);
        assert!(opts.stdout && opts.stderr && opts.timestamps);
        assert_eq!(opts.tail, Some(100));
    }
}
