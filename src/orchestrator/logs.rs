// ABOUTME: Log retrieval for an application's container.
// ABOUTME: Parses the caller's line-count and timestamp parameters leniently.

use crate::error::Result;
use crate::runtime::{FullRuntime, LogLine, LogOptions, bounded};
use crate::store::RecordStore;
use crate::types::AppName;

use super::Orchestrator;

/// Lines returned when the caller asks for none or something unusable.
pub const DEFAULT_LOG_LINES: u64 = 100;

/// A log request as received from a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogRequest {
    /// `None` means the configured default.
    pub lines: Option<u64>,
    pub timestamps: bool,
}

impl LogRequest {
    pub fn new(lines: u64, timestamps: bool) -> Self {
        Self {
            lines: Some(lines),
            timestamps,
        }
    }

    /// Build from raw query parameters.
    ///
    /// `lines` is read from its leading digits (`"50abc"` is 50). Absent,
    /// non-numeric, or zero means the default. `timestamps` is a presence flag.
    pub fn from_query(lines: Option<&str>, timestamps: bool) -> Self {
        let lines = lines.and_then(|raw| {
            let raw = raw.trim_start();
            let raw = raw.strip_prefix('+').unwrap_or(raw);
            let end = raw
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(raw.len());
            raw[..end].parse::<u64>().ok().filter(|n| *n > 0)
        });
        Self { lines, timestamps }
    }

    pub fn lines_or(&self, default: u64) -> u64 {
        self.lines.unwrap_or(default)
    }
}

impl<R: FullRuntime, S: RecordStore> Orchestrator<R, S> {
    /// The tail of the container's combined stdout/stderr, frame headers stripped.
    pub async fn fetch_logs(&self, name: &AppName, request: LogRequest) -> Result<Vec<LogLine>> {
        let (_, id) = self.container_of(name).await?;
        let options = LogOptions::tail(request.lines_or(self.settings.logs.default_lines))
            .with_timestamps(request.timestamps);

        let lines = bounded(
            "logs",
            self.settings.timeouts.logs,
            self.runtime.container_logs(&id, &options),
        )
        .await?;
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_garbage_lines_use_default() {
        assert_eq!(LogRequest::from_query(None, false).lines, None);
        assert_eq!(LogRequest::from_query(Some("abc"), false).lines, None);
        assert_eq!(LogRequest::from_query(Some(""), false).lines, None);
        assert_eq!(LogRequest::from_query(Some("0"), false).lines, None);
        assert_eq!(LogRequest::from_query(Some("-5"), false).lines, None);
        assert_eq!(
            LogRequest::from_query(Some("abc"), false).lines_or(DEFAULT_LOG_LINES),
            100
        );
    }

    #[test]
    fn leading_digits_are_used() {
        assert_eq!(LogRequest::from_query(Some("50"), true).lines, Some(50));
        assert_eq!(LogRequest::from_query(Some(" 20lines"), false).lines, Some(20));
        assert!(LogRequest::from_query(None, true).timestamps);
    }
}
