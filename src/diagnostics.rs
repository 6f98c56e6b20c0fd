// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a pipeline run but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The previous container could not be stopped.
    pub fn stop_old(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::StopOld,
            message: message.into(),
        }
    }

    /// The previous container could not be removed.
    pub fn remove_old(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RemoveOld,
            message: message.into(),
        }
    }

    /// The container could not be cleaned up while deleting an application.
    pub fn container_cleanup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ContainerCleanup,
            message: message.into(),
        }
    }

    /// Releasing the deploy claim failed (the record may still say deploying).
    pub fn claim_release(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ClaimRelease,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    StopOld,
    RemoveOld,
    ContainerCleanup,
    ClaimRelease,
}
