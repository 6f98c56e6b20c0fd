// ABOUTME: Deployment pipeline using the type state pattern.
// ABOUTME: Exports state types, the pipeline driver, the deploy lease, and orphan handling.

mod deployment;
mod error;
mod lease;
mod orphans;
mod pipeline;
mod state;
mod transitions;

pub use deployment::{Deployment, PipelineStep};
pub use error::{DeployError, DeployErrorKind};
pub use lease::DeployLease;
pub use orphans::{CleanupFailure, CleanupResult, cleanup_orphans, detect_orphans};
pub use pipeline::{DeployFailure, DeployReport, run_pipeline};
pub use state::{ContainerCreated, ImageBuilt, Initialized, OldRetired, Started};
pub use transitions::TransitionResult;
