// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ContainerOps, ImageOps, LogOps, RuntimeInfo and the FullRuntime bundle.

mod container;
mod image;
mod logs;
mod runtime_info;
mod shared_types;

pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use image::{BuildError, BuildOutcome, BuildRequest, ImageOps};
pub use logs::{FRAME_HEADER_LEN, LogError, LogLine, LogOps, LogOptions, LogStream, demux_frames};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

/// Every capability the orchestrator needs from an engine.
///
/// Implemented automatically for any type providing the individual traits, so
/// test doubles only implement the pieces.
pub trait FullRuntime: ContainerOps + ImageOps + LogOps + 'static {}

impl<T> FullRuntime for T where T: ContainerOps + ImageOps + LogOps + 'static {}
