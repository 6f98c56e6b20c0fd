// ABOUTME: Container runtime access: capability traits, detection, and the bollard adapter.
// ABOUTME: Everything above this module talks to engines only through the traits.

mod bollard;
mod deadline;
mod detection;
mod error;
pub mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use deadline::{Deadline, bounded};
pub use detection::{DetectionError, detect, detect_local};
pub use error::{
    ConnectionSnafu, DetectionSnafu, PingTimedOutSnafu, RuntimeError, RuntimeErrorKind,
    UnreachableSnafu,
};
pub use traits::*;
pub use types::{RuntimeConfig, RuntimeInfo as RuntimeEndpoint, RuntimeType};
