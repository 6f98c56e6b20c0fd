// ABOUTME: Library root for slipway - application lifecycle orchestration over Docker or Podman.
// ABOUTME: The CLI binary in main.rs is a thin layer over the Orchestrator facade.

pub mod application;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod resolver;
pub mod runtime;
pub mod store;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use orchestrator::Orchestrator;
