// ABOUTME: Validated domain types and engine identifiers.
// ABOUTME: Parsing happens once at the edge; the core only sees checked values.

mod app_name;
mod git_source;
mod id;
mod image_ref;
mod webhook_token;

pub use app_name::{AppName, AppNameError};
pub use git_source::{GitSource, GitSourceError};
pub use id::{ContainerId, ImageId};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use webhook_token::WebhookToken;
