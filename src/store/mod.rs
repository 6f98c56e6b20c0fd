// ABOUTME: Application record store: trait, shared record logic, and two backends.
// ABOUTME: All mutations are atomic with respect to each other within one store.

mod file;
mod memory;
mod records;

use crate::application::ApplicationConfig;
use crate::types::{AppName, WebhookToken};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors from the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("application not found: {0}")]
    NotFound(AppName),

    #[error("application already exists: {0}")]
    AlreadyExists(AppName),

    #[error("webhook token is already used by application {0}")]
    TokenTaken(AppName),

    #[error("record file {path} is locked by another process (waited {waited:?})")]
    Locked { path: PathBuf, waited: Duration },

    #[error("failed to access record file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome of trying to take the deploy claim.
#[derive(Debug, Clone)]
pub enum Claim {
    /// The claim is ours; carries the record as it now stands.
    Acquired(ApplicationConfig),
    /// Another live claim holds the application.
    Busy(ApplicationConfig),
}

/// Persistence for application records.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn find(&self, name: &AppName) -> Result<Option<ApplicationConfig>, StoreError>;

    async fn find_by_token(
        &self,
        token: &WebhookToken,
    ) -> Result<Option<ApplicationConfig>, StoreError>;

    /// All records, ordered by name.
    async fn find_all(&self) -> Result<Vec<ApplicationConfig>, StoreError>;

    /// Add a new record. Fails if the name or the webhook token is taken.
    async fn insert(&self, config: ApplicationConfig) -> Result<(), StoreError>;

    /// Insert or overwrite a record. Fails if another record holds its webhook token.
    async fn save(&self, config: ApplicationConfig) -> Result<(), StoreError>;

    /// Atomically apply `f` to the stored record and return the result.
    async fn update<F>(&self, name: &AppName, f: F) -> Result<ApplicationConfig, StoreError>
    where
        F: FnOnce(&mut ApplicationConfig) + Send;

    /// Remove a record, returning it if it existed.
    async fn remove(&self, name: &AppName) -> Result<Option<ApplicationConfig>, StoreError>;

    /// Set `is_deploying` unless a claim younger than `stale_after` already holds it.
    async fn try_mark_deploying(
        &self,
        name: &AppName,
        now: DateTime<Utc>,
        stale_after: Duration,
    ) -> Result<Claim, StoreError>;

    /// Release the deploy claim. A missing record is not an error.
    async fn clear_deploying(&self, name: &AppName) -> Result<(), StoreError>;
}
