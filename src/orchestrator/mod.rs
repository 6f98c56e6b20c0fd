// ABOUTME: Orchestrator facade: every application operation a caller can request.
// ABOUTME: Owns the runtime, the record store, and settings; status is resolved live on each read.

mod deployments;
mod lifecycle;
mod logs;

use std::sync::Arc;

use futures::future::try_join_all;

use crate::application::ObservedApplication;
use crate::config::Settings;
use crate::deploy::{CleanupResult, cleanup_orphans, detect_orphans};
use crate::error::{Error, Result};
use crate::resolver::resolve;
use crate::runtime::{ContainerSummary, FullRuntime};
use crate::store::{RecordStore, StoreError};
use crate::types::{AppName, ContainerId};

pub use deployments::{Deleted, Triggered};
pub use logs::{DEFAULT_LOG_LINES, LogRequest};

/// Application lifecycle operations over one engine and one record store.
pub struct Orchestrator<R, S> {
    runtime: Arc<R>,
    store: Arc<S>,
    settings: Arc<Settings>,
}

impl<R, S> Clone for Orchestrator<R, S> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            store: Arc::clone(&self.store),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<R: FullRuntime, S: RecordStore> Orchestrator<R, S> {
    pub fn new(runtime: Arc<R>, store: Arc<S>, settings: Settings) -> Self {
        Self {
            runtime,
            store,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn runtime(&self) -> &Arc<R> {
        &self.runtime
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// One application with its live status.
    pub async fn get_application(&self, name: &AppName) -> Result<ObservedApplication> {
        let config = self
            .store
            .find(name)
            .await?
            .ok_or_else(|| Error::not_found(name))?;
        self.observe(config).await
    }

    /// Every application with its live status, resolved concurrently.
    pub async fn list_applications(&self) -> Result<Vec<ObservedApplication>> {
        let configs = self.store.find_all().await?;
        try_join_all(configs.into_iter().map(|config| self.observe(config))).await
    }

    /// Managed containers no record points at.
    pub async fn orphaned_containers(&self) -> Result<Vec<ContainerSummary>> {
        let known = self.known_containers().await?;
        detect_orphans(self.runtime.as_ref(), &known, &self.settings)
            .await
            .map_err(|e| Error::container("list", e))
    }

    /// Stop and remove every orphaned container.
    pub async fn remove_orphaned_containers(&self) -> Result<CleanupResult> {
        let orphans: Vec<ContainerId> = self
            .orphaned_containers()
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        Ok(cleanup_orphans(self.runtime.as_ref(), &orphans, &self.settings).await)
    }

    async fn known_containers(&self) -> Result<Vec<ContainerId>> {
        Ok(self
            .store
            .find_all()
            .await?
            .into_iter()
            .filter_map(|c| c.runtime_id)
            .collect())
    }

    async fn observe(
        &self,
        config: crate::application::ApplicationConfig,
    ) -> Result<ObservedApplication> {
        resolve(self.runtime.as_ref(), config, self.settings.timeouts.inspect)
            .await
            .map_err(|e| Error::container("inspect", e))
    }
}

/// Store errors keyed on a missing record become facade `NotFound`.
fn store_error(err: StoreError) -> Error {
    match err {
        StoreError::NotFound(name) => Error::not_found(name),
        other => Error::Store(other),
    }
}
