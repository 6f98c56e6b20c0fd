// ABOUTME: Single-call container lifecycle operations: start, stop, restart, pause, unpause.
// ABOUTME: Also token rotation. Engine errors are reported verbatim and never retried.

use chrono::Utc;

use crate::application::ApplicationConfig;
use crate::error::{Error, Result};
use crate::runtime::{ContainerError, FullRuntime, bounded};
use crate::store::RecordStore;
use crate::types::{AppName, ContainerId, WebhookToken};

use super::{Orchestrator, store_error};

impl<R: FullRuntime, S: RecordStore> Orchestrator<R, S> {
    /// Start the application's container.
    ///
    /// Idempotent: the engine's "already started" answer (HTTP 304) is
    /// success, not an error. Every other engine error is returned verbatim.
    pub async fn start_application(&self, name: &AppName) -> Result<()> {
        let (_, id) = self.container_of(name).await?;
        let call = self.runtime.start_container(&id);
        match bounded("start", self.settings.timeouts.start, call).await {
            Ok(()) | Err(ContainerError::AlreadyRunning(_)) => {
                tracing::info!(app = %name, "started");
                Ok(())
            }
            Err(e) => Err(Error::container("start", e)),
        }
    }

    /// Stop the application's container.
    ///
    /// Idempotent: the engine's "already stopped" answer (HTTP 304) is
    /// success, not an error. Every other engine error is returned verbatim.
    pub async fn stop_application(&self, name: &AppName) -> Result<()> {
        let (_, id) = self.container_of(name).await?;
        let call = self.runtime.stop_container(&id, self.settings.deploy.stop_grace);
        match bounded("stop", self.settings.timeouts.stop, call).await {
            Ok(()) | Err(ContainerError::NotRunning(_)) => {
                tracing::info!(app = %name, "stopped");
                Ok(())
            }
            Err(e) => Err(Error::container("stop", e)),
        }
    }

    pub async fn restart_application(&self, name: &AppName) -> Result<()> {
        let (_, id) = self.container_of(name).await?;
        let call = self
            .runtime
            .restart_container(&id, self.settings.deploy.stop_grace);
        // Restart waits out the stop grace before starting again.
        let limit = self.settings.timeouts.stop + self.settings.timeouts.start;
        bounded("restart", limit, call)
            .await
            .map_err(|e| Error::container("restart", e))?;
        tracing::info!(app = %name, "restarted");
        Ok(())
    }

    pub async fn pause_application(&self, name: &AppName) -> Result<()> {
        let (_, id) = self.container_of(name).await?;
        bounded("pause", self.settings.timeouts.pause, self.runtime.pause_container(&id))
            .await
            .map_err(|e| Error::container("pause", e))?;
        tracing::info!(app = %name, "paused");
        Ok(())
    }

    pub async fn unpause_application(&self, name: &AppName) -> Result<()> {
        let (_, id) = self.container_of(name).await?;
        bounded(
            "unpause",
            self.settings.timeouts.pause,
            self.runtime.unpause_container(&id),
        )
        .await
        .map_err(|e| Error::container("unpause", e))?;
        tracing::info!(app = %name, "unpaused");
        Ok(())
    }

    /// Replace the webhook token. The old token stops working immediately.
    pub async fn rotate_token(&self, name: &AppName) -> Result<WebhookToken> {
        let token = WebhookToken::generate();
        let new_token = token.clone();
        self.store
            .update(name, move |config| {
                config.webhook_token = new_token;
                config.updated_at = Utc::now();
            })
            .await
            .map_err(store_error)?;
        tracing::info!(app = %name, "webhook token rotated");
        Ok(token)
    }

    /// The record and its container id, or `ContainerNotFound` if none was ever created.
    pub(super) async fn container_of(
        &self,
        name: &AppName,
    ) -> Result<(ApplicationConfig, ContainerId)> {
        let config = self
            .store
            .find(name)
            .await?
            .ok_or_else(|| Error::not_found(name))?;
        match config.runtime_id.clone() {
            Some(id) => Ok((config, id)),
            None => Err(Error::ContainerNotFound(name.clone())),
        }
    }
}
