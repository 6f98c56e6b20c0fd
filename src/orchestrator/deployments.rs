// ABOUTME: Operations that run or guard the pipeline: create, redeploy by token, delete.
// ABOUTME: Triggers acknowledge once the claim is held; the pipeline runs in a spawned task.

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::application::{ApplicationConfig, ContainerTemplate, NewApplication};
use crate::deploy::{DeployFailure, DeployLease, DeployReport, run_pipeline};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::resolver::resolve;
use crate::runtime::{ContainerError, FullRuntime, bounded};
use crate::store::{RecordStore, StoreError};
use crate::types::{AppName, WebhookToken};

use super::Orchestrator;

/// An accepted pipeline trigger.
#[derive(Debug)]
pub struct Triggered {
    /// The record as it stood when the claim was taken.
    pub application: ApplicationConfig,
    /// Resolves when the pipeline finishes.
    pub completion: JoinHandle<std::result::Result<DeployReport, DeployFailure>>,
}

impl Triggered {
    /// Wait for the pipeline and convert its failure into a facade error.
    pub async fn wait(self) -> Result<DeployReport> {
        match self.completion.await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(failure)) => Err(failure.error.into()),
            Err(join) => Err(Error::ContainerOperationFailed {
                operation: "deploy",
                message: join.to_string(),
            }),
        }
    }
}

/// Result of deleting an application.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub application: ApplicationConfig,
    /// Container cleanup problems that did not stop the deletion.
    pub warnings: Vec<Warning>,
}

/// Where a pipeline run takes its container settings from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateSource {
    /// The record's `last_applied` template.
    Record,
    /// The live container's settings, falling back to the record.
    LiveContainer,
}

impl<R: FullRuntime, S: RecordStore> Orchestrator<R, S> {
    /// Persist a new application and start building it.
    ///
    /// Fails with `Conflict` and persists nothing if the name or the webhook
    /// token is taken.
    pub async fn create_application(&self, request: NewApplication) -> Result<Triggered> {
        let now = Utc::now();
        let mut config = ApplicationConfig::new(request, now);
        config.is_deploying = true;
        config.deploying_since = Some(now);

        self.store
            .insert(config.clone())
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists(name) => {
                    Error::Conflict(format!("application {name} already exists"))
                }
                StoreError::TokenTaken(holder) => Error::Conflict(format!(
                    "webhook token is already used by application {holder}"
                )),
                other => Error::Store(other),
            })?;
        tracing::info!(app = %config.name, image = %config.image_reference, "application created");

        let lease = DeployLease::adopt(self.store.clone(), config.name.clone());
        let completion = self.spawn_pipeline(lease, config.clone(), TemplateSource::Record);
        Ok(Triggered {
            application: config,
            completion,
        })
    }

    /// Rebuild and replace the container of the application owning `token`.
    ///
    /// Unknown tokens are `NotFound`; an application already deploying is a `Conflict`.
    pub async fn redeploy_on_notification(&self, token: &WebhookToken) -> Result<Triggered> {
        let config = self
            .store
            .find_by_token(token)
            .await?
            .ok_or_else(|| Error::NotFound("no application for this webhook token".to_string()))?;

        let (lease, claimed) = DeployLease::acquire(
            self.store.clone(),
            &config.name,
            self.settings.deploy.stale_after,
        )
        .await?;
        tracing::info!(app = %claimed.name, "redeploy triggered");

        let completion = self.spawn_pipeline(lease, claimed.clone(), TemplateSource::LiveContainer);
        Ok(Triggered {
            application: claimed,
            completion,
        })
    }

    /// Remove an application's container (if any) and its record.
    ///
    /// Container cleanup failures are reported as warnings; the record is
    /// removed regardless. Refused with `Conflict` while a pipeline runs.
    pub async fn delete_application(&self, name: &AppName) -> Result<Deleted> {
        let (lease, config) =
            DeployLease::acquire(self.store.clone(), name, self.settings.deploy.stale_after)
                .await
                .map_err(|e| match e {
                    crate::deploy::DeployError::Store(StoreError::NotFound(n)) => {
                        Error::not_found(n)
                    }
                    other => other.into(),
                })?;

        let warnings = self.remove_container_of(&config).await.into_warnings();

        let removed = self.store.remove(name).await;
        // The record is gone (or the store failed); either way the claim is moot.
        if let Err(e) = lease.release().await {
            tracing::debug!(app = %name, error = %e, "claim release after delete");
        }
        let application = removed?.unwrap_or(config);

        tracing::info!(app = %name, warnings = warnings.len(), "application deleted");
        Ok(Deleted {
            application,
            warnings,
        })
    }

    async fn remove_container_of(&self, config: &ApplicationConfig) -> Diagnostics {
        let mut diagnostics = Diagnostics::default();
        let Some(id) = config.runtime_id.clone() else {
            return diagnostics;
        };
        let timeouts = &self.settings.timeouts;

        let running = match resolve(self.runtime.as_ref(), config.clone(), timeouts.inspect).await
        {
            Ok(observed) if !observed.has_container() => {
                tracing::debug!(app = %config.name, "container already gone");
                return diagnostics;
            }
            Ok(observed) => observed.is_running,
            Err(e) => {
                diagnostics.warn(Warning::container_cleanup(format!(
                    "failed to inspect container {}: {}",
                    id.short(),
                    e
                )));
                false
            }
        };

        if running {
            let stop = self
                .runtime
                .stop_container(&id, self.settings.deploy.stop_grace);
            match bounded("stop", timeouts.stop, stop).await {
                Ok(()) | Err(ContainerError::NotRunning(_)) => {}
                Err(e) => diagnostics.warn(Warning::container_cleanup(format!(
                    "failed to stop container {}: {}",
                    id.short(),
                    e
                ))),
            }
        }

        let remove = self.runtime.remove_container(&id, true);
        match bounded("remove", timeouts.remove, remove).await {
            Ok(()) | Err(ContainerError::NotFound(_)) => {}
            Err(e) => diagnostics.warn(Warning::container_cleanup(format!(
                "failed to remove container {}: {}",
                id.short(),
                e
            ))),
        }

        diagnostics
    }

    fn spawn_pipeline(
        &self,
        lease: DeployLease<S>,
        config: ApplicationConfig,
        source: TemplateSource,
    ) -> JoinHandle<std::result::Result<DeployReport, DeployFailure>> {
        let this = self.clone();
        let name = config.name.clone();

        tokio::spawn(async move {
            let run = async move {
                let template = match source {
                    TemplateSource::Record => config.last_applied.clone(),
                    TemplateSource::LiveContainer => this.live_template(&config).await,
                };
                run_pipeline(
                    this.runtime.as_ref(),
                    this.store.as_ref(),
                    &this.settings,
                    config,
                    template,
                )
                .await
            };

            let result = match lease.scope(run).await {
                Ok(result) => result,
                Err(panicked) => Err(DeployFailure::from(panicked)),
            };
            if let Err(failure) = &result {
                tracing::error!(
                    app = %name,
                    error = %failure.error,
                    steps = ?failure.steps,
                    "deployment failed"
                );
            }
            result
        })
    }

    /// Env, ports, and binds of the running container, or the last applied template.
    async fn live_template(&self, config: &ApplicationConfig) -> ContainerTemplate {
        if config.runtime_id.is_none() {
            return config.last_applied.clone();
        }
        match resolve(
            self.runtime.as_ref(),
            config.clone(),
            self.settings.timeouts.inspect,
        )
        .await
        {
            Ok(observed) if observed.has_container() => observed.template(),
            Ok(_) => {
                tracing::info!(app = %config.name, "no live container, using last applied settings");
                config.last_applied.clone()
            }
            Err(e) => {
                tracing::warn!(
                    app = %config.name,
                    error = %e,
                    "could not inspect live container, using last applied settings"
                );
                config.last_applied.clone()
            }
        }
    }
}
