// ABOUTME: Pipeline driver: runs build -> retire old -> create -> start and persists the result.
// ABOUTME: The caller holds the deploy lease; this module only sequences the steps.

use chrono::Utc;
use serde::Serialize;

use crate::application::{ApplicationConfig, ContainerTemplate};
use crate::config::Settings;
use crate::diagnostics::Warning;
use crate::runtime::{ContainerOps, ImageOps};
use crate::store::RecordStore;
use crate::types::{AppName, ContainerId};

use super::deployment::{Deployment, PipelineStep};
use super::error::DeployError;

/// What a successful run did.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    /// The record after the new container was persisted.
    pub config: ApplicationConfig,
    pub steps: Vec<PipelineStep>,
    pub warnings: Vec<Warning>,
}

/// A failed run: the fatal error plus everything that happened before it.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct DeployFailure {
    #[source]
    pub error: DeployError,
    pub steps: Vec<PipelineStep>,
    pub warnings: Vec<Warning>,
}

impl DeployFailure {
    fn at<S>(deployment: Deployment<S>, error: DeployError) -> Self {
        let (steps, diagnostics) = deployment.into_parts();
        Self {
            error,
            steps,
            warnings: diagnostics.into_warnings(),
        }
    }
}

impl From<DeployError> for DeployFailure {
    fn from(error: DeployError) -> Self {
        Self {
            error,
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Run the pipeline for `config`, creating the new container from `template`.
///
/// The deploy claim must already be held. On success the record's
/// `runtime_id`, `updated_at` and `last_applied` are persisted. If the new
/// container was created but would not start, its id is persisted anyway and
/// the start error is returned.
pub async fn run_pipeline<R, S>(
    runtime: &R,
    store: &S,
    settings: &Settings,
    config: ApplicationConfig,
    template: ContainerTemplate,
) -> Result<DeployReport, DeployFailure>
where
    R: ContainerOps + ImageOps + ?Sized,
    S: RecordStore + ?Sized,
{
    let deployment = Deployment::new(config, template);
    tracing::info!(
        app = %deployment.name(),
        image = %deployment.config().image_reference,
        replacing = ?deployment.old_container().map(|id| id.short().to_string()),
        "starting deployment"
    );

    let built = deployment
        .build_image(runtime, settings)
        .await
        .map_err(|(d, e)| DeployFailure::at(d, e))?;

    let retired = built.retire_old(runtime, settings).await;

    let created = retired
        .create_container(runtime, settings)
        .await
        .map_err(|(d, e)| DeployFailure::at(d, e))?;

    match created.start_container(runtime, settings).await {
        Ok(mut started) => {
            let id = started.new_container().clone();
            let persisted = persist_container(store, started.name(), id, started.template()).await;
            let config = match persisted {
                Ok(config) => config,
                Err(e) => return Err(DeployFailure::at(started, e)),
            };
            started.enter(PipelineStep::Done);
            tracing::info!(app = %config.name, "deployment finished");

            let (steps, diagnostics) = started.into_parts();
            Ok(DeployReport {
                config,
                steps,
                warnings: diagnostics.into_warnings(),
            })
        }
        Err((created, error)) => {
            // The container exists; point the record at it even though it is not running.
            let id = created.new_container().clone();
            if let Err(e) = persist_container(store, created.name(), id, created.template()).await {
                tracing::warn!(app = %created.name(), error = %e, "failed to record unstarted container");
            }
            Err(DeployFailure::at(created, error))
        }
    }
}

async fn persist_container<S>(
    store: &S,
    name: &AppName,
    id: ContainerId,
    template: &ContainerTemplate,
) -> Result<ApplicationConfig, DeployError>
where
    S: RecordStore + ?Sized,
{
    let template = template.clone();
    let updated = store
        .update(name, move |config| {
            config.runtime_id = Some(id);
            config.updated_at = Utc::now();
            config.last_applied = template;
        })
        .await?;
    Ok(updated)
}
