// ABOUTME: State transition methods for the deployment pipeline.
// ABOUTME: Each method consumes self and returns the next state, or itself plus the error.

use crate::application::{container_labels, env_var, port_binding};
use crate::config::Settings;
use crate::diagnostics::Warning;
use crate::runtime::{
    BuildRequest, ContainerError, ContainerOps, ContainerSpec, ImageOps, bounded,
};

use super::Deployment;
use super::deployment::PipelineStep;
use super::error::DeployError;
use super::state::{ContainerCreated, ImageBuilt, Initialized, OldRetired, Started};

/// Result type for transitions that hand the run back on failure.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Deployment<S> {
    fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            config: self.config,
            template: self.template,
            old_container: self.old_container,
            steps: self.steps,
            diagnostics: self.diagnostics,
            state,
        }
    }

    pub(crate) fn enter(&mut self, step: PipelineStep) {
        tracing::info!(app = %self.config.name, step = %step, "pipeline step");
        self.steps.push(step);
    }

    /// The new container is named after the application and carries our labels.
    fn container_spec(&self) -> ContainerSpec {
        ContainerSpec {
            name: self.config.name.to_string(),
            image: self.config.image_reference.clone(),
            env: env_var::to_native(&self.template.env),
            port_bindings: port_binding::to_native(&self.template.ports),
            binds: self.template.volumes.clone(),
            labels: container_labels(&self.config.name),
        }
    }
}

// =============================================================================
// Initialized -> ImageBuilt
// =============================================================================

impl Deployment<Initialized> {
    /// Build the image from the record's git source, tagged with its image reference.
    ///
    /// # Errors
    ///
    /// Returns `(self, DeployError::BuildFailed)`; nothing else has been touched.
    pub async fn build_image<R>(
        mut self,
        runtime: &R,
        settings: &Settings,
    ) -> TransitionResult<ImageBuilt, Initialized>
    where
        R: ImageOps + ?Sized,
    {
        self.enter(PipelineStep::Building);

        let request = BuildRequest {
            tag: self.config.image_reference.clone(),
            remote: self.config.source().remote_locator(),
        };

        match bounded("build", settings.timeouts.build, runtime.build_image(&request)).await {
            Ok(outcome) => {
                tracing::debug!(
                    app = %self.config.name,
                    image_id = ?outcome.image_id,
                    lines = outcome.output.len(),
                    "image built"
                );
                Ok(self.transition(ImageBuilt))
            }
            Err(e) => Err((self, DeployError::BuildFailed(e))),
        }
    }
}

// =============================================================================
// ImageBuilt -> OldRetired
// =============================================================================

impl Deployment<ImageBuilt> {
    /// Stop and remove the previous container, if there is one.
    ///
    /// Both calls are best-effort: failures become warnings and the run continues.
    pub async fn retire_old<R>(mut self, runtime: &R, settings: &Settings) -> Deployment<OldRetired>
    where
        R: ContainerOps + ?Sized,
    {
        let Some(old) = self.old_container.clone() else {
            return self.transition(OldRetired);
        };

        self.enter(PipelineStep::StoppingOld);
        let stop = runtime.stop_container(&old, settings.deploy.stop_grace);
        match bounded("stop", settings.timeouts.stop, stop).await {
            Ok(()) => {}
            Err(ContainerError::NotRunning(_)) => {
                tracing::debug!(container = %old.short(), "old container was not running");
            }
            Err(e) => self.diagnostics.warn(Warning::stop_old(format!(
                "failed to stop old container {}: {}",
                old.short(),
                e
            ))),
        }

        self.enter(PipelineStep::RemovingOld);
        let remove = runtime.remove_container(&old, true);
        if let Err(e) = bounded("remove", settings.timeouts.remove, remove).await {
            self.diagnostics.warn(Warning::remove_old(format!(
                "failed to remove old container {}: {}",
                old.short(),
                e
            )));
        }

        self.transition(OldRetired)
    }
}

// =============================================================================
// OldRetired -> ContainerCreated
// =============================================================================

impl Deployment<OldRetired> {
    /// Create the new container from the desired template.
    ///
    /// # Errors
    ///
    /// Returns `(self, DeployError::CreateFailed)`. The record still points at
    /// the old container, which may already be gone.
    pub async fn create_container<R>(
        mut self,
        runtime: &R,
        settings: &Settings,
    ) -> TransitionResult<ContainerCreated, OldRetired>
    where
        R: ContainerOps + ?Sized,
    {
        self.enter(PipelineStep::CreatingNew);

        let spec = self.container_spec();
        match bounded("create", settings.timeouts.create, runtime.create_container(&spec)).await {
            Ok(id) => {
                tracing::debug!(app = %self.config.name, container = %id.short(), "container created");
                Ok(self.transition(ContainerCreated::new(id)))
            }
            Err(e) => Err((self, DeployError::CreateFailed(e))),
        }
    }
}

// =============================================================================
// ContainerCreated -> Started
// =============================================================================

impl Deployment<ContainerCreated> {
    /// Start the new container.
    ///
    /// # Errors
    ///
    /// Returns `(self, DeployError::StartFailed)`; the container exists but is
    /// not running, and the caller still owns its id.
    pub async fn start_container<R>(
        mut self,
        runtime: &R,
        settings: &Settings,
    ) -> TransitionResult<Started, ContainerCreated>
    where
        R: ContainerOps + ?Sized,
    {
        self.enter(PipelineStep::StartingNew);

        let id = self.state.container_id().clone();
        match bounded("start", settings.timeouts.start, runtime.start_container(&id)).await {
            Ok(()) => Ok(self.transition(Started::new(id))),
            Err(e) => Err((self, DeployError::StartFailed(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        APPLICATION_LABEL, ApplicationConfig, ContainerTemplate, EnvVar, MANAGED_LABEL,
        NewApplication, PortBinding,
    };
    use crate::types::{AppName, GitSource, ImageRef};
    use chrono::Utc;

    #[test]
    fn container_spec_uses_template_and_labels() {
        let config = ApplicationConfig::new(
            NewApplication {
                name: AppName::new("api").unwrap(),
                image_reference: ImageRef::parse("api:v1").unwrap(),
                source: GitSource::github("acme/api", "main", "").unwrap(),
                template: ContainerTemplate::default(),
                webhook_token: None,
            },
            Utc::now(),
        );
        let template = ContainerTemplate {
            env: vec![EnvVar::new("URL", "a=b")],
            ports: vec![PortBinding::new("80", 8080)],
            volumes: vec!["/srv:/data".into()],
        };

        let spec = Deployment::new(config, template).container_spec();
        assert_eq!(spec.name, "api");
        assert_eq!(spec.image.to_string(), "api:v1");
        assert_eq!(spec.env, vec!["URL=a=b".to_string()]);
        assert!(spec.port_bindings.contains_key("80"));
        assert_eq!(spec.binds, vec!["/srv:/data".to_string()]);
        assert_eq!(spec.labels.get(MANAGED_LABEL).map(String::as_str), Some("true"));
        assert_eq!(spec.labels.get(APPLICATION_LABEL).map(String::as_str), Some("api"));
    }
}
