// ABOUTME: Generic pipeline run parameterized by state marker.
// ABOUTME: Carries the record, the desired container template, and the step log.

use serde::Serialize;

use crate::application::{ApplicationConfig, ContainerTemplate};
use crate::diagnostics::Diagnostics;
use crate::types::{AppName, ContainerId};

use super::state::{ContainerCreated, Initialized, Started};

/// One pipeline step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStep {
    Building,
    StoppingOld,
    RemovingOld,
    CreatingNew,
    StartingNew,
    Done,
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PipelineStep::Building => "BUILDING",
            PipelineStep::StoppingOld => "STOPPING_OLD",
            PipelineStep::RemovingOld => "REMOVING_OLD",
            PipelineStep::CreatingNew => "CREATING_NEW",
            PipelineStep::StartingNew => "STARTING_NEW",
            PipelineStep::Done => "DONE",
        };
        f.write_str(s)
    }
}

/// A pipeline run in progress, parameterized by its current state.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) config: ApplicationConfig,
    pub(crate) template: ContainerTemplate,
    pub(crate) old_container: Option<ContainerId>,
    pub(crate) steps: Vec<PipelineStep>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) state: S,
}

impl Deployment<Initialized> {
    /// Start a run for `config`, creating the container from `template`.
    ///
    /// The record's current `runtime_id`, if any, is the container to retire.
    pub fn new(config: ApplicationConfig, template: ContainerTemplate) -> Self {
        let old_container = config.runtime_id.clone();
        Deployment {
            config,
            template,
            old_container,
            steps: Vec::new(),
            diagnostics: Diagnostics::default(),
            state: Initialized,
        }
    }
}

impl<S> Deployment<S> {
    pub fn name(&self) -> &AppName {
        &self.config.name
    }

    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    pub fn template(&self) -> &ContainerTemplate {
        &self.template
    }

    /// The container being replaced (None on first deploy).
    pub fn old_container(&self) -> Option<&ContainerId> {
        self.old_container.as_ref()
    }

    /// Steps entered so far.
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Tear the run down into its step log and diagnostics.
    pub fn into_parts(self) -> (Vec<PipelineStep>, Diagnostics) {
        (self.steps, self.diagnostics)
    }
}

impl Deployment<ContainerCreated> {
    /// The freshly created container.
    pub fn new_container(&self) -> &ContainerId {
        self.state.container_id()
    }
}

impl Deployment<Started> {
    /// The running container.
    pub fn new_container(&self) -> &ContainerId {
        self.state.container_id()
    }
}
