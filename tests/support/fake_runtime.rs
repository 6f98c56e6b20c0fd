// ABOUTME: In-memory container engine implementing ContainerOps, ImageOps and LogOps.
// ABOUTME: Records every call and supports per-operation failure and hang injection.

use async_trait::async_trait;
use parking_lot::Mutex;
use slipway::runtime::{
    BuildError, BuildOutcome, BuildRequest, ContainerDetails, ContainerError, ContainerFilters,
    ContainerOps, ContainerSpec, ContainerSummary, FRAME_HEADER_LEN, ImageOps, LogError, LogLine,
    LogOps, LogOptions, LogStream, demux_frames,
};
use slipway::types::{ContainerId, ImageId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

/// Engine operations, for failure injection and call-order assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Build,
    Create,
    Start,
    Stop,
    Restart,
    Pause,
    Unpause,
    Remove,
    Inspect,
    List,
    Logs,
}

/// A recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Build { tag: String, remote: String },
    Create { name: String },
    Start(ContainerId),
    Stop(ContainerId),
    Restart(ContainerId),
    Pause(ContainerId),
    Unpause(ContainerId),
    Remove { id: ContainerId, force: bool },
    Inspect(ContainerId),
    List,
    Logs { id: ContainerId, tail: Option<u64>, timestamps: bool },
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::Build { .. } => Op::Build,
            Call::Create { .. } => Op::Create,
            Call::Start(_) => Op::Start,
            Call::Stop(_) => Op::Stop,
            Call::Restart(_) => Op::Restart,
            Call::Pause(_) => Op::Pause,
            Call::Unpause(_) => Op::Unpause,
            Call::Remove { .. } => Op::Remove,
            Call::Inspect(_) => Op::Inspect,
            Call::List => Op::List,
            Call::Logs { .. } => Op::Logs,
        }
    }
}

/// What an injected failure looks like from the engine.
#[derive(Debug, Clone)]
pub enum Failure {
    /// The engine cannot be reached.
    Unavailable,
    /// The engine answered with an error.
    Engine(String),
}

/// A container known to the fake engine.
#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: ContainerId,
    pub spec: ContainerSpec,
    /// `created`, `running`, `paused` or `exited`.
    pub state: String,
}

#[derive(Default)]
struct State {
    next_id: u64,
    containers: BTreeMap<String, FakeContainer>,
    images: HashSet<String>,
    logs: HashMap<String, Vec<u8>>,
    calls: Vec<Call>,
    failures: HashMap<Op, Failure>,
    hangs: HashSet<Op>,
}

#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<State>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `op` fail.
    pub fn fail(&self, op: Op, failure: Failure) {
        self.state.lock().failures.insert(op, failure);
    }

    /// Clear an injected failure.
    pub fn heal(&self, op: Op) {
        self.state.lock().failures.remove(&op);
    }

    /// Make every call of `op` wait forever.
    pub fn hang(&self, op: Op) {
        self.state.lock().hangs.insert(op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.calls().iter().map(Call::op).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Register a container directly, as if created outside slipway.
    pub fn seed_container(&self, spec: ContainerSpec, state: &str) -> ContainerId {
        let mut guard = self.state.lock();
        let id = next_container_id(&mut guard);
        guard.containers.insert(
            id.as_str().to_string(),
            FakeContainer {
                id: id.clone(),
                spec,
                state: state.to_string(),
            },
        );
        id
    }

    pub fn container(&self, id: &ContainerId) -> Option<FakeContainer> {
        self.state.lock().containers.get(id.as_str()).cloned()
    }

    pub fn containers(&self) -> Vec<FakeContainer> {
        self.state.lock().containers.values().cloned().collect()
    }

    pub fn set_state(&self, id: &ContainerId, state: &str) {
        if let Some(c) = self.state.lock().containers.get_mut(id.as_str()) {
            c.state = state.to_string();
        }
    }

    /// Remove a container behind slipway's back.
    pub fn forget(&self, id: &ContainerId) {
        self.state.lock().containers.remove(id.as_str());
    }

    /// Raw log payload as the engine would return it.
    pub fn set_logs(&self, id: &ContainerId, raw: Vec<u8>) {
        self.state.lock().logs.insert(id.as_str().to_string(), raw);
    }

    fn enter(&self, call: Call) -> (Option<Failure>, bool) {
        let mut guard = self.state.lock();
        let op = call.op();
        guard.calls.push(call);
        (guard.failures.get(&op).cloned(), guard.hangs.contains(&op))
    }

    async fn container_call(&self, call: Call) -> Result<(), ContainerError> {
        let (failure, hang) = self.enter(call);
        if hang {
            std::future::pending::<()>().await;
        }
        match failure {
            None => Ok(()),
            Some(Failure::Unavailable) => {
                Err(ContainerError::Unavailable("connection refused".to_string()))
            }
            Some(Failure::Engine(message)) => Err(ContainerError::Runtime(message)),
        }
    }

    fn with_container<T>(
        &self,
        id: &ContainerId,
        f: impl FnOnce(&mut FakeContainer) -> Result<T, ContainerError>,
    ) -> Result<T, ContainerError> {
        let mut guard = self.state.lock();
        match guard.containers.get_mut(id.as_str()) {
            Some(container) => f(container),
            None => Err(ContainerError::NotFound(id.to_string())),
        }
    }
}

fn next_container_id(state: &mut State) -> ContainerId {
    state.next_id += 1;
    ContainerId::new(format!("c{:03}{}", state.next_id, "0".repeat(60)))
}

/// One multiplexed log frame: stream byte, three zero bytes, big-endian length, payload.
pub fn frame(stream: u8, payload: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    out.push(stream);
    out.extend_from_slice(&[0, 0, 0]);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload.as_bytes());
    out
}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn build_image(&self, request: &BuildRequest) -> Result<BuildOutcome, BuildError> {
        let tag = request.tag.to_string();
        let (failure, hang) = self.enter(Call::Build {
            tag: tag.clone(),
            remote: request.remote.clone(),
        });
        if hang {
            std::future::pending::<()>().await;
        }
        match failure {
            Some(Failure::Unavailable) => {
                return Err(BuildError::Unavailable("connection refused".to_string()));
            }
            Some(Failure::Engine(message)) => return Err(BuildError::Failed { tag, message }),
            None => {}
        }

        self.state.lock().images.insert(tag);
        Ok(BuildOutcome {
            image_id: Some(ImageId::new("sha256:feedface")),
            output: vec!["Step 1/1 : FROM scratch".to_string()],
        })
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        self.container_call(Call::Create {
            name: spec.name.clone(),
        })
        .await?;

        let mut guard = self.state.lock();
        if guard.containers.values().any(|c| c.spec.name == spec.name) {
            return Err(ContainerError::AlreadyExists(spec.name.clone()));
        }
        if !guard.images.contains(&spec.image.to_string()) {
            return Err(ContainerError::ImageNotFound(spec.image.to_string()));
        }
        let id = next_container_id(&mut guard);
        guard.containers.insert(
            id.as_str().to_string(),
            FakeContainer {
                id: id.clone(),
                spec: spec.clone(),
                state: "created".to_string(),
            },
        );
        Ok(id)
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.container_call(Call::Start(id.clone())).await?;
        self.with_container(id, |c| match c.state.as_str() {
            "running" => Err(ContainerError::AlreadyRunning(id.to_string())),
            _ => {
                c.state = "running".to_string();
                Ok(())
            }
        })
    }

    async fn stop_container(&self, id: &ContainerId, _grace: Duration) -> Result<(), ContainerError> {
        self.container_call(Call::Stop(id.clone())).await?;
        self.with_container(id, |c| match c.state.as_str() {
            "running" | "paused" => {
                c.state = "exited".to_string();
                Ok(())
            }
            _ => Err(ContainerError::NotRunning(id.to_string())),
        })
    }

    async fn restart_container(
        &self,
        id: &ContainerId,
        _grace: Duration,
    ) -> Result<(), ContainerError> {
        self.container_call(Call::Restart(id.clone())).await?;
        self.with_container(id, |c| {
            c.state = "running".to_string();
            Ok(())
        })
    }

    async fn pause_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.container_call(Call::Pause(id.clone())).await?;
        self.with_container(id, |c| match c.state.as_str() {
            "running" => {
                c.state = "paused".to_string();
                Ok(())
            }
            _ => Err(ContainerError::NotRunning(format!(
                "container {id} is not running"
            ))),
        })
    }

    async fn unpause_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.container_call(Call::Unpause(id.clone())).await?;
        self.with_container(id, |c| match c.state.as_str() {
            "paused" => {
                c.state = "running".to_string();
                Ok(())
            }
            _ => Err(ContainerError::NotRunning(format!(
                "container {id} is not paused"
            ))),
        })
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        self.container_call(Call::Remove {
            id: id.clone(),
            force,
        })
        .await?;
        let mut guard = self.state.lock();
        let running = match guard.containers.get(id.as_str()) {
            None => return Err(ContainerError::NotFound(id.to_string())),
            Some(c) => c.state == "running",
        };
        if running && !force {
            return Err(ContainerError::Runtime(
                "cannot remove a running container".to_string(),
            ));
        }
        guard.containers.remove(id.as_str());
        Ok(())
    }

    async fn inspect_container(
        &self,
        id: &ContainerId,
    ) -> Result<ContainerDetails, ContainerError> {
        self.container_call(Call::Inspect(id.clone())).await?;
        self.with_container(id, |c| {
            Ok(ContainerDetails {
                id: c.id.clone(),
                name: format!("/{}", c.spec.name),
                image: c.spec.image.to_string(),
                status: c.state.clone(),
                running: c.state == "running",
                env: c.spec.env.clone(),
                port_bindings: c.spec.port_bindings.clone(),
                binds: c.spec.binds.clone(),
                labels: c.spec.labels.clone(),
            })
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        self.container_call(Call::List).await?;
        let guard = self.state.lock();
        Ok(guard
            .containers
            .values()
            .filter(|c| filters.all || c.state == "running")
            .filter(|c| {
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.spec.labels.get(k) == Some(v))
            })
            .filter(|c| {
                filters
                    .name
                    .as_ref()
                    .is_none_or(|name| c.spec.name.contains(name.as_str()))
            })
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                name: c.spec.name.clone(),
                image: c.spec.image.to_string(),
                state: c.state.clone(),
                status: c.state.clone(),
                labels: c.spec.labels.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl LogOps for FakeRuntime {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<Vec<LogLine>, LogError> {
        let (failure, hang) = self.enter(Call::Logs {
            id: id.clone(),
            tail: opts.tail,
            timestamps: opts.timestamps,
        });
        if hang {
            std::future::pending::<()>().await;
        }
        match failure {
            Some(Failure::Unavailable) => {
                return Err(LogError::Unavailable("connection refused".to_string()));
            }
            Some(Failure::Engine(message)) => return Err(LogError::Runtime(message)),
            None => {}
        }

        let guard = self.state.lock();
        if !guard.containers.contains_key(id.as_str()) {
            return Err(LogError::ContainerNotFound(id.to_string()));
        }
        let raw = guard.logs.get(id.as_str()).cloned().unwrap_or_default();
        let mut lines = demux_frames(&raw).unwrap_or_else(|| {
            vec![LogLine {
                stream: LogStream::Console,
                content: String::from_utf8_lossy(&raw).into_owned(),
            }]
        });
        if let Some(tail) = opts.tail {
            let keep = usize::try_from(tail).unwrap_or(usize::MAX);
            let skip = lines.len().saturating_sub(keep);
            lines.drain(..skip);
        }
        Ok(lines)
    }
}
