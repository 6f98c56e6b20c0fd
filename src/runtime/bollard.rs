// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Speaks the Docker-compatible API, so it serves both Docker and Podman.

use crate::runtime::traits::{
    BuildError, BuildOutcome, BuildRequest, ContainerDetails, ContainerError, ContainerFilters,
    ContainerOps, ContainerSpec, ContainerSummary, HostPort, ImageOps, LogError, LogLine, LogOps,
    LogOptions, LogStream, NativePortBindings, RuntimeInfo, RuntimeInfoError, RuntimeMetadata,
    demux_frames,
};
use crate::runtime::types::{RuntimeInfo as RuntimeEndpoint, RuntimeType};
use crate::types::{ContainerId, ImageId};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerCreateBody, HostConfig, PortBinding};
use bollard::query_parameters::{
    BuildImageOptionsBuilder, CreateContainerOptions, InspectContainerOptions,
    ListContainersOptions, LogsOptions, RemoveContainerOptions, RestartContainerOptions,
    StopContainerOptions,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

/// Transport-level failures: the engine could not be reached at all.
fn is_unreachable(e: &BollardError) -> bool {
    matches!(
        e,
        BollardError::IOError { .. }
            | BollardError::RequestTimeoutError
            | BollardError::HyperResponseError { .. }
            | BollardError::HyperLegacyError { .. }
    )
}

fn map_container_create_error(e: BollardError) -> ContainerError {
    match &e {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageNotFound(message.clone()),
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::AlreadyExists(message.clone()),
        _ if is_unreachable(&e) => ContainerError::Unavailable(e.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: BollardError) -> ContainerError {
    match &e {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::AlreadyRunning(message.clone()),
        _ if is_unreachable(&e) => ContainerError::Unavailable(e.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_stop_error(e: BollardError) -> ContainerError {
    match &e {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::NotRunning(message.clone()),
        _ if is_unreachable(&e) => ContainerError::Unavailable(e.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

/// Pause and unpause answer 409 when the container is not in a state that allows it.
fn map_container_pause_error(e: BollardError) -> ContainerError {
    match &e {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::NotRunning(message.clone()),
        _ if is_unreachable(&e) => ContainerError::Unavailable(e.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_not_found_error(e: BollardError) -> ContainerError {
    match &e {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ if is_unreachable(&e) => ContainerError::Unavailable(e.to_string()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_build_error(e: BollardError, tag: &str) -> BuildError {
    match &e {
        BollardError::DockerResponseServerError { message, .. } => BuildError::Failed {
            tag: tag.to_string(),
            message: message.clone(),
        },
        BollardError::DockerStreamError { error } => BuildError::Failed {
            tag: tag.to_string(),
            message: error.clone(),
        },
        _ if is_unreachable(&e) => BuildError::Unavailable(e.to_string()),
        _ => BuildError::Runtime(e.to_string()),
    }
}

fn map_log_error(e: BollardError) -> LogError {
    match &e {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => LogError::ContainerNotFound(message.clone()),
        _ if is_unreachable(&e) => LogError::Unavailable(e.to_string()),
        _ => LogError::StreamError(e.to_string()),
    }
}

// =============================================================================
// Port binding conversion
// =============================================================================

fn to_bollard_bindings(bindings: &NativePortBindings) -> HashMap<String, Option<Vec<PortBinding>>> {
    bindings
        .iter()
        .map(|(key, hosts)| {
            let hosts = hosts.as_ref().map(|hosts| {
                hosts
                    .iter()
                    .map(|h| PortBinding {
                        host_ip: h.host_ip.clone(),
                        host_port: h.host_port.clone(),
                    })
                    .collect()
            });
            (key.clone(), hosts)
        })
        .collect()
}

fn from_bollard_bindings(bindings: HashMap<String, Option<Vec<PortBinding>>>) -> NativePortBindings {
    bindings
        .into_iter()
        .map(|(key, hosts)| {
            let hosts = hosts.map(|hosts| {
                hosts
                    .into_iter()
                    .map(|h| HostPort {
                        host_ip: h.host_ip,
                        host_port: h.host_port,
                    })
                    .collect()
            });
            (key, hosts)
        })
        .collect()
}

fn grace_secs(grace: Duration) -> i32 {
    i32::try_from(grace.as_secs()).unwrap_or(i32::MAX)
}

/// An engine enum as the engine itself spells it on the wire.
fn engine_text(value: &impl std::fmt::Display) -> String {
    value.to_string()
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardRuntime {
    /// Create a new BollardRuntime from a Docker client.
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to the runtime at `endpoint`.
    ///
    /// `request_timeout` is the client's transport ceiling; callers apply their
    /// own, shorter per-operation limits on top of it.
    pub fn connect(
        endpoint: &RuntimeEndpoint,
        request_timeout: Duration,
    ) -> Result<Self, RuntimeInfoError> {
        let client = Docker::connect_with_unix(
            &endpoint.socket_path,
            request_timeout.as_secs().max(1),
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(Self::new(client, endpoint.runtime_type))
    }

    /// Get the runtime type (Docker or Podman).
    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }
}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        let info = self
            .client
            .info()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        let name = match self.runtime_type {
            RuntimeType::Docker => "Docker".to_string(),
            RuntimeType::Podman => "Podman".to_string(),
        };

        Ok(RuntimeMetadata {
            name,
            version: info.server_version.unwrap_or_default(),
            api_version: bollard::API_DEFAULT_VERSION.to_string(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn build_image(&self, request: &BuildRequest) -> Result<BuildOutcome, BuildError> {
        let tag = request.tag.to_string();
        let options = BuildImageOptionsBuilder::default()
            .t(&tag)
            .remote(&request.remote)
            .rm(true)
            .build();

        tracing::info!(tag = %tag, remote = %request.remote, "building image");

        let mut outcome = BuildOutcome::default();
        let mut stream = self.client.build_image(options, None, None);
        while let Some(item) = stream.next().await {
            let info = item.map_err(|e| map_build_error(e, &tag))?;

            if let Some(detail) = info.error_detail {
                return Err(BuildError::Failed {
                    tag,
                    message: detail.message.unwrap_or_else(|| "unknown build error".into()),
                });
            }
            if let Some(line) = info.stream {
                let line = line.trim_end();
                if !line.is_empty() {
                    tracing::debug!(target: "slipway::build", "{}", line);
                    outcome.output.push(line.to_string());
                }
            }
            if let Some(id) = info.aux.and_then(|aux| aux.id) {
                outcome.image_id = Some(ImageId::new(id));
            }
        }

        Ok(outcome)
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let mut host_config = HostConfig::default();
        if !spec.port_bindings.is_empty() {
            host_config.port_bindings = Some(to_bollard_bindings(&spec.port_bindings));
        }
        if !spec.binds.is_empty() {
            host_config.binds = Some(spec.binds.clone());
        }

        let exposed_ports: Vec<String> = spec.port_bindings.keys().cloned().collect();

        let body = ContainerCreateBody {
            image: Some(spec.image.to_string()),
            env: if spec.env.is_empty() {
                None
            } else {
                Some(spec.env.clone())
            },
            labels: if spec.labels.is_empty() {
                None
            } else {
                Some(spec.labels.clone())
            },
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            host_config: Some(host_config),
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(spec.name.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), body)
            .await
            .map_err(map_container_create_error)?;

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(
                id.as_str(),
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
            .map_err(map_container_start_error)
    }

    async fn stop_container(&self, id: &ContainerId, grace: Duration) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(grace_secs(grace)),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_stop_error)
    }

    async fn restart_container(
        &self,
        id: &ContainerId,
        grace: Duration,
    ) -> Result<(), ContainerError> {
        let opts = RestartContainerOptions {
            t: Some(grace_secs(grace)),
            signal: None,
        };

        self.client
            .restart_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_not_found_error)
    }

    async fn pause_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .pause_container(id.as_str())
            .await
            .map_err(map_container_pause_error)
    }

    async fn unpause_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .unpause_container(id.as_str())
            .await
            .map_err(map_container_pause_error)
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_not_found_error)
    }

    async fn inspect_container(
        &self,
        id: &ContainerId,
    ) -> Result<ContainerDetails, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_container_not_found_error)?;

        let status = details
            .state
            .as_ref()
            .and_then(|s| s.status)
            .map(|s| engine_text(&s))
            .unwrap_or_default();
        let running = details
            .state
            .as_ref()
            .and_then(|s| s.running)
            .unwrap_or(false);

        let (port_bindings, binds) = match details.host_config {
            Some(host) => (
                host.port_bindings.map(from_bollard_bindings).unwrap_or_default(),
                host.binds.unwrap_or_default(),
            ),
            None => (NativePortBindings::new(), Vec::new()),
        };

        let (image, env, labels) = match details.config {
            Some(config) => (
                config.image.unwrap_or_default(),
                config.env.unwrap_or_default(),
                config.labels.unwrap_or_default(),
            ),
            None => (String::new(), Vec::new(), HashMap::new()),
        };

        Ok(ContainerDetails {
            id: ContainerId::new(details.id.unwrap_or_else(|| id.as_str().to_string())),
            name: details
                .name
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image,
            status,
            running,
            env,
            port_bindings,
            binds,
            labels,
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();

        if let Some(ref name) = filters.name {
            filter_map.insert("name".to_string(), vec![name.clone()]);
        }

        for (key, value) in &filters.labels {
            filter_map
                .entry("label".to_string())
                .or_default()
                .push(format!("{}={}", key, value));
        }

        let opts = ListContainersOptions {
            all: filters.all,
            filters: Some(filter_map),
            ..Default::default()
        };

        // Podman can report "stopping" during shutdown, which bollard fails to
        // deserialize. It is transient, so retry briefly.
        let mut last_error = None;
        for attempt in 0..3 {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => {
                    return Ok(containers
                        .into_iter()
                        .map(|c| {
                            let name = c
                                .names
                                .unwrap_or_default()
                                .first()
                                .map(|n| n.trim_start_matches('/').to_string())
                                .unwrap_or_default();

                            ContainerSummary {
                                id: ContainerId::new(c.id.unwrap_or_default()),
                                name,
                                image: c.image.unwrap_or_default(),
                                state: c
                                    .state
                                    .map(|s| engine_text(&s))
                                    .unwrap_or_default(),
                                status: c.status.unwrap_or_default(),
                                labels: c.labels.unwrap_or_default(),
                            }
                        })
                        .collect());
                }
                Err(e) => {
                    let err_str = e.to_string();
                    if (err_str.contains("unknown variant `stopping`")
                        || err_str.contains("unknown variant `stopped`"))
                        && attempt < 2
                    {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        last_error = Some(err_str);
                        continue;
                    }
                    if is_unreachable(&e) {
                        return Err(ContainerError::Unavailable(err_str));
                    }
                    return Err(ContainerError::Runtime(err_str));
                }
            }
        }

        Err(ContainerError::Runtime(
            last_error.unwrap_or_else(|| "list_containers failed".to_string()),
        ))
    }
}

#[async_trait]
impl LogOps for BollardRuntime {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<Vec<LogLine>, LogError> {
        let log_opts = LogsOptions {
            stdout: opts.stdout,
            stderr: opts.stderr,
            follow: false,
            timestamps: opts.timestamps,
            tail: opts
                .tail
                .map(|n| n.to_string())
                .unwrap_or_else(|| "all".to_string()),
            ..Default::default()
        };

        let mut stream = self.client.logs(id.as_str(), Some(log_opts));
        let mut lines = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk.map_err(map_log_error)? {
                LogOutput::StdOut { message } => lines.push(LogLine {
                    stream: LogStream::Stdout,
                    content: String::from_utf8_lossy(&message).into_owned(),
                }),
                LogOutput::StdErr { message } => lines.push(LogLine {
                    stream: LogStream::Stderr,
                    content: String::from_utf8_lossy(&message).into_owned(),
                }),
                LogOutput::StdIn { message } => lines.push(LogLine {
                    stream: LogStream::Stdin,
                    content: String::from_utf8_lossy(&message).into_owned(),
                }),
                // Podman sometimes labels multiplexed output as raw; strip the headers ourselves.
                LogOutput::Console { message } => match demux_frames(&message) {
                    Some(frames) => lines.extend(frames),
                    None => lines.push(LogLine {
                        stream: LogStream::Console,
                        content: String::from_utf8_lossy(&message).into_owned(),
                    }),
                },
            }
        }

        Ok(lines)
    }
}
