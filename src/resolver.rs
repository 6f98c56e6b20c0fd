// ABOUTME: Status resolution: a record plus one live inspection gives the observed view.
// ABOUTME: A missing container is a status, every other engine failure is an error.

use crate::application::{ApplicationConfig, ObservedApplication};
use crate::runtime::{ContainerError, ContainerOps, bounded};
use std::time::Duration;

/// Resolve the live state of `config`.
///
/// Makes no engine call when no container was ever created. Read-only.
pub async fn resolve<R>(
    runtime: &R,
    config: ApplicationConfig,
    inspect_timeout: Duration,
) -> Result<ObservedApplication, ContainerError>
where
    R: ContainerOps + ?Sized,
{
    let Some(id) = config.runtime_id.clone() else {
        return Ok(ObservedApplication::not_built(config));
    };

    match bounded("inspect", inspect_timeout, runtime.inspect_container(&id)).await {
        Ok(details) => Ok(ObservedApplication::from_details(config, &details)),
        Err(ContainerError::NotFound(_)) => {
            tracing::debug!(app = %config.name, container = %id.short(), "container is gone");
            Ok(ObservedApplication::container_not_found(config))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ContainerTemplate, EnvVar, NewApplication, ObservedStatus, PortBinding};
    use crate::runtime::{ContainerDetails, ContainerFilters, ContainerSpec, ContainerSummary, HostPort};
    use crate::types::{AppName, ContainerId, GitSource, ImageRef};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Answer {
        Details(ContainerDetails),
        Missing,
        Broken,
        Hang,
    }

    /// Engine that only answers inspections.
    struct Inspector {
        answer: Answer,
        calls: AtomicUsize,
    }

    impl Inspector {
        fn new(answer: Answer) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ContainerOps for Inspector {
        async fn create_container(&self, _: &ContainerSpec) -> Result<ContainerId, ContainerError> {
            unreachable!()
        }
        async fn start_container(&self, _: &ContainerId) -> Result<(), ContainerError> {
            unreachable!()
        }
        async fn stop_container(&self, _: &ContainerId, _: Duration) -> Result<(), ContainerError> {
            unreachable!()
        }
        async fn restart_container(&self, _: &ContainerId, _: Duration) -> Result<(), ContainerError> {
            unreachable!()
        }
        async fn pause_container(&self, _: &ContainerId) -> Result<(), ContainerError> {
            unreachable!()
        }
        async fn unpause_container(&self, _: &ContainerId) -> Result<(), ContainerError> {
            unreachable!()
        }
        async fn remove_container(&self, _: &ContainerId, _: bool) -> Result<(), ContainerError> {
            unreachable!()
        }
        async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerDetails, ContainerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Answer::Details(d) => Ok(d.clone()),
                Answer::Missing => Err(ContainerError::NotFound(id.to_string())),
                Answer::Broken => Err(ContainerError::Unavailable("socket closed".to_string())),
                Answer::Hang => futures::future::pending().await,
            }
        }
        async fn list_containers(
            &self,
            _: &ContainerFilters,
        ) -> Result<Vec<ContainerSummary>, ContainerError> {
            unreachable!()
        }
    }

    fn config(runtime_id: Option<&str>) -> ApplicationConfig {
        let mut config = ApplicationConfig::new(
            NewApplication {
                name: AppName::new("api").unwrap(),
                image_reference: ImageRef::parse("api:v1").unwrap(),
                source: GitSource::github("acme/api", "main", "").unwrap(),
                template: ContainerTemplate::default(),
                webhook_token: None,
            },
            Utc::now(),
        );
        config.runtime_id = runtime_id.map(ContainerId::new);
        config
    }

    fn details(status: &str, running: bool) -> ContainerDetails {
        ContainerDetails {
            id: ContainerId::new("abc"),
            name: "/api".to_string(),
            image: "api:v1".to_string(),
            status: status.to_string(),
            running,
            env: vec!["URL=postgres://db?a=b".to_string()],
            port_bindings: HashMap::from([(
                "8080/tcp".to_string(),
                Some(vec![HostPort {
                    host_ip: None,
                    host_port: Some("18080".to_string()),
                }]),
            )]),
            binds: vec!["/srv/data:/data".to_string()],
            labels: HashMap::new(),
        }
    }

    const LIMIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn never_built_makes_no_engine_call() {
        let engine = Inspector::new(Answer::Broken);

        let observed = resolve(&engine, config(None), LIMIT).await.unwrap();

        assert_eq!(observed.status, ObservedStatus::NotBuilt);
        assert!(!observed.is_running);
        assert!(observed.env_vars.is_empty());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn live_container_is_decoded() {
        let engine = Inspector::new(Answer::Details(details("running", true)));

        let observed = resolve(&engine, config(Some("abc")), LIMIT).await.unwrap();

        assert_eq!(observed.status, ObservedStatus::Running);
        assert!(observed.is_running);
        assert_eq!(observed.env_vars, [EnvVar::new("URL", "postgres://db?a=b")]);
        assert_eq!(observed.port_bindings, [PortBinding::new("8080/tcp", 18080)]);
        assert_eq!(observed.volumes, ["/srv/data:/data"]);
    }

    #[tokio::test]
    async fn exited_container_is_not_running() {
        let engine = Inspector::new(Answer::Details(details("exited", false)));

        let observed = resolve(&engine, config(Some("abc")), LIMIT).await.unwrap();

        assert_eq!(observed.status, ObservedStatus::Exited);
        assert!(!observed.is_running);
    }

    #[tokio::test]
    async fn missing_container_is_a_status() {
        let engine = Inspector::new(Answer::Missing);

        let observed = resolve(&engine, config(Some("abc")), LIMIT).await.unwrap();

        assert_eq!(observed.status, ObservedStatus::ContainerNotFound);
        assert!(!observed.is_running);
        assert!(observed.port_bindings.is_empty());
    }

    #[tokio::test]
    async fn other_failures_propagate() {
        let engine = Inspector::new(Answer::Broken);

        let err = resolve(&engine, config(Some("abc")), LIMIT).await.unwrap_err();

        assert!(matches!(err, ContainerError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_inspection_times_out() {
        let engine = Inspector::new(Answer::Hang);

        let err = resolve(&engine, config(Some("abc")), LIMIT).await.unwrap_err();

        assert!(matches!(err, ContainerError::TimedOut { operation: "inspect", .. }));
    }
}
