// ABOUTME: Tests for runtime trait definitions.
// ABOUTME: Verifies capability bounds compose and FullRuntime auto-implements for any engine.

mod support;

use slipway::runtime::traits::*;
use slipway::types::{ContainerId, ImageRef};
use std::sync::Arc;
use std::time::Duration;
use support::fake_runtime::FakeRuntime;

/// Verify that function signatures work with narrow trait bounds.
mod trait_bounds {
    use super::*;

    /// Function requiring only ContainerOps.
    async fn is_running(runtime: &impl ContainerOps, id: &ContainerId) -> Result<bool, ContainerError> {
        Ok(runtime.inspect_container(id).await?.running)
    }

    /// Function requiring only ImageOps.
    async fn build(runtime: &impl ImageOps, tag: &str) -> Result<BuildOutcome, BuildError> {
        let request = BuildRequest {
            tag: ImageRef::parse(tag).unwrap(),
            remote: "https://github.com/acme/api.git#main".to_string(),
        };
        runtime.build_image(&request).await
    }

    /// Function requiring every capability.
    async fn everything<R: FullRuntime>(runtime: Arc<R>, id: &ContainerId) -> usize {
        let logs = runtime
            .container_logs(id, &LogOptions::tail(10))
            .await
            .unwrap_or_default();
        logs.len()
    }

    #[tokio::test]
    async fn narrow_bounds_accept_a_full_engine() {
        let runtime = FakeRuntime::new();
        let outcome = build(&runtime, "api:v1").await.unwrap();
        assert!(outcome.image_id.is_some());

        let id = runtime.create_container(&spec("api", "api:v1")).await.unwrap();
        assert!(!is_running(&runtime, &id).await.unwrap());
        runtime.start_container(&id).await.unwrap();
        assert!(is_running(&runtime, &id).await.unwrap());

        assert_eq!(everything(Arc::new(runtime), &id).await, 0);
    }

    fn spec(name: &str, image: &str) -> ContainerSpec {
        ContainerSpec {
            name: name.to_string(),
            image: ImageRef::parse(image).unwrap(),
            env: vec![],
            port_bindings: Default::default(),
            binds: vec![],
            labels: Default::default(),
        }
    }
}

/// Trait objects must stay usable behind Arc for the facade's shared engine.
mod object_safety {
    use super::*;

    #[test]
    fn capability_traits_are_object_safe() {
        let runtime = Arc::new(FakeRuntime::new());
        let _containers: Arc<dyn ContainerOps> = runtime.clone();
        let _images: Arc<dyn ImageOps> = runtime.clone();
        let _logs: Arc<dyn LogOps> = runtime;
    }
}

mod values {
    use super::*;

    #[test]
    fn log_options_tail_requests_both_streams() {
        let opts = LogOptions::tail(50).with_timestamps(true);
        assert!(opts.stdout && opts.stderr && opts.timestamps);
        assert_eq!(opts.tail, Some(50));
    }

    #[test]
    fn container_filters_default_to_running_only() {
        let filters = ContainerFilters::default();
        assert!(!filters.all);
        assert!(filters.labels.is_empty());
    }

    #[test]
    fn error_types_keep_engine_messages() {
        let err = ContainerError::AlreadyExists("api".to_string());
        assert!(err.to_string().contains("api"));

        let err = ContainerError::TimedOut {
            operation: "stop",
            after: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "stop timed out after 5s");

        let err = BuildError::Failed {
            tag: "api:v1".to_string(),
            message: "COPY failed: no such file".to_string(),
        };
        assert!(err.to_string().contains("COPY failed"));

        let err = LogError::ContainerNotFound("missing".to_string());
        assert!(err.to_string().contains("missing"));

        let err = RuntimeInfoError::ConnectionFailed("timeout".to_string());
        assert!(err.to_string().contains("timeout"));
    }
}
