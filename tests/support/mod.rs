// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, a fake engine, and application fixtures.

use std::sync::{Arc, Once};
use std::time::Duration;

use slipway::Orchestrator;
use slipway::application::{ContainerTemplate, EnvVar, NewApplication, PortBinding};
use slipway::config::Settings;
use slipway::store::MemoryStore;
use slipway::types::{AppName, GitSource, ImageRef};

// Each test binary only uses some of these items, so allow dead_code.
#[allow(dead_code)]
pub mod fake_runtime;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("slipway=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Default settings with per-call limits short enough for paused-clock tests.
#[allow(dead_code)]
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.timeouts.build = Duration::from_secs(120);
    settings.timeouts.create = Duration::from_secs(5);
    settings.timeouts.start = Duration::from_secs(5);
    settings.timeouts.stop = Duration::from_secs(5);
    settings.timeouts.remove = Duration::from_secs(5);
    settings.timeouts.inspect = Duration::from_secs(2);
    settings
}

#[allow(dead_code)]
pub fn app_name(name: &str) -> AppName {
    AppName::new(name).unwrap()
}

/// A request for `name` built from `acme/<name>` with one env var and one port.
#[allow(dead_code)]
pub fn new_application(name: &str) -> NewApplication {
    NewApplication {
        name: app_name(name),
        image_reference: ImageRef::parse(&format!("registry.local/{name}:latest")).unwrap(),
        source: GitSource::github(&format!("acme/{name}"), "main", "").unwrap(),
        template: ContainerTemplate {
            env: vec![EnvVar::new("PORT", "8080")],
            ports: vec![PortBinding::new("8080", 18080)],
            volumes: vec![],
        },
        webhook_token: None,
    }
}

pub type TestOrchestrator = Orchestrator<fake_runtime::FakeRuntime, MemoryStore>;

/// An orchestrator over a fresh fake engine and an empty in-memory store.
#[allow(dead_code)]
pub fn orchestrator() -> (
    TestOrchestrator,
    Arc<fake_runtime::FakeRuntime>,
    Arc<MemoryStore>,
) {
    init_tracing();
    let runtime = Arc::new(fake_runtime::FakeRuntime::new());
    let store = Arc::new(MemoryStore::new());
    let orchestrator = Orchestrator::new(runtime.clone(), store.clone(), test_settings());
    (orchestrator, runtime, store)
}
