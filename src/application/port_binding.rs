// ABOUTME: Port binding value type and its engine-native encoding.
// ABOUTME: Native form is container-port-string -> list of host records; one host per port here.

use crate::runtime::{HostPort, NativePortBindings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortBindingError {
    #[error("invalid port mapping format: {0} (expected host:container[/proto])")]
    InvalidFormat(String),

    #[error("invalid host port: {0}")]
    InvalidHostPort(String),

    #[error("invalid container port: {0}")]
    InvalidContainerPort(String),
}

/// One published port: `host_port` on the host forwards to `container_port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortBinding {
    /// Container side, optionally with a protocol suffix (`80`, `53/udp`).
    pub container_port: String,
    pub host_port: u16,
}

impl PortBinding {
    pub fn new(container_port: impl Into<String>, host_port: u16) -> Self {
        Self {
            container_port: container_port.into(),
            host_port,
        }
    }

    /// Parse `"8080:80"` or `"8053:53/udp"`.
    pub fn parse(input: &str) -> Result<Self, PortBindingError> {
        let (host, container) = input
            .split_once(':')
            .ok_or_else(|| PortBindingError::InvalidFormat(input.to_string()))?;

        let host_port: u16 = host
            .parse()
            .map_err(|_| PortBindingError::InvalidHostPort(host.to_string()))?;

        let (number, proto) = match container.split_once('/') {
            Some((number, proto)) => (number, Some(proto)),
            None => (container, None),
        };
        if number.parse::<u16>().is_err() {
            return Err(PortBindingError::InvalidContainerPort(container.to_string()));
        }
        if let Some(proto) = proto
            && !matches!(proto, "tcp" | "udp" | "sctp")
        {
            return Err(PortBindingError::InvalidContainerPort(container.to_string()));
        }

        Ok(Self::new(container, host_port))
    }

    fn container_port_number(&self) -> u32 {
        self.container_port
            .split('/')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(u32::MAX)
    }
}

impl std::fmt::Display for PortBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host_port, self.container_port)
    }
}

/// Encode bindings into the engine's map form.
pub fn to_native(bindings: &[PortBinding]) -> NativePortBindings {
    let mut native = NativePortBindings::new();
    for binding in bindings {
        native
            .entry(binding.container_port.clone())
            .or_insert_with(|| Some(Vec::new()))
            .get_or_insert_with(Vec::new)
            .push(HostPort {
                host_ip: None,
                host_port: Some(binding.host_port.to_string()),
            });
    }
    native
}

/// Decode the engine's map form, keeping the first host record per container port.
///
/// Entries with no host record or an unparsable host port are skipped. The
/// result is ordered by container port.
pub fn from_native(native: &NativePortBindings) -> Vec<PortBinding> {
    let mut bindings: Vec<PortBinding> = native
        .iter()
        .filter_map(|(container_port, hosts)| {
            let first = hosts.as_ref()?.first()?;
            let host_port = first.host_port.as_deref()?.parse().ok()?;
            Some(PortBinding::new(container_port.clone(), host_port))
        })
        .collect();
    bindings.sort_by(|a, b| {
        a.container_port_number()
            .cmp(&b.container_port_number())
            .then_with(|| a.container_port.cmp(&b.container_port))
    });
    bindings
}
