// ABOUTME: The persisted application record and the container settings it last applied.
// ABOUTME: Records are owned by the store; lifecycle state lives in the engine.

use super::env_var::EnvVar;
use super::port_binding::PortBinding;
use crate::types::{AppName, ContainerId, GitSource, ImageRef, WebhookToken};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Desired container settings: env, published ports, bind mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerTemplate {
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub ports: Vec<PortBinding>,
    /// Bind-mount specs such as `/srv/data:/data:ro`.
    #[serde(default)]
    pub volumes: Vec<String>,
}

/// What a caller supplies to create an application.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub name: AppName,
    pub image_reference: ImageRef,
    pub source: GitSource,
    pub template: ContainerTemplate,
    /// Use this token instead of generating one.
    pub webhook_token: Option<WebhookToken>,
}

/// Persisted declared configuration of one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub name: AppName,
    pub image_reference: ImageRef,
    pub source_repo_url: String,
    pub source_branch: String,
    #[serde(default)]
    pub build_context_path: String,
    pub webhook_token: WebhookToken,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Current container. Only the deployment pipeline writes this.
    #[serde(default)]
    pub runtime_id: Option<ContainerId>,
    #[serde(default)]
    pub is_deploying: bool,
    #[serde(default)]
    pub deploying_since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_applied: ContainerTemplate,
}

impl ApplicationConfig {
    pub fn new(request: NewApplication, now: DateTime<Utc>) -> Self {
        let NewApplication {
            name,
            image_reference,
            source,
            template,
            webhook_token,
        } = request;

        Self {
            name,
            image_reference,
            source_repo_url: source.repo_url,
            source_branch: source.branch,
            build_context_path: source.context_path,
            webhook_token: webhook_token.unwrap_or_else(WebhookToken::generate),
            created_at: now,
            updated_at: now,
            runtime_id: None,
            is_deploying: false,
            deploying_since: None,
            last_applied: template,
        }
    }

    pub fn source(&self) -> GitSource {
        GitSource {
            repo_url: self.source_repo_url.clone(),
            branch: self.source_branch.clone(),
            context_path: self.build_context_path.clone(),
        }
    }

    /// Whether a deploy claim is held and younger than `stale_after`.
    pub fn claim_is_live(&self, now: DateTime<Utc>, stale_after: std::time::Duration) -> bool {
        if !self.is_deploying {
            return false;
        }
        match self.deploying_since {
            Some(since) => {
                let stale_after =
                    chrono::Duration::from_std(stale_after).unwrap_or(chrono::Duration::weeks(5200));
                now.signed_duration_since(since) < stale_after
            }
            // Legacy records without a timestamp: treat the flag at face value.
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample(now: DateTime<Utc>) -> ApplicationConfig {
        ApplicationConfig::new(
            NewApplication {
                name: AppName::new("api").unwrap(),
                image_reference: ImageRef::parse("api:v1").unwrap(),
                source: GitSource::new("https://github.com/acme/api.git", "main", "web").unwrap(),
                template: ContainerTemplate::default(),
                webhook_token: None,
            },
            now,
        )
    }

    #[test]
    fn new_record_is_idle_and_unprovisioned() {
        let now = Utc::now();
        let config = sample(now);
        assert_eq!(config.created_at, now);
        assert_eq!(config.updated_at, now);
        assert!(config.runtime_id.is_none());
        assert!(!config.is_deploying);
        assert_eq!(
            config.source().remote_locator(),
            "https://github.com/acme/api.git#main:web"
        );
    }

    #[test]
    fn claim_goes_stale() {
        let now = Utc::now();
        let mut config = sample(now);
        assert!(!config.claim_is_live(now, Duration::from_secs(3600)));

        config.is_deploying = true;
        config.deploying_since = Some(now - chrono::Duration::minutes(5));
        assert!(config.claim_is_live(now, Duration::from_secs(3600)));

        config.deploying_since = Some(now - chrono::Duration::hours(2));
        assert!(!config.claim_is_live(now, Duration::from_secs(3600)));
    }

    #[test]
    fn missing_optional_fields_deserialize() {
        let json = r#"{
            "name": "api",
            "image_reference": "api:v1",
            "source_repo_url": "https://github.com/acme/api.git",
            "source_branch": "main",
            "webhook_token": "3f1c",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let config: ApplicationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.build_context_path, "");
        assert!(config.runtime_id.is_none());
        assert_eq!(config.last_applied, ContainerTemplate::default());
    }
}
