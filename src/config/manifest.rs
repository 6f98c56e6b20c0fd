// ABOUTME: Application manifest: the YAML a caller writes to create an application.
// ABOUTME: Turns into a validated NewApplication with env references resolved.

use serde::Deserialize;
use std::path::Path;

use super::EnvValue;
use super::deserialize::{deserialize_app_name, deserialize_env_entries, deserialize_image_ref};
use super::env_value::resolve_env_entries;
use crate::application::{ContainerTemplate, NewApplication, PortBinding};
use crate::error::{Error, Result};
use crate::types::{AppName, GitSource, ImageRef, WebhookToken};

/// Where to build from. Exactly one of `repository` or `github` must be set.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSpec {
    /// Full clone URL.
    #[serde(default)]
    pub repository: Option<String>,

    /// `owner/name` on GitHub.
    #[serde(default)]
    pub github: Option<String>,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Dockerfile directory inside the repository.
    #[serde(default)]
    pub context: String,
}

fn default_branch() -> String {
    "main".to_string()
}

impl SourceSpec {
    pub fn to_git_source(&self) -> Result<GitSource> {
        let source = match (&self.repository, &self.github) {
            (Some(url), None) => GitSource::new(url.as_str(), self.branch.as_str(), self.context.as_str()),
            (None, Some(slug)) => GitSource::github(slug, self.branch.as_str(), self.context.as_str()),
            (Some(_), Some(_)) => {
                return Err(Error::InvalidRequest(
                    "source: set either repository or github, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(Error::InvalidRequest(
                    "source: repository or github is required".to_string(),
                ));
            }
        };
        source.map_err(|e| Error::InvalidRequest(format!("source: {e}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(deserialize_with = "deserialize_app_name")]
    pub name: AppName,

    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    pub source: SourceSpec,

    #[serde(default, deserialize_with = "deserialize_env_entries")]
    pub env: Vec<(String, EnvValue)>,

    /// `host:container[/proto]` entries.
    #[serde(default)]
    pub ports: Vec<String>,

    /// Bind-mount specs.
    #[serde(default)]
    pub volumes: Vec<String>,

    /// Fixed webhook token; generated when absent.
    #[serde(default)]
    pub webhook_token: Option<String>,
}

impl Manifest {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Validate everything and resolve env references from the current environment.
    pub fn into_request(self) -> Result<NewApplication> {
        let source = self.source.to_git_source()?;

        let ports = self
            .ports
            .iter()
            .map(|p| PortBinding::parse(p))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;

        if let Some(bad) = self.volumes.iter().find(|v| !v.contains(':')) {
            return Err(Error::InvalidRequest(format!(
                "invalid volume {bad:?} (expected source:target[:mode])"
            )));
        }

        let webhook_token = match self.webhook_token {
            Some(token) if token.trim().is_empty() => {
                return Err(Error::InvalidRequest(
                    "webhook_token cannot be empty".to_string(),
                ));
            }
            Some(token) => Some(WebhookToken::from_caller(token)),
            None => None,
        };

        Ok(NewApplication {
            name: self.name,
            image_reference: self.image,
            source,
            template: ContainerTemplate {
                env: resolve_env_entries(&self.env)?,
                ports,
                volumes: self.volumes,
            },
            webhook_token,
        })
    }
}
