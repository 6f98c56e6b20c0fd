// ABOUTME: Environment variable value types with interpolation support.
// ABOUTME: Manifest entries are literals or references to the caller's environment.

use crate::application::EnvVar;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }
}

/// Resolve manifest entries, keeping their order.
pub fn resolve_env_entries(entries: &[(String, EnvValue)]) -> Result<Vec<EnvVar>> {
    entries
        .iter()
        .map(|(k, v)| v.resolve().map(|resolved| EnvVar::new(k.clone(), resolved)))
        .collect()
}
