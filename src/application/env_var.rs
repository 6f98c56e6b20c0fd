// ABOUTME: Environment variable value type and its engine-native KEY=VALUE encoding.
// ABOUTME: Only the first '=' separates key from value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn to_native(&self) -> String {
        format!("{}={}", self.key, self.value)
    }

    /// An entry without `=` decodes to an empty value.
    pub fn from_native(entry: &str) -> Self {
        match entry.split_once('=') {
            Some((key, value)) => Self::new(key, value),
            None => Self::new(entry, ""),
        }
    }
}

pub fn to_native(vars: &[EnvVar]) -> Vec<String> {
    vars.iter().map(EnvVar::to_native).collect()
}

pub fn from_native(entries: &[String]) -> Vec<EnvVar> {
    entries.iter().map(|e| EnvVar::from_native(e)).collect()
}
