// ABOUTME: Git build source: repository URL, branch, and Dockerfile subdirectory.
// ABOUTME: Renders the engine's remote build locator <url>#<branch>[:<subpath>].

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GitSourceError {
    #[error("repository URL cannot be empty")]
    EmptyUrl,

    #[error("branch cannot be empty")]
    EmptyBranch,

    #[error("invalid character in {field}: {ch:?}")]
    InvalidChar { field: &'static str, ch: char },

    #[error("GitHub repository must be written as owner/name, got {0:?}")]
    BadGithubShorthand(String),
}

/// Where an application's image is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSource {
    pub repo_url: String,
    pub branch: String,
    /// Directory holding the Dockerfile, relative to the repository root.
    /// Empty means the root itself.
    #[serde(default)]
    pub context_path: String,
}

impl GitSource {
    pub fn new(
        repo_url: impl Into<String>,
        branch: impl Into<String>,
        context_path: impl Into<String>,
    ) -> Result<Self, GitSourceError> {
        let repo_url = repo_url.into();
        let branch = branch.into();
        let context_path = normalize_context(&context_path.into());

        if repo_url.trim().is_empty() {
            return Err(GitSourceError::EmptyUrl);
        }
        if branch.trim().is_empty() {
            return Err(GitSourceError::EmptyBranch);
        }
        // '#' and ':' delimit the locator fields.
        reject_chars("repository URL", &repo_url, &['#', ' '])?;
        reject_chars("branch", &branch, &['#', ':', ' '])?;
        reject_chars("build context path", &context_path, &['#', ':'])?;

        Ok(Self {
            repo_url,
            branch,
            context_path,
        })
    }

    /// Source hosted on GitHub, given as `owner/name`.
    pub fn github(
        slug: &str,
        branch: impl Into<String>,
        context_path: impl Into<String>,
    ) -> Result<Self, GitSourceError> {
        let (owner, name) = slug
            .split_once('/')
            .filter(|(o, n)| !o.is_empty() && !n.is_empty() && !n.contains('/'))
            .ok_or_else(|| GitSourceError::BadGithubShorthand(slug.to_string()))?;
        Self::new(
            format!("https://github.com/{owner}/{name}.git"),
            branch,
            context_path,
        )
    }

    /// The `remote` parameter for an engine build.
    pub fn remote_locator(&self) -> String {
        if self.context_path.is_empty() {
            format!("{}#{}", self.repo_url, self.branch)
        } else {
            format!("{}#{}:{}", self.repo_url, self.branch, self.context_path)
        }
    }
}

fn normalize_context(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}

fn reject_chars(field: &'static str, value: &str, banned: &[char]) -> Result<(), GitSourceError> {
    match value.chars().find(|c| banned.contains(c)) {
        Some(ch) => Err(GitSourceError::InvalidChar { field, ch }),
        None => Ok(()),
    }
}
