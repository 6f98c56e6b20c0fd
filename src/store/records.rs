// ABOUTME: In-memory record table shared by the store backends.
// ABOUTME: Each method is one atomic step; backends wrap it in their own lock.

use super::{Claim, StoreError};
use crate::application::ApplicationConfig;
use crate::types::{AppName, WebhookToken};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Default)]
pub(super) struct Records {
    by_name: BTreeMap<AppName, ApplicationConfig>,
}

impl Records {
    pub(super) fn from_vec(configs: Vec<ApplicationConfig>) -> Self {
        Self {
            by_name: configs.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }

    pub(super) fn to_vec(&self) -> Vec<ApplicationConfig> {
        self.by_name.values().cloned().collect()
    }

    pub(super) fn find(&self, name: &AppName) -> Option<ApplicationConfig> {
        self.by_name.get(name).cloned()
    }

    pub(super) fn find_by_token(&self, token: &WebhookToken) -> Option<ApplicationConfig> {
        self.by_name
            .values()
            .find(|c| &c.webhook_token == token)
            .cloned()
    }

    pub(super) fn insert(&mut self, config: ApplicationConfig) -> Result<(), StoreError> {
        if self.by_name.contains_key(&config.name) {
            return Err(StoreError::AlreadyExists(config.name));
        }
        self.check_token(&config)?;
        self.by_name.insert(config.name.clone(), config);
        Ok(())
    }

    pub(super) fn save(&mut self, config: ApplicationConfig) -> Result<(), StoreError> {
        self.check_token(&config)?;
        self.by_name.insert(config.name.clone(), config);
        Ok(())
    }

    pub(super) fn update<F>(&mut self, name: &AppName, f: F) -> Result<ApplicationConfig, StoreError>
    where
        F: FnOnce(&mut ApplicationConfig),
    {
        let mut config = self
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.clone()))?;
        f(&mut config);
        // The key is the identity; a closure cannot rename a record.
        config.name = name.clone();
        self.check_token(&config)?;
        self.by_name.insert(name.clone(), config.clone());
        Ok(config)
    }

    /// Tokens are unique across records; `config` may keep its own.
    fn check_token(&self, config: &ApplicationConfig) -> Result<(), StoreError> {
        match self
            .by_name
            .values()
            .find(|other| other.name != config.name && other.webhook_token == config.webhook_token)
        {
            Some(holder) => Err(StoreError::TokenTaken(holder.name.clone())),
            None => Ok(()),
        }
    }

    pub(super) fn remove(&mut self, name: &AppName) -> Option<ApplicationConfig> {
        self.by_name.remove(name)
    }

    pub(super) fn try_mark_deploying(
        &mut self,
        name: &AppName,
        now: DateTime<Utc>,
        stale_after: Duration,
    ) -> Result<Claim, StoreError> {
        let config = self
            .by_name
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.clone()))?;

        if config.claim_is_live(now, stale_after) {
            return Ok(Claim::Busy(config.clone()));
        }
        if config.is_deploying {
            tracing::warn!(
                app = %name,
                since = ?config.deploying_since,
                "taking over stale deploy claim"
            );
        }

        config.is_deploying = true;
        config.deploying_since = Some(now);
        Ok(Claim::Acquired(config.clone()))
    }

    /// Returns whether anything changed.
    pub(super) fn clear_deploying(&mut self, name: &AppName) -> bool {
        match self.by_name.get_mut(name) {
            Some(config) if config.is_deploying || config.deploying_since.is_some() => {
                config.is_deploying = false;
                config.deploying_since = None;
                true
            }
            _ => false,
        }
    }
}
