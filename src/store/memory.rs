// ABOUTME: Process-local record store.
// ABOUTME: Used by tests and by callers that keep records elsewhere.

use super::records::Records;
use super::{Claim, RecordStore, StoreError};
use crate::application::ApplicationConfig;
use crate::types::{AppName, WebhookToken};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(configs: Vec<ApplicationConfig>) -> Self {
        Self {
            records: Mutex::new(Records::from_vec(configs)),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find(&self, name: &AppName) -> Result<Option<ApplicationConfig>, StoreError> {
        Ok(self.records.lock().find(name))
    }

    async fn find_by_token(
        &self,
        token: &WebhookToken,
    ) -> Result<Option<ApplicationConfig>, StoreError> {
        Ok(self.records.lock().find_by_token(token))
    }

    async fn find_all(&self) -> Result<Vec<ApplicationConfig>, StoreError> {
        Ok(self.records.lock().to_vec())
    }

    async fn insert(&self, config: ApplicationConfig) -> Result<(), StoreError> {
        self.records.lock().insert(config)
    }

    async fn save(&self, config: ApplicationConfig) -> Result<(), StoreError> {
        self.records.lock().save(config)
    }

    async fn update<F>(&self, name: &AppName, f: F) -> Result<ApplicationConfig, StoreError>
    where
        F: FnOnce(&mut ApplicationConfig) + Send,
    {
        self.records.lock().update(name, f)
    }

    async fn remove(&self, name: &AppName) -> Result<Option<ApplicationConfig>, StoreError> {
        Ok(self.records.lock().remove(name))
    }

    async fn try_mark_deploying(
        &self,
        name: &AppName,
        now: DateTime<Utc>,
        stale_after: Duration,
    ) -> Result<Claim, StoreError> {
        self.records.lock().try_mark_deploying(name, now, stale_after)
    }

    async fn clear_deploying(&self, name: &AppName) -> Result<(), StoreError> {
        self.records.lock().clear_deploying(name);
        Ok(())
    }
}
