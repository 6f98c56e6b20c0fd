// ABOUTME: Deploy lease: the held is_deploying claim for one application.
// ABOUTME: Released on every exit path, including panics and task cancellation.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;

use crate::application::ApplicationConfig;
use crate::store::{Claim, RecordStore, StoreError};
use crate::types::AppName;

use super::DeployError;

/// A held deploy claim that releases on drop.
///
/// Prefer [`DeployLease::scope`] or [`DeployLease::release`]; the drop path
/// can only schedule the release on the current tokio runtime.
pub struct DeployLease<S: RecordStore> {
    store: Arc<S>,
    name: AppName,
    released: bool,
}

impl<S: RecordStore> std::fmt::Debug for DeployLease<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployLease")
            .field("name", &self.name)
            .field("released", &self.released)
            .finish()
    }
}

impl<S: RecordStore> DeployLease<S> {
    /// Claim `name` for a pipeline run.
    ///
    /// A claim older than `stale_after` is taken over. Returns the record as
    /// it stands with the claim set.
    pub async fn acquire(
        store: Arc<S>,
        name: &AppName,
        stale_after: Duration,
    ) -> Result<(Self, ApplicationConfig), DeployError> {
        match store.try_mark_deploying(name, Utc::now(), stale_after).await? {
            Claim::Acquired(config) => Ok((Self::adopt(store, name.clone()), config)),
            Claim::Busy(config) => Err(DeployError::Busy {
                app: name.clone(),
                since: config.deploying_since,
            }),
        }
    }

    /// Take ownership of a claim that was set when the record was inserted.
    pub fn adopt(store: Arc<S>, name: AppName) -> Self {
        Self {
            store,
            name,
            released: false,
        }
    }

    pub fn name(&self) -> &AppName {
        &self.name
    }

    /// Release the claim.
    pub async fn release(mut self) -> Result<(), StoreError> {
        self.released = true;
        self.store.clear_deploying(&self.name).await
    }

    /// Run `fut` while holding the claim, then release it.
    ///
    /// A panic inside `fut` is caught and reported as `DeployError::Panicked`
    /// after the claim is released.
    pub async fn scope<F, T>(self, fut: F) -> Result<T, DeployError>
    where
        F: Future<Output = T>,
    {
        let outcome = AssertUnwindSafe(fut).catch_unwind().await;

        let name = self.name.clone();
        if let Err(e) = self.release().await {
            tracing::warn!(app = %name, error = %e, "failed to release deploy claim");
        }

        outcome.map_err(|panic| DeployError::Panicked(panic_message(panic.as_ref())))
    }
}

impl<S: RecordStore> Drop for DeployLease<S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                let name = self.name.clone();
                tracing::debug!(app = %name, "deploy lease dropped, releasing in background");
                handle.spawn(async move {
                    if let Err(e) = store.clear_deploying(&name).await {
                        tracing::warn!(app = %name, error = %e, "failed to release deploy claim");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(app = %self.name, "deploy lease dropped outside a runtime; claim left set");
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
