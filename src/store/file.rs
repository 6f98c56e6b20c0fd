// ABOUTME: JSON-file record store shared by every slipway process on the machine.
// ABOUTME: Mutations take an O_EXCL lock file, re-read the records, and replace the file by rename.

use super::records::Records;
use super::{Claim, RecordStore, StoreError};
use crate::application::ApplicationConfig;
use crate::types::{AppName, WebhookToken};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// How long a mutation waits for another process's lock by default.
const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(10);

/// Delay between attempts to take a held lock.
const LOCK_POLL: Duration = Duration::from_millis(20);

/// A lock older than this belongs to a process that died mid-mutation.
const ABANDONED_AFTER: Duration = Duration::from_secs(30);

/// Records kept in one JSON file.
///
/// Nothing is cached: reads parse the file, and each mutation runs
/// lock, load, change, write, unlock. Readers never see a partial file
/// because writes land through a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_wait: Duration,
    // Queues this process's own mutations instead of having them poll the lock file.
    writer: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// The file is parsed once here so a corrupt store fails early.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let lock_path = sibling(&path, "lock");
        let store = Self {
            path,
            lock_path,
            lock_wait: DEFAULT_LOCK_WAIT,
            writer: Mutex::new(()),
        };
        let records = store.load().await?;
        tracing::debug!(
            path = %store.path.display(),
            count = records.to_vec().len(),
            "opened record store"
        );
        Ok(store)
    }

    /// Give up on a lock held by another process after `wait`.
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Records, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(data) if data.iter().all(u8::is_ascii_whitespace) => Ok(Records::default()),
            Ok(data) => {
                let configs: Vec<ApplicationConfig> =
                    serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
                        path: self.path.clone(),
                        source,
                    })?;
                Ok(Records::from_vec(configs))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Records::default()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Apply `change` to the records on disk under the cross-process lock.
    ///
    /// `change` returns its result and whether the file must be rewritten.
    /// A failed write leaves the file, and so the store, as it was.
    async fn mutate<T, M>(&self, change: M) -> Result<T, StoreError>
    where
        M: FnOnce(&mut Records) -> Result<(T, bool), StoreError> + Send,
        T: Send,
    {
        let _queued = self.writer.lock().await;
        let _lock = LockFile::acquire(&self.lock_path, self.lock_wait).await?;

        let mut records = self.load().await?;
        let (out, changed) = change(&mut records)?;
        if changed {
            self.persist(&records).await?;
        }
        Ok(out)
    }

    async fn persist(&self, records: &Records) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let data = serde_json::to_vec_pretty(&records.to_vec()).map_err(|source| {
            StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        let temp_path = sibling(&self.path, &format!("tmp.{}", std::process::id()));
        tokio::fs::write(&temp_path, &data).await.map_err(io_err)?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(io_err(e));
        }
        Ok(())
    }
}

/// `<path>.<suffix>` next to the record file.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "records".to_string());
    path.with_file_name(format!("{file_name}.{suffix}"))
}

/// Who holds the lock file. Written into it for diagnostics and abandonment checks.
#[derive(Debug, Serialize, Deserialize)]
struct LockHolder {
    pid: u32,
    acquired_at: DateTime<Utc>,
}

impl LockHolder {
    fn is_abandoned(&self) -> bool {
        Utc::now()
            .signed_duration_since(self.acquired_at)
            .to_std()
            .is_ok_and(|age| age >= ABANDONED_AFTER)
    }
}

/// Exclusive lock held as a file created with `create_new`; removed on drop.
#[derive(Debug)]
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    async fn acquire(path: &Path, wait: Duration) -> Result<Self, StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let started = tokio::time::Instant::now();
        loop {
            let attempt = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .await;

            match attempt {
                Ok(mut file) => {
                    let lock = Self {
                        path: path.to_path_buf(),
                    };
                    let holder = LockHolder {
                        pid: std::process::id(),
                        acquired_at: Utc::now(),
                    };
                    let data = serde_json::to_vec(&holder).map_err(|source| {
                        StoreError::Corrupt {
                            path: path.to_path_buf(),
                            source,
                        }
                    })?;
                    file.write_all(&data).await.map_err(io_err)?;
                    file.flush().await.map_err(io_err)?;
                    return Ok(lock);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if Self::is_abandoned(path).await {
                        tracing::warn!(lock = %path.display(), "breaking abandoned record store lock");
                        let _ = tokio::fs::remove_file(path).await;
                        continue;
                    }
                    if started.elapsed() >= wait {
                        return Err(StoreError::Locked {
                            path: path.to_path_buf(),
                            waited: wait,
                        });
                    }
                    tokio::time::sleep(LOCK_POLL).await;
                }
                Err(source) => return Err(io_err(source)),
            }
        }
    }

    /// A lock is abandoned when its holder stamp is old, or, for a lock whose
    /// stamp cannot be read, when the file itself is old.
    async fn is_abandoned(path: &Path) -> bool {
        if let Ok(data) = tokio::fs::read(path).await
            && let Ok(holder) = serde_json::from_slice::<LockHolder>(&data)
        {
            return holder.is_abandoned();
        }
        match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified
                .elapsed()
                .is_ok_and(|age| age >= ABANDONED_AFTER),
            Err(_) => false,
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to remove record store lock");
        }
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn find(&self, name: &AppName) -> Result<Option<ApplicationConfig>, StoreError> {
        Ok(self.load().await?.find(name))
    }

    async fn find_by_token(
        &self,
        token: &WebhookToken,
    ) -> Result<Option<ApplicationConfig>, StoreError> {
        Ok(self.load().await?.find_by_token(token))
    }

    async fn find_all(&self) -> Result<Vec<ApplicationConfig>, StoreError> {
        Ok(self.load().await?.to_vec())
    }

    async fn insert(&self, config: ApplicationConfig) -> Result<(), StoreError> {
        self.mutate(|records| records.insert(config).map(|()| ((), true)))
            .await
    }

    async fn save(&self, config: ApplicationConfig) -> Result<(), StoreError> {
        self.mutate(|records| records.save(config).map(|()| ((), true)))
            .await
    }

    async fn update<F>(&self, name: &AppName, f: F) -> Result<ApplicationConfig, StoreError>
    where
        F: FnOnce(&mut ApplicationConfig) + Send,
    {
        self.mutate(|records| records.update(name, f).map(|updated| (updated, true)))
            .await
    }

    async fn remove(&self, name: &AppName) -> Result<Option<ApplicationConfig>, StoreError> {
        self.mutate(|records| {
            let removed = records.remove(name);
            let changed = removed.is_some();
            Ok((removed, changed))
        })
        .await
    }

    async fn try_mark_deploying(
        &self,
        name: &AppName,
        now: DateTime<Utc>,
        stale_after: Duration,
    ) -> Result<Claim, StoreError> {
        self.mutate(|records| {
            let claim = records.try_mark_deploying(name, now, stale_after)?;
            let changed = matches!(claim, Claim::Acquired(_));
            Ok((claim, changed))
        })
        .await
    }

    async fn clear_deploying(&self, name: &AppName) -> Result<(), StoreError> {
        self.mutate(|records| Ok(((), records.clear_deploying(name))))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ContainerTemplate, NewApplication};
    use crate::types::{ContainerId, GitSource, ImageRef};

    const HOUR: Duration = Duration::from_secs(3600);

    fn sample(name: &str) -> ApplicationConfig {
        ApplicationConfig::new(
            NewApplication {
                name: AppName::new(name).unwrap(),
                image_reference: ImageRef::parse(&format!("{name}:v1")).unwrap(),
                source: GitSource::github(&format!("acme/{name}"), "main", "").unwrap(),
                template: ContainerTemplate::default(),
                webhook_token: None,
            },
            Utc::now(),
        )
    }

    fn write_lock(path: &Path, acquired_at: DateTime<Utc>) {
        let holder = LockHolder {
            pid: 1,
            acquired_at,
        };
        std::fs::write(path, serde_json::to_vec(&holder).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("apps.json")).await.unwrap();
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/apps.json");
        let name = AppName::new("api").unwrap();

        let store = FileStore::open(&path).await.unwrap();
        store.insert(sample("api")).await.unwrap();
        store
            .update(&name, |c| c.runtime_id = Some(ContainerId::new("abc123")))
            .await
            .unwrap();
        drop(store);

        let reopened = FileStore::open(&path).await.unwrap();
        let config = reopened.find(&name).await.unwrap().unwrap();
        assert_eq!(config.runtime_id, Some(ContainerId::new("abc123")));
        assert!(!sibling(&path, &format!("tmp.{}", std::process::id())).exists());
        assert!(!sibling(&path, "lock").exists());
    }

    #[tokio::test]
    async fn removal_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        let name = AppName::new("api").unwrap();

        let store = FileStore::open(&path).await.unwrap();
        store.insert(sample("api")).await.unwrap();
        assert!(store.remove(&name).await.unwrap().is_some());

        let reopened = FileStore::open(&path).await.unwrap();
        assert!(reopened.find(&name).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = FileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        std::fs::write(&path, "\n").unwrap();

        let store = FileStore::open(&path).await.unwrap();
        assert!(store.find_all().await.unwrap().is_empty());
    }

    mod shared_file {
        use super::*;

        #[tokio::test]
        async fn claim_is_exclusive_across_stores() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("apps.json");
            let name = AppName::new("api").unwrap();
            let a = FileStore::open(&path).await.unwrap();
            a.insert(sample("api")).await.unwrap();
            let b = FileStore::open(&path).await.unwrap();

            let (first, second) = tokio::join!(
                a.try_mark_deploying(&name, Utc::now(), HOUR),
                b.try_mark_deploying(&name, Utc::now(), HOUR),
            );

            let acquired = [first.unwrap(), second.unwrap()]
                .iter()
                .filter(|c| matches!(c, Claim::Acquired(_)))
                .count();
            assert_eq!(acquired, 1);
        }

        #[tokio::test]
        async fn writes_from_one_store_are_seen_and_kept_by_another() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("apps.json");
            let name = AppName::new("api").unwrap();
            let a = FileStore::open(&path).await.unwrap();
            let b = FileStore::open(&path).await.unwrap();

            a.insert(sample("api")).await.unwrap();
            assert!(b.find(&name).await.unwrap().is_some());

            a.update(&name, |c| c.runtime_id = Some(ContainerId::new("new-container")))
                .await
                .unwrap();
            b.update(&name, |c| c.updated_at = Utc::now()).await.unwrap();

            let record = FileStore::open(&path)
                .await
                .unwrap()
                .find(&name)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(record.runtime_id, Some(ContainerId::new("new-container")));
        }

        #[tokio::test]
        async fn token_uniqueness_holds_across_stores() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("apps.json");
            let a = FileStore::open(&path).await.unwrap();
            let b = FileStore::open(&path).await.unwrap();
            let api = sample("api");
            let mut web = sample("web");
            web.webhook_token = api.webhook_token.clone();

            a.insert(api).await.unwrap();
            let err = b.insert(web).await.unwrap_err();

            assert!(matches!(err, StoreError::TokenTaken(_)));
        }

        #[tokio::test]
        async fn live_lock_held_elsewhere_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("apps.json");
            let store = FileStore::open(&path)
                .await
                .unwrap()
                .with_lock_wait(Duration::from_millis(100));
            write_lock(&sibling(&path, "lock"), Utc::now());

            let err = store.insert(sample("api")).await.unwrap_err();

            assert!(matches!(err, StoreError::Locked { .. }));
            assert!(sibling(&path, "lock").exists(), "another holder's lock is left alone");
            assert!(store.find_all().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn abandoned_lock_is_broken() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("apps.json");
            let store = FileStore::open(&path)
                .await
                .unwrap()
                .with_lock_wait(Duration::from_millis(100));
            write_lock(&sibling(&path, "lock"), Utc::now() - chrono::Duration::minutes(5));

            store.insert(sample("api")).await.unwrap();

            assert_eq!(store.find_all().await.unwrap().len(), 1);
            assert!(!sibling(&path, "lock").exists());
        }
    }

    mod failed_writes {
        use super::*;

        #[tokio::test]
        async fn failed_claim_write_leaves_no_claim_behind() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("apps.json");
            let name = AppName::new("api").unwrap();
            let store = FileStore::open(&path).await.unwrap();
            store.insert(sample("api")).await.unwrap();

            // A directory where the temp file goes makes the write fail.
            let temp_path = sibling(&path, &format!("tmp.{}", std::process::id()));
            std::fs::create_dir(&temp_path).unwrap();

            let err = store
                .try_mark_deploying(&name, Utc::now(), HOUR)
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::Io { .. }));
            assert!(!store.find(&name).await.unwrap().unwrap().is_deploying);
            assert!(!sibling(&path, "lock").exists());

            std::fs::remove_dir(&temp_path).unwrap();
            let claim = store.try_mark_deploying(&name, Utc::now(), HOUR).await.unwrap();
            assert!(matches!(claim, Claim::Acquired(_)));
        }

        #[tokio::test]
        async fn failed_update_write_keeps_the_previous_record() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("apps.json");
            let name = AppName::new("api").unwrap();
            let store = FileStore::open(&path).await.unwrap();
            store.insert(sample("api")).await.unwrap();

            let temp_path = sibling(&path, &format!("tmp.{}", std::process::id()));
            std::fs::create_dir(&temp_path).unwrap();

            let result = store
                .update(&name, |c| c.runtime_id = Some(ContainerId::new("lost")))
                .await;
            assert!(result.is_err());
            assert_eq!(store.find(&name).await.unwrap().unwrap().runtime_id, None);
        }
    }
}
