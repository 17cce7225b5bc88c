//! Mutex-guarded snapshot cache with write-through persistence.
//!
//! Every mutation runs under the lock as clone → mutate → save → commit.
//! If the save fails the cached snapshot is left untouched, so no caller
//! ever observes state that was not persisted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::{Snapshot, SnapshotStore, StoreError};

/// Shared access point to the bot's persisted state.
pub struct StateStore {
    backend: Box<dyn SnapshotStore>,
    cache: Mutex<Snapshot>,
}

impl StateStore {
    /// Loads the snapshot from `backend` and caches it.
    pub fn open(backend: impl SnapshotStore + 'static) -> Self {
        let snapshot = backend.load();
        Self {
            backend: Box::new(backend),
            cache: Mutex::new(snapshot),
        }
    }

    /// Returns a copy of the current snapshot.
    pub async fn read(&self) -> Snapshot {
        self.cache.lock().await.clone()
    }

    /// Runs a read-only closure against the current snapshot.
    pub async fn view<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        f(&*self.cache.lock().await)
    }

    /// Applies `f` and persists the result.
    pub async fn update<T>(&self, f: impl FnOnce(&mut Snapshot) -> T) -> Result<T, StoreError> {
        let mut cache = self.cache.lock().await;
        let mut next = cache.clone();
        let output = f(&mut next);

        self.commit(&mut cache, next)?;
        Ok(output)
    }

    /// Applies `f`, persisting only when it returns `Ok`.
    ///
    /// A rejection leaves both the cache and the durable copy untouched.
    pub async fn try_update<T, E>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> Result<T, E>,
    ) -> Result<Result<T, E>, StoreError> {
        let mut cache = self.cache.lock().await;
        let mut next = cache.clone();

        match f(&mut next) {
            Ok(output) => {
                self.commit(&mut cache, next)?;
                Ok(Ok(output))
            }
            Err(rejection) => Ok(Err(rejection)),
        }
    }

    /// Persists `next` and swaps it in. Runs with the cache lock held, so
    /// saves are serialized; the backend write itself is synchronous.
    fn commit(&self, cache: &mut Snapshot, next: Snapshot) -> Result<(), StoreError> {
        if let Err(e) = self.backend.save(&next) {
            error!("Failed to persist snapshot: {}", e);
            return Err(e);
        }
        *cache = next;
        Ok(())
    }

    /// Writes a timestamped copy of the committed snapshot into `dir`.
    pub async fn backup(&self, dir: &Path, at: DateTime<Utc>) -> Result<PathBuf, StoreError> {
        let json = {
            let cache = self.cache.lock().await;
            serde_json::to_string_pretty(&*cache)?
        };

        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        let path = dir.join(backup_file_name(at));
        fs::write(&path, json).map_err(|e| StoreError::io(&path, e))?;

        debug!("Snapshot backup written to {}", path.display());
        Ok(path)
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").finish_non_exhaustive()
    }
}

/// Returns `data-<iso timestamp>.json` with `:` and `.` replaced by `-`.
fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("data-{}.json", at.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}
