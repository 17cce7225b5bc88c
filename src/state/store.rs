//! Snapshot persistence backends.
//!
//! The JSON backend writes atomically via temp file + rename. Loading never
//! fails: an absent or corrupt file yields the default snapshot.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

use super::{Snapshot, UserId};

/// Errors raised while persisting or reading the snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create a storage error from an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Backend holding the durable copy of the snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Loads a structurally complete snapshot, defaulting whatever is missing.
    fn load(&self) -> Snapshot;

    /// Replaces the durable copy with `snapshot`.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Snapshot stored as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    static_owners: Vec<UserId>,
}

impl JsonFileStore {
    /// Creates a store for `path`. `static_owners` seed the default owner list.
    pub fn new(path: impl Into<PathBuf>, static_owners: Vec<UserId>) -> Self {
        Self {
            path: path.into(),
            static_owners,
        }
    }

    /// Returns the data file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot, reporting unreadable or unparsable files as errors.
    pub fn load_strict(&self) -> Result<Snapshot, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Ok(Snapshot::merge_value(&value, &self.static_owners))
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "data.json".into(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Snapshot {
        match self.load_strict() {
            Ok(snapshot) => snapshot,
            Err(StoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!("No data file at {}, starting from defaults", self.path.display());
                Snapshot::with_owners(&self.static_owners)
            }
            Err(e) => {
                warn!("Failed to load {} ({}), starting from defaults", self.path.display(), e);
                Snapshot::with_owners(&self.static_owners)
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        let temp_path = self.temp_path();

        {
            let mut file = fs::File::create(&temp_path).map_err(|e| StoreError::io(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| StoreError::io(&temp_path, e))?;
            file.sync_all().map_err(|e| StoreError::io(&temp_path, e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))
    }
}

/// In-memory backend, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Snapshot>,
    fail_saves: Mutex<bool>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    /// Creates a store holding `snapshot`.
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    /// Makes subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().unwrap_or_else(PoisonError::into_inner) = fail;
    }

    /// Returns how many saves succeeded.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the durable copy.
    pub fn stored(&self) -> Snapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Snapshot {
        self.stored()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if *self.fail_saves.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(StoreError::Unavailable("saves disabled".to_owned()));
        }
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<T> {
    fn load(&self) -> Snapshot {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        (**self).save(snapshot)
    }
}
