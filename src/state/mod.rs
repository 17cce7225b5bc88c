//! Persisted state module.
//!
//! Holds the snapshot data model, the persistence backends and the
//! shared write-through cache every component reads and mutates.

mod cache;
mod snapshot;
mod store;

pub use cache::StateStore;
pub use snapshot::{
    ChatId, CooldownKind, CooldownSetting, CooldownTable, DEFAULT_COOLDOWN_MINUTES, GlobalSettings,
    MAX_COOLDOWN_MINUTES, Snapshot, UserId, insert_id, remove_id,
};
pub use store::{JsonFileStore, MemoryStore, SnapshotStore, StoreError};
