//! Offline image sync for the Skillet recipe app
//!
//! This crate is the reconciliation core that keeps locally captured recipe
//! images flowing to remote storage:
//! - Per-image sync records with pure lifecycle transitions
//! - Aggregate status calculation for progress reporting
//! - Validated storage configuration with a bounded retry schedule
//! - A classified error taxonomy driving retry decisions
//! - A key-value storage contract with fail-open record persistence
//!
//! The crate never runs the sync loop itself. An orchestrator owns the
//! record collection, calls the transitions as upload attempts resolve, and
//! recomputes [`SyncStatus`] for the UI.

#![warn(clippy::all)]

pub mod config;
pub mod errors;
pub mod record;
pub mod status;
pub mod storage;
pub mod store;

pub use config::{ConfigUpdate, StorageConfig, MAX_RETRY_DELAY_MS, SUPPORTED_IMAGE_FORMATS};
pub use errors::ValidationError;
pub use record::{ImageSyncRecord, RecordOptions, SyncState};
pub use status::SyncStatus;
pub use storage::{StorageError, StorageErrorKind};
pub use store::{
    delete_record, load_record, load_records, record_key, save_record, KeyValueStore, MemoryStore,
    StoredRecord, RECORD_PREFIX,
};
