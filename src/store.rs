//! Key-value storage contract and record persistence.
//!
//! The sync core talks to device storage through [`KeyValueStore`], a small
//! async string-to-string contract. Records are persisted as JSON under
//! prefixed keys; decoding is fail-open, so one unreadable payload degrades
//! to a [`StoredRecord::Corrupt`] entry instead of failing the whole load.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::record::ImageSyncRecord;
use crate::storage::StorageError;

/// Key namespace for persisted sync records.
pub const RECORD_PREFIX: &str = "image-sync/";

/// Trait for device key-value storage.
///
/// This trait is object-safe and can be used with `Arc<dyn KeyValueStore>`
/// for shared access across async tasks. Implementations report failures as
/// [`StorageError`] and never panic.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any existing value.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Fetch the value for `key`. A missing key is `Ok(None)`, not an error.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key.
    async fn clear(&self) -> Result<(), StorageError>;

    /// List every key, in no particular order.
    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError>;

    /// Whether `key` currently holds a value.
    async fn has_key(&self, key: &str) -> Result<bool, StorageError>;
}

/// In-memory [`KeyValueStore`], the reference implementation and test double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the map, converting a poisoned lock into a storage error
    /// instead of a panic.
    fn guard(
        &self,
        operation: &str,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.items
            .lock()
            .map_err(|e| StorageError::unknown(e.to_string(), operation, "memory_store"))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.guard("set_item")?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.guard("get_item")?.get(key).cloned())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.guard("remove_item")?.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.guard("clear")?.clear();
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.guard("get_all_keys")?.keys().cloned().collect())
    }

    async fn has_key(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.guard("has_key")?.contains_key(key))
    }
}

/// Outcome of decoding one persisted record.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredRecord {
    /// The payload parsed and passed validation.
    Valid(ImageSyncRecord),
    /// The payload is unreadable. The image is still tracked; status
    /// calculation counts it as pending.
    Corrupt { key: String, reason: String },
}

impl StoredRecord {
    pub fn as_valid(&self) -> Option<&ImageSyncRecord> {
        match self {
            Self::Valid(record) => Some(record),
            Self::Corrupt { .. } => None,
        }
    }
}

/// Storage key for a record, derived from its identity.
pub fn record_key(local_uri: &str) -> String {
    format!("{RECORD_PREFIX}{local_uri}")
}

/// Persist a record as JSON under its derived key.
pub async fn save_record(
    store: &dyn KeyValueStore,
    record: &ImageSyncRecord,
) -> Result<(), StorageError> {
    let payload = serde_json::to_string(record).map_err(|e| {
        StorageError::data_serialization_failed(e.to_string(), "save_record", "image_sync")
    })?;
    let key = record_key(&record.local_uri);
    store.set_item(&key, &payload).await?;
    tracing::debug!(key = %key, state = %record.state().as_str(), "Saved sync record");
    Ok(())
}

/// Load one record by its image URI. `Ok(None)` when nothing is stored.
pub async fn load_record(
    store: &dyn KeyValueStore,
    local_uri: &str,
) -> Result<Option<StoredRecord>, StorageError> {
    let key = record_key(local_uri);
    Ok(store
        .get_item(&key)
        .await?
        .map(|payload| decode_record(&key, &payload)))
}

/// Load every persisted record.
///
/// Keys outside [`RECORD_PREFIX`] are ignored; a key that vanishes between
/// the listing and the read is skipped.
pub async fn load_records(store: &dyn KeyValueStore) -> Result<Vec<StoredRecord>, StorageError> {
    let mut records = Vec::new();
    for key in store.get_all_keys().await? {
        if !key.starts_with(RECORD_PREFIX) {
            continue;
        }
        if let Some(payload) = store.get_item(&key).await? {
            records.push(decode_record(&key, &payload));
        }
    }
    Ok(records)
}

/// Remove the persisted record for an image URI.
pub async fn delete_record(
    store: &dyn KeyValueStore,
    local_uri: &str,
) -> Result<(), StorageError> {
    let key = record_key(local_uri);
    store.remove_item(&key).await?;
    tracing::debug!(key = %key, "Deleted sync record");
    Ok(())
}

/// Decode a payload, degrading parse or validation failures to
/// [`StoredRecord::Corrupt`].
fn decode_record(key: &str, payload: &str) -> StoredRecord {
    let record: ImageSyncRecord = match serde_json::from_str(payload) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Stored sync record does not parse");
            return StoredRecord::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            };
        }
    };
    if let Err(e) = record.validate() {
        tracing::warn!(key = %key, error = %e, "Stored sync record fails validation");
        return StoredRecord::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        };
    }
    StoredRecord::Valid(record)
}
