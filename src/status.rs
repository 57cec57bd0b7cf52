//! Aggregate sync status over a collection of records.
//!
//! [`SyncStatus`] is a snapshot the UI renders ("3 of 12 images synced").
//! The calculators are pure single-pass folds; they never touch storage and
//! never fail partway through a collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::record::{ImageSyncRecord, SyncState};
use crate::store::StoredRecord;

/// Snapshot of sync progress across all tracked images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SyncStatus {
    /// Total number of images tracked.
    pub total_images: u64,
    /// Number of images confirmed durable.
    pub synced_images: u64,
    /// Number of images waiting for their first successful upload.
    pub pending_images: u64,
    /// Number of images whose last attempt failed.
    pub failed_images: u64,
    /// Number of uploads in flight. Always 0 from the calculators; only the
    /// orchestrator knows what is in flight.
    pub syncing_images: u64,
    /// Whole-number percent synced, rounded half up. 0 when nothing is tracked.
    pub sync_percentage: u8,
    /// When the last sync pass completed. Carried forward, never derived.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Whether a sync pass is currently running.
    pub is_syncing: bool,
}

impl SyncStatus {
    /// Compute a snapshot from the records themselves.
    ///
    /// Bucketing follows [`ImageSyncRecord::state`]: synced wins over
    /// failed, everything else is pending. `syncing_images`, `is_syncing`
    /// and `last_sync_at` are out of this function's reach and come back
    /// zeroed; see [`updated`](Self::updated) for preserving them.
    pub fn calculate<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ImageSyncRecord>,
    {
        let mut status = Self::default();
        for record in records {
            status.count(record);
        }
        status.sync_percentage = percentage(status.synced_images, status.total_images);
        status
    }

    /// Compute a snapshot from decoded storage entries.
    ///
    /// A [`StoredRecord::Corrupt`] entry still represents an image we are
    /// tracking, just one whose payload we can no longer read, so it counts
    /// toward `total_images` and `pending_images`. One bad payload never
    /// aborts the fold.
    pub fn calculate_stored<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a StoredRecord>,
    {
        let mut status = Self::default();
        for entry in entries {
            match entry {
                StoredRecord::Valid(record) => status.count(record),
                StoredRecord::Corrupt { .. } => {
                    status.total_images += 1;
                    status.pending_images += 1;
                }
            }
        }
        status.sync_percentage = percentage(status.synced_images, status.total_images);
        status
    }

    /// Recompute every count from `records`, carrying `last_sync_at` and
    /// `is_syncing` over from `self`. Prior counts are discarded, not merged.
    pub fn updated<'a, I>(&self, records: I) -> Self
    where
        I: IntoIterator<Item = &'a ImageSyncRecord>,
    {
        Self {
            last_sync_at: self.last_sync_at,
            is_syncing: self.is_syncing,
            ..Self::calculate(records)
        }
    }

    /// Check the count invariants on a snapshot that did not come out of a
    /// calculator (e.g. one deserialized from storage).
    pub fn validate(&self) -> Result<(), ValidationError> {
        let sum = self
            .synced_images
            .saturating_add(self.pending_images)
            .saturating_add(self.failed_images)
            .saturating_add(self.syncing_images);
        if sum != self.total_images {
            return Err(ValidationError::InconsistentCounts {
                total: self.total_images,
                sum,
            });
        }
        if self.sync_percentage > 100 {
            return Err(ValidationError::out_of_range(
                "sync_percentage",
                self.sync_percentage,
                "0..=100",
            ));
        }
        Ok(())
    }

    fn count(&mut self, record: &ImageSyncRecord) {
        self.total_images += 1;
        match record.state() {
            SyncState::Synced => self.synced_images += 1,
            SyncState::Failed => self.failed_images += 1,
            SyncState::Pending => self.pending_images += 1,
        }
    }
}

/// Whole-number percent synced, rounded half up.
///
/// `(200 * synced + total) / (2 * total)` is `round(100 * synced / total)`
/// without leaving integer arithmetic; u128 keeps the scaling overflow-free.
fn percentage(synced: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let scaled = 200 * u128::from(synced) + u128::from(total);
    (scaled / (2 * u128::from(total))) as u8
}
