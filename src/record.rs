//! Per-image sync records and their lifecycle transitions.
//!
//! An [`ImageSyncRecord`] tracks one locally captured recipe image from
//! capture until its upload is durable. Records are immutable values: the
//! transition methods consume the old record and return the replacement, so
//! the collection owner swaps values instead of mutating in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Derived lifecycle state of a record.
///
/// This is never stored; it is read off the `is_synced`/`has_error` flags,
/// in that priority order. In-flight ("syncing") is not a record state; the
/// orchestrator tracks its own in-flight set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Not yet uploaded and not known to have failed.
    Pending,
    /// Upload confirmed durable.
    Synced,
    /// Last upload attempt failed (will be retried).
    Failed,
}

impl SyncState {
    /// Stable string form for reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
            Self::Failed => "failed",
        }
    }

    /// Parse the string form back.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "synced" => Some(Self::Synced),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Sync state of one locally captured recipe image.
///
/// Fields are ordered for optimal memory layout:
/// - heap types first (String, `Option<String>`)
/// - 8-byte primitives (`Option<u64>`)
/// - DateTime fields (12-16 bytes each)
/// - 4-byte primitives (u32)
/// - booleans grouped at the end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSyncRecord {
    // Heap types first
    /// Device-local URI of the captured image. Also the record's identity.
    pub local_uri: String,
    /// Filename used for the remote upload.
    pub file_name: String,
    /// Recipe this image belongs to. Lookup-only; the recipe owns deletion.
    pub recipe_id: String,
    /// Last upload error (if the last attempt failed).
    pub error_message: Option<String>,
    /// MIME type, when known (e.g. `image/jpeg`).
    pub content_type: Option<String>,

    // 8-byte primitives
    /// File size in bytes, when known.
    pub file_size: Option<u64>,

    // DateTime fields
    /// When the upload was confirmed durable (set only on success).
    pub synced_at: Option<DateTime<Utc>>,
    /// When this record last went through a transition.
    pub last_checked: DateTime<Utc>,

    // 4-byte primitives
    /// Retry counter as reported by the orchestrator.
    pub retry_count: u32,

    // Booleans grouped together
    /// Whether the upload is confirmed durable.
    pub is_synced: bool,
    /// Whether the last attempt failed.
    pub has_error: bool,
}

/// Optional overrides for [`ImageSyncRecord::with_options`].
///
/// Unset fields take the documented pending-record defaults.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    pub is_synced: bool,
    pub synced_at: Option<DateTime<Utc>>,
    /// Defaults to the construction time when `None`.
    pub last_checked: Option<DateTime<Utc>>,
    pub has_error: bool,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub file_size: Option<u64>,
    pub content_type: Option<String>,
}

impl ImageSyncRecord {
    /// Create a new pending record.
    ///
    /// Fails when any of `local_uri`, `file_name`, `recipe_id` is empty or
    /// whitespace-only. These three are validated here and nowhere else; the
    /// transitions trust them for the record's lifetime.
    pub fn new(
        local_uri: impl Into<String>,
        file_name: impl Into<String>,
        recipe_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::with_options(local_uri, file_name, recipe_id, RecordOptions::default())
    }

    /// Create a record with explicit overrides (e.g. when rebuilding state
    /// from an import or a migration).
    pub fn with_options(
        local_uri: impl Into<String>,
        file_name: impl Into<String>,
        recipe_id: impl Into<String>,
        options: RecordOptions,
    ) -> Result<Self, ValidationError> {
        let local_uri = required(local_uri.into(), "local_uri")?;
        let file_name = required(file_name.into(), "file_name")?;
        let recipe_id = required(recipe_id.into(), "recipe_id")?;

        Ok(Self {
            local_uri,
            file_name,
            recipe_id,
            error_message: options.error_message,
            content_type: options.content_type,
            file_size: options.file_size,
            synced_at: options.synced_at,
            last_checked: options.last_checked.unwrap_or_else(Utc::now),
            retry_count: options.retry_count,
            is_synced: options.is_synced,
            has_error: options.has_error,
        })
    }

    /// Lifecycle state derived from the flags: synced wins over failed,
    /// everything else is pending.
    pub fn state(&self) -> SyncState {
        if self.is_synced {
            SyncState::Synced
        } else if self.has_error {
            SyncState::Failed
        } else {
            SyncState::Pending
        }
    }

    /// Record a durable upload.
    ///
    /// Clears the error flags regardless of prior state. `synced_at` is
    /// stored verbatim (left unset when `None`); `last_checked` takes the
    /// same timestamp, or the current time when none was supplied.
    pub fn mark_synced(self, synced_at: Option<DateTime<Utc>>) -> Self {
        Self {
            is_synced: true,
            has_error: false,
            error_message: None,
            last_checked: synced_at.unwrap_or_else(Utc::now),
            synced_at,
            ..self
        }
    }

    /// Record a failed upload attempt.
    ///
    /// The error message is stored verbatim; an empty string is permitted.
    /// `retry_count` is replaced, not incremented, since the orchestrator
    /// owns the counting.
    pub fn mark_failed(self, error: impl Into<String>, retry_count: u32) -> Self {
        Self {
            is_synced: false,
            has_error: true,
            error_message: Some(error.into()),
            retry_count,
            last_checked: Utc::now(),
            ..self
        }
    }

    /// Record that a retry was scheduled.
    ///
    /// Only the counter and `last_checked` move; the sync/error flags keep
    /// reporting the last attempt's outcome until that retry resolves.
    pub fn mark_retry(self, retry_count: u32) -> Self {
        Self {
            retry_count,
            last_checked: Utc::now(),
            ..self
        }
    }

    /// Re-check the construction invariants on a record that did not come
    /// through [`new`](Self::new), such as one deserialized from storage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (value, field) in [
            (&self.local_uri, "local_uri"),
            (&self.file_name, "file_name"),
            (&self.recipe_id, "recipe_id"),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyField { field });
            }
        }
        Ok(())
    }
}

fn required(value: String, field: &'static str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ImageSyncRecord {
        ImageSyncRecord::new("file:///photos/stew.jpg", "stew.jpg", "recipe-7").unwrap()
    }

    #[test]
    fn test_new_pending_defaults() {
        let now = Utc::now();
        let r = record();
        assert!(!r.is_synced);
        assert!(!r.has_error);
        assert_eq!(r.retry_count, 0);
        assert!(r.synced_at.is_none());
        assert!(r.error_message.is_none());
        assert!(r.file_size.is_none());
        assert!(r.content_type.is_none());
        assert_eq!(r.state(), SyncState::Pending);
        // last_checked defaults to a recent time (within 1 second of now)
        assert!((r.last_checked - now).num_seconds().abs() <= 1);
    }

    #[test]
    fn test_new_rejects_empty_required_fields() {
        assert_eq!(
            ImageSyncRecord::new("", "stew.jpg", "recipe-7"),
            Err(ValidationError::EmptyField { field: "local_uri" })
        );
        assert_eq!(
            ImageSyncRecord::new("file:///p.jpg", "   ", "recipe-7"),
            Err(ValidationError::EmptyField { field: "file_name" })
        );
        assert_eq!(
            ImageSyncRecord::new("file:///p.jpg", "p.jpg", "\t\n"),
            Err(ValidationError::EmptyField { field: "recipe_id" })
        );
    }

    #[test]
    fn test_with_options_overrides() {
        let checked = Utc::now() - chrono::Duration::hours(3);
        let r = ImageSyncRecord::with_options(
            "file:///photos/pie.jpg",
            "pie.jpg",
            "recipe-2",
            RecordOptions {
                retry_count: 4,
                has_error: true,
                error_message: Some("Upload failed".to_string()),
                last_checked: Some(checked),
                file_size: Some(48_213),
                content_type: Some("image/jpeg".to_string()),
                ..RecordOptions::default()
            },
        )
        .unwrap();
        assert_eq!(r.retry_count, 4);
        assert_eq!(r.state(), SyncState::Failed);
        assert_eq!(r.last_checked, checked);
        assert_eq!(r.file_size, Some(48_213));
        assert_eq!(r.content_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_mark_synced_clears_error_state() {
        let t = Utc::now();
        let r = record().mark_failed("Network unreachable", 3).mark_synced(Some(t));
        assert!(r.is_synced);
        assert!(!r.has_error);
        assert!(r.error_message.is_none());
        assert_eq!(r.synced_at, Some(t));
        assert_eq!(r.last_checked, t);
        // The counter is not reset by success; it documents how hard this was
        assert_eq!(r.retry_count, 3);
        assert_eq!(r.state(), SyncState::Synced);
    }

    #[test]
    fn test_mark_synced_without_timestamp() {
        let now = Utc::now();
        let r = record().mark_synced(None);
        assert!(r.is_synced);
        assert!(r.synced_at.is_none());
        assert!((r.last_checked - now).num_seconds().abs() <= 1);
    }

    #[test]
    fn test_mark_failed_sets_error_and_counter() {
        let r = record().mark_failed("Upload failed", 2);
        assert!(!r.is_synced);
        assert!(r.has_error);
        assert_eq!(r.error_message.as_deref(), Some("Upload failed"));
        assert_eq!(r.retry_count, 2);
        assert_eq!(r.state(), SyncState::Failed);
    }

    #[test]
    fn test_mark_failed_permits_empty_message() {
        let r = record().mark_failed("", 1);
        assert_eq!(r.error_message.as_deref(), Some(""));
        assert!(r.has_error);
    }

    #[test]
    fn test_mark_retry_leaves_flags_alone() {
        let r = record().mark_failed("Timeout", 1).mark_retry(2);
        assert_eq!(r.retry_count, 2);
        assert!(r.has_error, "retry must not clear the failure flags");
        assert!(!r.is_synced);
        assert_eq!(r.error_message.as_deref(), Some("Timeout"));
    }

    #[test]
    fn test_failure_retry_success_lifecycle() {
        let now = Utc::now();
        let r = record()
            .mark_failed("Upload failed", 1)
            .mark_retry(2)
            .mark_synced(Some(now));
        assert_eq!(r.retry_count, 2);
        assert!(r.is_synced);
        assert!(!r.has_error);
        assert!(r.error_message.is_none());
        assert_eq!(r.synced_at, Some(now));
    }

    #[test]
    fn test_transitions_preserve_identity_fields() {
        let r = record().mark_failed("x", 1).mark_retry(2).mark_synced(None);
        assert_eq!(r.local_uri, "file:///photos/stew.jpg");
        assert_eq!(r.file_name, "stew.jpg");
        assert_eq!(r.recipe_id, "recipe-7");
    }

    #[test]
    fn test_sync_state_round_trip() {
        for state in [SyncState::Pending, SyncState::Synced, SyncState::Failed] {
            assert_eq!(SyncState::from_str(state.as_str()), Some(state));
        }
        assert_eq!(SyncState::from_str("uploading"), None);
    }

    #[test]
    fn test_validate_catches_deserialized_empty_fields() {
        let mut r = record();
        assert!(r.validate().is_ok());
        r.recipe_id = "  ".to_string();
        assert_eq!(
            r.validate(),
            Err(ValidationError::EmptyField { field: "recipe_id" })
        );
    }
}
