//! Validated storage configuration.
//!
//! A [`StorageConfig`] is a plain value owned by whichever context drives the
//! sync; there is no process-wide config. Changes go through
//! [`apply`](StorageConfig::apply), which validates the whole candidate and
//! returns a new value, so an invalid update can never leave a half-merged
//! config behind.

use std::time::Duration;

use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Image media types the sync engine accepts.
pub const SUPPORTED_IMAGE_FORMATS: [&str; 6] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/heic",
    "image/heif",
];

/// Ceiling on a single retry delay: one millisecond under five minutes.
pub const MAX_RETRY_DELAY_MS: u64 = 299_999;

// One millisecond under seven days.
const MAX_CACHE_EXPIRY_MS: u64 = 604_799_999;

// One byte under 100 MB.
const MAX_FILE_SIZE_BYTES: u64 = 104_857_599;

/// Tunables for the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Upload attempts after the first failure, 1..=100.
    pub max_retries: u32,
    /// Base delay between attempts in milliseconds, 1..=299_999.
    pub retry_delay_ms: u64,
    /// Images uploaded per batch, 1..=100.
    pub batch_size: u32,
    /// Cache entry lifetime in milliseconds, 1..=604_799_999.
    pub cache_expiry_ms: u64,
    /// Whether to queue uploads while offline.
    pub offline_sync: bool,
    /// JPEG/WebP re-encode quality, in (0.0, 1.0].
    pub compression_quality: f32,
    /// Largest accepted image in bytes, 1..=104_857_599.
    pub max_file_size: u64,
    /// Accepted media types; non-empty subset of [`SUPPORTED_IMAGE_FORMATS`].
    pub supported_formats: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            batch_size: 10,
            cache_expiry_ms: 86_400_000,
            offline_sync: true,
            compression_quality: 0.8,
            max_file_size: 10_485_760,
            supported_formats: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

/// Partial update for [`StorageConfig::apply`]. Unset fields keep their
/// prior values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub batch_size: Option<u32>,
    pub cache_expiry_ms: Option<u64>,
    pub offline_sync: Option<bool>,
    pub compression_quality: Option<f32>,
    pub max_file_size: Option<u64>,
    pub supported_formats: Option<Vec<String>>,
}

impl StorageConfig {
    /// Merge an update over this config and validate the result.
    ///
    /// Every violated constraint is reported; a rejected update leaves the
    /// caller's value exactly as it was.
    pub fn apply(&self, update: &ConfigUpdate) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        if let Some(v) = update.max_retries {
            next.max_retries = v;
        }
        if let Some(v) = update.retry_delay_ms {
            next.retry_delay_ms = v;
        }
        if let Some(v) = update.batch_size {
            next.batch_size = v;
        }
        if let Some(v) = update.cache_expiry_ms {
            next.cache_expiry_ms = v;
        }
        if let Some(v) = update.offline_sync {
            next.offline_sync = v;
        }
        if let Some(v) = update.compression_quality {
            next.compression_quality = v;
        }
        if let Some(v) = update.max_file_size {
            next.max_file_size = v;
        }
        if let Some(v) = &update.supported_formats {
            next.supported_formats = v.clone();
        }
        next.validate()?;
        tracing::debug!(update = ?update, "Storage configuration updated");
        Ok(next)
    }

    /// Check every field constraint, reporting all faults at once.
    ///
    /// [`Default`] and [`apply`](Self::apply) outputs always pass; this is
    /// for values that arrived from outside (deserialized settings).
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut faults = Vec::new();
        if !(1..=100).contains(&self.max_retries) {
            faults.push(ValidationError::out_of_range(
                "max_retries",
                self.max_retries,
                "1..=100",
            ));
        }
        if !(1..=MAX_RETRY_DELAY_MS).contains(&self.retry_delay_ms) {
            faults.push(ValidationError::out_of_range(
                "retry_delay_ms",
                self.retry_delay_ms,
                "1..=299999",
            ));
        }
        if !(1..=100).contains(&self.batch_size) {
            faults.push(ValidationError::out_of_range(
                "batch_size",
                self.batch_size,
                "1..=100",
            ));
        }
        if !(1..=MAX_CACHE_EXPIRY_MS).contains(&self.cache_expiry_ms) {
            faults.push(ValidationError::out_of_range(
                "cache_expiry_ms",
                self.cache_expiry_ms,
                "1..=604799999",
            ));
        }
        // NaN fails this comparison and is rejected with the rest
        if !(self.compression_quality > 0.0 && self.compression_quality <= 1.0) {
            faults.push(ValidationError::out_of_range(
                "compression_quality",
                self.compression_quality,
                "(0.0, 1.0]",
            ));
        }
        if !(1..=MAX_FILE_SIZE_BYTES).contains(&self.max_file_size) {
            faults.push(ValidationError::out_of_range(
                "max_file_size",
                self.max_file_size,
                "1..=104857599",
            ));
        }
        if self.supported_formats.is_empty() {
            faults.push(ValidationError::EmptyField {
                field: "supported_formats",
            });
        }
        for format in &self.supported_formats {
            if !SUPPORTED_IMAGE_FORMATS.contains(&format.as_str()) {
                faults.push(ValidationError::UnsupportedFormat {
                    format: format.clone(),
                });
            }
        }
        if faults.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::from_faults(faults))
        }
    }

    /// Compute the delay before a given retry attempt (0-indexed).
    ///
    /// Formula: `min(retry_delay_ms * 2^attempt, MAX_RETRY_DELAY_MS)
    /// + random_jitter(0..retry_delay_ms)`. The orchestrator sleeps this
    /// long between attempts; the jitter keeps a batch of failures from
    /// retrying in lockstep.
    pub fn delay_for_retry(&self, attempt: u32) -> Duration {
        let exp_delay = self
            .retry_delay_ms
            .saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX));
        let capped = exp_delay.min(MAX_RETRY_DELAY_MS);
        let jitter = if self.retry_delay_ms > 0 {
            rand::thread_rng().gen_range(0..self.retry_delay_ms)
        } else {
            0
        };
        Duration::from_millis(capped + jitter)
    }
}
