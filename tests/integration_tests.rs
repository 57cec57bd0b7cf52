//! Integration tests for the image sync core

use chrono::Utc;
use skillet_sync::{
    load_record, load_records, record_key, save_record, ConfigUpdate, ImageSyncRecord,
    KeyValueStore, MemoryStore, StorageConfig, StorageError, StoredRecord, SyncState, SyncStatus,
};

fn capture(i: usize) -> ImageSyncRecord {
    ImageSyncRecord::new(
        format!("file:///DCIM/skillet/IMG_{i:04}.jpg"),
        format!("IMG_{i:04}.jpg"),
        "recipe-carbonara",
    )
    .unwrap()
}

#[test]
fn test_capture_failure_retry_success_lifecycle() {
    // A fresh capture starts pending
    let record = capture(1);
    assert_eq!(record.state(), SyncState::Pending);

    let status = SyncStatus::calculate([&record]);
    assert_eq!(status.total_images, 1);
    assert_eq!(status.pending_images, 1);
    assert_eq!(status.sync_percentage, 0);

    // First attempt fails on the network
    let record = record.mark_failed("Upload failed", 1);
    assert_eq!(record.state(), SyncState::Failed);
    assert_eq!(record.error_message.as_deref(), Some("Upload failed"));

    let status = SyncStatus::calculate([&record]);
    assert_eq!(status.failed_images, 1);
    assert_eq!(status.pending_images, 0);

    // A retry is scheduled; the failure stays visible until it resolves
    let record = record.mark_retry(2);
    assert_eq!(record.state(), SyncState::Failed);
    assert_eq!(record.retry_count, 2);

    // The retry succeeds
    let synced_at = Utc::now();
    let record = record.mark_synced(Some(synced_at));
    assert!(record.is_synced);
    assert!(!record.has_error);
    assert!(record.error_message.is_none());
    assert_eq!(record.retry_count, 2, "success keeps the attempt history");
    assert_eq!(record.synced_at, Some(synced_at));

    let status = SyncStatus::calculate([&record]);
    assert_eq!(status.synced_images, 1);
    assert_eq!(status.sync_percentage, 100);
}

#[test]
fn test_camera_roll_scale_reporting() {
    // 1000 captures, every second one already synced
    let records: Vec<ImageSyncRecord> = (0..1000)
        .map(|i| {
            let r = capture(i);
            if i % 2 == 0 {
                r.mark_synced(Some(Utc::now()))
            } else {
                r
            }
        })
        .collect();

    let status = SyncStatus::calculate(&records);
    assert_eq!(status.total_images, 1000);
    assert_eq!(status.synced_images, 500);
    assert_eq!(status.pending_images, 500);
    assert_eq!(status.failed_images, 0);
    assert_eq!(status.sync_percentage, 50);
    assert!(status.validate().is_ok());
}

#[test]
fn test_status_refresh_keeps_orchestrator_fields() {
    let records: Vec<ImageSyncRecord> = (0..4).map(capture).collect();
    let last_sync = Utc::now() - chrono::Duration::minutes(5);

    // The orchestrator is mid-run and knows when the last pass finished
    let live = SyncStatus {
        is_syncing: true,
        last_sync_at: Some(last_sync),
        ..SyncStatus::calculate(&records)
    };

    // Two uploads land; the refresh replaces counts but not the run state
    let records: Vec<ImageSyncRecord> = records
        .into_iter()
        .enumerate()
        .map(|(i, r)| if i < 2 { r.mark_synced(None) } else { r })
        .collect();
    let refreshed = live.updated(&records);

    assert_eq!(refreshed.synced_images, 2);
    assert_eq!(refreshed.pending_images, 2);
    assert_eq!(refreshed.sync_percentage, 50);
    assert!(refreshed.is_syncing);
    assert_eq!(refreshed.last_sync_at, Some(last_sync));
}

#[tokio::test]
async fn test_persistence_round_trip_with_corrupt_entry() -> anyhow::Result<()> {
    let store = MemoryStore::new();

    // Persist a small queue, one record per captured image
    for i in 0..3 {
        let record = if i == 0 {
            capture(i).mark_synced(Some(Utc::now()))
        } else {
            capture(i)
        };
        save_record(&store, &record).await?;
    }

    // One payload gets mangled on disk
    store
        .set_item(&record_key("file:///DCIM/skillet/IMG_0002.jpg"), "{torn")
        .await?;

    let entries = load_records(&store).await?;
    assert_eq!(entries.len(), 3);

    let corrupt: Vec<_> = entries
        .iter()
        .filter(|e| matches!(e, StoredRecord::Corrupt { .. }))
        .collect();
    assert_eq!(corrupt.len(), 1, "only the mangled payload is corrupt");

    // Reporting still works; the unreadable image counts as pending
    let status = SyncStatus::calculate_stored(&entries);
    assert_eq!(status.total_images, 3);
    assert_eq!(status.synced_images, 1);
    assert_eq!(status.pending_images, 2);

    // The readable records round-trip exactly
    let loaded = load_record(&store, "file:///DCIM/skillet/IMG_0001.jpg").await?;
    match loaded {
        Some(StoredRecord::Valid(record)) => {
            assert_eq!(record.file_name, "IMG_0001.jpg");
            assert_eq!(record.state(), SyncState::Pending);
        }
        other => panic!("expected a valid record, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_retry_policy_follows_configuration() {
    let config = StorageConfig::default()
        .apply(&ConfigUpdate {
            max_retries: Some(2),
            retry_delay_ms: Some(100),
            ..ConfigUpdate::default()
        })
        .unwrap();

    // Only transient failures are worth scheduling
    let offline = StorageError::network("socket closed", "upload", "image_sync");
    let denied = StorageError::permission_denied("no photo access", "upload", "image_sync");
    assert!(offline.is_retryable());
    assert!(!denied.is_retryable());

    // The schedule doubles per attempt, with jitter under one base delay
    let mut record = capture(9).mark_failed(offline.to_string(), 1);
    for attempt in 0..config.max_retries {
        let delay = config.delay_for_retry(attempt);
        let floor = u128::from(100u64 << attempt);
        assert!(delay.as_millis() >= floor);
        assert!(delay.as_millis() < floor + 100);
        let attempts_so_far = record.retry_count + 1;
        record = record.mark_retry(attempts_so_far);
    }
    assert_eq!(record.retry_count, 3);
    assert_eq!(record.state(), SyncState::Failed);
}

#[test]
fn test_rejected_settings_surface_every_fault() {
    let config = StorageConfig::default();
    let err = config
        .apply(&ConfigUpdate {
            retry_delay_ms: Some(0),
            max_file_size: Some(500_000_000),
            supported_formats: Some(vec!["image/tiff".to_string()]),
            ..ConfigUpdate::default()
        })
        .unwrap_err();

    assert_eq!(err.fault_count(), 3);
    let message = err.to_string();
    assert!(message.contains("retry_delay_ms"));
    assert!(message.contains("max_file_size"));
    assert!(message.contains("image/tiff"));
}
