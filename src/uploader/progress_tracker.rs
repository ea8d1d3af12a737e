use crate::commands::{RecordStore, UploadRecord, UploadStatus};
use crate::errors::safe_record_update;

use super::transfer_client::UploadResult;

/// Highest progress a record may show before the server has answered
const MAX_IN_FLIGHT_PROGRESS: u8 = 99;

/// Append a freshly submitted record to the end of the list
pub fn append_record(records: &RecordStore, record: UploadRecord) -> bool {
    match records.lock() {
        Ok(mut records) => {
            records.push(record);
            true
        }
        Err(e) => {
            log::error!("Failed to acquire record lock for append: {}", e);
            false
        }
    }
}

/// Raise the progress of an uploading record.
///
/// Returns the stored progress when it changed. Lower values, terminal
/// records and removed records are ignored.
pub fn update_progress(records: &RecordStore, record_id: &str, percent: u8) -> Option<u8> {
    safe_record_update(records, record_id, "progress update", |record| {
        if !record.is_uploading() {
            return None;
        }

        let capped = percent.min(MAX_IN_FLIGHT_PROGRESS);
        if capped > record.progress {
            record.progress = capped;
            log::debug!("Progress: {} at {}%", record.name, capped);
            Some(capped)
        } else {
            None
        }
    })
    .flatten()
}

/// Mark a record as uploaded
pub fn mark_complete(records: &RecordStore, record_id: &str, result: &UploadResult) -> bool {
    safe_record_update(records, record_id, "completion update", |record| {
        record.status = UploadStatus::Complete {
            url: result.url.clone(),
            deletion_token: result.deletion_token.clone(),
        };
        record.progress = 100;

        log::info!("Uploaded {} to {}", record.name, result.url);
    })
    .is_some()
}

/// Mark a record as failed
pub fn mark_failed(records: &RecordStore, record_id: &str, message: &str) -> bool {
    safe_record_update(records, record_id, "failure update", |record| {
        record.status = UploadStatus::Error {
            message: message.to_string(),
        };

        log::warn!("Failed to upload {}: {}", record.name, message);
    })
    .is_some()
}

pub fn remove_record(records: &RecordStore, record_id: &str) -> bool {
    match records.lock() {
        Ok(mut records) => {
            let before = records.len();
            records.retain(|r| r.id != record_id);
            records.len() != before
        }
        Err(e) => {
            log::error!("Failed to acquire record lock for removal of {}: {}", record_id, e);
            false
        }
    }
}

pub fn snapshot(records: &RecordStore) -> Vec<UploadRecord> {
    match records.lock() {
        Ok(records) => records.clone(),
        Err(e) => {
            log::error!("Failed to acquire record lock for snapshot: {}", e);
            Vec::new()
        }
    }
}

/// (uploading, complete, failed)
pub fn status_counts(records: &[UploadRecord]) -> (usize, usize, usize) {
    records
        .iter()
        .fold((0, 0, 0), |(uploading, complete, failed), record| {
            match record.status {
                UploadStatus::Uploading => (uploading + 1, complete, failed),
                UploadStatus::Complete { .. } => (uploading, complete + 1, failed),
                UploadStatus::Error { .. } => (uploading, complete, failed + 1),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(names: &[&str]) -> (RecordStore, Vec<String>) {
        let store = RecordStore::default();
        let mut ids = Vec::new();
        for name in names {
            let record = UploadRecord::new(name.to_string(), 10);
            ids.push(record.id.clone());
            append_record(&store, record);
        }
        (store, ids)
    }

    fn done(url: &str) -> UploadResult {
        UploadResult {
            url: url.to_string(),
            deletion_token: Some("tok".to_string()),
        }
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let (store, ids) = store_with(&["a.txt", "b.txt", "a.txt"]);
        let records = snapshot(&store);

        assert_eq!(records.len(), 3);
        let stored: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(stored, ids);
        assert_eq!(records[0].name, records[2].name);
    }

    #[test]
    fn test_progress_is_monotonic_and_capped() {
        let (store, ids) = store_with(&["a.txt"]);

        assert_eq!(update_progress(&store, &ids[0], 40), Some(40));
        assert_eq!(update_progress(&store, &ids[0], 20), None);
        assert_eq!(update_progress(&store, &ids[0], 100), Some(99));
        assert_eq!(snapshot(&store)[0].progress, 99);
        assert!(snapshot(&store)[0].is_uploading());
    }

    #[test]
    fn test_complete_sets_full_progress_and_result() {
        let (store, ids) = store_with(&["a.txt"]);

        assert!(mark_complete(&store, &ids[0], &done("https://t.sh/x/a.txt")));
        let record = &snapshot(&store)[0];
        assert_eq!(record.progress, 100);
        assert_eq!(record.url(), Some("https://t.sh/x/a.txt"));
        assert_eq!(record.deletion_token(), Some("tok"));
        assert!(record.error().is_none());
    }

    #[test]
    fn test_progress_ignored_after_terminal_state() {
        let (store, ids) = store_with(&["a.txt"]);
        mark_failed(&store, &ids[0], "Upload failed (500)");

        assert_eq!(update_progress(&store, &ids[0], 50), None);
        let record = &snapshot(&store)[0];
        assert_eq!(record.error(), Some("Upload failed (500)"));
        assert!(record.url().is_none());
    }

    #[test]
    fn test_late_events_for_removed_record_are_noops() {
        let (store, ids) = store_with(&["a.txt", "b.txt"]);

        assert!(remove_record(&store, &ids[0]));
        assert!(!remove_record(&store, &ids[0]));

        assert_eq!(update_progress(&store, &ids[0], 50), None);
        assert!(!mark_complete(&store, &ids[0], &done("https://t.sh/x/a.txt")));
        assert!(!mark_failed(&store, &ids[0], "late"));

        let records = snapshot(&store);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, ids[1]);
        assert!(records[0].is_uploading());
    }

    #[test]
    fn test_status_counts() {
        let (store, ids) = store_with(&["a", "b", "c"]);
        mark_complete(&store, &ids[0], &done("https://t.sh/x/a"));
        mark_failed(&store, &ids[2], "nope");

        assert_eq!(status_counts(&snapshot(&store)), (1, 1, 1));
    }
}
