use crate::commands::{EventSender, RecordStore, UploadEvent, UploadRecord};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered the upload with a non-success status.
    #[error("Upload failed ({status})")]
    TransferFailed { status: u16 },

    /// Transport-level failure, no status code available.
    #[error("{0}")]
    NetworkFailed(String),

    #[error("{0}")]
    LoadFailed(String),

    #[error("Failed to delete file: {0}")]
    DeleteFailed(String),

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Custom result type
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn file_not_found(path: &str) -> Self {
        Self::FileNotFound {
            path: path.to_string(),
        }
    }

    pub fn invalid_url(url: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
        }
    }

    pub fn transfer_failed(status: u16) -> Self {
        Self::TransferFailed { status }
    }

    pub fn network_failed(error: impl std::fmt::Display) -> Self {
        Self::NetworkFailed(error.to_string())
    }
}

/// Apply `f` to the record with `record_id`.
///
/// Returns `false` without touching anything when the record is gone, which is
/// the normal outcome for events arriving after the record was removed.
pub fn safe_record_update<F, R>(
    records: &RecordStore,
    record_id: &str,
    operation: &str,
    f: F,
) -> Option<R>
where
    F: FnOnce(&mut UploadRecord) -> R,
{
    match records.lock() {
        Ok(mut records) => {
            if let Some(record) = records.iter_mut().find(|r| r.id == record_id) {
                Some(f(record))
            } else {
                log::debug!(
                    "Record {} not present for {} operation, ignoring",
                    record_id,
                    operation
                );
                None
            }
        }
        Err(e) => {
            log::error!(
                "Failed to acquire record lock for {} on {} (non-critical): {}",
                operation,
                record_id,
                e
            );
            None
        }
    }
}

pub fn safe_record_read<F, R>(
    records: &RecordStore,
    record_id: &str,
    operation: &str,
    f: F,
) -> Option<R>
where
    F: FnOnce(&UploadRecord) -> R,
{
    match records.lock() {
        Ok(records) => {
            if let Some(record) = records.iter().find(|r| r.id == record_id) {
                Some(f(record))
            } else {
                log::debug!(
                    "Record {} not present for {} operation",
                    record_id,
                    operation
                );
                None
            }
        }
        Err(e) => {
            log::error!(
                "Failed to acquire record lock for {} on {} (non-critical): {}",
                operation,
                record_id,
                e
            );
            None
        }
    }
}

/// Publish an event to every subscriber. Having no subscriber is not an error.
pub fn safe_emit_event(events: &EventSender, event: UploadEvent) -> bool {
    match events.send(event) {
        Ok(receivers) => {
            log::trace!("Emitted upload event to {} subscriber(s)", receivers);
            true
        }
        Err(e) => {
            log::debug!("No subscriber for upload event {:?} (non-critical)", e.0);
            false
        }
    }
}
