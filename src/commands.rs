use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::uploader::bulk_links::{derive_bulk_links, BulkLinks};
use crate::uploader::progress_tracker;
use crate::uploader::transfer_client::{TransferClient, UploadOptions};
use crate::{download, markdown, preview, uploader};

pub type RecordId = String;

/// Lifecycle of a single upload. Result fields only exist in their state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Complete {
        url: String,
        deletion_token: Option<String>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UploadRecord {
    pub id: RecordId,
    pub name: String,
    pub size: u64,
    pub progress: u8,
    #[serde(flatten)]
    pub status: UploadStatus,
    pub submitted_at: DateTime<Utc>,
}

impl UploadRecord {
    pub fn new(name: String, size: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            size,
            progress: 0,
            status: UploadStatus::Uploading,
            submitted_at: Utc::now(),
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.status, UploadStatus::Uploading)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, UploadStatus::Complete { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, UploadStatus::Error { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match &self.status {
            UploadStatus::Complete { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn deletion_token(&self) -> Option<&str> {
        match &self.status {
            UploadStatus::Complete { deletion_token, .. } => deletion_token.as_deref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            UploadStatus::Error { message } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UploadEvent {
    Submitted {
        id: RecordId,
        name: String,
        size: u64,
    },
    Progress {
        id: RecordId,
        progress: u8,
    },
    Completed {
        id: RecordId,
        url: String,
        deletion_token: Option<String>,
    },
    Failed {
        id: RecordId,
        error: String,
    },
    Removed {
        id: RecordId,
    },
}

impl UploadEvent {
    pub fn record_id(&self) -> &str {
        match self {
            UploadEvent::Submitted { id, .. }
            | UploadEvent::Progress { id, .. }
            | UploadEvent::Completed { id, .. }
            | UploadEvent::Failed { id, .. }
            | UploadEvent::Removed { id } => id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadEvent::Completed { .. } | UploadEvent::Failed { .. } | UploadEvent::Removed { .. }
        )
    }
}

/// Insertion-ordered upload records shared with the upload tasks
pub type RecordStore = Arc<Mutex<Vec<UploadRecord>>>;

pub type EventSender = broadcast::Sender<UploadEvent>;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Everything a front-end needs, passed explicitly instead of living in globals.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub client: TransferClient,
    pub records: RecordStore,
    pub events: EventSender,
}

impl AppContext {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let client = TransferClient::new(&config.web_address)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config: Arc::new(config),
            client,
            records: RecordStore::default(),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }
}

/// Start uploading every file; returns the new record ids in submission order.
///
/// Must be called from within a tokio runtime.
pub fn upload_files(ctx: &AppContext, files: Vec<PathBuf>, options: UploadOptions) -> Vec<RecordId> {
    uploader::submit(ctx, files, options)
}

pub fn get_upload_records(ctx: &AppContext) -> Vec<UploadRecord> {
    progress_tracker::snapshot(&ctx.records)
}

pub fn get_upload_record(ctx: &AppContext, record_id: &str) -> Option<UploadRecord> {
    crate::errors::safe_record_read(&ctx.records, record_id, "get record", |r| r.clone())
}

/// Drop a record from the list. An in-flight transfer keeps running.
pub fn remove_upload(ctx: &AppContext, record_id: &str) -> bool {
    uploader::remove(ctx, record_id)
}

pub fn get_bulk_links(ctx: &AppContext) -> Option<BulkLinks> {
    let records = progress_tracker::snapshot(&ctx.records);
    derive_bulk_links(&ctx.config.web_address, &records)
}

pub async fn delete_file(ctx: &AppContext, download_url: &str, deletion_token: &str) -> AppResult<()> {
    download::delete_file(&ctx.client, download_url, deletion_token).await
}

pub async fn fetch_preview(ctx: &AppContext, url: &str) -> AppResult<String> {
    preview::fetch_content(&ctx.client, url).await
}

pub async fn render_markdown_preview(ctx: &AppContext, url: &str) -> AppResult<String> {
    let raw = preview::fetch_content(&ctx.client, url).await?;
    Ok(markdown::render_markdown(&raw))
}

pub fn get_app_config(ctx: &AppContext) -> AppConfig {
    ctx.config.as_ref().clone()
}

/// Wait until none of `ids` is still uploading.
///
/// `events` must have been subscribed before the uploads were submitted.
pub async fn wait_for_uploads(
    ctx: &AppContext,
    ids: &[RecordId],
    events: &mut broadcast::Receiver<UploadEvent>,
) {
    let mut pending: HashSet<&str> = ids.iter().map(String::as_str).collect();
    pending.retain(|id| {
        crate::errors::safe_record_read(&ctx.records, id, "wait", |r| r.is_uploading())
            .unwrap_or(false)
    });

    while !pending.is_empty() {
        match events.recv().await {
            Ok(event) if event.is_terminal() => {
                pending.remove(event.record_id());
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::debug!("Upload event receiver lagged by {} events", skipped);
                pending.retain(|id| {
                    crate::errors::safe_record_read(&ctx.records, id, "wait", |r| r.is_uploading())
                        .unwrap_or(false)
                });
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Receive the next upload event, skipping over any the receiver lagged past.
///
/// Returns `None` once every sender is gone.
pub async fn next_upload_event(events: &mut broadcast::Receiver<UploadEvent>) -> Option<UploadEvent> {
    loop {
        match events.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::debug!("Upload event receiver lagged by {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(id: &str, progress: u8) -> UploadEvent {
        UploadEvent::Progress {
            id: id.to_string(),
            progress,
        }
    }

    #[tokio::test]
    async fn test_next_upload_event_continues_after_lag() {
        let (tx, mut rx) = broadcast::channel(2);
        for p in 1..=5 {
            tx.send(progress("a", p)).unwrap();
        }

        // The three oldest events were overwritten; the rest still arrive.
        assert_eq!(next_upload_event(&mut rx).await, Some(progress("a", 4)));
        assert_eq!(next_upload_event(&mut rx).await, Some(progress("a", 5)));

        drop(tx);
        assert_eq!(next_upload_event(&mut rx).await, None);
    }

    #[test]
    fn test_new_record_starts_uploading() {
        let record = UploadRecord::new("hello.txt".to_string(), 12);
        assert!(record.is_uploading());
        assert_eq!(record.progress, 0);
        assert!(record.url().is_none());
        assert!(record.deletion_token().is_none());
        assert!(record.error().is_none());
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = UploadRecord::new("a".to_string(), 1);
        let b = UploadRecord::new("a".to_string(), 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_record_serializes_status_inline() {
        let mut record = UploadRecord::new("a.txt".to_string(), 3);
        record.status = UploadStatus::Complete {
            url: "https://transfer.sh/abc/a.txt".to_string(),
            deletion_token: Some("tok".to_string()),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["url"], "https://transfer.sh/abc/a.txt");
        assert_eq!(json["deletion_token"], "tok");
    }

    #[test]
    fn test_terminal_events() {
        let id = "x".to_string();
        assert!(!UploadEvent::Progress { id: id.clone(), progress: 5 }.is_terminal());
        assert!(UploadEvent::Removed { id: id.clone() }.is_terminal());
        assert!(UploadEvent::Failed { id, error: "boom".to_string() }.is_terminal());
    }
}
