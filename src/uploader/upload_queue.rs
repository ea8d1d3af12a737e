use std::path::{Path, PathBuf};

use crate::commands::{AppContext, RecordId, UploadEvent, UploadRecord};
use crate::errors::safe_emit_event;
use crate::file_info::file_name_of;
use crate::security::InputValidator;

use super::progress_tracker::*;
use super::transfer_client::UploadOptions;

/// Register one record per file and start every upload at once.
///
/// Records are appended synchronously, in order, before any transfer begins.
/// Each transfer runs on its own task; none waits for or affects another.
pub fn submit(ctx: &AppContext, files: Vec<PathBuf>, options: UploadOptions) -> Vec<RecordId> {
    let mut ids = Vec::with_capacity(files.len());

    for path in files {
        let name = file_name_of(&path);
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        let record = UploadRecord::new(name.clone(), size);
        let record_id = record.id.clone();

        if !append_record(&ctx.records, record) {
            continue;
        }
        safe_emit_event(
            &ctx.events,
            UploadEvent::Submitted {
                id: record_id.clone(),
                name: name.clone(),
                size,
            },
        );

        ids.push(record_id.clone());
        tokio::spawn(upload_one(ctx.clone(), record_id, path, name, options.clone()));
    }

    if !ids.is_empty() {
        log::info!("Submitted {} file(s) for upload", ids.len());
    }

    ids
}

/// Forget a record. The transfer behind it, if any, is left running.
pub fn remove(ctx: &AppContext, record_id: &str) -> bool {
    let removed = remove_record(&ctx.records, record_id);
    if removed {
        log::info!("Removed upload record {}", record_id);
        safe_emit_event(
            &ctx.events,
            UploadEvent::Removed {
                id: record_id.to_string(),
            },
        );
    } else {
        log::debug!("Record {} already gone, nothing to remove", record_id);
    }
    removed
}

async fn upload_one(
    ctx: AppContext,
    record_id: RecordId,
    path: PathBuf,
    name: String,
    options: UploadOptions,
) {
    if let Err(e) = InputValidator::validate_upload_path(&path) {
        fail(&ctx, &record_id, &e.to_string());
        return;
    }

    let records = ctx.records.clone();
    let events = ctx.events.clone();
    let progress_id = record_id.clone();
    let on_progress = move |percent: u8| {
        if let Some(progress) = update_progress(&records, &progress_id, percent) {
            safe_emit_event(
                &events,
                UploadEvent::Progress {
                    id: progress_id.clone(),
                    progress,
                },
            );
        }
    };

    match ctx
        .client
        .upload_file(Path::new(&path), &name, &options, on_progress)
        .await
    {
        Ok(result) => {
            if mark_complete(&ctx.records, &record_id, &result) {
                safe_emit_event(
                    &ctx.events,
                    UploadEvent::Completed {
                        id: record_id,
                        url: result.url,
                        deletion_token: result.deletion_token,
                    },
                );
            } else {
                log::debug!("Upload of {} finished after its record was removed", name);
            }
        }
        Err(e) => fail(&ctx, &record_id, &e.to_string()),
    }
}

fn fail(ctx: &AppContext, record_id: &str, message: &str) {
    if mark_failed(&ctx.records, record_id, message) {
        safe_emit_event(
            &ctx.events,
            UploadEvent::Failed {
                id: record_id.to_string(),
                error: message.to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn context() -> AppContext {
        // Nothing listens on the discard port, so transfers fail fast.
        let config = AppConfig::default()
            .with_web_address("http://127.0.0.1:9/")
            .unwrap();
        AppContext::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_submit_appends_records_in_order() {
        let ctx = context();
        let files = vec![
            PathBuf::from("first_missing.txt"),
            PathBuf::from("second_missing.txt"),
            PathBuf::from("first_missing.txt"),
        ];

        let ids = submit(&ctx, files, UploadOptions::default());
        let records = snapshot(&ctx.records);

        assert_eq!(ids.len(), 3);
        assert_eq!(records.len(), 3);
        for (record, id) in records.iter().zip(&ids) {
            assert_eq!(&record.id, id);
        }
        assert_eq!(records[0].name, "first_missing.txt");
        assert_eq!(records[1].name, "second_missing.txt");
        assert_eq!(records[2].name, "first_missing.txt");
    }

    #[tokio::test]
    async fn test_submit_nothing() {
        let ctx = context();
        assert!(submit(&ctx, Vec::new(), UploadOptions::default()).is_empty());
        assert!(snapshot(&ctx.records).is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_ends_in_error() {
        let ctx = context();
        let mut events = ctx.subscribe();

        let ids = submit(
            &ctx,
            vec![PathBuf::from("definitely_does_not_exist.bin")],
            UploadOptions::default(),
        );
        crate::commands::wait_for_uploads(&ctx, &ids, &mut events).await;

        let record = &snapshot(&ctx.records)[0];
        assert!(record.is_failed());
        assert!(record.error().unwrap().contains("definitely_does_not_exist.bin"));
    }

    #[tokio::test]
    async fn test_remove_unknown_id() {
        let ctx = context();
        assert!(!remove(&ctx, "not-a-record"));
    }
}
