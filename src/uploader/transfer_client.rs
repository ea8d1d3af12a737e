use crate::config::normalize_web_address;
use crate::errors::{AppError, AppResult};
use futures::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client};
use std::path::Path;
use tokio_util::io::ReaderStream;

/// Response header carrying `<download url>/<deletion token>`
pub const DELETE_URL_HEADER: &str = "X-Url-Delete";
pub const MAX_DOWNLOADS_HEADER: &str = "Max-Downloads";
pub const MAX_DAYS_HEADER: &str = "Max-Days";

/// Optional server-side limits sent with an upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub max_downloads: Option<u32>,
    pub max_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub url: String,
    pub deletion_token: Option<String>,
}

/// HTTP client for a transfer.sh instance.
///
/// No request timeout is configured: an upload may stay pending for as long
/// as the server keeps the connection open.
#[derive(Debug, Clone)]
pub struct TransferClient {
    client: Client,
    base_address: String,
}

impl TransferClient {
    pub fn new(base_address: &str) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("transfer-sh-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_address: normalize_web_address(base_address),
        })
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    /// Upload target for `file_name`. Colliding names are left to the server.
    pub fn endpoint_for(&self, file_name: &str) -> String {
        format!("{}{}", self.base_address, file_name)
    }

    /// PUT the raw bytes of `path` to the instance.
    ///
    /// `on_progress` receives the rounded percentage of bytes handed to the
    /// transport. It is not called for empty files.
    pub async fn upload_file<F>(
        &self,
        path: &Path,
        file_name: &str,
        options: &UploadOptions,
        mut on_progress: F,
    ) -> AppResult<UploadResult>
    where
        F: FnMut(u8) + Send + Sync + 'static,
    {
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();

        let mut sent: u64 = 0;
        let stream = ReaderStream::new(file).inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                sent += bytes.len() as u64;
                if total > 0 {
                    on_progress(progress_percent(sent, total));
                }
            }
        });

        let endpoint = self.endpoint_for(file_name);
        log::debug!("PUT {} ({} bytes)", endpoint, total);

        let mut request = self
            .client
            .put(&endpoint)
            .header(CONTENT_LENGTH, total)
            .body(Body::wrap_stream(stream));

        if let Some(max_downloads) = options.max_downloads {
            request = request.header(MAX_DOWNLOADS_HEADER, max_downloads);
        }
        if let Some(max_days) = options.max_days {
            request = request.header(MAX_DAYS_HEADER, max_days);
        }

        let response = request.send().await.map_err(AppError::network_failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transfer_failed(status.as_u16()));
        }

        let deletion_token = response
            .headers()
            .get(DELETE_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_deletion_token);

        let body = response.text().await.map_err(AppError::network_failed)?;

        Ok(UploadResult {
            url: body.trim().to_string(),
            deletion_token,
        })
    }

    /// DELETE `download_url/token`. Only a 2xx answer counts as deleted.
    pub async fn delete(&self, download_url: &str, deletion_token: &str) -> AppResult<()> {
        let target = format!("{}/{}", download_url.trim_end_matches('/'), deletion_token);

        let response = self
            .client
            .delete(&target)
            .send()
            .await
            .map_err(|e| AppError::DeleteFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AppError::DeleteFailed(format!("server answered {}", status)))
        }
    }

    /// GET `url` as text.
    pub async fn fetch_text(&self, url: &str) -> AppResult<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            log::warn!("Fetching {} failed: {}", url, e);
            AppError::LoadFailed(LOAD_FAILED_MESSAGE.to_string())
        })?;

        if !response.status().is_success() {
            log::warn!("Fetching {} answered {}", url, response.status());
            return Err(AppError::LoadFailed(LOAD_FAILED_MESSAGE.to_string()));
        }

        response.text().await.map_err(|e| {
            log::warn!("Reading body of {} failed: {}", url, e);
            AppError::LoadFailed(LOAD_FAILED_MESSAGE.to_string())
        })
    }
}

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load file";

pub fn progress_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (sent as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Keep only the final path segment of the delete URL header.
pub fn extract_deletion_token(header_value: &str) -> Option<String> {
    let token = header_value.trim().rsplit('/').next()?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
