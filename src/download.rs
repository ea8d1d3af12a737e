use crate::config::DownloadConfig;
use crate::errors::{AppError, AppResult};
use crate::file_info::format_bytes;
use crate::preview::{language_for_filename, PreviewKind};
use crate::security::InputValidator;
use crate::uploader::transfer_client::TransferClient;

/// Permanently delete an uploaded file with its deletion token.
pub async fn delete_file(
    client: &TransferClient,
    download_url: &str,
    deletion_token: &str,
) -> AppResult<()> {
    InputValidator::validate_http_url(download_url)
        .map_err(|e| AppError::DeleteFailed(e.to_string()))?;
    InputValidator::validate_deletion_token(deletion_token)
        .map_err(|e| AppError::DeleteFailed(e.to_string()))?;

    match client.delete(download_url.trim(), deletion_token.trim()).await {
        Ok(()) => {
            log::info!("Deleted {}", download_url);
            Ok(())
        }
        Err(e) => {
            log::warn!("Deleting {} failed: {}", download_url, e);
            Err(e)
        }
    }
}

/// What a download page shows about its file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadInfo {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub download_url: String,
    pub preview: PreviewKind,
}

impl DownloadInfo {
    pub fn from_config(config: &DownloadConfig) -> Self {
        let preview = match &config.preview_type {
            Some(preview_type) => PreviewKind::from_preview_type(preview_type),
            None => PreviewKind::from_content_type(&config.content_type),
        };

        Self {
            filename: config.filename.clone(),
            content_type: config.content_type.clone(),
            size: config.content_length.trim().parse().unwrap_or(0),
            download_url: config.download_url.clone(),
            preview,
        }
    }

    /// `name (type, size)`
    pub fn summary(&self) -> String {
        format!(
            "{} ({}, {})",
            self.filename,
            self.content_type,
            format_bytes(self.size)
        )
    }

    pub fn language(&self) -> Option<&'static str> {
        match self.preview {
            PreviewKind::Code => Some(language_for_filename(&self.filename)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn download_config(preview_type: Option<&str>, content_type: &str) -> DownloadConfig {
        DownloadConfig {
            site: AppConfig::default(),
            filename: "main.rs".to_string(),
            content_type: content_type.to_string(),
            content_length: "1536".to_string(),
            download_url: "https://transfer.sh/abc/main.rs".to_string(),
            preview_type: preview_type.map(str::to_string),
        }
    }

    #[test]
    fn test_info_prefers_configured_preview_type() {
        let info = DownloadInfo::from_config(&download_config(Some("code"), "application/octet-stream"));
        assert_eq!(info.preview, PreviewKind::Code);
        assert_eq!(info.language(), Some("rust"));
        assert_eq!(info.summary(), "main.rs (application/octet-stream, 1.5 KB)");
    }

    #[test]
    fn test_info_falls_back_to_content_type() {
        let info = DownloadInfo::from_config(&download_config(None, "image/png"));
        assert_eq!(info.preview, PreviewKind::Image);
        assert!(info.language().is_none());
    }

    #[test]
    fn test_unparseable_length_counts_as_zero() {
        let mut config = download_config(None, "text/plain");
        config.content_length = "unknown".to_string();
        assert_eq!(DownloadInfo::from_config(&config).size, 0);
    }

    #[tokio::test]
    async fn test_delete_requires_token() {
        let client = TransferClient::new("https://transfer.sh/").unwrap();
        let result = delete_file(&client, "https://transfer.sh/abc/a.txt", "").await;
        assert!(matches!(result, Err(AppError::DeleteFailed(_))));
    }
}
