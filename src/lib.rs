//! Client for transfer.sh-style file sharing instances: concurrent uploads with
//! per-file progress, archive links, deletion, previews and markdown rendering.

pub mod commands;
pub mod config;
pub mod download;
pub mod errors;
pub mod file_info;
pub mod markdown;
pub mod preview;
pub mod security;
pub mod uploader;
pub mod usage;

pub use commands::{AppContext, UploadEvent, UploadRecord, UploadStatus};
pub use config::{AppConfig, DownloadConfig};
pub use errors::{AppError, AppResult};
