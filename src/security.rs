use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::errors::{AppError, AppResult};

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid token pattern"))
}

pub struct InputValidator;

impl InputValidator {
    /// A file can be uploaded if it exists and is a regular file.
    pub fn validate_upload_path(path: &Path) -> AppResult<()> {
        let display = path.to_string_lossy();

        if display.trim().is_empty() {
            return Err(AppError::validation("file_path", "File path cannot be empty"));
        }

        if !path.exists() {
            return Err(AppError::file_not_found(&display));
        }

        if !path.is_file() {
            return Err(AppError::validation("file_path", "Path is not a file"));
        }

        Ok(())
    }

    pub fn validate_deletion_token(token: &str) -> AppResult<()> {
        let trimmed = token.trim();

        if trimmed.is_empty() {
            return Err(AppError::validation("token", "Deletion token cannot be empty"));
        }

        if trimmed.len() > 200 {
            return Err(AppError::validation("token", "Deletion token too long"));
        }

        if !token_pattern().is_match(trimmed) {
            return Err(AppError::validation(
                "token",
                "Deletion token contains invalid characters",
            ));
        }

        Ok(())
    }

    pub fn validate_http_url(url: &str) -> AppResult<()> {
        let trimmed = url.trim();

        if trimmed.is_empty() {
            return Err(AppError::validation("url", "URL cannot be empty"));
        }

        match reqwest::Url::parse(trimmed) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
            _ => Err(AppError::invalid_url(trimmed)),
        }
    }
}
