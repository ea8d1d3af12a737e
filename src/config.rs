use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};

pub const DEFAULT_WEB_ADDRESS: &str = "https://transfer.sh/";
pub const DEFAULT_HOSTNAME: &str = "transfer.sh";

/// Site settings. Keys match the settings object the server injects into its pages.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub web_address: String,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ga_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purge_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_token2: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            web_address: DEFAULT_WEB_ADDRESS.to_string(),
            hostname: DEFAULT_HOSTNAME.to_string(),
            ga_key: None,
            email_contact: None,
            max_upload_size: None,
            purge_time: None,
            sample_token: None,
            sample_token2: None,
        }
    }
}

impl AppConfig {
    /// Same settings pointed at another instance. The hostname follows the address.
    pub fn with_web_address(mut self, web_address: &str) -> AppResult<Self> {
        self.web_address = normalize_web_address(web_address);
        self.hostname = reqwest::Url::parse(&self.web_address)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .ok_or_else(|| AppError::invalid_url(web_address))?;
        validate_config(&self)?;
        Ok(self)
    }
}

/// Settings for a single file's download page
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadConfig {
    #[serde(flatten)]
    pub site: AppConfig,
    pub filename: String,
    pub content_type: String,
    pub content_length: String,
    pub download_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_type: Option<String>,
}

/// Ensure the base address ends with exactly one `/` so file names can be appended.
pub fn normalize_web_address(web_address: &str) -> String {
    format!("{}/", web_address.trim().trim_end_matches('/'))
}

fn get_config_path() -> AppResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AppError::Config("Could not find config directory".to_string()))?
        .join("transfer-sh-client");

    fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("config.json"))
}

pub fn load_config() -> AppResult<AppConfig> {
    let config_path = get_config_path()?;
    load_config_from(&config_path)
}

/// Load settings from `config_path`, writing the defaults there if it does not exist.
pub fn load_config_from(config_path: &Path) -> AppResult<AppConfig> {
    if config_path.exists() {
        let config_str = fs::read_to_string(config_path)?;
        let mut config: AppConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
            log::warn!("Failed to parse config file: {}. Using defaults.", e);
            AppConfig::default()
        });
        config.web_address = normalize_web_address(&config.web_address);

        validate_config(&config)?;

        Ok(config)
    } else {
        let default_config = AppConfig::default();
        save_config_to(config_path, &default_config)?;
        Ok(default_config)
    }
}

pub fn save_config(config: &AppConfig) -> AppResult<()> {
    let config_path = get_config_path()?;
    save_config_to(&config_path, config)
}

pub fn save_config_to(config_path: &Path, config: &AppConfig) -> AppResult<()> {
    validate_config(config)?;

    if config_path.exists() {
        let backup_path = config_path.with_extension("json.bak");
        if let Err(e) = fs::copy(config_path, &backup_path) {
            log::warn!("Failed to create config backup: {}", e);
        }
    } else if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(config_path, config_str)?;

    log::info!("Configuration saved to {}", config_path.display());
    Ok(())
}

pub fn validate_config(config: &AppConfig) -> AppResult<()> {
    let web_address = config.web_address.trim();
    if !(web_address.starts_with("http://") || web_address.starts_with("https://")) {
        return Err(AppError::validation(
            "webAddress",
            "Must start with http:// or https://",
        ));
    }

    if reqwest::Url::parse(web_address).is_err() {
        return Err(AppError::invalid_url(web_address));
    }

    if config.hostname.trim().is_empty() {
        return Err(AppError::validation("hostname", "Hostname cannot be empty"));
    }

    if let Some(email) = &config.email_contact {
        if !email.contains('@') {
            return Err(AppError::validation("emailContact", "Must be an email address"));
        }
    }

    Ok(())
}

// Reset configuration to defaults
pub fn reset_config() -> AppResult<AppConfig> {
    let config_path = get_config_path()?;

    if config_path.exists() {
        let backup_path = config_path.with_extension("json.reset_backup");
        fs::copy(&config_path, &backup_path)?;
        log::info!("Existing config backed up to {}", backup_path.display());
    }

    let default_config = AppConfig::default();
    save_config_to(&config_path, &default_config)?;

    log::info!("Configuration reset to defaults");
    Ok(default_config)
}
