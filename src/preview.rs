use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::AppResult;
use crate::security::InputValidator;
use crate::uploader::transfer_client::TransferClient;

/// How a downloaded file is shown on its page
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Image,
    Video,
    Audio,
    Markdown,
    Code,
    Generic,
}

impl PreviewKind {
    /// Map the server's preview type. Unknown values, `sandbox` included, get the generic view.
    pub fn from_preview_type(preview_type: &str) -> Self {
        match preview_type.trim().to_ascii_lowercase().as_str() {
            "image" => PreviewKind::Image,
            "video" => PreviewKind::Video,
            "audio" => PreviewKind::Audio,
            "markdown" => PreviewKind::Markdown,
            "code" => PreviewKind::Code,
            _ => PreviewKind::Generic,
        }
    }

    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "text/markdown" | "text/x-markdown" => PreviewKind::Markdown,
            "application/json" | "application/javascript" | "application/xml"
            | "application/x-sh" | "application/toml" | "application/yaml" => PreviewKind::Code,
            m if m.starts_with("image/") => PreviewKind::Image,
            m if m.starts_with("video/") => PreviewKind::Video,
            m if m.starts_with("audio/") => PreviewKind::Audio,
            m if m.starts_with("text/") => PreviewKind::Code,
            _ => PreviewKind::Generic,
        }
    }

    /// Whether the preview needs the file's text content
    pub fn needs_content(&self) -> bool {
        matches!(self, PreviewKind::Markdown | PreviewKind::Code)
    }
}

/// Highlighter language for a file name, `text` when unknown
pub fn language_for_filename(filename: &str) -> &'static str {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let ext = name.rsplit('.').next().unwrap_or_default();

    match ext {
        "js" => "javascript",
        "jsx" => "jsx",
        "ts" => "typescript",
        "tsx" => "tsx",
        "py" => "python",
        "rb" => "ruby",
        "go" => "go",
        "rs" => "rust",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "hpp" => "cpp",
        "cs" => "csharp",
        "php" => "php",
        "swift" => "swift",
        "kt" => "kotlin",
        "scala" => "scala",
        "sh" | "bash" | "zsh" | "fish" => "bash",
        "ps1" => "powershell",
        "sql" => "sql",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" => "scss",
        "less" => "less",
        "json" => "json",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" => "markdown",
        "dockerfile" => "docker",
        "makefile" => "makefile",
        _ => "text",
    }
}

/// Load a file's text for an inline preview
pub async fn fetch_content(client: &TransferClient, url: &str) -> AppResult<String> {
    InputValidator::validate_http_url(url)?;
    let content = client.fetch_text(url).await?;
    log::debug!("Loaded {} bytes of preview content from {}", content.len(), url);
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_type_mapping() {
        assert_eq!(PreviewKind::from_preview_type("image"), PreviewKind::Image);
        assert_eq!(PreviewKind::from_preview_type("Markdown"), PreviewKind::Markdown);
        assert_eq!(PreviewKind::from_preview_type("code"), PreviewKind::Code);
        assert_eq!(PreviewKind::from_preview_type("sandbox"), PreviewKind::Generic);
        assert_eq!(PreviewKind::from_preview_type(""), PreviewKind::Generic);
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(PreviewKind::from_content_type("image/png"), PreviewKind::Image);
        assert_eq!(PreviewKind::from_content_type("video/mp4"), PreviewKind::Video);
        assert_eq!(PreviewKind::from_content_type("audio/mpeg"), PreviewKind::Audio);
        assert_eq!(
            PreviewKind::from_content_type("text/markdown; charset=utf-8"),
            PreviewKind::Markdown
        );
        assert_eq!(PreviewKind::from_content_type("text/plain"), PreviewKind::Code);
        assert_eq!(PreviewKind::from_content_type("application/json"), PreviewKind::Code);
        assert_eq!(
            PreviewKind::from_content_type("application/octet-stream"),
            PreviewKind::Generic
        );
        assert!(PreviewKind::Code.needs_content());
        assert!(!PreviewKind::Image.needs_content());
    }

    #[test]
    fn test_language_for_filename() {
        assert_eq!(language_for_filename("main.rs"), "rust");
        assert_eq!(language_for_filename("App.TSX"), "tsx");
        assert_eq!(language_for_filename("Dockerfile"), "docker");
        assert_eq!(language_for_filename("Makefile"), "makefile");
        assert_eq!(language_for_filename("archive.tar.gz"), "text");
        assert_eq!(language_for_filename("notes"), "text");
        assert_eq!(language_for_filename("dir/setup.sh"), "bash");
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_url() {
        let client = TransferClient::new("https://transfer.sh/").unwrap();
        assert!(fetch_content(&client, "file:///etc/passwd").await.is_err());
    }
}
