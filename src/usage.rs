use serde::Serialize;

use crate::config::AppConfig;

const DEFAULT_SAMPLE_TOKEN: &str = "abc123";
const DEFAULT_SAMPLE_TOKEN2: &str = "def456";

/// One titled snippet showing how to use the instance from a terminal
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct UsageExample {
    pub title: String,
    pub comment: Option<String>,
    pub commands: Vec<String>,
}

impl UsageExample {
    fn new(title: &str, comment: Option<&str>, commands: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            comment: comment.map(str::to_string),
            commands,
        }
    }
}

pub fn usage_examples(config: &AppConfig) -> Vec<UsageExample> {
    let web = &config.web_address;
    let token = config.sample_token.as_deref().unwrap_or(DEFAULT_SAMPLE_TOKEN);
    let token2 = config.sample_token2.as_deref().unwrap_or(DEFAULT_SAMPLE_TOKEN2);

    vec![
        UsageExample::new(
            "Upload with cURL",
            Some("Upload a file"),
            vec![format!("curl --upload-file ./hello.txt {}hello.txt", web)],
        ),
        UsageExample::new(
            "Upload with limits",
            Some("With max downloads and expiry"),
            vec![format!(
                "curl -H \"Max-Downloads: 1\" -H \"Max-Days: 5\" --upload-file ./hello.txt {}hello.txt",
                web
            )],
        ),
        UsageExample::new(
            "Multiple files",
            Some("Download as archive"),
            vec![
                format!(
                    "curl -i -F filedata=@/tmp/hello.txt -F filedata=@/tmp/hello2.txt {}",
                    web
                ),
                format!("curl {}({}/hello.txt,{}/world.txt).zip", web, token, token2),
            ],
        ),
        UsageExample::new(
            "Encrypt with GPG",
            Some("Encrypt and upload, then download and decrypt"),
            vec![
                format!(
                    "cat /tmp/hello.txt | gpg -ac -o- | curl -X PUT --upload-file \"-\" {}test.txt",
                    web
                ),
                format!("curl {}{}/test.txt | gpg -o- > /tmp/hello.txt", web, token),
            ],
        ),
        UsageExample::new(
            "Encrypt with OpenSSL",
            Some("Encrypt and upload, then download and decrypt"),
            vec![
                format!(
                    "cat /tmp/hello.txt | openssl aes-256-cbc -pbkdf2 -e | curl -X PUT --upload-file \"-\" {}test.txt",
                    web
                ),
                format!(
                    "curl {}{}/test.txt | openssl aes-256-cbc -pbkdf2 -d > /tmp/hello.txt",
                    web, token
                ),
            ],
        ),
        UsageExample::new(
            "PowerShell (Windows)",
            None,
            vec![format!(
                "Invoke-WebRequest -Method PUT -InFile .\\file.txt {}file.txt",
                web
            )],
        ),
    ]
}

/// Short lines describing the instance's limits
pub fn feature_summary(config: &AppConfig) -> Vec<String> {
    vec![
        match &config.max_upload_size {
            Some(size) => format!("Upload up to {}", size),
            None => "Unlimited uploads".to_string(),
        },
        match &config.purge_time {
            Some(time) => format!("Stored for {}", time),
            None => "Stored forever".to_string(),
        },
    ]
}
