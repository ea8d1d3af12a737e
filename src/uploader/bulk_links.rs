use serde::Serialize;

use crate::commands::UploadRecord;

/// Archive links covering every completed upload
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct BulkLinks {
    pub zip: String,
    pub tar_gz: String,
}

/// Server-side path of an uploaded file, without the leading `/`
pub fn archive_segment(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let segment = parsed.path().trim_start_matches('/');
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

/// Build `base(seg1,seg2,...).zip` and `.tar.gz` once two or more uploads are complete.
///
/// Segments follow record order, not the order uploads finished in.
pub fn derive_bulk_links(base_address: &str, records: &[UploadRecord]) -> Option<BulkLinks> {
    let segments: Vec<String> = records
        .iter()
        .filter_map(UploadRecord::url)
        .filter_map(|url| {
            let segment = archive_segment(url);
            if segment.is_none() {
                log::warn!("Skipping unparseable upload URL in bulk link: {}", url);
            }
            segment
        })
        .collect();

    if segments.len() < 2 {
        return None;
    }

    let stem = format!("{}({})", base_address, segments.join(","));
    Some(BulkLinks {
        zip: format!("{}.zip", stem),
        tar_gz: format!("{}.tar.gz", stem),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::UploadStatus;

    fn record(name: &str, status: UploadStatus) -> UploadRecord {
        let mut record = UploadRecord::new(name.to_string(), 1);
        record.status = status;
        record
    }

    fn complete(url: &str) -> UploadStatus {
        UploadStatus::Complete {
            url: url.to_string(),
            deletion_token: None,
        }
    }

    #[test]
    fn test_two_completed_files() {
        let records = vec![
            record("f1.txt", complete("https://transfer.sh/a/f1.txt")),
            record("f2.txt", complete("https://transfer.sh/b/f2.txt")),
        ];

        let links = derive_bulk_links("https://transfer.sh/", &records).unwrap();
        assert_eq!(links.zip, "https://transfer.sh/(a/f1.txt,b/f2.txt).zip");
        assert_eq!(links.tar_gz, "https://transfer.sh/(a/f1.txt,b/f2.txt).tar.gz");
    }

    #[test]
    fn test_single_completed_file_has_no_links() {
        let records = vec![
            record("f1.txt", complete("https://transfer.sh/a/f1.txt")),
            record("f2.txt", UploadStatus::Uploading),
            record(
                "f3.txt",
                UploadStatus::Error {
                    message: "Upload failed (500)".to_string(),
                },
            ),
        ];

        assert!(derive_bulk_links("https://transfer.sh/", &records).is_none());
        assert!(derive_bulk_links("https://transfer.sh/", &[]).is_none());
    }

    #[test]
    fn test_skips_unfinished_records_between_completed_ones() {
        let records = vec![
            record("x", complete("https://transfer.sh/c/x.bin")),
            record("y", UploadStatus::Uploading),
            record("z", complete("https://transfer.sh/d/z.bin")),
        ];

        let links = derive_bulk_links("https://transfer.sh/", &records).unwrap();
        assert_eq!(links.zip, "https://transfer.sh/(c/x.bin,d/z.bin).zip");
    }

    #[test]
    fn test_archive_segment() {
        assert_eq!(
            archive_segment("https://transfer.sh/abc/hello world.txt").as_deref(),
            Some("abc/hello%20world.txt")
        );
        assert!(archive_segment("https://transfer.sh/").is_none());
        assert!(archive_segment("not a url").is_none());
    }
}
