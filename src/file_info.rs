use std::path::Path;

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size with up to two decimals, e.g. `1.5 MB`.
///
/// Sizes above the largest unit stay in GB.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor: u64 = 1;
    while unit < UNITS.len() - 1 && bytes >= divisor * 1024 {
        divisor *= 1024;
        unit += 1;
    }

    let value = format!("{:.2}", bytes as f64 / divisor as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", value, UNITS[unit])
}

/// Name the file is uploaded under
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_boundaries() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(1), "1 Bytes");
        assert_eq!(format_bytes(1023), "1023 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_048_576), "1 MB");
        assert_eq!(format_bytes(1_073_741_824), "1 GB");
    }

    #[test]
    fn test_format_bytes_rounds_to_two_decimals() {
        assert_eq!(format_bytes(1_234_567), "1.18 MB");
        assert_eq!(format_bytes(5 * 1_099_511_627_776), "5120 GB");
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of(Path::new("/tmp/dir/hello.txt")), "hello.txt");
        assert_eq!(file_name_of(Path::new("relative name.md")), "relative name.md");
        assert_eq!(file_name_of(Path::new("/")), "upload");
    }
}
