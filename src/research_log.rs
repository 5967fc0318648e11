//! Append-only research output file.

use crate::error::Result;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Header line opening every saved entry.
pub const ENTRY_HEADER: &str = "--- Research Output --- ";

/// Format a saved entry: header, timestamp, blank line, body, blank line.
pub fn format_entry(data: &str, timestamp: DateTime<Local>) -> String {
    format!(
        "{}\nTimestamp: {}\n\n{}\n\n",
        ENTRY_HEADER,
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        data
    )
}

/// Append `data` to the file at `path`, creating it if needed.
///
/// Returns the confirmation message handed back to the agent.
pub fn save_to_text(data: &str, path: &Path) -> Result<String> {
    let entry = format_entry(data, Local::now());

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(entry.as_bytes())?;

    info!("Saved {} bytes of research output to {}", entry.len(), path.display());
    Ok(format!("data successfully saved to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_entry() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            format_entry("findings", ts),
            "--- Research Output --- \nTimestamp: 2024-03-09 14:05:07\n\nfindings\n\n"
        );
    }

    #[test]
    fn test_save_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let message = save_to_text("first", &path).unwrap();
        assert_eq!(message, format!("data successfully saved to {}", path.display()));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(ENTRY_HEADER));
        assert!(content.contains("\n\nfirst\n\n"));
    }

    #[test]
    fn test_save_appends_and_grows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        save_to_text("first entry", &path).unwrap();
        let len_after_first = std::fs::metadata(&path).unwrap().len();

        save_to_text("second entry", &path).unwrap();
        let len_after_second = std::fs::metadata(&path).unwrap().len();
        assert!(len_after_second > len_after_first);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(ENTRY_HEADER).count(), 2);
        let first = content.find("first entry").unwrap();
        let second = content.find("second entry").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_save_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        save_to_text("Zürich – 東京", &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("Zürich – 東京"));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        assert!(save_to_text("data", &path).is_err());
    }
}
