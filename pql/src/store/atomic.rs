//! Atomic file replacement for slot files.
//!
//! Content is written to a temp file in the same directory and renamed over
//! the target, so readers see either the old text or the new text.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Temp path next to the target.
/// Format: {dir}/.tmp.{random}.{filename}
pub fn temp_path(final_path: &Path) -> PathBuf {
    let filename = final_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("slot");
    let random: u64 = rand::random();
    final_path.with_file_name(format!(".tmp.{:016x}.{}", random, filename))
}

/// Replace `final_path` with `content`, creating parent directories as needed.
pub fn replace_file(final_path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = final_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(final_path);
    fs::write(&temp, content)?;
    if let Err(e) = fs::rename(&temp, final_path) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path() {
        let final_path = Path::new("/tmp/test/filters.pql");
        let temp = temp_path(final_path);

        assert_eq!(temp.parent(), final_path.parent());
        let filename = temp.file_name().unwrap().to_str().unwrap();
        assert!(filename.starts_with(".tmp."));
        assert!(filename.ends_with(".filters.pql"));
    }

    #[test]
    fn test_replace_file() {
        let tmp = TempDir::new().unwrap();
        let final_path = tmp.path().join("slots/filters.pql");

        replace_file(&final_path, b"eq(donor.age,22)").unwrap();
        assert_eq!(fs::read(&final_path).unwrap(), b"eq(donor.age,22)");

        replace_file(&final_path, b"limit(5)").unwrap();
        assert_eq!(fs::read(&final_path).unwrap(), b"limit(5)");

        // No temp files should remain
        let temps: Vec<_> = fs::read_dir(final_path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().unwrap_or("").starts_with(".tmp."))
            .collect();
        assert!(temps.is_empty(), "No temp files should remain");
    }
}
