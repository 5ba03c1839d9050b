//! Plain text and markdown file extraction.

use crate::error::{PratError, Result};
use std::path::Path;

/// Extensions read directly as text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Read a local text or markdown file.
pub fn extract_text_file(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(PratError::Extraction(format!(
            "Unsupported file type '{}': {}",
            ext,
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| PratError::Extraction(format!("Cannot read {}: {}", path.display(), e)))?;

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Notes\n\nSome research.").unwrap();

        let text = extract_text_file(&path).unwrap();
        assert!(text.contains("Some research."));
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "a,b,c").unwrap();

        assert!(extract_text_file(&path).is_err());
    }
}
