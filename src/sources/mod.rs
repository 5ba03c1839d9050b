//! Source text extraction.
//!
//! Turns user-supplied source locators (URLs, file paths) and research hits
//! into [`SourceSnippet`]s: plain text plus provenance. Each locator kind has
//! its own extractor; a locator that cannot be extracted is reported as an
//! error and the caller decides whether to skip it.

mod audio;
mod document;
mod file;
mod web;
mod youtube;

pub use audio::transcribe_audio;
pub use document::{extract_docx, extract_pdf};
pub use file::extract_text_file;
pub use web::extract_web_page;
pub use youtube::{extract_subtitles, extract_video_id};

use crate::error::{PratError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Kind of source a snippet was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Wikipedia,
    Web,
    YouTube,
    Audio,
    Pdf,
    Word,
    File,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Wikipedia => write!(f, "wikipedia"),
            SourceKind::Web => write!(f, "web"),
            SourceKind::YouTube => write!(f, "youtube"),
            SourceKind::Audio => write!(f, "audio"),
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::Word => write!(f, "word"),
            SourceKind::File => write!(f, "file"),
        }
    }
}

/// A fragment of research text with provenance.
///
/// Read-only once collected; the retrieval index and the prompts consume it
/// as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnippet {
    /// Unique snippet id.
    pub id: Uuid,
    /// Where the text came from: URL, file path, or article title.
    pub origin: String,
    /// What kind of source it was extracted from.
    pub kind: SourceKind,
    /// The extracted plain text.
    pub text: String,
}

impl SourceSnippet {
    /// Create a snippet with a fresh id.
    pub fn new(origin: impl Into<String>, kind: SourceKind, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin: origin.into(),
            kind,
            text: text.into(),
        }
    }
}

/// Audio file extensions handed to transcription.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg"];

/// Decide which extractor handles a locator.
pub fn classify(locator: &str) -> SourceKind {
    if youtube::extract_video_id(locator).is_some() {
        return SourceKind::YouTube;
    }

    let lower = locator.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("ftp://")
    {
        return SourceKind::Web;
    }

    match Path::new(&lower).extension().and_then(|e| e.to_str()) {
        Some(ext) if AUDIO_EXTENSIONS.contains(&ext) => SourceKind::Audio,
        Some("pdf") => SourceKind::Pdf,
        Some("docx") => SourceKind::Word,
        _ => SourceKind::File,
    }
}

/// Extracts text from source locators, dispatching by kind.
pub struct SourceExtractor {
    http: reqwest::Client,
    temp_dir: PathBuf,
}

impl SourceExtractor {
    /// Create an extractor. The temp directory holds downloaded subtitles.
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Extract one locator into a snippet.
    pub async fn extract(&self, locator: &str) -> Result<SourceSnippet> {
        let kind = classify(locator);
        debug!(locator, kind = %kind, "Extracting source");

        let text = match kind {
            SourceKind::YouTube => extract_subtitles(locator, &self.temp_dir).await?,
            SourceKind::Web => extract_web_page(&self.http, locator).await?,
            SourceKind::Audio => transcribe_audio(Path::new(locator)).await?,
            SourceKind::Pdf => extract_pdf(Path::new(locator))?,
            SourceKind::Word => extract_docx(Path::new(locator))?,
            SourceKind::File => extract_text_file(Path::new(locator))?,
            SourceKind::Wikipedia => {
                return Err(PratError::Extraction(format!(
                    "Wikipedia articles are fetched by the research collector, not by locator: {}",
                    locator
                )))
            }
        };

        if text.trim().is_empty() {
            return Err(PratError::Extraction(format!(
                "No text extracted from {}",
                locator
            )));
        }

        Ok(SourceSnippet::new(locator, kind, text))
    }

    /// Extract every locator, skipping the ones that fail.
    ///
    /// Failed locators are logged as warnings. The result can be empty; the
    /// research stage turns that into a fatal error.
    pub async fn extract_all(&self, locators: &[String]) -> Vec<SourceSnippet> {
        let mut snippets = Vec::new();

        for locator in locators {
            match self.extract(locator).await {
                Ok(snippet) => snippets.push(snippet),
                Err(e) => warn!(locator, "Skipping unusable source: {}", e),
            }
        }

        snippets
    }
}
