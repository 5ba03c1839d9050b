//! YouTube subtitle extraction.
//!
//! Downloads a video's subtitles (manual or auto-generated) with yt-dlp and
//! flattens the WebVTT cues into plain transcript text.

use crate::error::{PratError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::debug;

fn video_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?:https?://)?
            (?:www\.)?
            (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
            ([a-zA-Z0-9_-]{11})
        ",
        )
        .expect("Invalid regex")
    })
}

/// Extract the video id from a YouTube URL.
///
/// Returns `None` for anything that is not a recognizable YouTube URL, which
/// is how locator classification tells YouTube links apart from other URLs.
pub fn extract_video_id(input: &str) -> Option<String> {
    video_id_regex()
        .captures(input.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Download a video's subtitles and return them as plain text.
pub async fn extract_subtitles(url: &str, temp_dir: &Path) -> Result<String> {
    let video_id = extract_video_id(url)
        .ok_or_else(|| PratError::Extraction(format!("Not a YouTube URL: {}", url)))?;

    std::fs::create_dir_all(temp_dir)?;
    let template = temp_dir.join(format!("{}.%(ext)s", video_id));

    debug!(video_id, "Downloading subtitles");

    let result = Command::new("yt-dlp")
        .arg("--skip-download")
        .arg("--write-subs")
        .arg("--write-auto-subs")
        .arg("--sub-format")
        .arg("vtt")
        .arg("--sub-langs")
        .arg("en.*")
        .arg("--output")
        .arg(template.to_str().unwrap_or_default())
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PratError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(PratError::Extraction(format!(
                "yt-dlp execution failed: {e}"
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PratError::Extraction(format!("yt-dlp failed: {stderr}")));
    }

    let subtitle_path = find_subtitle_file(temp_dir, &video_id)?;
    let raw = std::fs::read_to_string(&subtitle_path)?;
    let _ = std::fs::remove_file(&subtitle_path);

    let text = vtt_to_text(&raw);
    if text.is_empty() {
        return Err(PratError::Extraction(format!(
            "Video {} has no usable subtitles",
            video_id
        )));
    }

    Ok(text)
}

/// Locate the subtitle file yt-dlp wrote for a video id.
fn find_subtitle_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir)?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(video_id) && name.ends_with(".vtt") {
            return Ok(entry.path());
        }
    }

    Err(PratError::Extraction(format!(
        "No subtitles downloaded for video {}",
        video_id
    )))
}

/// Flatten WebVTT cues into plain text.
///
/// Drops the header, timestamps, cue settings, and inline tags. Auto
/// subtitles repeat the previous line in each cue, so consecutive duplicate
/// lines collapse to one.
pub fn vtt_to_text(vtt: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));

    let mut lines: Vec<String> = Vec::new();

    for line in vtt.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with("WEBVTT")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.starts_with("NOTE")
            || line.contains("-->")
        {
            continue;
        }

        let cleaned = tag.replace_all(line, "").trim().to_string();
        if cleaned.is_empty() {
            continue;
        }

        if lines.last().map(|prev| prev == &cleaned) != Some(true) {
            lines.push(cleaned);
        }
    }

    lines.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_variants() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            id
        );
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), id);
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0"),
            id
        );
        assert_eq!(extract_video_id("https://example.com/watch"), None);
    }

    #[test]
    fn test_vtt_to_text_strips_structure() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n00:00:00.000 --> 00:00:02.000\nHello there\n\n00:00:02.000 --> 00:00:04.000\nHello there\nGeneral <c>Kenobi</c>\n";
        assert_eq!(vtt_to_text(vtt), "Hello there General Kenobi");
    }

    #[test]
    fn test_vtt_to_text_empty_input() {
        assert_eq!(vtt_to_text("WEBVTT\n\n"), "");
    }
}
