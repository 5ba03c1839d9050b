//! Segment assembly with ffmpeg.
//!
//! Audio segments are written to the temp directory, silences are generated
//! with the `anullsrc` source, and the pieces are stitched together with the
//! concat demuxer into one re-encoded MP3.

use super::Segment;
use crate::error::{PratError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

/// Write every segment to disk and concatenate them into `output`.
pub async fn assemble(segments: &[Segment], temp_dir: &Path, output: &Path) -> Result<()> {
    if segments.is_empty() {
        return Err(PratError::SpeechRender("Nothing to assemble".into()));
    }

    let work_dir = temp_dir.join(format!("render_{}", Uuid::new_v4()));
    std::fs::create_dir_all(&work_dir)?;

    let result = write_and_concat(segments, &work_dir, output).await;

    // Segment files are only useful for debugging a failed assembly.
    if result.is_ok() {
        let _ = std::fs::remove_dir_all(&work_dir);
    }

    result
}

async fn write_and_concat(segments: &[Segment], work_dir: &Path, output: &Path) -> Result<()> {
    let mut paths = Vec::with_capacity(segments.len());

    for (idx, segment) in segments.iter().enumerate() {
        let path = work_dir.join(format!("seg_{:04}.mp3", idx));
        match segment {
            Segment::Audio(bytes) => {
                tokio::fs::write(&path, bytes).await?;
            }
            Segment::Silence { duration_ms } => {
                generate_silence(&path, *duration_ms).await?;
            }
        }
        paths.push(path);
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    concat_segments(&paths, work_dir, output).await
}

/// Generate a silent MP3 of the given length.
async fn generate_silence(path: &Path, duration_ms: u64) -> Result<()> {
    debug!(duration_ms, "Generating silence segment");

    let result = Command::new("ffmpeg")
        .arg("-f").arg("lavfi")
        .arg("-i").arg("anullsrc=r=24000:cl=mono")
        .arg("-t").arg(format!("{:.3}", duration_ms as f64 / 1000.0))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("9")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(PratError::SpeechRender(format!(
                "ffmpeg silence generation failed: {stderr}"
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PratError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(PratError::SpeechRender(format!("ffmpeg error: {e}"))),
    }
}

/// Concatenate segment files into `output` with the concat demuxer.
///
/// Segments come from different encoders (synthesizer output and generated
/// silence), so the result is re-encoded rather than stream-copied.
async fn concat_segments(paths: &[PathBuf], work_dir: &Path, output: &Path) -> Result<()> {
    let list_path = work_dir.join("concat.txt");
    let list = paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display()))
        .collect::<String>();
    tokio::fs::write(&list_path, list).await?;

    debug!(segments = paths.len(), "Concatenating segments");

    let result = Command::new("ffmpeg")
        .arg("-f").arg("concat")
        .arg("-safe").arg("0")
        .arg("-i").arg(&list_path)
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(output)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(PratError::SpeechRender(format!(
                "ffmpeg concat failed: {stderr}"
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PratError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(PratError::SpeechRender(format!("ffmpeg error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_assemble_rejects_empty_plan() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp3");
        let result = assemble(&[], dir.path(), &output).await;
        assert!(matches!(result, Err(PratError::SpeechRender(_))));
    }
}
