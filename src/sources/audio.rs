//! Audio file transcription.

use crate::error::{PratError, Result};
use crate::openai::create_client;
use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use std::path::Path;
use tracing::debug;

/// Transcribe a local audio file with the OpenAI transcription API.
pub async fn transcribe_audio(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "Transcribing audio source");

    let file_bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio.mp3")
        .to_string();

    let request = CreateTranscriptionRequestArgs::default()
        .file(AudioInput::from_vec_u8(file_name, file_bytes))
        .model("whisper-1")
        .build()
        .map_err(|e| PratError::OpenAI(e.to_string()))?;

    let client = create_client();
    let response = client
        .audio()
        .transcribe(request)
        .await
        .map_err(|e| PratError::OpenAI(format!("Transcription failed: {}", e)))?;

    Ok(response.text)
}
