//! Speech synthesis via the ElevenLabs API.

use super::Synthesizer;
use crate::config::ElevenLabsTtsSettings;
use crate::error::{PratError, Result};
use crate::script::Speaker;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

const API_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// ElevenLabs text-to-speech adapter.
pub struct ElevenLabsSynthesizer {
    http: reqwest::Client,
    api_key: String,
    settings: ElevenLabsTtsSettings,
}

impl ElevenLabsSynthesizer {
    /// Create an adapter reading the key from `ELEVENLABS_API_KEY`.
    pub fn from_env(settings: ElevenLabsTtsSettings) -> Result<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY").map_err(|_| {
            PratError::Config(
                "ELEVENLABS_API_KEY is not set but the TTS provider is elevenlabs".into(),
            )
        })?;
        Ok(Self::new(api_key, settings))
    }

    pub fn new(api_key: impl Into<String>, settings: ElevenLabsTtsSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            settings,
        }
    }

    fn voice_id_for(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::Interviewer => &self.settings.interviewer_voice,
            Speaker::Interviewee => &self.settings.interviewee_voice,
        }
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    fn provider(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str, speaker: Speaker) -> Result<Vec<u8>> {
        debug!(speaker = %speaker, chars = text.len(), "Synthesizing speech");

        let url = format!("{}/{}", API_BASE, self.voice_id_for(speaker));
        let request = SpeechRequest {
            text,
            model_id: &self.settings.model,
        };

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
