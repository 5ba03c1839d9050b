//! Speech synthesis via the OpenAI audio API.

use super::Synthesizer;
use crate::config::OpenAiTtsSettings;
use crate::error::{PratError, Result};
use crate::openai::create_client;
use crate::script::Speaker;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice};
use async_trait::async_trait;
use tracing::{debug, warn};

/// OpenAI text-to-speech adapter.
pub struct OpenAiSynthesizer {
    settings: OpenAiTtsSettings,
}

impl OpenAiSynthesizer {
    pub fn new(settings: OpenAiTtsSettings) -> Self {
        Self { settings }
    }

    fn voice_for(&self, speaker: Speaker) -> Voice {
        let name = match speaker {
            Speaker::Interviewer => &self.settings.interviewer_voice,
            Speaker::Interviewee => &self.settings.interviewee_voice,
        };
        parse_voice(name)
    }

    fn model(&self) -> SpeechModel {
        match self.settings.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }
}

fn parse_voice(name: &str) -> Voice {
    match name.to_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        other => {
            warn!(voice = other, "Unknown OpenAI voice, using alloy");
            Voice::Alloy
        }
    }
}

#[async_trait]
impl Synthesizer for OpenAiSynthesizer {
    fn provider(&self) -> &str {
        "openai"
    }

    async fn synthesize(&self, text: &str, speaker: Speaker) -> Result<Vec<u8>> {
        debug!(speaker = %speaker, chars = text.len(), "Synthesizing speech");

        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .voice(self.voice_for(speaker))
            .model(self.model())
            .response_format(SpeechResponseFormat::Mp3)
            .build()
            .map_err(|e| PratError::OpenAI(e.to_string()))?;

        let client = create_client();
        let response = client
            .audio()
            .speech(request)
            .await
            .map_err(|e| PratError::OpenAI(format!("Speech synthesis failed: {}", e)))?;

        Ok(response.bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voice_known_and_unknown() {
        assert!(matches!(parse_voice("nova"), Voice::Nova));
        assert!(matches!(parse_voice("ONYX"), Voice::Onyx));
        assert!(matches!(parse_voice("custom-voice"), Voice::Alloy));
    }

    #[test]
    fn test_voices_follow_speaker_roles() {
        let synthesizer = OpenAiSynthesizer::new(OpenAiTtsSettings::default());
        assert!(matches!(
            synthesizer.voice_for(Speaker::Interviewer),
            Voice::Nova
        ));
        assert!(matches!(
            synthesizer.voice_for(Speaker::Interviewee),
            Voice::Onyx
        ));
    }
}
