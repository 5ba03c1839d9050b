//! Text-to-speech provider adapters.
//!
//! A [`Synthesizer`] turns one dialogue turn into encoded audio bytes for
//! the configured voice of its speaker. Assembly of the full episode lives
//! in the `speech` module.

mod elevenlabs;
mod openai;

pub use elevenlabs::ElevenLabsSynthesizer;
pub use openai::OpenAiSynthesizer;

use crate::config::TtsSettings;
use crate::error::{PratError, Result};
use crate::script::Speaker;
use async_trait::async_trait;
use std::sync::Arc;

/// Speech synthesis for one utterance at a time.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Provider name, used for rate limiting.
    fn provider(&self) -> &str;

    /// Synthesize the text in the voice configured for this speaker.
    async fn synthesize(&self, text: &str, speaker: Speaker) -> Result<Vec<u8>>;
}

/// Build the synthesizer named by configuration.
pub fn create_synthesizer(settings: &TtsSettings) -> Result<Arc<dyn Synthesizer>> {
    match settings.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiSynthesizer::new(settings.openai.clone()))),
        "elevenlabs" => Ok(Arc::new(ElevenLabsSynthesizer::from_env(
            settings.elevenlabs.clone(),
        )?)),
        other => Err(PratError::Config(format!("Unknown TTS provider: {}", other))),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic synthesizers for tests.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Marker in utterance text that makes [`FlakySynthesizer`] fail.
    pub const FAIL_MARKER: &str = "<fail>";

    /// Synthesizer that returns the utterance text as bytes, failing
    /// deterministically whenever the text contains [`FAIL_MARKER`].
    pub struct FlakySynthesizer {
        calls: AtomicUsize,
    }

    impl FlakySynthesizer {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Synthesizer for FlakySynthesizer {
        fn provider(&self) -> &str {
            "scripted"
        }

        async fn synthesize(&self, text: &str, _speaker: Speaker) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains(FAIL_MARKER) {
                return Err(PratError::OpenAI("scripted synthesis failure".into()));
            }
            Ok(text.as_bytes().to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_synthesizer_rejects_unknown_provider() {
        let settings = TtsSettings {
            provider: "festival".to_string(),
            ..TtsSettings::default()
        };
        assert!(matches!(
            create_synthesizer(&settings),
            Err(PratError::Config(_))
        ));
    }

    #[test]
    fn test_create_synthesizer_openai() {
        let settings = TtsSettings::default();
        let synthesizer = create_synthesizer(&settings).unwrap();
        assert_eq!(synthesizer.provider(), "openai");
    }
}
