//! Configuration module for Prat.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{OutlinePrompts, Prompts, ResearchPrompts, ScriptPrompts};
pub use settings::{
    CheckpointSettings, ElevenLabsTtsSettings, EmbeddingSettings, GeneralSettings, LlmSettings,
    OpenAiTtsSettings, OutlineSettings, PlaceholderHandling, PodcastSettings, PromptSettings,
    ProviderLimit, RateLimitSettings, ResearchSettings, RetrievalSettings, ScriptSettings,
    Settings, TtsSettings,
};
