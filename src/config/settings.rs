//! Configuration settings for Prat.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub podcast: PodcastSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub research: ResearchSettings,
    pub outline: OutlineSettings,
    pub script: ScriptSettings,
    pub tts: TtsSettings,
    pub rate_limits: RateLimitSettings,
    pub checkpoints: CheckpointSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for generated transcripts and audio.
    pub output_dir: String,
    /// Directory for temporary files (per-turn audio segments).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "./output".to_string(),
            temp_dir: "/tmp/prat".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Episode framing: podcast name, intro/outro lines, and section template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PodcastSettings {
    /// Podcast name used in the intro/outro templates.
    pub name: String,
    /// Opening line, spoken by the interviewer. Supports {{podcast_name}} and {{topic}}.
    pub intro: String,
    /// Closing line, spoken by the interviewer. Supports {{podcast_name}} and {{topic}}.
    pub outro: String,
    /// Fixed episode structure the outline must follow, first to last.
    pub episode_structure: Vec<String>,
}

impl Default for PodcastSettings {
    fn default() -> Self {
        Self {
            name: "Prat".to_string(),
            intro: "Welcome to {{podcast_name}}. Today we've invited an expert to talk about {{topic}}.".to_string(),
            outro: "That's all for today. Thank you for listening to {{podcast_name}}. See you next time when we'll talk about whatever you want.".to_string(),
            episode_structure: vec![
                "Episode Introduction".to_string(),
                "Main Discussion Topics".to_string(),
                "Conclusion".to_string(),
            ],
        }
    }
}

/// Language model settings.
///
/// Two model roles: a fast model for small structured calls (article
/// suggestions, search queries) and a long-context model for outline and
/// script generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider for the fast model (openai, gemini).
    pub fast_provider: String,
    /// Fast model name.
    pub fast_model: String,
    /// Provider for the long-context model (openai, gemini).
    pub long_context_provider: String,
    /// Long-context model name.
    pub long_context_model: String,
    /// Sampling temperature for generation calls.
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            fast_provider: "openai".to_string(),
            fast_model: "gpt-4o-mini".to_string(),
            long_context_provider: "openai".to_string(),
            long_context_model: "gpt-4o".to_string(),
            temperature: 0.7,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Context retrieval settings for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Target chunk size in characters when splitting research snippets.
    pub chunk_chars: usize,
    /// Overlap between consecutive chunks in characters.
    pub overlap_chars: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_chars: 1000,
            overlap_chars: 200,
            top_k: 4,
        }
    }
}

/// Research collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    /// Maximum Wikipedia articles to fetch per topic.
    pub max_articles: usize,
    /// Maximum web search queries to generate per topic.
    pub max_queries: usize,
    /// Maximum results to keep per search query.
    pub results_per_query: usize,
    /// Domains excluded from web search results.
    pub exclude_domains: Vec<String>,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            max_articles: 5,
            max_queries: 3,
            results_per_query: 5,
            exclude_domains: Vec::new(),
        }
    }
}

/// Outline generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    /// Attempts before outline generation fails (initial call + retries).
    pub max_attempts: usize,
    /// Character budget for research context in the outline prompt.
    pub context_chars: usize,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            context_chars: 24_000,
        }
    }
}

/// Script generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Default number of question/answer rounds per section.
    pub qa_rounds: usize,
    /// How many prior turns are kept in the prompt context window.
    pub context_turns: usize,
    /// Attempts per dialogue turn before falling back to a placeholder.
    pub max_attempts: usize,
    /// Text emitted for a turn that failed generation.
    pub placeholder_text: String,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            qa_rounds: 2,
            context_turns: 8,
            max_attempts: 3,
            placeholder_text: "[inaudible]".to_string(),
        }
    }
}

/// How the speech renderer treats placeholder turns left by the script writer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderHandling {
    /// Omit placeholder turns from the audio entirely.
    #[default]
    Skip,
    /// Render placeholder turns as silence of estimated duration.
    Silence,
}

impl std::str::FromStr for PlaceholderHandling {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(PlaceholderHandling::Skip),
            "silence" => Ok(PlaceholderHandling::Silence),
            _ => Err(format!("Unknown placeholder handling: {}", s)),
        }
    }
}

impl std::fmt::Display for PlaceholderHandling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceholderHandling::Skip => write!(f, "skip"),
            PlaceholderHandling::Silence => write!(f, "silence"),
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    /// TTS provider (openai, elevenlabs).
    pub provider: String,
    /// Output audio format (mp3).
    pub format: String,
    /// Silence inserted between turns, in milliseconds.
    pub turn_gap_ms: u64,
    /// Silence inserted between sections, in milliseconds.
    pub section_gap_ms: u64,
    /// Speech rate used to estimate silence duration for skipped turns.
    pub words_per_minute: u32,
    /// How placeholder turns from the script writer are rendered.
    pub placeholder_turns: PlaceholderHandling,
    /// OpenAI speech synthesis settings.
    pub openai: OpenAiTtsSettings,
    /// ElevenLabs synthesis settings.
    pub elevenlabs: ElevenLabsTtsSettings,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            format: "mp3".to_string(),
            turn_gap_ms: 300,
            section_gap_ms: 800,
            words_per_minute: 150,
            placeholder_turns: PlaceholderHandling::default(),
            openai: OpenAiTtsSettings::default(),
            elevenlabs: ElevenLabsTtsSettings::default(),
        }
    }
}

/// OpenAI speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiTtsSettings {
    /// Speech model.
    pub model: String,
    /// Voice for the interviewer role.
    pub interviewer_voice: String,
    /// Voice for the interviewee role.
    pub interviewee_voice: String,
}

impl Default for OpenAiTtsSettings {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            interviewer_voice: "nova".to_string(),
            interviewee_voice: "onyx".to_string(),
        }
    }
}

/// ElevenLabs synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevenLabsTtsSettings {
    /// ElevenLabs model id.
    pub model: String,
    /// Voice id for the interviewer role.
    pub interviewer_voice: String,
    /// Voice id for the interviewee role.
    pub interviewee_voice: String,
}

impl Default for ElevenLabsTtsSettings {
    fn default() -> Self {
        Self {
            model: "eleven_multilingual_v2".to_string(),
            interviewer_voice: "iP95p4xoKVk53GoZ742B".to_string(),
            interviewee_voice: "IKne3meq5aSn9XLyUdCD".to_string(),
        }
    }
}

/// Rate limit and retry parameters for one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderLimit {
    /// Requests permitted per rolling one-minute window.
    pub requests_per_minute: usize,
    /// Retries after a failed call before giving up.
    pub max_retries: usize,
    /// Base backoff delay in milliseconds; doubles each retry.
    pub base_delay_ms: u64,
}

impl Default for ProviderLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 20,
            max_retries: 10,
            base_delay_ms: 2000,
        }
    }
}

/// Per-provider rate limits with a default fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct RateLimitSettings {
    /// Fallback limit for providers without an explicit entry.
    pub default: ProviderLimit,
    /// Per-provider overrides, keyed by provider name (openai, gemini, ...).
    pub providers: HashMap<String, ProviderLimit>,
}


impl RateLimitSettings {
    /// Limit for a provider, falling back to the default entry.
    pub fn limit_for(&self, provider: &str) -> &ProviderLimit {
        self.providers.get(provider).unwrap_or(&self.default)
    }
}

/// Checkpoint storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointSettings {
    /// Directory where checkpoint records are written.
    pub dir: String,
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            dir: "./.checkpoints".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PratError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded checkpoint directory path.
    pub fn checkpoint_dir(&self) -> PathBuf {
        Self::expand_path(&self.checkpoints.dir)
    }
}
