//! Error types for Prat.

use thiserror::Error;

/// Library-level error type for Prat operations.
#[derive(Error, Debug)]
pub enum PratError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider '{provider}' call failed after {attempts} attempt(s): {message}")]
    ProviderCall {
        provider: String,
        attempts: usize,
        message: String,
    },

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Research failed: {0}")]
    Research(String),

    #[error("Source extraction failed: {0}")]
    Extraction(String),

    #[error("Outline generation failed: {0}")]
    OutlineGeneration(String),

    #[error("Script generation failed: {0}")]
    Script(String),

    #[error("Speech rendering failed: {0}")]
    SpeechRender(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Gemini API error: {0}")]
    Gemini(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Prat operations.
pub type Result<T> = std::result::Result<T, PratError>;
