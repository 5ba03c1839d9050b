//! Pre-flight checks before expensive operations.
//!
//! Validates that the API keys and external tools a generation run will
//! need are available before any provider gets called.

use crate::config::Settings;
use crate::error::{PratError, Result};
use crate::pipeline::Mode;
use crate::sources::{classify, SourceKind};
use std::process::Command;

/// Check everything one generation request will need.
pub fn check_generate(
    settings: &Settings,
    mode: Mode,
    sources: &[String],
    audio: bool,
) -> Result<()> {
    // The chat models and embeddings always go through OpenAI unless both
    // LLM roles are on another provider; the embedder is OpenAI regardless.
    check_env("OPENAI_API_KEY", "LLM and embedding calls")?;

    if mode == Mode::Research {
        check_env("TAVILY_API_KEY", "web search in research mode")?;
    }

    if settings.llm.fast_provider == "gemini" || settings.llm.long_context_provider == "gemini" {
        check_env("GEMINI_API_KEY", "an LLM role configured to use gemini")?;
    }

    if audio {
        if settings.tts.provider == "elevenlabs" {
            check_env("ELEVENLABS_API_KEY", "the configured TTS provider")?;
        }
        check_tool("ffmpeg")?;
    }

    if sources.iter().any(|s| classify(s) == SourceKind::YouTube) {
        check_tool("yt-dlp")?;
    }

    Ok(())
}

/// Check that an environment variable is set and non-empty.
fn check_env(name: &str, needed_for: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(()),
        _ => Err(PratError::Config(format!(
            "{} is not set but is required for {}. Set it with: export {}='...'",
            name, needed_for, name
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg uses -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(PratError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PratError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(PratError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_env_rejects_missing_variable() {
        let result = check_env("PRAT_TEST_SURELY_UNSET_VARIABLE", "testing");
        assert!(matches!(result, Err(PratError::Config(_))));
    }
}
