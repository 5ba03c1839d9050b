//! Generate command - run the full episode pipeline.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::pipeline::{GenerateRequest, Generator, Mode};
use anyhow::Result;
use std::path::PathBuf;

/// Run the generate command.
#[allow(clippy::too_many_arguments)]
pub async fn run_generate(
    topic: &str,
    mode: &str,
    sources: Vec<String>,
    qa_rounds: Option<usize>,
    checkpoint: bool,
    audio_output: Option<PathBuf>,
    text_output: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    let mode: Mode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    preflight::check_generate(&settings, mode, &sources, audio_output.is_some())?;

    let render_audio = audio_output.is_some();
    let request = GenerateRequest {
        topic: topic.to_string(),
        mode,
        sources,
        qa_rounds,
        checkpoint,
        audio_output,
        text_output,
    };

    Output::info(&format!("Generating episode about \"{}\" ({} mode)", topic, mode));
    if !checkpoint {
        Output::warning("Checkpointing is off; an interrupted run starts over.");
    }

    let generator = Generator::new(settings)?;
    let spinner = Output::spinner("Researching, outlining, and writing the script...");
    let result = generator.generate(request).await;
    spinner.finish_and_clear();

    let report = result?;

    Output::success("Episode generated!");
    Output::kv("Transcript", &report.transcript_path.display().to_string());
    if let Some(audio) = &report.audio_path {
        Output::kv("Audio", &audio.display().to_string());
    } else if render_audio {
        Output::warning("Audio output was requested but not produced.");
    }
    Output::kv("Research snippets", &report.snippets.to_string());
    Output::kv("Sections", &report.sections.to_string());
    Output::kv("Dialogue turns", &report.turns.to_string());

    Ok(())
}
