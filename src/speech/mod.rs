//! Audio rendering of a finished transcript.
//!
//! The transcript is first turned into a flat render plan of spoken turns
//! and silence gaps, then each spoken turn is synthesized through the rate
//! limiter, and finally the segments are assembled into one audio file with
//! ffmpeg. A turn whose synthesis fails permanently becomes silence of its
//! estimated spoken duration, so one bad turn never loses the episode.

mod assemble;

use crate::config::{PlaceholderHandling, TtsSettings};
use crate::error::{PratError, Result};
use crate::script::{Speaker, Transcript};
use crate::throttle::RateLimiter;
use crate::tts::Synthesizer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One step of the render plan, in playback order.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderStep {
    /// A spoken turn.
    Speech { speaker: Speaker, text: String },
    /// A fixed-length pause.
    Silence { duration_ms: u64 },
}

/// One rendered segment, in playback order.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Encoded audio bytes from the synthesizer.
    Audio(Vec<u8>),
    /// Silence to generate at assembly time.
    Silence { duration_ms: u64 },
}

/// Strip markup the script writer's models occasionally leave in spoken text.
///
/// Emphasis markers, inline code ticks, and leading list markers read fine on
/// a page but get spoken aloud by TTS engines.
pub fn clean_text_for_tts(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());

    for line in text.lines() {
        let line = line.trim_start();
        let line = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
            .unwrap_or(line);

        if !cleaned.is_empty() {
            cleaned.push(' ');
        }
        cleaned.push_str(line);
    }

    cleaned
        .replace(['*', '_', '`', '#'], "")
        .replace('—', ", ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Estimate how long the text would take to speak, in milliseconds.
pub fn estimate_duration_ms(text: &str, words_per_minute: u32) -> u64 {
    let words = text.split_whitespace().count() as u64;
    let wpm = words_per_minute.max(1) as u64;
    (words * 60_000 / wpm).max(500)
}

/// Flatten a transcript into spoken turns and gaps.
///
/// Turns within a group are separated by the turn gap; the intro, each
/// section, and the outro are separated by the longer section gap.
/// Placeholder turns are dropped or become estimated silence, per
/// configuration.
pub fn build_render_plan(transcript: &Transcript, settings: &TtsSettings) -> Vec<RenderStep> {
    let mut groups: Vec<Vec<RenderStep>> = Vec::new();

    groups.push(vec![RenderStep::Speech {
        speaker: transcript.intro.speaker,
        text: transcript.intro.text.clone(),
    }]);

    for section in &transcript.sections {
        let mut group = Vec::new();
        for turn in &section.turns {
            if turn.placeholder {
                match settings.placeholder_turns {
                    PlaceholderHandling::Skip => continue,
                    PlaceholderHandling::Silence => {
                        group.push(RenderStep::Silence {
                            duration_ms: estimate_duration_ms(
                                &turn.text,
                                settings.words_per_minute,
                            ),
                        });
                        continue;
                    }
                }
            }
            group.push(RenderStep::Speech {
                speaker: turn.speaker,
                text: turn.text.clone(),
            });
        }
        if !group.is_empty() {
            groups.push(group);
        }
    }

    groups.push(vec![RenderStep::Speech {
        speaker: transcript.outro.speaker,
        text: transcript.outro.text.clone(),
    }]);

    let mut plan = Vec::new();
    for (group_idx, group) in groups.iter().enumerate() {
        if group_idx > 0 {
            plan.push(RenderStep::Silence {
                duration_ms: settings.section_gap_ms,
            });
        }
        for (step_idx, step) in group.iter().enumerate() {
            if step_idx > 0 {
                plan.push(RenderStep::Silence {
                    duration_ms: settings.turn_gap_ms,
                });
            }
            plan.push(step.clone());
        }
    }

    plan
}

/// Renders transcripts to audio files.
pub struct SpeechRenderer {
    synthesizer: Arc<dyn Synthesizer>,
    limiter: Arc<RateLimiter>,
    settings: TtsSettings,
    temp_dir: PathBuf,
}

impl SpeechRenderer {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        limiter: Arc<RateLimiter>,
        settings: TtsSettings,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            synthesizer,
            limiter,
            settings,
            temp_dir,
        }
    }

    /// Render the transcript to one audio file at `output`.
    #[instrument(skip(self, transcript), fields(topic = %transcript.topic))]
    pub async fn render(&self, transcript: &Transcript, output: &Path) -> Result<PathBuf> {
        let plan = build_render_plan(transcript, &self.settings);
        info!(steps = plan.len(), "Rendering episode audio");

        let segments = self.synthesize_plan(&plan).await?;
        assemble::assemble(&segments, &self.temp_dir, output).await?;

        info!(output = %output.display(), "Episode audio written");
        Ok(output.to_path_buf())
    }

    /// Synthesize every spoken step of the plan.
    ///
    /// A turn that still fails after the rate limiter's retries becomes
    /// silence of its estimated duration. Only a plan where every spoken
    /// turn failed is an error.
    pub async fn synthesize_plan(&self, plan: &[RenderStep]) -> Result<Vec<Segment>> {
        let mut segments = Vec::with_capacity(plan.len());
        let mut spoken = 0usize;
        let mut failed = 0usize;

        for step in plan {
            match step {
                RenderStep::Silence { duration_ms } => {
                    segments.push(Segment::Silence {
                        duration_ms: *duration_ms,
                    });
                }
                RenderStep::Speech { speaker, text } => {
                    spoken += 1;
                    let cleaned = clean_text_for_tts(text);
                    let result = self
                        .limiter
                        .call(self.synthesizer.provider(), || {
                            self.synthesizer.synthesize(&cleaned, *speaker)
                        })
                        .await;

                    match result {
                        Ok(bytes) => segments.push(Segment::Audio(bytes)),
                        Err(e) => {
                            failed += 1;
                            warn!(speaker = %speaker, "Turn synthesis failed, substituting silence: {}", e);
                            segments.push(Segment::Silence {
                                duration_ms: estimate_duration_ms(
                                    text,
                                    self.settings.words_per_minute,
                                ),
                            });
                        }
                    }
                }
            }
        }

        if spoken > 0 && failed == spoken {
            return Err(PratError::SpeechRender(format!(
                "All {} spoken turns failed synthesis",
                spoken
            )));
        }

        Ok(segments)
    }
}
