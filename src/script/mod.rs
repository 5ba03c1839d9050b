//! Dialogue script generation.
//!
//! Expands the outline into an interview: for each section, a fixed number
//! of question/answer rounds between the two roles, with the answer side
//! grounded in retrieved research context. Progress is checkpointed after
//! each completed section so an interrupted run resumes at section
//! granularity.

use crate::checkpoint::{Checkpointer, Stage};
use crate::config::{PodcastSettings, Prompts, ScriptSettings};
use crate::error::{PratError, Result};
use crate::llm::{generate_structured, ChatModel};
use crate::outline::{Outline, Section};
use crate::retrieval::ContextIndex;
use crate::throttle::RateLimiter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One of the two fixed conversational roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Interviewer,
    Interviewee,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Interviewer => "Interviewer",
            Speaker::Interviewee => "Interviewee",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One utterance by one speaker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialogueTurn {
    pub speaker: Speaker,
    pub text: String,
    /// Set when generation failed and the configured placeholder text was
    /// substituted; the speech renderer treats these per configuration.
    #[serde(default)]
    pub placeholder: bool,
}

impl DialogueTurn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            placeholder: false,
        }
    }

    pub fn placeholder(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            placeholder: true,
        }
    }
}

/// The dialogue for one outline section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionScript {
    pub title: String,
    pub turns: Vec<DialogueTurn>,
}

/// Checkpointed script state: the sections completed so far, in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptProgress {
    pub sections: Vec<SectionScript>,
}

/// The complete episode script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub topic: String,
    pub intro: DialogueTurn,
    pub sections: Vec<SectionScript>,
    pub outro: DialogueTurn,
}

impl Transcript {
    /// All turns in spoken order: intro, sections, outro.
    pub fn turns(&self) -> Vec<&DialogueTurn> {
        let mut turns = vec![&self.intro];
        for section in &self.sections {
            turns.extend(section.turns.iter());
        }
        turns.push(&self.outro);
        turns
    }

    pub fn turn_count(&self) -> usize {
        2 + self.sections.iter().map(|s| s.turns.len()).sum::<usize>()
    }
}

/// Strip decoration a chat model tends to wrap spoken lines in.
///
/// Removes markdown fences, a leading speaker label, and symmetric quotes,
/// leaving only the words to be spoken.
pub fn clean_turn_text(raw: &str) -> String {
    let mut text = raw.trim();

    if text.starts_with("```") {
        text = text.trim_start_matches("```");
        if let Some(newline) = text.find('\n') {
            // Drop a language tag on the opening fence.
            if !text[..newline].contains(' ') {
                text = &text[newline + 1..];
            }
        }
        text = text.trim_end_matches("```").trim();
    }

    let mut text = text.to_string();
    for label in [
        "Interviewer:",
        "Interviewee:",
        "Host:",
        "Guest:",
        "Expert:",
        "Question:",
        "Answer:",
    ] {
        if let Some(stripped) = text.strip_prefix(label) {
            text = stripped.trim_start().to_string();
            break;
        }
    }

    let trimmed = text.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return trimmed[1..trimmed.len() - 1].trim().to_string();
    }

    trimmed.to_string()
}

/// Writes the episode script section by section.
pub struct ScriptWriter {
    model: Arc<dyn ChatModel>,
    limiter: Arc<RateLimiter>,
    settings: ScriptSettings,
    podcast: PodcastSettings,
    prompts: Prompts,
}

impl ScriptWriter {
    pub fn new(
        model: Arc<dyn ChatModel>,
        limiter: Arc<RateLimiter>,
        settings: ScriptSettings,
        podcast: PodcastSettings,
        prompts: Prompts,
    ) -> Self {
        Self {
            model,
            limiter,
            settings,
            podcast,
            prompts,
        }
    }

    /// Write the full transcript.
    ///
    /// Each section gets exactly `qa_rounds` rounds of one interviewer turn
    /// followed by one interviewee turn. Completed sections found in the
    /// checkpoint are reused; each newly completed section is checkpointed
    /// before the next begins.
    #[instrument(skip(self, outline, index, checkpointer))]
    pub async fn write(
        &self,
        topic: &str,
        outline: &Outline,
        index: &ContextIndex,
        qa_rounds: usize,
        checkpointer: &Checkpointer,
    ) -> Result<Transcript> {
        let mut progress: ScriptProgress = checkpointer
            .load_stage(Stage::Script)
            .await?
            .unwrap_or_default();

        if !progress.sections.is_empty() {
            info!(
                completed = progress.sections.len(),
                "Resuming script from checkpoint"
            );
        }

        let outline_text = outline.as_text();

        for (idx, section) in outline.sections.iter().enumerate() {
            if idx < progress.sections.len() {
                continue;
            }

            info!(section = %section.title, "Writing section dialogue");
            let turns = self
                .write_section(topic, &outline_text, section, &progress, index, qa_rounds)
                .await?;

            progress.sections.push(SectionScript {
                title: section.title.clone(),
                turns,
            });
            checkpointer.save_stage(Stage::Script, &progress).await?;
        }

        let vars = HashMap::from([
            ("podcast_name".to_string(), self.podcast.name.clone()),
            ("topic".to_string(), topic.to_string()),
        ]);

        Ok(Transcript {
            topic: topic.to_string(),
            intro: DialogueTurn::new(
                Speaker::Interviewer,
                Prompts::render(&self.podcast.intro, &vars),
            ),
            sections: progress.sections,
            outro: DialogueTurn::new(
                Speaker::Interviewer,
                Prompts::render(&self.podcast.outro, &vars),
            ),
        })
    }

    /// Run the Q&A rounds for one section.
    async fn write_section(
        &self,
        topic: &str,
        outline_text: &str,
        section: &Section,
        progress: &ScriptProgress,
        index: &ContextIndex,
        qa_rounds: usize,
    ) -> Result<Vec<DialogueTurn>> {
        let mut turns: Vec<DialogueTurn> = Vec::with_capacity(qa_rounds * 2);
        let subtopics = section
            .subsections
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n");

        for _ in 0..qa_rounds {
            let history = self.history_window(progress, &turns);

            let question = self
                .generate_turn(Speaker::Interviewer, |vars| {
                    vars.insert("topic".to_string(), topic.to_string());
                    vars.insert("outline".to_string(), outline_text.to_string());
                    vars.insert("section_title".to_string(), section.title.clone());
                    vars.insert("subtopics".to_string(), subtopics.clone());
                    vars.insert("history".to_string(), history.clone());
                })
                .await;
            turns.push(question);

            let question_text = turns.last().map(|t| t.text.clone()).unwrap_or_default();
            let context = match index.retrieve(&question_text).await {
                Ok(context) => context,
                Err(e) => {
                    warn!("Context retrieval failed, answering without it: {}", e);
                    String::new()
                }
            };

            let history = self.history_window(progress, &turns);
            let answer = self
                .generate_turn(Speaker::Interviewee, |vars| {
                    vars.insert("topic".to_string(), topic.to_string());
                    vars.insert("context".to_string(), context.clone());
                    vars.insert("history".to_string(), history.clone());
                    vars.insert("question".to_string(), question_text.clone());
                })
                .await;
            turns.push(answer);
        }

        Ok(turns)
    }

    /// Generate one turn, degrading to a placeholder when attempts run out.
    async fn generate_turn<F>(&self, speaker: Speaker, fill_vars: F) -> DialogueTurn
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let mut vars = HashMap::new();
        fill_vars(&mut vars);

        let (system_template, user_template) = match speaker {
            Speaker::Interviewer => (
                &self.prompts.script.interviewer_system,
                &self.prompts.script.interviewer_user,
            ),
            Speaker::Interviewee => (
                &self.prompts.script.interviewee_system,
                &self.prompts.script.interviewee_user,
            ),
        };
        let system = self.prompts.render_with_custom(system_template, &vars);
        let user = self.prompts.render_with_custom(user_template, &vars);

        let result = generate_structured(
            self.model.as_ref(),
            &self.limiter,
            &system,
            &user,
            self.settings.max_attempts,
            |response| {
                let text = clean_turn_text(response);
                if text.is_empty() {
                    Err(PratError::InvalidInput("Empty dialogue turn".into()))
                } else {
                    Ok(text)
                }
            },
        )
        .await;

        match result {
            Ok(text) => DialogueTurn::new(speaker, text),
            Err(e) => {
                warn!(speaker = %speaker, "Turn generation failed, inserting placeholder: {}", e);
                DialogueTurn::placeholder(speaker, self.settings.placeholder_text.clone())
            }
        }
    }

    /// Format the last `context_turns` turns across the whole conversation.
    fn history_window(&self, progress: &ScriptProgress, current: &[DialogueTurn]) -> String {
        let all: Vec<&DialogueTurn> = progress
            .sections
            .iter()
            .flat_map(|s| s.turns.iter())
            .chain(current.iter())
            .collect();

        let window_start = all.len().saturating_sub(self.settings.context_turns);
        all[window_start..]
            .iter()
            .map(|turn| format!("{}: {}", turn.speaker, turn.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;
    use crate::config::{RateLimitSettings, RetrievalSettings};
    use crate::embedding::testing::StubEmbedder;
    use crate::llm::testing::ScriptedChatModel;
    use crate::outline::Section;

    fn sample_outline() -> Outline {
        Outline {
            sections: vec![
                Section {
                    title: "Introduction".into(),
                    subsections: vec!["why Linux matters".into()],
                },
                Section {
                    title: "The Kernel".into(),
                    subsections: vec!["history".into(), "architecture".into()],
                },
                Section {
                    title: "Conclusion".into(),
                    subsections: vec!["recap".into()],
                },
            ],
        }
    }

    async fn empty_index() -> ContextIndex {
        ContextIndex::build(
            &[],
            Arc::new(StubEmbedder::new()),
            Arc::new(RateLimiter::new(RateLimitSettings::default())),
            &RetrievalSettings::default(),
        )
        .await
        .unwrap()
    }

    fn writer(model: ScriptedChatModel) -> ScriptWriter {
        ScriptWriter::new(
            Arc::new(model),
            Arc::new(RateLimiter::new(RateLimitSettings::default())),
            ScriptSettings::default(),
            PodcastSettings::default(),
            Prompts::default(),
        )
    }

    #[test]
    fn test_clean_turn_text() {
        assert_eq!(clean_turn_text("  Hello there.  "), "Hello there.");
        assert_eq!(clean_turn_text("Interviewer: What is Linux?"), "What is Linux?");
        assert_eq!(clean_turn_text("\"Quoted answer.\""), "Quoted answer.");
        assert_eq!(clean_turn_text("```\nFenced line\n```"), "Fenced line");
        assert_eq!(clean_turn_text(""), "");
    }

    #[tokio::test]
    async fn test_sections_get_exactly_two_turns_per_round_alternating() {
        // Scenario from the test plan: Linux, 3 rounds, checkpointing off.
        let model = ScriptedChatModel::new(["A perfectly good line."]);
        let writer = writer(model);
        let checkpointer = Checkpointer::disabled("Linux", 3);
        let index = empty_index().await;

        let transcript = writer
            .write("Linux", &sample_outline(), &index, 3, &checkpointer)
            .await
            .unwrap();

        assert_eq!(transcript.sections.len(), 3);
        for section in &transcript.sections {
            assert_eq!(section.turns.len(), 6);
            for (i, turn) in section.turns.iter().enumerate() {
                let expected = if i % 2 == 0 {
                    Speaker::Interviewer
                } else {
                    Speaker::Interviewee
                };
                assert_eq!(turn.speaker, expected);
            }
        }
    }

    #[tokio::test]
    async fn test_transcript_starts_with_populated_intro() {
        let model = ScriptedChatModel::new(["A line."]);
        let writer = writer(model);
        let checkpointer = Checkpointer::disabled("Linux", 3);
        let index = empty_index().await;

        let transcript = writer
            .write("Linux", &sample_outline(), &index, 3, &checkpointer)
            .await
            .unwrap();

        let turns = transcript.turns();
        let first = turns.first().unwrap();
        assert_eq!(first.speaker, Speaker::Interviewer);
        assert!(first.text.contains("Prat"));
        assert!(first.text.contains("Linux"));

        let last = turns.last().unwrap();
        assert_eq!(last.speaker, Speaker::Interviewer);
        assert_eq!(transcript.turn_count(), 2 + 3 * 6);
    }

    #[tokio::test]
    async fn test_failed_turns_become_placeholders_without_aborting() {
        // The scripted model only ever produces empty responses, so every
        // turn exhausts its attempts and falls back to the placeholder.
        let model = ScriptedChatModel::new([""]);
        let writer = writer(model);
        let checkpointer = Checkpointer::disabled("Linux", 1);
        let index = empty_index().await;

        let transcript = writer
            .write("Linux", &sample_outline(), &index, 1, &checkpointer)
            .await
            .unwrap();

        for section in &transcript.sections {
            assert_eq!(section.turns.len(), 2);
            for turn in &section.turns {
                assert!(turn.placeholder);
                assert_eq!(turn.text, ScriptSettings::default().placeholder_text);
            }
        }
    }

    #[tokio::test]
    async fn test_resume_skips_completed_sections() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let checkpointer = Checkpointer::new(store, "Linux", 1);

        // A prior run completed the first section.
        let done = ScriptProgress {
            sections: vec![SectionScript {
                title: "Introduction".into(),
                turns: vec![
                    DialogueTurn::new(Speaker::Interviewer, "Earlier question"),
                    DialogueTurn::new(Speaker::Interviewee, "Earlier answer"),
                ],
            }],
        };
        checkpointer.save_stage(Stage::Script, &done).await.unwrap();

        let model = ScriptedChatModel::new(["Fresh line."]);
        let writer = writer(model);
        let index = empty_index().await;

        let transcript = writer
            .write("Linux", &sample_outline(), &index, 1, &checkpointer)
            .await
            .unwrap();

        assert_eq!(transcript.sections.len(), 3);
        assert_eq!(transcript.sections[0].turns[0].text, "Earlier question");
        assert_eq!(transcript.sections[1].turns[0].text, "Fresh line.");
    }

    #[tokio::test]
    async fn test_history_window_is_bounded() {
        let model = ScriptedChatModel::new(["x"]);
        let writer = ScriptWriter::new(
            Arc::new(model),
            Arc::new(RateLimiter::new(RateLimitSettings::default())),
            ScriptSettings {
                context_turns: 2,
                ..ScriptSettings::default()
            },
            PodcastSettings::default(),
            Prompts::default(),
        );

        let progress = ScriptProgress {
            sections: vec![SectionScript {
                title: "s".into(),
                turns: vec![
                    DialogueTurn::new(Speaker::Interviewer, "one"),
                    DialogueTurn::new(Speaker::Interviewee, "two"),
                    DialogueTurn::new(Speaker::Interviewer, "three"),
                ],
            }],
        };
        let current = vec![DialogueTurn::new(Speaker::Interviewee, "four")];

        let history = writer.history_window(&progress, &current);
        assert_eq!(history, "Interviewer: three\nInterviewee: four");
    }
}
