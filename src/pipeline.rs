//! Pipeline coordination.
//!
//! [`Generator`] wires the stages together: research, outline, script, and
//! optional speech rendering. Research and outline go through the
//! checkpointer's run-or-load combinator; the script writer checkpoints its
//! own progress at section granularity.

use crate::checkpoint::{slugify, CheckpointStore, Checkpointer, FsCheckpointStore, Stage};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{PratError, Result};
use crate::llm::{create_chat_model, ChatModel, ModelRole};
use crate::outline::{Outline, OutlineBuilder};
use crate::research::{ResearchCollector, SearchClient};
use crate::retrieval::ContextIndex;
use crate::script::{ScriptWriter, Transcript};
use crate::sources::{SourceExtractor, SourceSnippet};
use crate::speech::SpeechRenderer;
use crate::throttle::RateLimiter;
use crate::tts::{create_synthesizer, Synthesizer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// How research material is gathered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The pipeline researches the topic itself (Wikipedia + web search).
    Research,
    /// The user supplies the sources; no automatic research happens.
    Context,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "research" => Ok(Mode::Research),
            "context" => Ok(Mode::Context),
            _ => Err(format!("Unknown mode: {} (expected research or context)", s)),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Research => write!(f, "research"),
            Mode::Context => write!(f, "context"),
        }
    }
}

/// One episode generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub topic: String,
    pub mode: Mode,
    /// Source locators for context mode; ignored in research mode.
    pub sources: Vec<String>,
    /// Q&A rounds per section; `None` uses the configured default.
    pub qa_rounds: Option<usize>,
    /// Whether stage checkpoints are read and written.
    pub checkpoint: bool,
    /// Where to render episode audio; `None` skips speech entirely.
    pub audio_output: Option<PathBuf>,
    /// Where to write the transcript; `None` uses the output directory.
    pub text_output: Option<PathBuf>,
}

impl GenerateRequest {
    /// A research-mode request with defaults everywhere else.
    pub fn research(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            mode: Mode::Research,
            sources: Vec::new(),
            qa_rounds: None,
            checkpoint: true,
            audio_output: None,
            text_output: None,
        }
    }

    /// A context-mode request over the given sources.
    pub fn context(topic: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            topic: topic.into(),
            mode: Mode::Context,
            sources,
            qa_rounds: None,
            checkpoint: true,
            audio_output: None,
            text_output: None,
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub transcript_path: PathBuf,
    pub audio_path: Option<PathBuf>,
    pub snippets: usize,
    pub sections: usize,
    pub turns: usize,
}

/// Runs the full generation pipeline.
pub struct Generator {
    settings: Settings,
    prompts: Prompts,
    fast_model: Arc<dyn ChatModel>,
    long_model: Arc<dyn ChatModel>,
    embedder: Arc<dyn Embedder>,
    limiter: Arc<RateLimiter>,
    store: Arc<dyn CheckpointStore>,
    /// Test seam; production builds the synthesizer from settings on demand.
    synthesizer: Option<Arc<dyn Synthesizer>>,
}

impl Generator {
    /// Build a generator from configuration.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let fast_model = create_chat_model(&settings.llm, ModelRole::Fast)?;
        let long_model = create_chat_model(&settings.llm, ModelRole::LongContext)?;
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(&settings.embedding));
        let limiter = Arc::new(RateLimiter::new(settings.rate_limits.clone()));
        let store: Arc<dyn CheckpointStore> =
            Arc::new(FsCheckpointStore::new(settings.checkpoint_dir()));

        Ok(Self {
            settings,
            prompts,
            fast_model,
            long_model,
            embedder,
            limiter,
            store,
            synthesizer: None,
        })
    }

    /// Build a generator from explicit components.
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        fast_model: Arc<dyn ChatModel>,
        long_model: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn CheckpointStore>,
        synthesizer: Option<Arc<dyn Synthesizer>>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(settings.rate_limits.clone()));
        Self {
            settings,
            prompts,
            fast_model,
            long_model,
            embedder,
            limiter,
            store,
            synthesizer,
        }
    }

    /// A checkpointer for the given topic run, for cleaning records.
    pub fn checkpointer_for(&self, topic: &str, qa_rounds: Option<usize>) -> Checkpointer {
        let qa_rounds = qa_rounds.unwrap_or(self.settings.script.qa_rounds);
        Checkpointer::new(self.store.clone(), topic, qa_rounds)
    }

    /// Run the pipeline for one request.
    #[instrument(skip(self, request), fields(topic = %request.topic, mode = %request.mode))]
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateReport> {
        if request.mode == Mode::Context && request.sources.is_empty() {
            return Err(PratError::InvalidInput(
                "Context mode needs at least one --sources entry".into(),
            ));
        }

        let qa_rounds = request
            .qa_rounds
            .unwrap_or(self.settings.script.qa_rounds)
            .max(1);

        let checkpointer = if request.checkpoint {
            Checkpointer::new(self.store.clone(), &request.topic, qa_rounds)
        } else {
            Checkpointer::disabled(&request.topic, qa_rounds)
        };

        let snippets = checkpointer
            .stage(Stage::Research, || self.collect(&request))
            .await?;
        info!(snippets = snippets.len(), "Research stage complete");

        let builder = OutlineBuilder::new(
            self.long_model.clone(),
            self.limiter.clone(),
            self.settings.outline.clone(),
            self.settings.podcast.clone(),
            self.prompts.clone(),
        );
        let outline: Outline = checkpointer
            .stage(Stage::Outline, || builder.build(&request.topic, &snippets))
            .await?;

        let index = ContextIndex::build(
            &snippets,
            self.embedder.clone(),
            self.limiter.clone(),
            &self.settings.retrieval,
        )
        .await?;

        let writer = ScriptWriter::new(
            self.long_model.clone(),
            self.limiter.clone(),
            self.settings.script.clone(),
            self.settings.podcast.clone(),
            self.prompts.clone(),
        );
        let transcript = writer
            .write(&request.topic, &outline, &index, qa_rounds, &checkpointer)
            .await?;

        let transcript_path = self.write_transcript(&request, &outline, &transcript).await?;
        info!(path = %transcript_path.display(), "Transcript written");

        let audio_path = match &request.audio_output {
            Some(path) => {
                let rendered = self.render_audio(&transcript, path.clone()).await?;
                checkpointer
                    .save_stage(Stage::Speech, &rendered.display().to_string())
                    .await?;
                Some(rendered)
            }
            None => None,
        };

        Ok(GenerateReport {
            transcript_path,
            audio_path,
            snippets: snippets.len(),
            sections: transcript.sections.len(),
            turns: transcript.turn_count(),
        })
    }

    /// Run the research stage for the request's mode.
    async fn collect(&self, request: &GenerateRequest) -> Result<Vec<SourceSnippet>> {
        let search = match request.mode {
            Mode::Research => Some(SearchClient::from_env()?),
            Mode::Context => None,
        };

        let collector = ResearchCollector::new(
            self.fast_model.clone(),
            self.limiter.clone(),
            SourceExtractor::new(self.settings.temp_dir()),
            search,
            self.settings.research.clone(),
            self.prompts.clone(),
        );

        match request.mode {
            Mode::Research => collector.collect_research(&request.topic).await,
            Mode::Context => collector.collect_context(&request.sources).await,
        }
    }

    async fn write_transcript(
        &self,
        request: &GenerateRequest,
        outline: &Outline,
        transcript: &Transcript,
    ) -> Result<PathBuf> {
        let path = match &request.text_output {
            Some(path) => path.clone(),
            None => self
                .settings
                .output_dir()
                .join(format!("{}.md", slugify(&request.topic))),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, render_markdown(outline, transcript)).await?;
        Ok(path)
    }

    async fn render_audio(&self, transcript: &Transcript, output: PathBuf) -> Result<PathBuf> {
        let synthesizer = match &self.synthesizer {
            Some(synthesizer) => synthesizer.clone(),
            None => create_synthesizer(&self.settings.tts)?,
        };

        let renderer = SpeechRenderer::new(
            synthesizer,
            self.limiter.clone(),
            self.settings.tts.clone(),
            self.settings.temp_dir(),
        );
        renderer.render(transcript, &output).await
    }
}

/// Format the outline and transcript as the episode markdown document.
pub fn render_markdown(outline: &Outline, transcript: &Transcript) -> String {
    let mut doc = format!("# {}\n\n## Outline\n\n", transcript.topic);

    for (i, section) in outline.sections.iter().enumerate() {
        doc.push_str(&format!("### Section {}: {}\n", i + 1, section.title));
        for subsection in &section.subsections {
            doc.push_str(&format!("- {}\n", subsection));
        }
        doc.push('\n');
    }

    doc.push_str("## Script\n\n");
    for turn in transcript.turns() {
        doc.push_str(&format!("**{}**: {}\n\n", turn.speaker, turn.text));
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;
    use crate::config::{ProviderLimit, RateLimitSettings};
    use crate::embedding::testing::StubEmbedder;
    use crate::llm::testing::ScriptedChatModel;

    fn outline_json() -> &'static str {
        r#"{
            "sections": [
                {"title": "Introduction", "subsections": ["why Linux matters"]},
                {"title": "The Kernel", "subsections": ["history", "architecture"]},
                {"title": "Conclusion", "subsections": ["recap"]}
            ]
        }"#
    }

    fn test_settings(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.output_dir = dir.join("output").to_string_lossy().to_string();
        settings.general.temp_dir = dir.join("temp").to_string_lossy().to_string();
        settings.checkpoints.dir = dir.join("checkpoints").to_string_lossy().to_string();
        settings.rate_limits = RateLimitSettings {
            default: ProviderLimit {
                requests_per_minute: 10_000,
                max_retries: 0,
                base_delay_ms: 1,
            },
            ..RateLimitSettings::default()
        };
        settings
    }

    fn generator(settings: Settings, long_model: ScriptedChatModel) -> Generator {
        Generator::with_components(
            settings,
            Prompts::default(),
            Arc::new(ScriptedChatModel::new(Vec::<String>::new())),
            Arc::new(long_model),
            Arc::new(StubEmbedder::new()),
            Arc::new(MemoryCheckpointStore::new()),
            None,
        )
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("research".parse::<Mode>(), Ok(Mode::Research));
        assert_eq!("Context".parse::<Mode>(), Ok(Mode::Context));
        assert!("podcast".parse::<Mode>().is_err());
    }

    #[tokio::test]
    async fn test_context_mode_requires_sources() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(
            test_settings(dir.path()),
            ScriptedChatModel::new(Vec::<String>::new()),
        );

        let request = GenerateRequest::context("Linux", Vec::new());
        let result = generator.generate(request).await;
        assert!(matches!(result, Err(PratError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_generate_full_run_from_context_sources() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(
            &notes,
            "Linux is a family of open-source operating systems built on the Linux kernel.",
        )
        .unwrap();

        // First long-model call returns the outline, then the model coasts on
        // the same dialogue line for every scripted turn.
        let long_model = ScriptedChatModel::new([outline_json(), "That's a great question."]);
        let generator = generator(test_settings(dir.path()), long_model);

        let mut request =
            GenerateRequest::context("Linux", vec![notes.to_string_lossy().to_string()]);
        request.qa_rounds = Some(3);
        request.checkpoint = false;

        let report = generator.generate(request).await.unwrap();

        assert_eq!(report.snippets, 1);
        assert_eq!(report.sections, 3);
        // Intro and outro plus 3 rounds of Q&A in each of 3 sections.
        assert_eq!(report.turns, 2 + 3 * 6);
        assert!(report.audio_path.is_none());

        let markdown = std::fs::read_to_string(&report.transcript_path).unwrap();
        assert!(markdown.starts_with("# Linux"));
        assert!(markdown.contains("## Outline"));
        assert!(markdown.contains("### Section 1: Introduction"));
        assert!(markdown.contains("## Script"));
        assert!(markdown.contains("**Interviewer**:"));
        assert!(markdown.contains("**Interviewee**: That's a great question."));
    }

    #[tokio::test]
    async fn test_generate_resumes_outline_from_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "Linux kernel notes for the checkpoint run.").unwrap();

        let store = Arc::new(MemoryCheckpointStore::new());
        let settings = test_settings(dir.path());

        let make = |responses: Vec<&str>, store: Arc<MemoryCheckpointStore>| {
            Generator::with_components(
                settings.clone(),
                Prompts::default(),
                Arc::new(ScriptedChatModel::new(Vec::<String>::new())),
                Arc::new(ScriptedChatModel::new(responses)),
                Arc::new(StubEmbedder::new()),
                store,
                None,
            )
        };

        let request = GenerateRequest::context("Linux", vec![notes.to_string_lossy().to_string()]);

        let first = make(vec![outline_json(), "Line."], store.clone());
        first.generate(request.clone()).await.unwrap();

        // The rerun's model never produces an outline; the checkpointed one
        // must carry the run.
        let second = make(vec!["Line."], store);
        let report = second.generate(request).await.unwrap();
        assert_eq!(report.sections, 3);
    }

    #[test]
    fn test_render_markdown_layout() {
        let outline: Outline = serde_json::from_str(outline_json()).unwrap();
        let transcript = Transcript {
            topic: "Linux".into(),
            intro: crate::script::DialogueTurn::new(
                crate::script::Speaker::Interviewer,
                "Welcome.",
            ),
            sections: Vec::new(),
            outro: crate::script::DialogueTurn::new(
                crate::script::Speaker::Interviewer,
                "Goodbye.",
            ),
        };

        let doc = render_markdown(&outline, &transcript);
        let outline_pos = doc.find("## Outline").unwrap();
        let script_pos = doc.find("## Script").unwrap();
        assert!(outline_pos < script_pos);
        assert!(doc.contains("- history\n"));
        assert!(doc.ends_with("**Interviewer**: Goodbye.\n\n"));
    }
}
