//! Episode outline generation.
//!
//! Turns the topic and research material into the fixed episode shape:
//! an introduction, one or more discussion sections, and a conclusion, each
//! with a handful of subsection bullets. The outline is generated as JSON by
//! the long-context model and validated before anything downstream sees it.

use crate::config::{OutlineSettings, PodcastSettings, Prompts};
use crate::error::{PratError, Result};
use crate::llm::{extract_json_object, generate_structured, ChatModel};
use crate::sources::SourceSnippet;
use crate::throttle::RateLimiter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Most subsection bullets a section may carry.
const MAX_SUBSECTIONS: usize = 4;

/// One outline section with its talking points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub title: String,
    pub subsections: Vec<String>,
}

/// The full episode outline.
///
/// Sections are positional: the first is the introduction, the last the
/// conclusion, and everything between is discussion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outline {
    pub sections: Vec<Section>,
}

impl Outline {
    /// Sections between the introduction and the conclusion.
    pub fn discussion_sections(&self) -> &[Section] {
        if self.sections.len() <= 2 {
            return &[];
        }
        &self.sections[1..self.sections.len() - 1]
    }

    /// Compact text form used as prompt context.
    pub fn as_text(&self) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, section.title));
            for subsection in &section.subsections {
                out.push_str(&format!("   - {}\n", subsection));
            }
        }
        out
    }

    /// Check the outline against the required episode shape.
    ///
    /// Needs at least three sections (introduction, one discussion,
    /// conclusion) and 1 to 4 non-empty subsection bullets per section.
    pub fn validate(&self) -> Result<()> {
        if self.sections.len() < 3 {
            return Err(PratError::InvalidInput(format!(
                "Outline has {} section(s), need at least 3 (introduction, discussion, conclusion)",
                self.sections.len()
            )));
        }

        for section in &self.sections {
            if section.title.trim().is_empty() {
                return Err(PratError::InvalidInput(
                    "Outline contains a section with an empty title".into(),
                ));
            }
            if section.subsections.is_empty() || section.subsections.len() > MAX_SUBSECTIONS {
                return Err(PratError::InvalidInput(format!(
                    "Section '{}' has {} subsection(s), expected 1 to {}",
                    section.title,
                    section.subsections.len(),
                    MAX_SUBSECTIONS
                )));
            }
            if section.subsections.iter().any(|s| s.trim().is_empty()) {
                return Err(PratError::InvalidInput(format!(
                    "Section '{}' contains an empty subsection bullet",
                    section.title
                )));
            }
        }

        Ok(())
    }
}

/// Builds outlines with the long-context model.
pub struct OutlineBuilder {
    model: Arc<dyn ChatModel>,
    limiter: Arc<RateLimiter>,
    settings: OutlineSettings,
    podcast: PodcastSettings,
    prompts: Prompts,
}

impl OutlineBuilder {
    pub fn new(
        model: Arc<dyn ChatModel>,
        limiter: Arc<RateLimiter>,
        settings: OutlineSettings,
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

    /// Generate a validated outline for the topic.
    ///
    /// Malformed model responses are regenerated up to the configured
    /// attempt budget; exhaustion fails the stage.
    #[instrument(skip(self, snippets))]
    pub async fn build(&self, topic: &str, snippets: &[SourceSnippet]) -> Result<Outline> {
        let context = research_context(snippets, self.settings.context_chars);
        let structure = self
            .podcast
            .episode_structure
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n");

        let vars = HashMap::from([
            ("topic".to_string(), topic.to_string()),
            ("episode_structure".to_string(), structure),
            ("context".to_string(), context),
        ]);
        let system = self
            .prompts
            .render_with_custom(&self.prompts.outline.system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.outline.user, &vars);

        let outline = generate_structured(
            self.model.as_ref(),
            &self.limiter,
            &system,
            &user,
            self.settings.max_attempts,
            parse_outline,
        )
        .await
        .map_err(|e| PratError::OutlineGeneration(e.to_string()))?;

        info!(sections = outline.sections.len(), "Outline generated");
        Ok(outline)
    }
}

/// Parse and validate a model response as an outline.
fn parse_outline(response: &str) -> Result<Outline> {
    let json = extract_json_object(response)?;
    let outline: Outline = serde_json::from_str(json)?;
    outline.validate()?;
    Ok(outline)
}

/// Concatenate snippet texts up to a character budget.
fn research_context(snippets: &[SourceSnippet], budget_chars: usize) -> String {
    let mut context = String::new();

    for snippet in snippets {
        if context.len() >= budget_chars {
            break;
        }
        let remaining = budget_chars - context.len();
        let text: String = snippet.text.chars().take(remaining).collect();
        context.push_str(&format!("## {}\n{}\n\n", snippet.origin, text));
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitSettings;
    use crate::llm::testing::ScriptedChatModel;
    use crate::sources::SourceKind;

    fn sample_outline_json() -> &'static str {
        r#"{
            "sections": [
                {"title": "Introduction to Linux", "subsections": ["why it matters", "what we'll cover"]},
                {"title": "The Kernel", "subsections": ["history", "architecture", "community"]},
                {"title": "Conclusion", "subsections": ["recap", "where to learn more"]}
            ]
        }"#
    }

    fn builder(model: ScriptedChatModel) -> OutlineBuilder {
        OutlineBuilder::new(
            Arc::new(model),
            Arc::new(RateLimiter::new(RateLimitSettings::default())),
            OutlineSettings::default(),
            PodcastSettings::default(),
            Prompts::default(),
        )
    }

    #[test]
    fn test_validate_accepts_expected_shape() {
        let outline = parse_outline(sample_outline_json()).unwrap();
        assert_eq!(outline.sections.len(), 3);
        assert_eq!(outline.discussion_sections().len(), 1);
        assert_eq!(outline.discussion_sections()[0].title, "The Kernel");
    }

    #[test]
    fn test_validate_rejects_too_few_sections() {
        let outline = Outline {
            sections: vec![
                Section {
                    title: "Intro".into(),
                    subsections: vec!["a".into()],
                },
                Section {
                    title: "Outro".into(),
                    subsections: vec!["b".into()],
                },
            ],
        };
        assert!(outline.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_subsection_counts() {
        let mut outline = parse_outline(sample_outline_json()).unwrap();
        outline.sections[1].subsections.clear();
        assert!(outline.validate().is_err());

        let mut outline = parse_outline(sample_outline_json()).unwrap();
        outline.sections[1].subsections = vec!["a".into(); 5];
        assert!(outline.validate().is_err());
    }

    #[test]
    fn test_as_text_lists_sections_in_order() {
        let outline = parse_outline(sample_outline_json()).unwrap();
        let text = outline.as_text();
        let intro = text.find("Introduction to Linux").unwrap();
        let kernel = text.find("The Kernel").unwrap();
        let conclusion = text.find("Conclusion").unwrap();
        assert!(intro < kernel && kernel < conclusion);
    }

    #[test]
    fn test_research_context_respects_budget() {
        let snippets = vec![
            SourceSnippet::new("a", SourceKind::File, "x".repeat(100)),
            SourceSnippet::new("b", SourceKind::File, "y".repeat(100)),
        ];
        let context = research_context(&snippets, 50);
        assert!(context.contains("## a"));
        assert!(!context.contains("## b"));
    }

    #[tokio::test]
    async fn test_build_retries_then_succeeds() {
        let model = ScriptedChatModel::new(["not an outline", sample_outline_json()]);
        let outline = builder(model).build("Linux", &[]).await.unwrap();
        assert_eq!(outline.sections.len(), 3);
    }

    #[tokio::test]
    async fn test_build_fails_after_attempt_budget() {
        let model = ScriptedChatModel::new(["garbage"]);
        let result = builder(model).build("Linux", &[]).await;
        assert!(matches!(result, Err(PratError::OutlineGeneration(_))));
    }
}
