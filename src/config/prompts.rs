//! Prompt templates for Prat.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub research: ResearchPrompts,
    pub outline: OutlinePrompts,
    pub script: ScriptPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Prompts for research collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchPrompts {
    pub wikipedia_system: String,
    pub wikipedia_user: String,
    pub queries_system: String,
    pub queries_user: String,
}

impl Default for ResearchPrompts {
    fn default() -> Self {
        Self {
            wikipedia_system: r#"You are a research assistant preparing background material for a podcast episode. Given a topic, you suggest the Wikipedia articles most useful for understanding it.

Suggest articles that:
1. Cover the topic directly, not just tangentially
2. Exist on English Wikipedia under the exact title you give
3. Together span history, key concepts, and notable people or events

Output your suggestions as a JSON array of article titles."#
                .to_string(),

            wikipedia_user: r#"Suggest up to {{max_articles}} Wikipedia articles for researching this podcast topic:

{{topic}}

Respond with a JSON array of exact article titles. Example:
["Linux", "Linux kernel", "Linus Torvalds"]"#
                .to_string(),

            queries_system: r#"You are a research assistant preparing background material for a podcast episode. Given a topic, you write web search queries that surface current, substantive coverage of it.

Write queries that:
1. Are specific enough to avoid generic listicles
2. Cover different angles of the topic rather than rephrasing one question
3. Would make sense typed into a search engine verbatim

Output your queries as a JSON array of strings."#
                .to_string(),

            queries_user: r#"Write up to {{max_queries}} web search queries for researching this podcast topic:

{{topic}}

Respond with a JSON array of query strings. Example:
["history of the Linux kernel", "Linux adoption in enterprise 2024"]"#
                .to_string(),
        }
    }
}

/// Prompts for outline generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlinePrompts {
    pub system: String,
    pub user: String,
}

impl Default for OutlinePrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an experienced podcast producer planning an interview episode. You turn a topic and research notes into a clear episode outline.

Rules for the outline:
1. Follow the requested episode structure exactly, in order
2. Give every section a short, concrete title
3. Give every section 2-4 subsection bullets, each a specific talking point drawn from the research where possible
4. Keep bullets as plain phrases, not full sentences or questions

Output the outline as a single JSON object."#
                .to_string(),

            user: r#"Plan a podcast episode about:

{{topic}}

The episode must follow this structure, first section to last:
{{episode_structure}}

Research notes:
{{context}}

Respond with a JSON object of this shape:
{
  "sections": [
    {"title": "Introduction to the Topic", "subsections": ["why it matters", "what we'll cover"]},
    {"title": "A Main Discussion Section", "subsections": ["first talking point", "second talking point", "third talking point"]}
  ]
}"#
                .to_string(),
        }
    }
}

/// Prompts for dialogue generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptPrompts {
    pub interviewer_system: String,
    pub interviewer_user: String,
    pub interviewee_system: String,
    pub interviewee_user: String,
}

impl Default for ScriptPrompts {
    fn default() -> Self {
        Self {
            interviewer_system: r#"You are the host of an interview podcast. You ask one question at a time, building naturally on what has already been said.

Rules for your questions:
1. Ask exactly one question, a single conversational sentence or two
2. Stay on the current section's talking points
3. Do not repeat a question that has already been asked
4. Do not answer the question yourself
5. Output only the spoken words, with no speaker label, quotes, or markdown"#
                .to_string(),

            interviewer_user: r#"The episode topic is: {{topic}}

Episode outline:
{{outline}}

You are currently in the section "{{section_title}}", which should cover:
{{subtopics}}

Conversation so far:
{{history}}

Ask the expert your next question."#
                .to_string(),

            interviewee_system: r#"You are an expert guest on an interview podcast. You answer the host's questions knowledgeably and conversationally.

Rules for your answers:
1. Answer the question directly in two to five sentences
2. Ground your answer in the provided reference material when it is relevant
3. Stay consistent with everything you have said earlier in the conversation
4. Speak naturally, as in a live conversation, without lists or headings
5. Output only the spoken words, with no speaker label, quotes, or markdown"#
                .to_string(),

            interviewee_user: r#"The episode topic is: {{topic}}

Reference material:
{{context}}

Conversation so far:
{{history}}

The host asks: {{question}}

Give your answer."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        // Store custom variables
        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            // Load research prompts if file exists
            let research_path = custom_path.join("research.toml");
            if research_path.exists() {
                let content = std::fs::read_to_string(&research_path)?;
                prompts.research = toml::from_str(&content)?;
            }

            // Load outline prompts if file exists
            let outline_path = custom_path.join("outline.toml");
            if outline_path.exists() {
                let content = std::fs::read_to_string(&outline_path)?;
                prompts.outline = toml::from_str(&content)?;
            }

            // Load script prompts if file exists
            let script_path = custom_path.join("script.toml");
            if script_path.exists() {
                let content = std::fs::read_to_string(&script_path)?;
                prompts.script = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        // Start with custom variables, then override with provided vars
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.research.wikipedia_system.is_empty());
        assert!(!prompts.outline.system.is_empty());
        assert!(!prompts.script.interviewer_user.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "The episode topic is: {{topic}}. Ask up to {{max_queries}} questions.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("topic".to_string(), "Linux".to_string());
        vars.insert("max_queries".to_string(), "3".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(
            result,
            "The episode topic is: Linux. Ask up to 3 questions."
        );
    }

    #[test]
    fn test_render_with_custom_precedence() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("tone".to_string(), "casual".to_string());
        prompts
            .variables
            .insert("topic".to_string(), "ignored".to_string());

        let mut vars = std::collections::HashMap::new();
        vars.insert("topic".to_string(), "Linux".to_string());

        let result = prompts.render_with_custom("{{tone}} episode about {{topic}}", &vars);
        assert_eq!(result, "casual episode about Linux");
    }
}
