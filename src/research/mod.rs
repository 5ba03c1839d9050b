//! Research collection.
//!
//! Produces the ordered set of [`SourceSnippet`]s the rest of the pipeline
//! works from. Research mode asks the fast model for Wikipedia articles and
//! web search queries and fetches the results; context mode extracts text
//! from user-supplied files and URLs. Either way the stage fails only when
//! zero usable snippets come out of it.

mod search;
mod wikipedia;

pub use search::{SearchClient, SearchHit};

use crate::config::{Prompts, ResearchSettings};
use crate::error::{PratError, Result};
use crate::llm::{extract_json_array, generate_structured, ChatModel};
use crate::sources::{SourceExtractor, SourceKind, SourceSnippet};
use crate::throttle::RateLimiter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Attempts for the small structured calls (article and query suggestions).
const SUGGESTION_ATTEMPTS: usize = 3;

/// Collects research material for a topic.
pub struct ResearchCollector {
    fast_model: Arc<dyn ChatModel>,
    limiter: Arc<RateLimiter>,
    extractor: SourceExtractor,
    search: Option<SearchClient>,
    http: reqwest::Client,
    settings: ResearchSettings,
    prompts: Prompts,
}

impl ResearchCollector {
    /// Create a collector.
    ///
    /// `search` is `None` in context mode, where no web search happens.
    pub fn new(
        fast_model: Arc<dyn ChatModel>,
        limiter: Arc<RateLimiter>,
        extractor: SourceExtractor,
        search: Option<SearchClient>,
        settings: ResearchSettings,
        prompts: Prompts,
    ) -> Self {
        Self {
            fast_model,
            limiter,
            extractor,
            search,
            http: reqwest::Client::new(),
            settings,
            prompts,
        }
    }

    /// Research mode: gather snippets for a topic from Wikipedia and the web.
    #[instrument(skip(self))]
    pub async fn collect_research(&self, topic: &str) -> Result<Vec<SourceSnippet>> {
        let mut snippets = Vec::new();

        let articles = self.suggest_articles(topic).await?;
        info!(count = articles.len(), "Got Wikipedia article suggestions");

        for title in &articles {
            let fetched = self
                .limiter
                .call("wikipedia", || wikipedia::fetch_article(&self.http, title))
                .await;
            match fetched {
                Ok(text) => snippets.push(SourceSnippet::new(title, SourceKind::Wikipedia, text)),
                Err(e) => warn!(title, "Skipping Wikipedia article: {}", e),
            }
        }

        let queries = self.suggest_queries(topic).await?;
        info!(count = queries.len(), "Got web search queries");

        for url in self.search_urls(&queries).await {
            match self.extractor.extract(&url).await {
                Ok(snippet) => snippets.push(snippet),
                Err(e) => warn!(url, "Skipping search result: {}", e),
            }
        }

        if snippets.is_empty() {
            return Err(PratError::Research(format!(
                "No usable research material found for '{}'",
                topic
            )));
        }

        info!(count = snippets.len(), "Research collection complete");
        Ok(snippets)
    }

    /// Context mode: extract snippets from user-supplied source locators.
    #[instrument(skip(self, sources))]
    pub async fn collect_context(&self, sources: &[String]) -> Result<Vec<SourceSnippet>> {
        let snippets = self.extractor.extract_all(sources).await;

        if snippets.is_empty() {
            return Err(PratError::Research(
                "None of the provided sources yielded any text".into(),
            ));
        }

        info!(
            count = snippets.len(),
            of = sources.len(),
            "Extracted context sources"
        );
        Ok(snippets)
    }

    /// Ask the fast model for Wikipedia article titles.
    async fn suggest_articles(&self, topic: &str) -> Result<Vec<String>> {
        let max_articles = self.settings.max_articles;
        let vars = HashMap::from([
            ("topic".to_string(), topic.to_string()),
            ("max_articles".to_string(), max_articles.to_string()),
        ]);
        let system = self
            .prompts
            .render_with_custom(&self.prompts.research.wikipedia_system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.research.wikipedia_user, &vars);

        generate_structured(
            self.fast_model.as_ref(),
            &self.limiter,
            &system,
            &user,
            SUGGESTION_ATTEMPTS,
            |response| parse_string_array(response, max_articles),
        )
        .await
        .map_err(|e| PratError::Research(format!("Could not suggest Wikipedia articles: {}", e)))
    }

    /// Ask the fast model for web search queries.
    async fn suggest_queries(&self, topic: &str) -> Result<Vec<String>> {
        let max_queries = self.settings.max_queries;
        let vars = HashMap::from([
            ("topic".to_string(), topic.to_string()),
            ("max_queries".to_string(), max_queries.to_string()),
        ]);
        let system = self
            .prompts
            .render_with_custom(&self.prompts.research.queries_system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.research.queries_user, &vars);

        generate_structured(
            self.fast_model.as_ref(),
            &self.limiter,
            &system,
            &user,
            SUGGESTION_ATTEMPTS,
            |response| parse_string_array(response, max_queries),
        )
        .await
        .map_err(|e| PratError::Research(format!("Could not suggest search queries: {}", e)))
    }

    /// Run every query and collect result URLs in order, without duplicates.
    async fn search_urls(&self, queries: &[String]) -> Vec<String> {
        let Some(search) = &self.search else {
            return Vec::new();
        };

        let mut urls = Vec::new();
        for query in queries {
            let hits = self
                .limiter
                .call("tavily", || {
                    search.search(
                        query,
                        self.settings.results_per_query,
                        &self.settings.exclude_domains,
                    )
                })
                .await;

            match hits {
                Ok(hits) => {
                    for hit in hits {
                        if !urls.contains(&hit.url) {
                            urls.push(hit.url);
                        }
                    }
                }
                Err(e) => warn!(query, "Skipping failed search query: {}", e),
            }
        }
        urls
    }
}

/// Parse a model response into a bounded list of non-empty strings.
fn parse_string_array(response: &str, max_items: usize) -> Result<Vec<String>> {
    let json = extract_json_array(response)?;
    let items: Vec<String> = serde_json::from_str(json)?;

    let items: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(max_items)
        .collect();

    if items.is_empty() {
        return Err(PratError::InvalidInput(
            "Model returned an empty list".into(),
        ));
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitSettings;
    use crate::llm::testing::ScriptedChatModel;

    fn collector_with_model(model: ScriptedChatModel) -> ResearchCollector {
        ResearchCollector::new(
            Arc::new(model),
            Arc::new(RateLimiter::new(RateLimitSettings::default())),
            SourceExtractor::new(std::env::temp_dir()),
            None,
            ResearchSettings::default(),
            Prompts::default(),
        )
    }

    #[test]
    fn test_parse_string_array_bounds_and_trims() {
        let response = "Sure! Here you go:\n[\"Linux\", \" Linux kernel \", \"\", \"Linus Torvalds\", \"GNU\"]";
        let items = parse_string_array(response, 3).unwrap();
        assert_eq!(items, vec!["Linux", "Linux kernel", "Linus Torvalds"]);
    }

    #[test]
    fn test_parse_string_array_rejects_empty() {
        assert!(parse_string_array("[]", 5).is_err());
        assert!(parse_string_array("no list here", 5).is_err());
    }

    #[tokio::test]
    async fn test_collect_context_mixes_good_and_bad_sources() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("linux.txt");
        std::fs::write(&good, "Linux is a family of open-source operating systems.").unwrap();

        let collector = collector_with_model(ScriptedChatModel::new(Vec::<String>::new()));
        let sources = vec![
            "/nonexistent/unreachable.txt".to_string(),
            good.to_string_lossy().to_string(),
        ];

        let snippets = collector.collect_context(&sources).await.unwrap();
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].text.contains("open-source"));
    }

    #[tokio::test]
    async fn test_collect_context_fails_with_zero_snippets() {
        let collector = collector_with_model(ScriptedChatModel::new(Vec::<String>::new()));
        let sources = vec!["/nonexistent/a.txt".to_string(), "/nonexistent/b.txt".to_string()];

        let result = collector.collect_context(&sources).await;
        assert!(matches!(result, Err(PratError::Research(_))));
    }

    #[tokio::test]
    async fn test_suggest_articles_retries_malformed_response() {
        let model = ScriptedChatModel::new([
            "I cannot answer that.",
            "[\"Linux\", \"Linux kernel\"]",
        ]);
        let collector = collector_with_model(model);

        let articles = collector.suggest_articles("Linux").await.unwrap();
        assert_eq!(articles, vec!["Linux", "Linux kernel"]);
    }
}
