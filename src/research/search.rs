//! Web search via the Tavily API.

use crate::error::{PratError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const API_URL: &str = "https://api.tavily.com/search";

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    exclude_domains: &'a [String],
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

/// One search result.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// Search client holding the API key.
pub struct SearchClient {
    http: reqwest::Client,
    api_key: String,
}

impl SearchClient {
    /// Create a client from the `TAVILY_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY").map_err(|_| {
            PratError::Config("TAVILY_API_KEY is not set but research mode needs web search".into())
        })?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Run one search query.
    ///
    /// PDF results are dropped; the API already honors the excluded domains.
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        exclude_domains: &[String],
    ) -> Result<Vec<SearchHit>> {
        debug!(query, "Running web search");

        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results,
            exclude_domains,
        };

        let response = self
            .http
            .post(API_URL)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;

        let hits = body
            .results
            .into_iter()
            .filter(|hit| !hit.url.to_lowercase().ends_with(".pdf"))
            .collect();

        Ok(hits)
    }
}
