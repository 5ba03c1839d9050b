//! Wikipedia article fetching.

use crate::error::{PratError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const API_BASE: &str = "https://en.wikipedia.org/w/api.php";

#[derive(Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Deserialize)]
struct QueryBody {
    pages: HashMap<String, PageBody>,
}

#[derive(Deserialize)]
struct PageBody {
    title: Option<String>,
    extract: Option<String>,
}

/// Fetch the plain-text extract of one Wikipedia article by title.
///
/// Follows redirects; a missing article or an empty extract is an error so
/// the collector can skip it.
pub async fn fetch_article(client: &reqwest::Client, title: &str) -> Result<String> {
    debug!(title, "Fetching Wikipedia article");

    let response = client
        .get(API_BASE)
        .query(&[
            ("action", "query"),
            ("prop", "extracts"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("format", "json"),
            ("titles", title),
        ])
        .header("User-Agent", "prat/0.1 (podcast research)")
        .send()
        .await?
        .error_for_status()?;

    let body: QueryResponse = response.json().await?;

    let pages = body
        .query
        .map(|q| q.pages)
        .ok_or_else(|| PratError::Extraction(format!("Malformed Wikipedia response for '{}'", title)))?;

    // The pages map has one entry; a page id of "-1" marks a missing article.
    for (page_id, page) in pages {
        if page_id == "-1" {
            continue;
        }
        if let Some(extract) = page.extract {
            if !extract.trim().is_empty() {
                let resolved = page.title.unwrap_or_else(|| title.to_string());
                debug!(title = %resolved, chars = extract.len(), "Fetched article");
                return Ok(extract);
            }
        }
    }

    Err(PratError::Extraction(format!(
        "Wikipedia article '{}' not found or empty",
        title
    )))
}
