//! Web page text extraction.

use crate::error::{PratError, Result};
use tracing::debug;

/// Width used when flattening HTML to text.
const TEXT_WIDTH: usize = 500;

/// Fetch a web page and flatten it to readable plain text.
///
/// HTML is rendered with html2text; non-HTML responses are returned as-is
/// when they look like text.
pub async fn extract_web_page(client: &reqwest::Client, url: &str) -> Result<String> {
    debug!(url, "Fetching web page");

    let response = client
        .get(url)
        .header("User-Agent", "prat/0.1 (podcast research)")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(PratError::Extraction(format!(
            "Fetching {} returned status {}",
            url,
            response.status()
        )));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response.text().await?;

    if content_type.contains("text/plain") {
        return Ok(body);
    }

    let text = html2text::from_read(body.as_bytes(), TEXT_WIDTH)
        .map_err(|e| PratError::Extraction(format!("Could not render {} as text: {}", url, e)))?;

    Ok(text)
}
