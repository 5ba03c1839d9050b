//! In-memory context retrieval over research snippets.
//!
//! Research snippets are split into overlapping chunks and embedded once;
//! the script writer then pulls the chunks closest to each interview
//! question into the answer prompt.

use crate::config::RetrievalSettings;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::sources::SourceSnippet;
use crate::throttle::RateLimiter;
use std::sync::Arc;
use tracing::{debug, info};

/// One indexed chunk of research text.
#[derive(Debug, Clone)]
struct IndexedChunk {
    origin: String,
    text: String,
    embedding: Vec<f32>,
}

/// Embedded research chunks queryable by similarity.
pub struct ContextIndex {
    chunks: Vec<IndexedChunk>,
    embedder: Arc<dyn Embedder>,
    limiter: Arc<RateLimiter>,
    top_k: usize,
}

impl ContextIndex {
    /// Chunk and embed the snippets into a queryable index.
    pub async fn build(
        snippets: &[SourceSnippet],
        embedder: Arc<dyn Embedder>,
        limiter: Arc<RateLimiter>,
        settings: &RetrievalSettings,
    ) -> Result<Self> {
        let mut origins = Vec::new();
        let mut texts = Vec::new();

        for snippet in snippets {
            for chunk in chunk_text(&snippet.text, settings.chunk_chars, settings.overlap_chars) {
                origins.push(snippet.origin.clone());
                texts.push(chunk);
            }
        }

        info!(
            snippets = snippets.len(),
            chunks = texts.len(),
            "Building retrieval index"
        );

        let embeddings = limiter
            .call(embedder.provider(), || embedder.embed_batch(&texts))
            .await?;

        let chunks = origins
            .into_iter()
            .zip(texts)
            .zip(embeddings)
            .map(|((origin, text), embedding)| IndexedChunk {
                origin,
                text,
                embedding,
            })
            .collect();

        Ok(Self {
            chunks,
            embedder,
            limiter,
            top_k: settings.top_k,
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Retrieve the chunks most similar to a query, formatted for a prompt.
    pub async fn retrieve(&self, query: &str) -> Result<String> {
        if self.chunks.is_empty() {
            return Ok(String::new());
        }

        let query_embedding = self
            .limiter
            .call(self.embedder.provider(), || self.embedder.embed(query))
            .await?;

        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(&query_embedding, &chunk.embedding), chunk))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.top_k);

        debug!(query, returned = scored.len(), "Retrieved context chunks");

        Ok(scored
            .iter()
            .map(|(_, chunk)| format!("[{}]\n{}", chunk.origin, chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

/// Split text into chunks of roughly `chunk_chars` characters with overlap.
///
/// Boundaries land on char boundaries, never inside a code point. An overlap
/// of at least one full chunk would never advance, so it is clamped.
pub fn chunk_text(text: &str, chunk_chars: usize, overlap_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let chunk_chars = chunk_chars.max(1);
    let overlap = overlap_chars.min(chunk_chars - 1);
    let step = chunk_chars - overlap;

    if chars.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_chars).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim().to_string();
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
