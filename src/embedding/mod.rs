//! Embedding generation for research context retrieval.
//!
//! The script writer retrieves research chunks by embedding similarity when
//! answering questions; this module provides the embedding seam.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Provider name, used for rate limiting.
    fn provider(&self) -> &str;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic embedder for tests.

    use super::*;

    /// Embedder producing byte-frequency vectors.
    ///
    /// Texts sharing words land near each other, which is enough structure
    /// for retrieval tests without any network access.
    pub struct StubEmbedder {
        dimensions: usize,
    }

    impl StubEmbedder {
        pub fn new() -> Self {
            Self { dimensions: 16 }
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        fn provider(&self) -> &str {
            "stub"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut vector = vec![0.0f32; self.dimensions];
            for byte in text.bytes() {
                vector[byte as usize % self.dimensions] += 1.0;
            }
            Ok(vector)
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed(text).await?);
            }
            Ok(vectors)
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }
}
