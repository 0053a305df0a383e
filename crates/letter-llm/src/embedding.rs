//! Embedding provider trait
//!
//! The vector store only accepts precomputed vectors, so documents and query
//! strings are embedded through a hosted model before they reach it.

use crate::Result;
use async_trait::async_trait;

/// Trait for text-embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            crate::LLMError::UnexpectedResponse("Embedding response was empty".to_string())
        })
    }

    /// Get the provider name
    fn name(&self) -> &str;
}
