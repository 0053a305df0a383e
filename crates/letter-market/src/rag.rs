//! Retrieval helper: embeds text and forwards it to the vector store

use crate::error::{NewsletterError, Result};
use crate::retry::RetryPolicy;
use crate::store::{Document, SearchResult, VectorStore, validate_batch};
use letter_llm::EmbeddingProvider;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Reads and writes collections on behalf of the pipeline
#[derive(Clone)]
pub struct RagHelper {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    retry: RetryPolicy,
}

impl RagHelper {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            embedder,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy for embedding calls
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.retry
            .execute("embedding", || async move { Ok(self.embedder.embed(texts).await?) })
            .await
    }

    /// Embed and upsert documents in a single batch
    ///
    /// Returns the number of documents written. An empty batch is a no-op.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn add(&self, collection: &str, mut documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            debug!("Nothing to add to '{}'", collection);
            return Ok(0);
        }
        validate_batch(&documents)?;

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embed(&texts).await?;
        if embeddings.len() != documents.len() {
            return Err(NewsletterError::Store(format!(
                "Got {} embeddings for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        for (doc, embedding) in documents.iter_mut().zip(embeddings) {
            doc.embedding = embedding;
        }

        self.store.create_collection(collection).await?;
        self.store.upsert(collection, &documents).await?;
        info!("Added {} documents to '{}'", documents.len(), collection);
        Ok(documents.len())
    }

    /// Similarity search for free text
    #[instrument(skip(self))]
    pub async fn query(
        &self,
        collection: &str,
        text: &str,
        n_results: usize,
    ) -> Result<Vec<SearchResult>> {
        if text.trim().is_empty() {
            return Err(NewsletterError::Validation("Query text is empty".to_string()));
        }
        if n_results == 0 {
            return Err(NewsletterError::Validation(
                "n_results must be at least 1".to_string(),
            ));
        }

        let embedding = self
            .embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| NewsletterError::Store("Embedding response was empty".to_string()))?;
        self.store.create_collection(collection).await?;
        let hits = self.store.search(collection, &embedding, n_results).await?;
        debug!("Query on '{}' returned {} hits", collection, hits.len());
        Ok(hits)
    }

    /// Texts of the documents matching a query
    pub async fn query_texts(
        &self,
        collection: &str,
        text: &str,
        n_results: usize,
    ) -> Result<Vec<String>> {
        Ok(self
            .query(collection, text, n_results)
            .await?
            .into_iter()
            .map(|hit| hit.document.text)
            .collect())
    }

    /// Documents by id
    pub async fn get(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        self.store.create_collection(collection).await?;
        self.store.get(collection, ids).await
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: &str) -> Result<usize> {
        self.store.create_collection(collection).await?;
        self.store.count(collection).await
    }
}
