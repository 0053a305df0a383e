//! Vector store abstraction
//!
//! The store keeps documents, their metadata and their embeddings in named
//! collections and runs similarity search. Embeddings are computed by the
//! caller (see [`crate::rag::RagHelper`]).

pub mod chroma;

pub use chroma::ChromaStore;

use crate::error::{NewsletterError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Flat metadata map; values are strings, numbers or booleans
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A document as stored in a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Filled in just before the document is written
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl Document {
    /// Create a document without metadata
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: Metadata::new(),
            embedding: Vec::new(),
        }
    }

    /// Add a metadata field, flattening lists and objects
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        if let Some(value) = flatten_value(value.into()) {
            self.metadata.insert(key.into(), value);
        }
        self
    }

    /// Metadata field as text, if present
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// A similarity search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    /// Distance reported by the store; smaller is closer
    pub distance: Option<f32>,
}

/// Backend that stores and searches embedded documents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not exist yet
    async fn create_collection(&self, collection: &str) -> Result<()>;

    /// Insert or replace documents by id in one call
    async fn upsert(&self, collection: &str, documents: &[Document]) -> Result<()>;

    /// Nearest documents to an embedding
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Documents by id; unknown ids are skipped
    async fn get(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>>;

    /// Number of documents in the collection
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// Scalar form of a metadata value
///
/// Lists and objects become JSON strings, nulls are dropped.
pub fn flatten_value(value: serde_json::Value) -> Option<serde_json::Value> {
    use serde_json::Value;

    match value {
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => Some(Value::String(value.to_string())),
        scalar => Some(scalar),
    }
}

/// Flatten every value of a metadata map
pub fn flatten_metadata(metadata: Metadata) -> Metadata {
    metadata
        .into_iter()
        .filter_map(|(k, v)| flatten_value(v).map(|v| (k, v)))
        .collect()
}

/// Reject batches the store would refuse or apply only partly
pub fn validate_batch(documents: &[Document]) -> Result<()> {
    let mut seen = HashSet::with_capacity(documents.len());
    for doc in documents {
        if doc.id.is_empty() {
            return Err(NewsletterError::Validation(
                "Document id must not be empty".to_string(),
            ));
        }
        if !seen.insert(doc.id.as_str()) {
            return Err(NewsletterError::Validation(format!(
                "Duplicate document id in batch: {}",
                doc.id
            )));
        }
    }

    let embedded = documents.iter().filter(|d| !d.embedding.is_empty()).count();
    if embedded != 0 && embedded != documents.len() {
        return Err(NewsletterError::Validation(format!(
            "{embedded} of {} documents carry embeddings",
            documents.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_keeps_scalars() {
        assert_eq!(flatten_value(json!("Reuters")), Some(json!("Reuters")));
        assert_eq!(flatten_value(json!(0.25)), Some(json!(0.25)));
        assert_eq!(flatten_value(json!(true)), Some(json!(true)));
        assert_eq!(flatten_value(json!(null)), None);
    }

    #[test]
    fn test_flatten_lists_and_objects_to_json_strings() {
        assert_eq!(
            flatten_value(json!(["Jane Roe", "John Doe"])),
            Some(json!(r#"["Jane Roe","John Doe"]"#))
        );
        assert_eq!(
            flatten_value(json!({"topic": "Earnings"})),
            Some(json!(r#"{"topic":"Earnings"}"#))
        );
    }

    #[test]
    fn test_flatten_metadata_map() {
        let mut raw = Metadata::new();
        raw.insert("source".into(), json!("CNBC"));
        raw.insert("authors".into(), json!([]));
        raw.insert("banner".into(), json!(null));

        let flat = flatten_metadata(raw);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat["authors"], json!("[]"));
    }

    #[test]
    fn test_with_metadata_flattens() {
        let doc = Document::new("0", "text")
            .with_metadata("authors", json!(["A"]))
            .with_metadata("title", "Headline");

        assert_eq!(doc.metadata_str("authors"), Some(r#"["A"]"#));
        assert_eq!(doc.metadata_str("title"), Some("Headline"));
    }

    #[test]
    fn test_validate_batch() {
        let ok = vec![Document::new("0", "a"), Document::new("1", "b")];
        assert!(validate_batch(&ok).is_ok());

        let dup = vec![Document::new("0", "a"), Document::new("0", "b")];
        assert!(matches!(validate_batch(&dup), Err(NewsletterError::Validation(_))));

        let empty_id = vec![Document::new("", "a")];
        assert!(validate_batch(&empty_id).is_err());

        let mut partial = vec![Document::new("0", "a"), Document::new("1", "b")];
        partial[0].embedding = vec![0.1];
        assert!(validate_batch(&partial).is_err());
    }
}
