//! Chroma HTTP API (v2) vector store
//!
//! Collections are addressed by name and resolved to Chroma ids through
//! get-or-create, so a collection exists as soon as it is first touched.

use super::{Document, Metadata, SearchResult, VectorStore, validate_batch};
use crate::config::NewsletterConfig;
use crate::error::{NewsletterError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

const SERVICE: &str = "Chroma";

/// Chroma server client
pub struct ChromaStore {
    client: Client,
    base_url: String,
    tenant: String,
    database: String,
    /// Collection name -> Chroma collection id
    collection_ids: RwLock<HashMap<String, String>>,
}

impl ChromaStore {
    /// Connect to a server using the default tenant and database
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::build(
            base_url.into(),
            "default_tenant".to_string(),
            "default_database".to_string(),
            Duration::from_secs(30),
        )
    }

    /// Connect using the pipeline configuration
    pub fn from_config(config: &NewsletterConfig) -> Result<Self> {
        Self::build(
            config.chroma_url.clone(),
            config.chroma_tenant.clone(),
            config.chroma_database.clone(),
            config.request_timeout,
        )
    }

    fn build(base_url: String, tenant: String, database: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tenant,
            database,
            collection_ids: RwLock::new(HashMap::new()),
        })
    }

    /// Check that the server is reachable
    pub async fn heartbeat(&self) -> Result<u64> {
        let response = self
            .client
            .get(format!("{}/api/v2/heartbeat", self.base_url))
            .send()
            .await?;
        let body: serde_json::Value = check_status(response).await?.json().await?;
        body.get("nanosecond heartbeat")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| NewsletterError::MissingKey {
                service: SERVICE.to_string(),
                key: "nanosecond heartbeat".to_string(),
            })
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.base_url, self.tenant, self.database
        )
    }

    /// Resolve a collection name to its id, creating it when missing
    async fn collection_id(&self, name: &str) -> Result<String> {
        if let Some(id) = self.collection_ids.read().await.get(name) {
            return Ok(id.clone());
        }

        let response = self
            .client
            .post(self.collections_url())
            .json(&CreateCollection {
                name,
                get_or_create: true,
            })
            .send()
            .await?;
        let collection: CollectionInfo = check_status(response).await?.json().await?;
        debug!("Collection '{}' has id {}", name, collection.id);

        self.collection_ids
            .write()
            .await
            .insert(name.to_string(), collection.id.clone());
        Ok(collection.id)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        collection: &str,
        action: &str,
        body: &B,
    ) -> Result<Response> {
        let id = self.collection_id(collection).await?;
        let response = self
            .client
            .post(format!("{}/{}/{}", self.collections_url(), id, action))
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn create_collection(&self, collection: &str) -> Result<()> {
        self.collection_id(collection).await.map(|_| ())
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn upsert(&self, collection: &str, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        validate_batch(documents)?;

        let body = UpsertRequest {
            ids: documents.iter().map(|d| d.id.as_str()).collect(),
            documents: documents.iter().map(|d| d.text.as_str()).collect(),
            metadatas: documents.iter().map(|d| metadata_or_none(&d.metadata)).collect(),
            embeddings: documents.iter().map(|d| d.embedding.as_slice()).collect(),
        };

        self.post(collection, "upsert", &body).await?;
        info!("Upserted {} documents into '{}'", documents.len(), collection);
        Ok(())
    }

    #[instrument(skip(self, embedding))]
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<SearchResult>> {
        let body = serde_json::json!({
            "query_embeddings": [embedding],
            "n_results": n_results,
            "include": ["documents", "metadatas", "distances"],
        });

        let result: QueryResponse = self.post(collection, "query", &body).await?.json().await?;
        Ok(result.into_hits())
    }

    async fn get(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "ids": ids,
            "include": ["documents", "metadatas"],
        });

        let result: GetResponse = self.post(collection, "get", &body).await?.json().await?;
        Ok(result.into_documents())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let id = self.collection_id(collection).await?;
        let response = self
            .client
            .get(format!("{}/{}/count", self.collections_url(), id))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(NewsletterError::Status {
        service: SERVICE.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Chroma rejects empty metadata maps
fn metadata_or_none(metadata: &Metadata) -> Option<&Metadata> {
    (!metadata.is_empty()).then_some(metadata)
}

// ============================================================================
// Chroma wire types
// ============================================================================

#[derive(Serialize)]
struct CreateCollection<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    ids: Vec<&'a str>,
    documents: Vec<&'a str>,
    metadatas: Vec<Option<&'a Metadata>>,
    embeddings: Vec<&'a [f32]>,
}

#[derive(Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

impl QueryResponse {
    /// Flatten the per-query lists; only one query is ever sent
    fn into_hits(self) -> Vec<SearchResult> {
        let ids = self.ids.into_iter().next().unwrap_or_default();
        let mut documents = self
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default()
            .into_iter();
        let mut metadatas = self
            .metadatas
            .and_then(|m| m.into_iter().next())
            .unwrap_or_default()
            .into_iter();
        let mut distances = self
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default()
            .into_iter();

        ids.into_iter()
            .map(|id| SearchResult {
                document: Document {
                    id,
                    text: documents.next().flatten().unwrap_or_default(),
                    metadata: metadatas.next().flatten().unwrap_or_default(),
                    embedding: Vec::new(),
                },
                distance: distances.next().flatten(),
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    #[serde(default)]
    documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Option<Vec<Option<Metadata>>>,
}

impl GetResponse {
    fn into_documents(self) -> Vec<Document> {
        let mut documents = self.documents.unwrap_or_default().into_iter();
        let mut metadatas = self.metadatas.unwrap_or_default().into_iter();

        self.ids
            .into_iter()
            .map(|id| Document {
                id,
                text: documents.next().flatten().unwrap_or_default(),
                metadata: metadatas.next().flatten().unwrap_or_default(),
                embedding: Vec::new(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_response_flattening() {
        let raw = serde_json::json!({
            "ids": [["0", "1"]],
            "documents": [["first", null]],
            "metadatas": [[{"source": "CNBC"}, null]],
            "distances": [[0.12, 0.5]]
        });

        let hits = serde_json::from_value::<QueryResponse>(raw).unwrap().into_hits();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.text, "first");
        assert_eq!(hits[0].document.metadata_str("source"), Some("CNBC"));
        assert_eq!(hits[0].distance, Some(0.12));
        assert_eq!(hits[1].document.text, "");
        assert!(hits[1].document.metadata.is_empty());
    }

    #[test]
    fn test_empty_query_response() {
        let raw = serde_json::json!({"ids": [[]], "documents": [[]]});
        let hits = serde_json::from_value::<QueryResponse>(raw).unwrap().into_hits();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_get_response_without_metadatas() {
        let raw = serde_json::json!({"ids": ["top_gainers"], "documents": ["[]"]});
        let docs = serde_json::from_value::<GetResponse>(raw).unwrap().into_documents();
        assert_eq!(docs[0].id, "top_gainers");
        assert_eq!(docs[0].text, "[]");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let store = ChromaStore::new("http://localhost:8000/").unwrap();
        assert_eq!(
            store.collections_url(),
            "http://localhost:8000/api/v2/tenants/default_tenant/databases/default_database/collections"
        );
    }
}
