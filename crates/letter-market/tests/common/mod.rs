//! Shared fakes for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use letter_market::store::{Document, SearchResult, VectorStore};
use letter_market::{FactChecker, RetryPolicy};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub use letter_llm::testing::{LetterEmbedder, ScriptedProvider};

pub const NEWS_BODY: &str = r#"{
  "items": "2",
  "sentiment_score_definition": "x <= -0.35: Bearish",
  "feed": [
    {
      "title": "Fed holds rates steady",
      "url": "https://example.com/fed",
      "time_published": "20240501T180000",
      "authors": ["Jane Roe"],
      "summary": "The central bank left rates unchanged.",
      "source": "Reuters",
      "topics": [{"topic": "Economy - Monetary", "relevance_score": "0.99"}],
      "overall_sentiment_score": 0.05,
      "overall_sentiment_label": "Neutral",
      "ticker_sentiment": []
    },
    {
      "title": "Chipmaker beats estimates",
      "url": "https://example.com/chips",
      "time_published": "20240501T200500",
      "authors": [],
      "summary": "Revenue rose on data center demand.",
      "source": "CNBC",
      "topics": [],
      "overall_sentiment_score": 0.41,
      "overall_sentiment_label": "Bullish",
      "ticker_sentiment": [
        {"ticker": "NVDA", "relevance_score": "0.9", "ticker_sentiment_score": "0.5", "ticker_sentiment_label": "Bullish"}
      ]
    }
  ]
}"#;

pub const MOVERS_BODY: &str = r#"{
  "metadata": "Top gainers, losers, and most actively traded US tickers",
  "last_updated": "2024-05-01 16:15:59 US/Eastern",
  "top_gainers": [
    {"ticker": "ABCD", "price": "2.15", "change_amount": "1.05", "change_percentage": "95.45%", "volume": "1200000"}
  ],
  "top_losers": [
    {"ticker": "WXYZ", "price": "0.80", "change_amount": "-0.70", "change_percentage": "-46.67%", "volume": "350000"}
  ],
  "most_actively_traded": []
}"#;

/// Retries without real waiting
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::fast()
}

/// In-memory store that counts upsert calls
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    upserts: AtomicUsize,
}

impl MemoryStore {
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|docs| docs.iter().map(|d| d.id.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn create_collection(&self, collection: &str) -> letter_market::Result<()> {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn upsert(&self, collection: &str, documents: &[Document]) -> letter_market::Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let mut collections = self.collections.lock().unwrap();
        let stored = collections.entry(collection.to_string()).or_default();
        for doc in documents {
            match stored.iter_mut().find(|d| d.id == doc.id) {
                Some(existing) => *existing = doc.clone(),
                None => stored.push(doc.clone()),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        n_results: usize,
    ) -> letter_market::Result<Vec<SearchResult>> {
        let collections = self.collections.lock().unwrap();
        let mut hits: Vec<SearchResult> = collections
            .get(collection)
            .into_iter()
            .flatten()
            .map(|doc| SearchResult {
                distance: Some(
                    doc.embedding
                        .iter()
                        .zip(embedding)
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum(),
                ),
                document: doc.clone(),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
        hits.truncate(n_results);
        Ok(hits)
    }

    async fn get(&self, collection: &str, ids: &[String]) -> letter_market::Result<Vec<Document>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|d| ids.contains(&d.id))
            .cloned()
            .collect())
    }

    async fn count(&self, collection: &str) -> letter_market::Result<usize> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, Vec::len))
    }
}

/// Returns a fixed probability and records the claims it saw
pub struct FixedChecker {
    pub support_prob: f64,
    pub claims: Mutex<Vec<String>>,
}

impl FixedChecker {
    pub fn new(support_prob: f64) -> Self {
        Self {
            support_prob,
            claims: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FactChecker for FixedChecker {
    async fn check(&self, claim: &str, _context: &str) -> letter_market::Result<f64> {
        self.claims.lock().unwrap().push(claim.to_string());
        Ok(self.support_prob)
    }
}
