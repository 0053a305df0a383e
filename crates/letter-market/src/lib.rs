//! Market newsletter pipeline
//!
//! This crate fetches market news and movers, stores them in a vector store
//! and turns them into a daily newsletter. It includes:
//!
//! - Alpha Vantage client with rate limiting, caching and retries
//! - Chroma vector store client behind the [`store::VectorStore`] trait
//! - Retrieval helper that embeds documents and queries
//! - Chunked summarisation and MiniJinja prompt templates
//! - The newsletter crew (company analyst, market trends analyst, risk
//!   manager, newsletter writer)
//! - Bespoke Labs MiniCheck fact-checking
//! - Chat sessions grounded in the stored news
//!
//! # Example
//!
//! ```rust,ignore
//! use letter_market::{NewsletterConfig, NewsletterCrew, RagHelper, Summarizer};
//! use letter_market::prompts::Prompts;
//! use letter_market::store::ChromaStore;
//! use letter_llm::providers::openai::{OpenAIEmbeddings, OpenAIProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = NewsletterConfig::default();
//!     let rag = RagHelper::new(
//!         Arc::new(ChromaStore::from_config(&config)?),
//!         Arc::new(OpenAIEmbeddings::from_env()?),
//!     );
//!     let summarizer = Summarizer::new(
//!         Arc::new(OpenAIProvider::from_env()?),
//!         Arc::new(Prompts::new()?),
//!         &config,
//!     );
//!
//!     let crew = NewsletterCrew::new(rag, summarizer, None, &config);
//!     let newsletter = crew.run(false).await?;
//!     println!("{}", newsletter.text);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod chat;
pub mod config;
pub mod crew;
pub mod error;
pub mod ingest;
pub mod model;
pub mod prompts;
pub mod rag;
pub mod retry;
pub mod store;
pub mod summarize;


// Re-export main types for convenience
pub use api::{AlphaVantageClient, FactCheckReport, FactChecker, MiniCheckClient, Verdict};
pub use chat::ChatSession;
pub use config::{Collections, NewsletterConfig};
pub use crew::{Newsletter, NewsletterCrew};
pub use error::{NewsletterError, Result};
pub use model::{DailyBar, Mover, NewsItem, TickerTrendsSnapshot, TrendCategory};
pub use rag::RagHelper;
pub use retry::RetryPolicy;
pub use store::{ChromaStore, Document, SearchResult, VectorStore};
pub use summarize::Summarizer;
