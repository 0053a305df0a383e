//! LLM provider abstraction layer for market-newsletter
//!
//! This crate provides provider-agnostic abstractions for the two hosted
//! model calls the newsletter pipeline makes:
//!
//! - Chat completions (single-turn prompts and chat history) via [`LLMProvider`]
//! - Text embeddings for the vector store via [`EmbeddingProvider`]
//!
//! Concrete OpenAI-compatible implementations live behind the `openai` feature.

pub mod completion;
pub mod embedding;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use embedding::EmbeddingProvider;
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
