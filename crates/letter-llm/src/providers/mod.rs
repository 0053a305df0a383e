//! Concrete provider implementations for OpenAI-compatible APIs

pub mod openai;

pub use openai::{OpenAIConfig, OpenAIEmbeddings, OpenAIProvider};
