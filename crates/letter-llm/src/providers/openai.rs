//! OpenAI provider implementation
//!
//! Implements [`LLMProvider`] over the chat completions endpoint and
//! [`EmbeddingProvider`] over the embeddings endpoint.
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! # Examples
//!
//! ```no_run
//! use letter_llm::{CompletionRequest, Message, LLMProvider};
//! use letter_llm::providers::OpenAIProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create provider from OPENAI_API_KEY environment variable
//!     let provider = OpenAIProvider::from_env()?;
//!
//!     let request = CompletionRequest::builder("gpt-4")
//!         .system("You are an expert financial analyst.")
//!         .add_message(Message::user("Summarize today's market."))
//!         .max_tokens(500)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.text());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Using with OpenAI-compatible APIs
//!
//! ```no_run
//! use letter_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // For local deployments (e.g., llama.cpp, vLLM, LM Studio)
//! let local_config = OpenAIConfig::new("not-needed")
//!     .with_api_base("http://localhost:8000/v1");
//!
//! let provider = OpenAIProvider::with_config(local_config)?;
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, EmbeddingProvider, LLMError, LLMProvider, Message,
    Result, Role, StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Most inputs the embeddings endpoint accepts in one request
pub const MAX_EMBEDDING_INPUTS: usize = 2048;

/// Configuration for OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the OpenAI API (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Model used for embeddings (default: "text-embedding-3-small")
    pub embedding_model: String,

    /// Inputs sent per embeddings request (default: 2048)
    pub embedding_batch_size: usize,

    /// Optional list of supported chat models
    /// If None, any model string is accepted
    pub supported_models: Option<Vec<String>>,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `OPENAI_API_KEY`. Optionally reads the base URL
    /// from `OPENAI_API_BASE` and the embedding model from
    /// `OPENAI_EMBEDDING_MODEL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            LLMError::ConfigurationError("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let mut config = Self::new(api_key);
        if let Ok(api_base) = std::env::var("OPENAI_API_BASE") {
            config.api_base = api_base;
        }
        if let Ok(model) = std::env::var("OPENAI_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        Ok(config)
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the embedding model
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Set how many inputs go into one embeddings request
    pub fn with_embedding_batch_size(mut self, size: usize) -> Self {
        self.embedding_batch_size = size.clamp(1, MAX_EMBEDDING_INPUTS);
        self
    }

    /// Set supported models list
    pub fn with_supported_models(mut self, models: Vec<String>) -> Self {
        self.supported_models = Some(models);
        self
    }

    fn build_client(&self) -> Result<Client> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?)
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_batch_size: MAX_EMBEDDING_INPUTS,
            supported_models: None,
        }
    }
}

/// OpenAI chat completion provider
///
/// Also compatible with OpenAI-compatible APIs through custom configuration.
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// Create a new OpenAI provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Validate model name against supported models list (if configured)
    fn validate_model(&self, model: &str) -> Result<()> {
        if let Some(supported) = &self.config.supported_models {
            if !supported.iter().any(|m| m == model) {
                return Err(LLMError::InvalidRequest(format!(
                    "Model '{model}' is not in the supported models list: {supported:?}"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to OpenAI API at {}", self.config.api_base);

        self.validate_model(&request.model)?;

        let openai_request = OpenAIRequest {
            model: request.model.clone(),
            messages: build_openai_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop_sequences,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await?;

        let response = check_status(response, &request.model).await?;

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        // OpenAI can return multiple choices but we use the first
        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let usage = openai_response.usage.unwrap_or_default();
        debug!(
            "Received response - stop_reason: {}, tokens: {}/{}",
            choice.finish_reason.as_deref().unwrap_or("none"),
            usage.prompt_tokens,
            usage.completion_tokens
        );

        let stop_reason = map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop"));
        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() && stop_reason != StopReason::ContentFilter {
            return Err(LLMError::UnexpectedResponse(
                "Completion contained no text".to_string(),
            ));
        }

        Ok(CompletionResponse {
            message: Message::assistant(content),
            stop_reason,
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// OpenAI embeddings client
pub struct OpenAIEmbeddings {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIEmbeddings {
    /// Create an embeddings client with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// Create an embeddings client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

impl OpenAIEmbeddings {
    /// One embeddings request, vectors in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&EmbeddingRequest {
                model: &self.config.embedding_model,
                input: texts,
            })
            .send()
            .await?;

        let response = check_status(response, &self.config.embedding_model).await?;

        let mut body: EmbeddingResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse embeddings: {e}"))
        })?;

        if body.data.len() != texts.len() {
            return Err(LLMError::UnexpectedResponse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        // The API reports an index per vector; order by it rather than trusting list order
        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    #[instrument(skip(self, texts), fields(model = %self.config.embedding_model, count = texts.len()))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.embedding_batch_size.max(1)) {
            vectors.extend(self.embed_batch(batch).await?);
        }

        debug!("Embedded {} texts", vectors.len());
        Ok(vectors)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Map non-success HTTP statuses to typed errors
async fn check_status(response: Response, model: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await?;
    Err(match status.as_u16() {
        401 => LLMError::AuthenticationFailed,
        429 => LLMError::RateLimitExceeded(error_text),
        400 => LLMError::InvalidRequest(error_text),
        404 => LLMError::ModelNotFound(model.to_string()),
        code @ 500..=599 => LLMError::ServerError {
            status: code,
            message: error_text,
        },
        _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
    })
}

// ============================================================================
// OpenAI-specific wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Build OpenAI messages; the system prompt goes first in the messages array
fn build_openai_messages(system: Option<String>, messages: Vec<Message>) -> Vec<OpenAIMessage> {
    let mut result = Vec::with_capacity(messages.len() + 1);

    if let Some(sys) = system {
        result.push(OpenAIMessage {
            role: Role::System.as_str(),
            content: sys,
        });
    }

    result.extend(messages.into_iter().map(|msg| OpenAIMessage {
        role: msg.role.as_str(),
        content: msg.content,
    }));

    result
}

/// Map OpenAI stop reason to our format
fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => {
            debug!("Content filtered by OpenAI safety systems");
            StopReason::ContentFilter
        }
        _ => {
            debug!("Unknown stop reason: {}", reason);
            StopReason::EndTurn
        }
    }
}
