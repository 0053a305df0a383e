//! Error types for newsletter operations

use thiserror::Error;

/// Newsletter pipeline errors
#[derive(Debug, Error)]
pub enum NewsletterError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from an external service
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    /// Error reported in the body of an otherwise successful response
    #[error("API error: {0}")]
    Api(String),

    /// Quota or rate limit reported by the data provider
    #[error("Rate limit exceeded for {provider}: {message}")]
    RateLimited { provider: String, message: String },

    /// Response lacked a required top-level key
    #[error("{service} response is missing '{key}'")]
    MissingKey { service: String, key: String },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Completion or embedding call failed
    #[error("LLM error: {0}")]
    Llm(#[from] letter_llm::LLMError),

    /// Vector store error
    #[error("Vector store error: {0}")]
    Store(String),

    /// Fact-check service error
    #[error("Fact-check error: {0}")]
    FactCheck(String),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Role agent failure
    #[error("Agent error: {0}")]
    Agent(String),

    /// Prompt template error
    #[error("Prompt error: {0}")]
    Prompt(#[from] minijinja::Error),
}

/// Result type alias for newsletter operations
pub type Result<T> = std::result::Result<T, NewsletterError>;

impl NewsletterError {
    /// Whether retrying the same call later could succeed
    ///
    /// Quota notices in a 200 body are not transient: the daily limit does
    /// not lift within a backoff window.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Llm(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Convert NewsletterError to letter_core::Error
impl From<NewsletterError> for letter_core::Error {
    fn from(err: NewsletterError) -> Self {
        letter_core::Error::ProcessingFailed(err.to_string())
    }
}

/// Convert letter_core::Error to NewsletterError
impl From<letter_core::Error> for NewsletterError {
    fn from(err: letter_core::Error) -> Self {
        NewsletterError::Agent(err.to_string())
    }
}
