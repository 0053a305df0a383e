//! Configuration for newsletter operations

use crate::error::{NewsletterError, Result};
use letter_utils::Secrets;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Alpha Vantage query endpoint
pub const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";
/// Bespoke Labs API root
pub const BESPOKE_BASE_URL: &str = "https://api.bespokelabs.ai";
/// Local Chroma server
pub const CHROMA_URL: &str = "http://localhost:8000";

/// Names of the vector-store collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    pub news: String,
    pub trends: String,
    pub market_data: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            news: "news_collection".to_string(),
            trends: "trends_collection".to_string(),
            market_data: "market_data".to_string(),
        }
    }
}

/// Configuration for the newsletter pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterConfig {
    /// Alpha Vantage API key
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage query endpoint
    pub alpha_vantage_base_url: String,

    /// Client-side request budget per minute
    pub rate_limit_per_minute: u32,

    /// Bespoke Labs API key (fact-checking is skipped without one)
    pub bespoke_api_key: Option<String>,

    /// Bespoke Labs API root
    pub bespoke_base_url: String,

    /// Chroma server URL
    pub chroma_url: String,

    /// Chroma tenant
    pub chroma_tenant: String,

    /// Chroma database
    pub chroma_database: String,

    /// Chat model used by every role
    pub model: String,

    /// Completion token cap per call
    pub max_tokens: usize,

    /// Sampling temperature (provider default when unset)
    pub temperature: Option<f32>,

    /// Cache TTL for news and movers
    pub cache_ttl_news: Duration,

    /// Cache TTL for daily price series
    pub cache_ttl_daily: Duration,

    /// Directory for response cache files (memory only when unset)
    pub cache_dir: Option<PathBuf>,

    /// Maximum attempts for transient failures
    pub max_retries: u32,

    /// Initial backoff duration for retries
    pub retry_backoff_base: Duration,

    /// Request timeout for data APIs
    pub request_timeout: Duration,

    /// Longest input summarised in one call
    pub max_chunk_chars: usize,

    /// Bound on recursive summary rounds
    pub max_summary_rounds: usize,

    /// Chunk summaries in flight at once
    pub chunk_concurrency: usize,

    /// Documents retrieved per query
    pub n_results: usize,

    /// Chat turns kept in a session
    pub chat_history_turns: usize,

    /// Collection names
    pub collections: Collections,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            alpha_vantage_base_url: ALPHA_VANTAGE_BASE_URL.to_string(),
            rate_limit_per_minute: 5,
            bespoke_api_key: None,
            bespoke_base_url: BESPOKE_BASE_URL.to_string(),
            chroma_url: CHROMA_URL.to_string(),
            chroma_tenant: "default_tenant".to_string(),
            chroma_database: "default_database".to_string(),
            model: "gpt-4".to_string(),
            max_tokens: 2048,
            temperature: None,
            cache_ttl_news: Duration::from_secs(300), // 5 minutes
            cache_ttl_daily: Duration::from_secs(3600), // 1 hour
            cache_dir: None,
            max_retries: 3,
            retry_backoff_base: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
            max_chunk_chars: 12_000,
            max_summary_rounds: 4,
            chunk_concurrency: 4,
            n_results: 5,
            chat_history_turns: 10,
            collections: Collections::default(),
        }
    }
}

impl NewsletterConfig {
    /// Create a new configuration builder
    pub fn builder() -> NewsletterConfigBuilder {
        NewsletterConfigBuilder::default()
    }

    /// Alpha Vantage key, required for any fetch
    pub fn require_alpha_vantage_key(&self) -> Result<&str> {
        self.alpha_vantage_api_key.as_deref().ok_or_else(|| {
            NewsletterError::Config(
                "Alpha Vantage API key missing; set [alpha_vantage] api_key or ALPHA_VANTAGE_API_KEY"
                    .to_string(),
            )
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(NewsletterError::Config(
                "max_retries must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_per_minute == 0 {
            return Err(NewsletterError::Config(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.max_chunk_chars < 100 {
            return Err(NewsletterError::Config(
                "max_chunk_chars must be at least 100".to_string(),
            ));
        }

        if self.max_summary_rounds == 0 || self.chunk_concurrency == 0 {
            return Err(NewsletterError::Config(
                "max_summary_rounds and chunk_concurrency must be greater than 0".to_string(),
            ));
        }

        if self.n_results == 0 || self.chat_history_turns == 0 {
            return Err(NewsletterError::Config(
                "n_results and chat_history_turns must be greater than 0".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(NewsletterError::Config("model must not be empty".to_string()));
        }

        for (name, value) in [
            ("alpha_vantage_base_url", &self.alpha_vantage_base_url),
            ("bespoke_base_url", &self.bespoke_base_url),
            ("chroma_url", &self.chroma_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| NewsletterError::Config(format!("{name} '{value}' is invalid: {e}")))?;
        }

        Ok(())
    }
}

/// Builder for NewsletterConfig
#[derive(Debug, Default)]
pub struct NewsletterConfigBuilder {
    config: NewsletterConfig,
}

impl NewsletterConfigBuilder {
    /// Take keys and endpoints from loaded secrets
    pub fn secrets(mut self, secrets: &Secrets) -> Self {
        let c = &mut self.config;
        if let Some(key) = &secrets.alpha_vantage.api_key {
            c.alpha_vantage_api_key = Some(key.clone());
        }
        if let Some(key) = &secrets.bespoke_labs.api_key {
            c.bespoke_api_key = Some(key.clone());
        }
        if let Some(model) = &secrets.openai.model {
            c.model.clone_from(model);
        }
        if let Some(url) = &secrets.chroma.url {
            c.chroma_url.clone_from(url);
        }
        if let Some(tenant) = &secrets.chroma.tenant {
            c.chroma_tenant.clone_from(tenant);
        }
        if let Some(database) = &secrets.chroma.database {
            c.chroma_database.clone_from(database);
        }
        self
    }

    /// Keep fetched responses in this directory between runs
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = Some(dir.into());
        self
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.alpha_vantage_api_key = Some(key.into());
        self
    }

    /// Set Alpha Vantage endpoint
    pub fn alpha_vantage_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.alpha_vantage_base_url = url.into();
        self
    }

    /// Set requests per minute
    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.config.rate_limit_per_minute = limit;
        self
    }

    /// Set Bespoke Labs API key
    pub fn bespoke_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.bespoke_api_key = Some(key.into());
        self
    }

    /// Set Bespoke Labs API root
    pub fn bespoke_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.bespoke_base_url = url.into();
        self
    }

    /// Set Chroma server URL
    pub fn chroma_url(mut self, url: impl Into<String>) -> Self {
        self.config.chroma_url = url.into();
        self
    }

    /// Set the chat model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set completion token cap
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set cache TTL for news and movers
    pub fn cache_ttl_news(mut self, duration: Duration) -> Self {
        self.config.cache_ttl_news = duration;
        self
    }

    /// Set cache TTL for daily series
    pub fn cache_ttl_daily(mut self, duration: Duration) -> Self {
        self.config.cache_ttl_daily = duration;
        self
    }

    /// Set maximum attempts
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.config.retry_backoff_base = duration;
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.config.request_timeout = duration;
        self
    }

    /// Set the chunk size for summaries
    pub fn max_chunk_chars(mut self, chars: usize) -> Self {
        self.config.max_chunk_chars = chars;
        self
    }

    /// Set the bound on summary rounds
    pub fn max_summary_rounds(mut self, rounds: usize) -> Self {
        self.config.max_summary_rounds = rounds;
        self
    }

    /// Set chunk concurrency
    pub fn chunk_concurrency(mut self, n: usize) -> Self {
        self.config.chunk_concurrency = n;
        self
    }

    /// Set documents retrieved per query
    pub fn n_results(mut self, n: usize) -> Self {
        self.config.n_results = n;
        self
    }

    /// Set chat turns kept per session
    pub fn chat_history_turns(mut self, turns: usize) -> Self {
        self.config.chat_history_turns = turns;
        self
    }

    /// Set collection names
    pub fn collections(mut self, collections: Collections) -> Self {
        self.config.collections = collections;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<NewsletterConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
