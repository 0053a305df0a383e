//! Client construction from secrets and configuration

use anyhow::{Context as _, Result, anyhow};
use letter_llm::providers::{OpenAIConfig, OpenAIEmbeddings, OpenAIProvider};
use letter_market::prompts::Prompts;
use letter_market::{
    AlphaVantageClient, ChromaStore, FactChecker, MiniCheckClient, NewsletterConfig, RagHelper,
    RetryPolicy, Summarizer,
};
use letter_utils::Secrets;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Loaded settings; clients are built per command
pub struct App {
    pub secrets: Secrets,
    pub config: NewsletterConfig,
}

impl App {
    /// Load secrets (file plus environment) and build the configuration
    pub fn load(path: Option<&Path>, cache_dir: &Path) -> Result<Self> {
        let secrets = Secrets::load(path).context("Failed to load secrets")?;
        let config = NewsletterConfig::builder()
            .secrets(&secrets)
            .cache_dir(cache_dir)
            .build()
            .context("Invalid configuration")?;

        debug!(
            "Configuration: model={}, chroma={}",
            config.model, config.chroma_url
        );
        Ok(Self { secrets, config })
    }

    /// Map a short collection name to its configured name
    pub fn collection<'a>(&'a self, name: &'a str) -> &'a str {
        let collections = &self.config.collections;
        match name {
            "news" => &collections.news,
            "trends" => &collections.trends,
            "market" | "market-data" => &collections.market_data,
            other => other,
        }
    }

    pub fn alpha_vantage(&self) -> Result<AlphaVantageClient> {
        Ok(AlphaVantageClient::from_config(&self.config)?)
    }

    fn openai_config(&self) -> Result<OpenAIConfig> {
        let openai = &self.secrets.openai;
        let api_key = openai.api_key.as_deref().ok_or_else(|| {
            anyhow!("OpenAI API key missing; set [openai] api_key or OPENAI_API_KEY")
        })?;

        let mut config = OpenAIConfig::new(api_key);
        if let Some(base) = &openai.api_base {
            config = config.with_api_base(base.as_str());
        }
        if let Some(model) = &openai.embedding_model {
            config = config.with_embedding_model(model.as_str());
        }
        Ok(config)
    }

    /// Chroma store plus OpenAI embeddings
    pub fn rag(&self) -> Result<RagHelper> {
        let store = ChromaStore::from_config(&self.config)?;
        let embeddings = OpenAIEmbeddings::with_config(self.openai_config()?)?;
        info!("Using Chroma at {}", self.config.chroma_url);
        Ok(RagHelper::new(Arc::new(store), Arc::new(embeddings))
            .with_retry_policy(RetryPolicy::from_config(&self.config)))
    }

    /// OpenAI chat completions with the built-in prompts
    pub fn summarizer(&self) -> Result<Summarizer> {
        let provider = OpenAIProvider::with_config(self.openai_config()?)?;
        Ok(Summarizer::new(
            Arc::new(provider),
            Arc::new(Prompts::new()?),
            &self.config,
        ))
    }

    /// MiniCheck client, when a Bespoke Labs key is configured
    pub fn fact_checker(&self) -> Result<Option<Arc<dyn FactChecker>>> {
        Ok(MiniCheckClient::from_config(&self.config)?
            .map(|client| Arc::new(client) as Arc<dyn FactChecker>))
    }
}
