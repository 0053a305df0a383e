//! The four roles of the newsletter crew

use crate::summarize::Summarizer;
use crate::prompts::ANALYST_SYSTEM;
use async_trait::async_trait;
use letter_core::context::keys;
use letter_core::{Agent, Context, Result};
use tracing::{debug, info};

/// Text used when no news documents were retrieved
pub const NO_COMPANY_INSIGHTS: &str = "No company insights available.";
/// Text used when no movers documents were retrieved
pub const NO_MARKET_TRENDS: &str = "No market trends available.";

/// Summarise the documents under `documents_key`, or fall back to `canned`
async fn summarize_or_canned(
    summarizer: &Summarizer,
    context: &Context,
    documents_key: &str,
    label: &str,
    canned: &str,
) -> Result<String> {
    let documents = context.documents(documents_key);
    if documents.is_empty() {
        info!("No documents for {}, using placeholder", label);
        return Ok(canned.to_string());
    }

    debug!("Summarizing {} documents for {}", documents.len(), label);
    Ok(summarizer.summarize_documents(&documents, label).await?)
}

/// Summarises retrieved news into company insights
pub struct CompanyAnalyst {
    summarizer: Summarizer,
}

impl CompanyAnalyst {
    pub fn new(summarizer: Summarizer) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl Agent for CompanyAnalyst {
    async fn process(&self, _input: String, context: &mut Context) -> Result<String> {
        let insights = summarize_or_canned(
            &self.summarizer,
            context,
            keys::NEWS_DOCUMENTS,
            "company insights",
            NO_COMPANY_INSIGHTS,
        )
        .await?;
        context.set_text(keys::COMPANY_INSIGHTS, insights.clone());
        Ok(insights)
    }

    fn name(&self) -> &str {
        "CompanyAnalyst"
    }

    fn output_key(&self) -> Option<&str> {
        Some(keys::COMPANY_INSIGHTS)
    }
}

/// Summarises retrieved movers into market trends
pub struct MarketTrendsAnalyst {
    summarizer: Summarizer,
}

impl MarketTrendsAnalyst {
    pub fn new(summarizer: Summarizer) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl Agent for MarketTrendsAnalyst {
    async fn process(&self, _input: String, context: &mut Context) -> Result<String> {
        let trends = summarize_or_canned(
            &self.summarizer,
            context,
            keys::TREND_DOCUMENTS,
            "market trends",
            NO_MARKET_TRENDS,
        )
        .await?;
        context.set_text(keys::MARKET_TRENDS, trends.clone());
        Ok(trends)
    }

    fn name(&self) -> &str {
        "MarketTrendsAnalyst"
    }

    fn output_key(&self) -> Option<&str> {
        Some(keys::MARKET_TRENDS)
    }
}

/// Assesses macroeconomic, sector and stock risks from both summaries
pub struct RiskManager {
    summarizer: Summarizer,
}

impl RiskManager {
    pub fn new(summarizer: Summarizer) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl Agent for RiskManager {
    async fn process(&self, _input: String, context: &mut Context) -> Result<String> {
        let company = context.require_text(keys::COMPANY_INSIGHTS)?;
        let trends = context.require_text(keys::MARKET_TRENDS)?;

        let prompt = self.summarizer.prompts().risks(company, trends)?;
        let risks = self.summarizer.complete(ANALYST_SYSTEM, prompt).await?;

        context.set_text(keys::RISKS, risks.clone());
        Ok(risks)
    }

    fn name(&self) -> &str {
        "RiskManager"
    }

    fn output_key(&self) -> Option<&str> {
        Some(keys::RISKS)
    }
}

/// Writes the newsletter from the three sections
pub struct NewsletterWriter {
    summarizer: Summarizer,
}

impl NewsletterWriter {
    pub fn new(summarizer: Summarizer) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl Agent for NewsletterWriter {
    async fn process(&self, _input: String, context: &mut Context) -> Result<String> {
        let newsletter = self
            .summarizer
            .generate_newsletter(
                context.require_text(keys::COMPANY_INSIGHTS)?,
                context.require_text(keys::MARKET_TRENDS)?,
                context.require_text(keys::RISKS)?,
                context.as_of(),
            )
            .await?;

        context.set_text(keys::NEWSLETTER, newsletter.clone());
        Ok(newsletter)
    }

    fn name(&self) -> &str {
        "NewsletterWriter"
    }

    fn output_key(&self) -> Option<&str> {
        Some(keys::NEWSLETTER)
    }
}
