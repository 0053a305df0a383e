//! Newsletter run: retrieve, analyse, assess risks, write, fact-check

use super::roles::{CompanyAnalyst, MarketTrendsAnalyst, NewsletterWriter, RiskManager};
use crate::api::{FactCheckReport, FactChecker, assess};
use crate::config::{Collections, NewsletterConfig};
use crate::error::Result;
use crate::rag::RagHelper;
use crate::summarize::Summarizer;
use letter_core::context::keys;
use letter_core::{Agent, Context};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Query text for the news collection
pub const COMPANY_QUERY: &str = "latest company news";
/// Query text for the trends collection
pub const TRENDS_QUERY: &str = "latest market trends";

/// Output of one crew run
#[derive(Debug, Clone, Serialize)]
pub struct Newsletter {
    pub run_id: String,
    pub as_of: String,
    pub text: String,
    pub company_insights: String,
    pub market_trends: String,
    pub risks: String,
    /// Retrieved news and movers documents, news first
    pub context_documents: Vec<String>,
    pub fact_check: Option<FactCheckReport>,
    /// Why the fact-check was requested but did not produce a report
    pub fact_check_error: Option<String>,
}

/// The fixed sequence of roles that writes the newsletter
pub struct NewsletterCrew {
    rag: RagHelper,
    company_analyst: CompanyAnalyst,
    trends_analyst: MarketTrendsAnalyst,
    risk_manager: RiskManager,
    writer: NewsletterWriter,
    fact_checker: Option<Arc<dyn FactChecker>>,
    collections: Collections,
    n_results: usize,
}

impl NewsletterCrew {
    pub fn new(
        rag: RagHelper,
        summarizer: Summarizer,
        fact_checker: Option<Arc<dyn FactChecker>>,
        config: &NewsletterConfig,
    ) -> Self {
        Self {
            rag,
            company_analyst: CompanyAnalyst::new(summarizer.clone()),
            trends_analyst: MarketTrendsAnalyst::new(summarizer.clone()),
            risk_manager: RiskManager::new(summarizer.clone()),
            writer: NewsletterWriter::new(summarizer),
            fact_checker,
            collections: config.collections.clone(),
            n_results: config.n_results,
        }
    }

    /// Whether a fact-check client is configured
    pub fn can_fact_check(&self) -> bool {
        self.fact_checker.is_some()
    }

    /// Run the crew once
    #[instrument(skip(self))]
    pub async fn run(&self, fact_check: bool) -> Result<Newsletter> {
        let run_id = Uuid::new_v4().to_string();
        let as_of = chrono::Local::now().date_naive().to_string();
        info!("Starting newsletter run {}", run_id);

        let (news, trends) = tokio::join!(
            self.rag
                .query_texts(&self.collections.news, COMPANY_QUERY, self.n_results),
            self.rag
                .query_texts(&self.collections.trends, TRENDS_QUERY, self.n_results),
        );
        let (news, trends) = (news?, trends?);
        info!(
            "Retrieved {} news and {} trend documents",
            news.len(),
            trends.len()
        );

        let mut context = Context::new()
            .with_run_id(run_id.as_str())
            .with_as_of(as_of.as_str());
        context.set_documents(keys::NEWS_DOCUMENTS, &news);
        context.set_documents(keys::TREND_DOCUMENTS, &trends);

        // The analysts work on their own copies and the results are merged back
        let mut company_context = context.clone();
        let mut trends_context = context.clone();
        let (company, market) = tokio::join!(
            self.company_analyst
                .process(String::new(), &mut company_context),
            self.trends_analyst
                .process(String::new(), &mut trends_context),
        );
        let company_insights = company?;
        let market_trends = market?;
        context.set_text(keys::COMPANY_INSIGHTS, company_insights.as_str());
        context.set_text(keys::MARKET_TRENDS, market_trends.as_str());

        let risks = self.risk_manager.process(String::new(), &mut context).await?;
        let text = self.writer.process(String::new(), &mut context).await?;
        info!("{} wrote {} chars", self.writer.name(), text.len());

        let context_documents: Vec<String> = news.into_iter().chain(trends).collect();
        let (fact_check, fact_check_error) = if fact_check {
            self.fact_check(&text, &context_documents).await
        } else {
            (None, None)
        };

        Ok(Newsletter {
            run_id,
            as_of,
            text,
            company_insights,
            market_trends,
            risks,
            context_documents,
            fact_check,
            fact_check_error,
        })
    }

    /// A failed check is reported next to the newsletter instead of discarding it
    async fn fact_check(
        &self,
        text: &str,
        documents: &[String],
    ) -> (Option<FactCheckReport>, Option<String>) {
        let Some(checker) = &self.fact_checker else {
            warn!("Fact-check requested but no Bespoke Labs API key is configured");
            return (None, Some("no Bespoke Labs API key configured".to_string()));
        };
        if documents.is_empty() {
            warn!("Skipping fact-check: no source documents were retrieved");
            return (None, Some("no source documents to check against".to_string()));
        }

        match assess(checker.as_ref(), text, &documents.join("\n")).await {
            Ok(report) => (Some(report), None),
            Err(e) => {
                warn!("Fact-check failed: {}", e);
                (None, Some(e.to_string()))
            }
        }
    }
}
