//! Bespoke Labs MiniCheck fact-checking client
//!
//! MiniCheck scores how well a context supports a claim. The score is turned
//! into a [`FactCheckReport`] with one of three verdicts.

use crate::config::{BESPOKE_BASE_URL, NewsletterConfig};
use crate::error::{NewsletterError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SERVICE: &str = "Bespoke Labs";
const FACTCHECK_PATH: &str = "/v0/argus/minicheck/factcheck";

/// Probability at or above which a claim counts as supported
pub const SUPPORTED_THRESHOLD: f64 = 0.8;
/// Probability at or above which a claim counts as partially supported
pub const PARTIAL_THRESHOLD: f64 = 0.5;

/// Scores a claim against a context
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FactChecker: Send + Sync {
    /// Support probability in `[0, 1]`
    async fn check(&self, claim: &str, context: &str) -> Result<f64>;
}

/// Bucketed outcome of a fact check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Supported,
    PartiallySupported,
    Unsupported,
}

impl Verdict {
    /// Bucket a support probability
    pub fn from_probability(support_prob: f64) -> Self {
        if support_prob >= SUPPORTED_THRESHOLD {
            Verdict::Supported
        } else if support_prob >= PARTIAL_THRESHOLD {
            Verdict::PartiallySupported
        } else {
            Verdict::Unsupported
        }
    }

    /// Message shown to the reader
    pub fn message(self) -> &'static str {
        match self {
            Verdict::Supported => "The newsletter is well supported by the source data.",
            Verdict::PartiallySupported => {
                "The newsletter is partially supported; review before publishing."
            }
            Verdict::Unsupported => "The newsletter is not supported by the source data.",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::Supported => "Supported",
            Verdict::PartiallySupported => "Partially supported",
            Verdict::Unsupported => "Unsupported",
        };
        f.write_str(label)
    }
}

/// Result of checking a newsletter against its sources
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactCheckReport {
    pub support_prob: f64,
    /// `support_prob * 100`, rounded to two decimals
    pub score_percent: f64,
    pub verdict: Verdict,
}

impl FactCheckReport {
    /// Build a report, rejecting probabilities outside `[0, 1]`
    pub fn from_probability(support_prob: f64) -> Result<Self> {
        if !support_prob.is_finite() || !(0.0..=1.0).contains(&support_prob) {
            return Err(NewsletterError::FactCheck(format!(
                "Unexpected support probability: {support_prob}"
            )));
        }

        Ok(Self {
            support_prob,
            score_percent: (support_prob * 10_000.0).round() / 100.0,
            verdict: Verdict::from_probability(support_prob),
        })
    }
}

/// Check a claim and build a report
///
/// Empty input is rejected before the checker is called.
pub async fn assess(
    checker: &dyn FactChecker,
    claim: &str,
    context: &str,
) -> Result<FactCheckReport> {
    validate_inputs(claim, context)?;
    let support_prob = checker.check(claim, context).await?;
    let report = FactCheckReport::from_probability(support_prob)?;
    info!(
        "Fact check: {}% ({})",
        report.score_percent, report.verdict
    );
    Ok(report)
}

fn validate_inputs(claim: &str, context: &str) -> Result<()> {
    if claim.trim().is_empty() {
        return Err(NewsletterError::Validation(
            "Fact-check claim is empty".to_string(),
        ));
    }
    if context.trim().is_empty() {
        return Err(NewsletterError::Validation(
            "Fact-check context is empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct FactCheckRequest<'a> {
    claim: &'a str,
    context: &'a str,
}

#[derive(Debug, Deserialize)]
struct FactCheckResponse {
    support_prob: Option<f64>,
}

/// HTTP client for the MiniCheck endpoint
#[derive(Clone)]
pub struct MiniCheckClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl MiniCheckClient {
    /// Create a client with default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: BESPOKE_BASE_URL.to_string(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client from the pipeline configuration, if a key is configured
    pub fn from_config(config: &NewsletterConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.bespoke_api_key.as_deref() else {
            return Ok(None);
        };

        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Some(Self {
            client,
            base_url: config.bespoke_base_url.clone(),
            api_key: api_key.to_string(),
            retry: RetryPolicy::from_config(config),
        }))
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request(&self, claim: &str, context: &str) -> Result<f64> {
        let url = format!("{}{}", self.base_url, FACTCHECK_PATH);
        debug!("POST {} (claim {} chars, context {} chars)", url, claim.len(), context.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&FactCheckRequest { claim, context })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NewsletterError::Status {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body: FactCheckResponse = response.json().await?;
        body.support_prob.ok_or_else(|| NewsletterError::MissingKey {
            service: SERVICE.to_string(),
            key: "support_prob".to_string(),
        })
    }
}

#[async_trait]
impl FactChecker for MiniCheckClient {
    #[instrument(skip_all)]
    async fn check(&self, claim: &str, context: &str) -> Result<f64> {
        validate_inputs(claim, context)?;
        let support_prob = self
            .retry
            .execute("minicheck", || self.request(claim, context))
            .await?;

        FactCheckReport::from_probability(support_prob).map(|r| r.support_prob)
    }
}
