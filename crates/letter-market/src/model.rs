//! Market data models parsed from Alpha Vantage responses

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

// Feed fields may be missing or `null`; both fall back to the default.

/// Topic tag attached to a news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRelevance {
    #[serde(deserialize_with = "nullable", default)]
    pub topic: String,
    #[serde(deserialize_with = "lenient_f64", default)]
    pub relevance_score: f64,
}

/// Sentiment of one article towards one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSentiment {
    #[serde(deserialize_with = "nullable", default)]
    pub ticker: String,
    #[serde(deserialize_with = "lenient_f64", default)]
    pub relevance_score: f64,
    #[serde(rename = "ticker_sentiment_score", deserialize_with = "lenient_f64", default)]
    pub sentiment_score: f64,
    #[serde(rename = "ticker_sentiment_label", deserialize_with = "nullable", default)]
    pub sentiment_label: String,
}

/// One article from the `NEWS_SENTIMENT` feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(deserialize_with = "title_or_default", default = "no_title")]
    pub title: String,
    #[serde(deserialize_with = "nullable", default)]
    pub url: String,
    /// Raw publication stamp, e.g. `20240501T133000`
    #[serde(deserialize_with = "nullable", default)]
    pub time_published: String,
    #[serde(deserialize_with = "nullable", default)]
    pub authors: Vec<String>,
    #[serde(deserialize_with = "summary_or_default", default = "no_summary")]
    pub summary: String,
    #[serde(deserialize_with = "nullable", default)]
    pub source: String,
    #[serde(deserialize_with = "nullable", default)]
    pub topics: Vec<TopicRelevance>,
    #[serde(deserialize_with = "lenient_f64", default)]
    pub overall_sentiment_score: f64,
    #[serde(deserialize_with = "nullable", default)]
    pub overall_sentiment_label: String,
    #[serde(deserialize_with = "nullable", default)]
    pub ticker_sentiment: Vec<TickerSentiment>,
}

impl NewsItem {
    /// Text stored in the vector store for this article
    pub fn document_text(&self) -> String {
        format!("{} - {}", self.title, self.summary)
    }

    /// Parsed publication time, if the stamp is well formed
    pub fn published_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.time_published, "%Y%m%dT%H%M%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&self.time_published, "%Y%m%dT%H%M"))
            .ok()
    }
}

fn no_title() -> String {
    "No title".to_string()
}

fn no_summary() -> String {
    "No summary".to_string()
}

fn title_or_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(no_title))
}

fn summary_or_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(no_summary))
}

/// Treat `null` like a missing field
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One ticker in a movers list
///
/// Alpha Vantage sends every field as a string; they are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mover {
    pub ticker: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub change_amount: String,
    #[serde(default)]
    pub change_percentage: String,
    #[serde(default)]
    pub volume: String,
}

impl Mover {
    /// One-line description, e.g. `NVDA - $912.50 (+4.2%)`
    pub fn describe(&self) -> String {
        let pct = self.change_percentage.trim_end_matches('%');
        format!("{} - ${} ({}%)", self.ticker, self.price, pct)
    }
}

/// Movers category, also the fixed store id of its snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendCategory {
    TopGainers,
    TopLosers,
    MostActivelyTraded,
}

impl TrendCategory {
    pub const ALL: [TrendCategory; 3] = [
        TrendCategory::TopGainers,
        TrendCategory::TopLosers,
        TrendCategory::MostActivelyTraded,
    ];

    /// Response key and document id
    pub fn id(self) -> &'static str {
        match self {
            TrendCategory::TopGainers => "top_gainers",
            TrendCategory::TopLosers => "top_losers",
            TrendCategory::MostActivelyTraded => "most_actively_traded",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TrendCategory::TopGainers => "Top Gainers",
            TrendCategory::TopLosers => "Top Losers",
            TrendCategory::MostActivelyTraded => "Most Actively Traded",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}

/// Response of `TOP_GAINERS_LOSERS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerTrendsSnapshot {
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub last_updated: String,
    pub top_gainers: Vec<Mover>,
    #[serde(default)]
    pub top_losers: Vec<Mover>,
    #[serde(default)]
    pub most_actively_traded: Vec<Mover>,
}

impl TickerTrendsSnapshot {
    /// Movers in one category
    pub fn category(&self, category: TrendCategory) -> &[Mover] {
        match category {
            TrendCategory::TopGainers => &self.top_gainers,
            TrendCategory::TopLosers => &self.top_losers,
            TrendCategory::MostActivelyTraded => &self.most_actively_traded,
        }
    }
}

/// One day of OHLCV data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl DailyBar {
    /// Text stored in the vector store for this bar
    pub fn document_text(&self) -> String {
        format!(
            "{} {}: open {:.2}, high {:.2}, low {:.2}, close {:.2}, volume {}",
            self.symbol, self.date, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

/// Accept numbers sent as JSON numbers or numeric strings; `null` and
/// blank strings read as 0
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(f64),
        Str(String),
    }

    match Option::<NumOrString>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumOrString::Num(n)) => Ok(n),
        Some(NumOrString::Str(s)) if s.trim().is_empty() => Ok(0.0),
        Some(NumOrString::Str(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
