//! Alpha Vantage API client

use crate::cache::{CacheKey, FetchCache};
use crate::config::NewsletterConfig;
use crate::error::{NewsletterError, Result};
use crate::model::{DailyBar, NewsItem, TickerTrendsSnapshot};
use crate::retry::RetryPolicy;
use chrono::NaiveDate;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const SERVICE: &str = "Alpha Vantage";

/// Default number of articles requested from the news feed
pub const DEFAULT_NEWS_LIMIT: u32 = 50;
/// Default sort order of the news feed
pub const DEFAULT_NEWS_SORT: &str = "RELEVANCE";

/// Cache file for news and movers inside the cache directory
pub const MARKET_CACHE_FILE: &str = "alpha_vantage_market.json";
/// Cache file for daily series inside the cache directory
pub const DAILY_CACHE_FILE: &str = "alpha_vantage_daily.json";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
///
/// Every request waits on a shared rate limiter, is retried on transient
/// failures, and is cached by function and parameters.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: SharedRateLimiter,
    retry: RetryPolicy,
    market_ttl: Duration,
    daily_ttl: Duration,
    cache_dir: Option<PathBuf>,
    market_cache: FetchCache,
    daily_cache: FetchCache,
}

fn build_cache(ttl: Duration, dir: Option<&Path>, file: &str) -> FetchCache {
    match dir {
        Some(dir) => FetchCache::persistent(ttl, dir.join(file)),
        None => FetchCache::new(ttl),
    }
}

impl AlphaVantageClient {
    /// Create a client with the given key and requests-per-minute budget
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Result<Self> {
        let config = NewsletterConfig {
            alpha_vantage_api_key: Some(api_key.into()),
            rate_limit_per_minute: rate_limit,
            ..NewsletterConfig::default()
        };
        Self::from_config(&config)
    }

    /// Create a client from the pipeline configuration
    pub fn from_config(config: &NewsletterConfig) -> Result<Self> {
        let api_key = config.require_alpha_vantage_key()?.to_string();
        let per_minute = NonZeroU32::new(config.rate_limit_per_minute).ok_or_else(|| {
            NewsletterError::Config("rate_limit_per_minute must be greater than 0".to_string())
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.alpha_vantage_base_url.clone(),
            api_key,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            retry: RetryPolicy::from_config(config),
            market_ttl: config.cache_ttl_news,
            daily_ttl: config.cache_ttl_daily,
            cache_dir: config.cache_dir.clone(),
            market_cache: build_cache(
                config.cache_ttl_news,
                config.cache_dir.as_deref(),
                MARKET_CACHE_FILE,
            ),
            daily_cache: build_cache(
                config.cache_ttl_daily,
                config.cache_dir.as_deref(),
                DAILY_CACHE_FILE,
            ),
        })
    }

    fn rebuild_caches(&mut self) {
        let dir = self.cache_dir.as_deref();
        self.market_cache = build_cache(self.market_ttl, dir, MARKET_CACHE_FILE);
        self.daily_cache = build_cache(self.daily_ttl, dir, DAILY_CACHE_FILE);
    }

    /// Point the client at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace both caches with ones using the given TTL
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.market_ttl = ttl;
        self.daily_ttl = ttl;
        self.rebuild_caches();
        self
    }

    /// Keep cached responses in `dir` so they outlive the process
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self.rebuild_caches();
        self
    }

    /// Drop every cached response so the next fetch hits the network
    pub async fn clear_cache(&self) {
        self.market_cache.clear().await;
        self.daily_cache.clear().await;
    }

    /// Fetch the news sentiment feed
    #[instrument(skip(self))]
    pub async fn news_sentiment(&self, limit: u32, sort: &str) -> Result<Vec<NewsItem>> {
        let params = vec![("limit", limit.to_string()), ("sort", sort.to_string())];
        let data = self
            .query("NEWS_SENTIMENT", params, "feed", &self.market_cache)
            .await?;

        let entries: Vec<serde_json::Value> = serde_json::from_value(data["feed"].clone())?;
        let total = entries.len();
        let items: Vec<NewsItem> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping malformed news article {}: {}", i, e);
                    None
                }
            })
            .collect();
        info!("Fetched {} of {} news articles", items.len(), total);
        Ok(items)
    }

    /// Fetch top gainers, top losers and most actively traded tickers
    #[instrument(skip(self))]
    pub async fn top_gainers_losers(&self) -> Result<TickerTrendsSnapshot> {
        let data = self
            .query("TOP_GAINERS_LOSERS", Vec::new(), "top_gainers", &self.market_cache)
            .await?;

        let snapshot: TickerTrendsSnapshot = serde_json::from_value(data)?;
        info!(
            "Fetched movers: {} gainers, {} losers, {} most active",
            snapshot.top_gainers.len(),
            snapshot.top_losers.len(),
            snapshot.most_actively_traded.len()
        );
        Ok(snapshot)
    }

    /// Fetch the daily price series for a symbol, newest bar first
    #[instrument(skip(self))]
    pub async fn daily_series(&self, symbol: &str) -> Result<Vec<DailyBar>> {
        let symbol = normalize_symbol(symbol)?;
        let params = vec![("symbol", symbol.clone())];
        let data = self
            .query("TIME_SERIES_DAILY", params, DAILY_SERIES_KEY, &self.daily_cache)
            .await?;

        let bars = parse_daily_series(&symbol, &data[DAILY_SERIES_KEY])?;
        info!("Fetched {} daily bars for {}", bars.len(), symbol);
        Ok(bars)
    }

    /// Cached, retried request that must contain `required_key`
    async fn query(
        &self,
        function: &str,
        params: Vec<(&'static str, String)>,
        required_key: &str,
        cache: &FetchCache,
    ) -> Result<serde_json::Value> {
        let key = CacheKey::new(function, &params);
        cache
            .get_or_fetch(key, || {
                self.retry.execute(function, || {
                    self.request(function, &params, required_key)
                })
            })
            .await
    }

    /// One rate-limited HTTP round trip
    async fn request(
        &self,
        function: &str,
        params: &[(&'static str, String)],
        required_key: &str,
    ) -> Result<serde_json::Value> {
        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        let mut query: Vec<(&str, &str)> = vec![("function", function)];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        query.push(("apikey", &self.api_key));

        debug!("GET {} function={}", self.base_url, function);
        let response = self.client.get(&self.base_url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NewsletterError::Status {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let data: serde_json::Value = response.json().await?;
        check_body(&data)?;

        if data.get(required_key).is_none() {
            return Err(NewsletterError::MissingKey {
                service: SERVICE.to_string(),
                key: required_key.to_string(),
            });
        }

        Ok(data)
    }
}

const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

/// Map error bodies sent with a 200 status to typed errors
fn check_body(data: &serde_json::Value) -> Result<()> {
    if let Some(error) = data.get("Error Message") {
        return Err(NewsletterError::Api(json_text(error)));
    }

    // Both keys carry quota notices, depending on the plan
    for key in ["Note", "Information"] {
        if let Some(note) = data.get(key) {
            return Err(NewsletterError::RateLimited {
                provider: SERVICE.to_string(),
                message: json_text(note),
            });
        }
    }

    Ok(())
}

fn json_text(value: &serde_json::Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}

fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= 12
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

    if valid {
        Ok(symbol)
    } else {
        Err(NewsletterError::Validation(format!(
            "Invalid symbol: '{symbol}'"
        )))
    }
}

fn parse_daily_series(symbol: &str, series: &serde_json::Value) -> Result<Vec<DailyBar>> {
    let obj = series.as_object().ok_or_else(|| {
        NewsletterError::Api(format!("'{DAILY_SERIES_KEY}' is not an object"))
    })?;

    let field = |values: &serde_json::Value, name: &str, date: &str| -> Result<String> {
        values
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| NewsletterError::Api(format!("Bar {date} is missing '{name}'")))
    };
    let number = |text: String, date: &str| -> Result<f64> {
        text.parse()
            .map_err(|_| NewsletterError::Api(format!("Bar {date} has a malformed price")))
    };

    let mut bars = Vec::with_capacity(obj.len());
    for (date, values) in obj {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| NewsletterError::Api(format!("Malformed bar date '{date}'")))?;
        let volume = field(values, "5. volume", date)?
            .parse()
            .map_err(|_| NewsletterError::Api(format!("Bar {date} has a malformed volume")))?;

        bars.push(DailyBar {
            symbol: symbol.to_string(),
            date: day,
            open: number(field(values, "1. open", date)?, date)?,
            high: number(field(values, "2. high", date)?, date)?,
            low: number(field(values, "3. low", date)?, date)?,
            close: number(field(values, "4. close", date)?, date)?,
            volume,
        });
    }

    bars.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(bars)
}
