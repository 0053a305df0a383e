//! Clients for the market data and fact-checking APIs

pub mod alpha_vantage;
pub mod factcheck;

pub use alpha_vantage::{AlphaVantageClient, DEFAULT_NEWS_LIMIT, DEFAULT_NEWS_SORT};
pub use factcheck::{FactCheckReport, FactChecker, MiniCheckClient, Verdict, assess};

#[cfg(test)]
pub use factcheck::MockFactChecker;
