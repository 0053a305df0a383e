//! The newsletter crew
//!
//! Four roles run in a fixed order over the retrieved documents:
//!
//! 1. [`CompanyAnalyst`] and [`MarketTrendsAnalyst`], concurrently
//! 2. [`RiskManager`]
//! 3. [`NewsletterWriter`]
//!
//! Intermediate results travel on a [`letter_core::Context`].

mod newsletter;
mod roles;

pub use newsletter::{COMPANY_QUERY, Newsletter, NewsletterCrew, TRENDS_QUERY};
pub use roles::{
    CompanyAnalyst, MarketTrendsAnalyst, NO_COMPANY_INSIGHTS, NO_MARKET_TRENDS, NewsletterWriter,
    RiskManager,
};
