//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Response cache location relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = ".newsletter-cache";

#[derive(Parser, Debug)]
#[command(name = "market-newsletter")]
#[command(version, about = "Market news, movers and an AI-written daily newsletter", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Secrets file (TOML); defaults to secrets.toml or .streamlit/secrets.toml
    #[arg(long, global = true, env = "NEWSLETTER_SECRETS")]
    pub config: Option<PathBuf>,

    /// Directory for cached API responses, reused between runs
    #[arg(long, global = true, env = "NEWSLETTER_CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// More detailed logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch news and/or movers and store them
    Fetch(FetchArgs),

    /// Fetch a daily price series into the market data collection
    Daily {
        /// Ticker symbol, e.g. IBM
        symbol: String,
    },

    /// Store the rows of a CSV file in the market data collection
    UploadCsv {
        /// Path to a headered CSV file
        path: PathBuf,
    },

    /// Write the newsletter from stored data
    Newsletter(NewsletterArgs),

    /// Similarity search in a collection
    Query {
        /// Collection name, or one of: news, trends, market
        collection: String,
        /// Query text
        text: String,
        /// Number of results
        #[arg(short, long, default_value_t = 5)]
        n: usize,
    },

    /// Look up documents by id
    Get {
        /// Collection name, or one of: news, trends, market
        collection: String,
        /// Document ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show the stored movers snapshot
    Trends,

    /// Chat about the stored news
    Chat,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Fetch the news sentiment feed
    #[arg(long)]
    pub news: bool,

    /// Fetch top gainers, losers and most active tickers
    #[arg(long)]
    pub trends: bool,

    /// Number of articles to request
    #[arg(long, default_value_t = letter_market::api::DEFAULT_NEWS_LIMIT)]
    pub limit: u32,

    /// Ignore cached responses
    #[arg(long)]
    pub refresh: bool,
}

impl FetchArgs {
    /// Which feeds to fetch; neither flag means both
    pub fn targets(&self) -> (bool, bool) {
        if self.news || self.trends {
            (self.news, self.trends)
        } else {
            (true, true)
        }
    }
}

#[derive(Args, Debug)]
pub struct NewsletterArgs {
    /// Skip the MiniCheck fact-check
    #[arg(long)]
    pub no_fact_check: bool,

    /// Also print the retrieved documents
    #[arg(long)]
    pub show_context: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_defaults_to_both() {
        let cli = Cli::try_parse_from(["market-newsletter", "fetch"]).unwrap();
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.targets(), (true, true));
        assert_eq!(args.limit, 50);
        assert!(!args.refresh);
        assert_eq!(cli.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
    }

    #[test]
    fn test_cache_dir_override() {
        let cli = Cli::try_parse_from([
            "market-newsletter",
            "fetch",
            "--refresh",
            "--cache-dir",
            "/tmp/av-cache",
        ])
        .unwrap();
        assert_eq!(cli.cache_dir, PathBuf::from("/tmp/av-cache"));
    }

    #[test]
    fn test_fetch_news_only() {
        let cli =
            Cli::try_parse_from(["market-newsletter", "fetch", "--news", "--limit", "10"]).unwrap();
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.targets(), (true, false));
        assert_eq!(args.limit, 10);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "market-newsletter",
            "query",
            "news",
            "rate cuts",
            "-n",
            "3",
            "--verbose",
            "--config",
            "my.toml",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
        assert!(matches!(cli.command, Commands::Query { n: 3, .. }));
    }

    #[test]
    fn test_get_requires_ids() {
        assert!(Cli::try_parse_from(["market-newsletter", "get", "trends"]).is_err());
    }
}
