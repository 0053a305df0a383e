//! market-newsletter: fetch market news and movers, store them in Chroma and
//! write a fact-checked daily newsletter
//!
//! # Usage
//!
//! ```bash
//! # secrets.toml with [alpha_vantage], [openai] and [bespoke_labs] api_key
//! market-newsletter fetch
//! market-newsletter newsletter --show-context
//! market-newsletter chat
//! ```

mod app;
mod cli;
mod commands;
mod render;
mod repl;

use app::App;
use clap::Parser;
use cli::{Cli, Commands};
use letter_utils::{LogOptions, init_tracing};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(LogOptions {
        verbose: cli.verbose,
        json: cli.json_logs,
    });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let app = App::load(cli.config.as_deref(), &cli.cache_dir)?;
    info!("Running {:?}", cli.command);

    match &cli.command {
        Commands::Fetch(args) => commands::fetch(&app, args).await,
        Commands::Daily { symbol } => commands::daily(&app, symbol).await,
        Commands::UploadCsv { path } => commands::upload_csv(&app, path).await,
        Commands::Newsletter(args) => commands::newsletter(&app, args).await,
        Commands::Query {
            collection,
            text,
            n,
        } => commands::query(&app, collection, text, *n).await,
        Commands::Get { collection, ids } => commands::get(&app, collection, ids).await,
        Commands::Trends => commands::trends(&app).await,
        Commands::Chat => repl::run(&app).await,
    }
}
