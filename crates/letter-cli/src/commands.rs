//! One handler per subcommand

use crate::app::App;
use crate::cli::{FetchArgs, NewsletterArgs};
use crate::render;
use anyhow::{Context as _, Result, bail};
use letter_market::api::DEFAULT_NEWS_SORT;
use letter_market::{
    AlphaVantageClient, Mover, NewsletterCrew, RagHelper, TrendCategory, ingest,
};
use std::path::Path;
use tracing::{error, info, warn};

/// Fetch the requested feeds concurrently; each one is stored independently
pub async fn fetch(app: &App, args: &FetchArgs) -> Result<()> {
    let (want_news, want_trends) = args.targets();
    let client = app.alpha_vantage()?;
    let rag = app.rag()?;
    if args.refresh {
        client.clear_cache().await;
    }

    let news = async {
        if want_news {
            Some(store_news(app, &client, &rag, args.limit).await)
        } else {
            None
        }
    };
    let trends = async {
        if want_trends {
            Some(store_trends(app, &client, &rag).await)
        } else {
            None
        }
    };
    let (news, trends) = tokio::join!(news, trends);

    let mut failures = 0;
    for (label, outcome) in [("news", news), ("trends", trends)] {
        match outcome {
            Some(Ok(count)) => println!("Stored {count} {label} documents."),
            Some(Err(e)) => {
                failures += 1;
                error!("Fetching {} failed: {:#}", label, e);
                eprintln!("Fetching {label} failed: {e:#}");
            }
            None => {}
        }
    }

    if failures > 0 {
        bail!("{failures} fetch(es) failed");
    }
    Ok(())
}

async fn store_news(
    app: &App,
    client: &AlphaVantageClient,
    rag: &RagHelper,
    limit: u32,
) -> Result<usize> {
    let items = client.news_sentiment(limit, DEFAULT_NEWS_SORT).await?;
    if items.is_empty() {
        warn!("News feed was empty");
    }
    let docs = ingest::news_documents(&items);
    Ok(rag.add(&app.config.collections.news, docs).await?)
}

async fn store_trends(app: &App, client: &AlphaVantageClient, rag: &RagHelper) -> Result<usize> {
    let snapshot = client.top_gainers_losers().await?;
    let docs = ingest::trend_documents(&snapshot);
    Ok(rag.add(&app.config.collections.trends, docs).await?)
}

pub async fn daily(app: &App, symbol: &str) -> Result<()> {
    let bars = app.alpha_vantage()?.daily_series(symbol).await?;
    let stored = app
        .rag()?
        .add(
            &app.config.collections.market_data,
            ingest::daily_documents(&bars),
        )
        .await?;

    println!("{}", render::daily_bars(&bars[..bars.len().min(10)]));
    println!("Stored {stored} daily bars.");
    Ok(())
}

pub async fn upload_csv(app: &App, path: &Path) -> Result<()> {
    let docs = ingest::csv_file_documents(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if docs.is_empty() {
        println!("{} has no data rows.", path.display());
        return Ok(());
    }

    let stored = app
        .rag()?
        .add(&app.config.collections.market_data, docs)
        .await?;
    println!("Stored {stored} rows from {}.", path.display());
    Ok(())
}

pub async fn newsletter(app: &App, args: &NewsletterArgs) -> Result<()> {
    let fact_checker = if args.no_fact_check {
        None
    } else {
        app.fact_checker()?
    };
    let crew = NewsletterCrew::new(app.rag()?, app.summarizer()?, fact_checker, &app.config);

    println!("Generating newsletter...");
    let newsletter = crew.run(!args.no_fact_check).await?;
    info!("Newsletter run {} finished", newsletter.run_id);

    println!("\n{}\n", newsletter.text);

    if args.show_context {
        println!("--- Source documents ({}) ---", newsletter.context_documents.len());
        for doc in &newsletter.context_documents {
            println!("- {}", render::preview(doc, 200));
        }
        println!();
    }

    if let Some(report) = &newsletter.fact_check {
        println!("{}", render::fact_check(report));
    } else if let Some(reason) = &newsletter.fact_check_error {
        eprintln!("Fact-check skipped: {reason}");
    }
    Ok(())
}

pub async fn query(app: &App, collection: &str, text: &str, n: usize) -> Result<()> {
    let collection = app.collection(collection);
    let hits = app.rag()?.query(collection, text, n).await?;
    if hits.is_empty() {
        println!("No documents in '{collection}' yet.");
        return Ok(());
    }
    println!("{}", render::search_results(&hits));
    Ok(())
}

pub async fn get(app: &App, collection: &str, ids: &[String]) -> Result<()> {
    let collection = app.collection(collection);
    let docs = app.rag()?.get(collection, ids).await?;
    if docs.is_empty() {
        println!("No matching ids in '{collection}'.");
        return Ok(());
    }
    println!("{}", render::documents(&docs));
    Ok(())
}

pub async fn trends(app: &App) -> Result<()> {
    let ids: Vec<String> = TrendCategory::ALL
        .iter()
        .map(|c| c.id().to_string())
        .collect();
    let docs = app
        .rag()?
        .get(&app.config.collections.trends, &ids)
        .await?;
    if docs.is_empty() {
        println!("No movers stored yet; run `fetch --trends` first.");
        return Ok(());
    }

    for doc in docs {
        let Some(category) = TrendCategory::from_id(&doc.id) else {
            continue;
        };
        let movers: Vec<Mover> = serde_json::from_str(&doc.text)
            .with_context(|| format!("Stored '{}' snapshot is not valid JSON", doc.id))?;

        println!("{}", category.title());
        if let Some(updated) = doc.metadata_str("last_updated") {
            println!("(last updated {updated})");
        }
        println!("{}\n", render::movers(&movers));
    }
    Ok(())
}
