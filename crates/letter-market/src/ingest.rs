//! Mapping of fetched data and uploaded files to store documents

use crate::error::{NewsletterError, Result};
use crate::model::{DailyBar, NewsItem, TickerTrendsSnapshot, TrendCategory};
use crate::store::Document;
use std::io::Read;
use std::path::Path;

/// One document per article, ids `"0"..` in feed order
///
/// Re-ingesting a newer feed overwrites the same ids.
pub fn news_documents(items: &[NewsItem]) -> Vec<Document> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Document::new(i.to_string(), item.document_text())
                .with_metadata("title", item.title.as_str())
                .with_metadata("url", item.url.as_str())
                .with_metadata("authors", item.authors.clone())
                .with_metadata("source", item.source.as_str())
                .with_metadata("time_published", item.time_published.as_str())
                .with_metadata("overall_sentiment_score", item.overall_sentiment_score)
                .with_metadata(
                    "overall_sentiment_label",
                    item.overall_sentiment_label.as_str(),
                )
                .with_metadata("topics", json_or_null(&item.topics))
                .with_metadata("ticker_sentiment", json_or_null(&item.ticker_sentiment))
        })
        .collect()
}

/// One JSON document per movers category, under the category's fixed id
pub fn trend_documents(snapshot: &TickerTrendsSnapshot) -> Vec<Document> {
    TrendCategory::ALL
        .into_iter()
        .map(|category| {
            let movers = snapshot.category(category);
            let text = serde_json::to_string(movers).unwrap_or_else(|_| "[]".to_string());
            Document::new(category.id(), text)
                .with_metadata("category", category.id())
                .with_metadata("count", movers.len())
                .with_metadata("last_updated", snapshot.last_updated.as_str())
                .with_metadata("summary", summarize_movers(movers))
        })
        .collect()
}

fn summarize_movers(movers: &[crate::model::Mover]) -> String {
    movers
        .iter()
        .take(5)
        .map(crate::model::Mover::describe)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One document per bar, id `"{SYMBOL}:{date}"`
pub fn daily_documents(bars: &[DailyBar]) -> Vec<Document> {
    bars.iter()
        .map(|bar| {
            Document::new(format!("{}:{}", bar.symbol, bar.date), bar.document_text())
                .with_metadata("symbol", bar.symbol.as_str())
                .with_metadata("date", bar.date.to_string())
                .with_metadata("open", bar.open)
                .with_metadata("high", bar.high)
                .with_metadata("low", bar.low)
                .with_metadata("close", bar.close)
                .with_metadata("volume", bar.volume)
        })
        .collect()
}

/// Read a headered CSV into one document per row, id `"{stem}:{index}"`
///
/// The text is `header=value` pairs; each column is also a metadata field.
pub fn csv_documents<R: Read>(reader: R, stem: &str) -> Result<Vec<Document>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    if headers.is_empty() {
        return Err(NewsletterError::Validation(
            "CSV file has no header row".to_string(),
        ));
    }

    let mut documents = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let text = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| format!("{h}={v}"))
            .collect::<Vec<_>>()
            .join(", ");

        let doc = headers.iter().zip(record.iter()).fold(
            Document::new(format!("{stem}:{index}"), text),
            |doc, (h, v)| doc.with_metadata(h, v),
        );
        documents.push(doc.with_metadata("source_file", stem));
    }

    Ok(documents)
}

/// Read a CSV file from disk, using the file stem in document ids
pub fn csv_file_documents(path: &Path) -> Result<Vec<Document>> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            NewsletterError::Validation(format!("Cannot derive a name from {}", path.display()))
        })?
        .to_string();

    let file = std::fs::File::open(path)?;
    csv_documents(file, &stem)
}

fn json_or_null<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mover;
    use std::io::Write;

    fn article(title: &str) -> NewsItem {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "summary": "Summary text",
            "authors": ["Jane Roe"],
            "source": "Reuters",
            "time_published": "20240501T133000",
            "overall_sentiment_score": 0.2,
            "overall_sentiment_label": "Somewhat-Bullish",
            "topics": [{"topic": "Earnings", "relevance_score": "0.7"}],
            "ticker_sentiment": []
        }))
        .unwrap()
    }

    #[test]
    fn test_news_documents_ids_and_metadata() {
        let docs = news_documents(&[article("A"), article("B"), article("C")]);
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2"]);

        assert_eq!(docs[1].text, "B - Summary text");
        assert_eq!(docs[0].metadata_str("authors"), Some(r#"["Jane Roe"]"#));
        assert_eq!(docs[0].metadata_str("ticker_sentiment"), Some("[]"));
        assert!(docs[0].metadata_str("topics").unwrap().contains("Earnings"));
        assert_eq!(docs[0].metadata["overall_sentiment_score"], serde_json::json!(0.2));
    }

    #[test]
    fn test_trend_documents_fixed_ids() {
        let snapshot = TickerTrendsSnapshot {
            metadata: "Top gainers, losers, and most actively traded US tickers".to_string(),
            last_updated: "2024-05-01 16:15:59 US/Eastern".to_string(),
            top_gainers: vec![Mover {
                ticker: "ABC".to_string(),
                price: "1.5".to_string(),
                change_amount: "0.5".to_string(),
                change_percentage: "50%".to_string(),
                volume: "1000".to_string(),
            }],
            top_losers: Vec::new(),
            most_actively_traded: Vec::new(),
        };

        let docs = trend_documents(&snapshot);
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["top_gainers", "top_losers", "most_actively_traded"]);

        let gainers: Vec<Mover> = serde_json::from_str(&docs[0].text).unwrap();
        assert_eq!(gainers, snapshot.top_gainers);
        assert_eq!(docs[0].metadata_str("summary"), Some("ABC - $1.5 (50%)"));
        assert_eq!(docs[1].text, "[]");
    }

    #[test]
    fn test_daily_documents() {
        let bar = DailyBar {
            symbol: "IBM".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 100,
        };
        let docs = daily_documents(&[bar]);
        assert_eq!(docs[0].id, "IBM:2024-05-01");
        assert!(docs[0].text.contains("close 1.50"));
        assert_eq!(docs[0].metadata["volume"], serde_json::json!(100));
    }

    #[test]
    fn test_csv_documents() {
        let data = "ticker,price\nAAPL,190.1\nMSFT,410.5\n";
        let docs = csv_documents(data.as_bytes(), "prices").unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "prices:0");
        assert_eq!(docs[1].text, "ticker=MSFT, price=410.5");
        assert_eq!(docs[1].metadata_str("ticker"), Some("MSFT"));
        assert_eq!(docs[1].metadata_str("source_file"), Some("prices"));
    }

    #[test]
    fn test_csv_header_only_yields_nothing() {
        let docs = csv_documents("ticker,price\n".as_bytes(), "empty").unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_csv_ragged_row_is_error() {
        let result = csv_documents("a,b\n1,2\n3\n".as_bytes(), "ragged");
        assert!(matches!(result, Err(NewsletterError::Csv(_))));
    }

    #[test]
    fn test_csv_file_documents_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "symbol\nNVDA").unwrap();

        let docs = csv_file_documents(&path).unwrap();
        assert_eq!(docs[0].id, "watchlist:0");
    }
}
