//! Terminal tables

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use letter_market::api::FactCheckReport;
use letter_market::store::{Document, SearchResult};
use letter_market::{DailyBar, Mover};

const PREVIEW_CHARS: usize = 120;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// First `max` characters of `text`, with an ellipsis when cut
pub fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

pub fn search_results(hits: &[SearchResult]) -> Table {
    let mut t = table(vec!["#", "ID", "Distance", "Document"]);
    for (rank, hit) in hits.iter().enumerate() {
        t.add_row(vec![
            (rank + 1).to_string(),
            hit.document.id.clone(),
            hit.distance.map_or_else(|| "-".to_string(), |d| format!("{d:.4}")),
            preview(&hit.document.text, PREVIEW_CHARS),
        ]);
    }
    t
}

pub fn documents(docs: &[Document]) -> Table {
    let mut t = table(vec!["ID", "Document", "Metadata"]);
    for doc in docs {
        let metadata = doc
            .metadata
            .iter()
            .map(|(k, v)| match v.as_str() {
                Some(s) => format!("{k}: {}", preview(s, 40)),
                None => format!("{k}: {v}"),
            })
            .collect::<Vec<_>>()
            .join("\n");
        t.add_row(vec![
            doc.id.clone(),
            preview(&doc.text, PREVIEW_CHARS),
            metadata,
        ]);
    }
    t
}

pub fn movers(movers: &[Mover]) -> Table {
    let mut t = table(vec!["Ticker", "Price", "Change", "Change %", "Volume"]);
    for m in movers {
        t.add_row(vec![
            m.ticker.clone(),
            m.price.clone(),
            m.change_amount.clone(),
            m.change_percentage.clone(),
            m.volume.clone(),
        ]);
    }
    t
}

pub fn daily_bars(bars: &[DailyBar]) -> Table {
    let mut t = table(vec!["Date", "Open", "High", "Low", "Close", "Volume"]);
    for bar in bars {
        t.add_row(vec![
            bar.date.to_string(),
            format!("{:.2}", bar.open),
            format!("{:.2}", bar.high),
            format!("{:.2}", bar.low),
            format!("{:.2}", bar.close),
            bar.volume.to_string(),
        ]);
    }
    t
}

pub fn fact_check(report: &FactCheckReport) -> String {
    format!(
        "Accuracy score: {:.2}% ({})\n{}",
        report.score_percent,
        report.verdict,
        report.verdict.message()
    )
}
