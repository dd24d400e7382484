//! Conversion of provider records into the canonical shapes.
//!
//! Missing numeric fields become `0` and a missing sector becomes
//! `"Unknown"`. This is lossy on purpose: a quote with gaps is still worth
//! showing.

use std::collections::BTreeSet;

use crate::{ChartPoint, HistoricalData, ScoreBreakdown, Stock, StockQuote, UNKNOWN_SECTOR};

/// Map a provider quote to a `Stock` at the given rank.
///
/// The result carries no screener context: sources are empty and all
/// scores are zero until a ranker fills them in.
pub fn quote_to_stock(quote: &StockQuote, rank: u32) -> Stock {
    let info = &quote.info;
    let price = &quote.price;
    let symbol = quote.symbol().to_string();

    Stock {
        rank,
        name: info
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| symbol.clone()),
        symbol,
        price: non_negative(price.current_price),
        change_percent: finite(price.change_percent),
        change_amount: finite(price.change),
        volume: price.volume.unwrap_or(0),
        // `as` saturates, so negative or NaN caps land on 0.
        market_cap: info.market_cap.map(|c| c as u64).unwrap_or(0),
        composite_score: 0.0,
        score_breakdown: ScoreBreakdown::default(),
        sources: BTreeSet::new(),
        sector: info
            .sector
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SECTOR.to_string()),
        selection_reason: None,
    }
}

/// Map a batch of quotes, numbering ranks from 1 in input order.
pub fn quotes_to_stocks(quotes: &[StockQuote]) -> Vec<Stock> {
    quotes
        .iter()
        .enumerate()
        .map(|(i, q)| quote_to_stock(q, i as u32 + 1))
        .collect()
}

/// Turn a history response into chart points.
///
/// `change_percent` is close-to-close against the previous row; the first
/// row, and any row following a zero close, reports 0.
pub fn history_to_chart(history: &HistoricalData) -> Vec<ChartPoint> {
    let mut points = Vec::with_capacity(history.data.len());
    let mut prev_close: Option<f64> = None;

    for row in &history.data {
        let close = non_negative(row.close);
        let change_percent = match prev_close {
            Some(prev) if prev > 0.0 => (close - prev) / prev * 100.0,
            _ => 0.0,
        };
        points.push(ChartPoint {
            date: row.date,
            price: close,
            volume: row.volume.unwrap_or(0),
            change_percent,
        });
        prev_close = Some(close);
    }

    points
}

fn finite(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn non_negative(value: Option<f64>) -> f64 {
    finite(value).max(0.0)
}
