//! Plain-text rendering of dashboard records.

use market_core::{BriefingResponse, ChartPoint, Stock};

/// Compact volume: `1.25B`, `340.0M`, `12.5K`.
pub fn format_volume(volume: u64) -> String {
    let v = volume as f64;
    if v >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if v >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if v >= 1e3 {
        format!("{:.1}K", v / 1e3)
    } else {
        volume.to_string()
    }
}

pub fn format_change(change_percent: f64) -> String {
    format!("{:+.2}%", change_percent)
}

pub fn stock_row(stock: &Stock) -> String {
    format!(
        "{:>3}  {:<6} {:>10.2} {:>8} {:>9}  score {:>5.1}  {}",
        stock.rank,
        stock.symbol,
        stock.price,
        format_change(stock.change_percent),
        format_volume(stock.volume),
        stock.composite_score,
        stock.name,
    )
}

pub fn stock_table(stocks: &[Stock]) -> String {
    if stocks.is_empty() {
        return "(no stocks)".to_string();
    }
    let mut lines = Vec::with_capacity(stocks.len());
    for stock in stocks {
        lines.push(stock_row(stock));
        if let Some(reason) = &stock.selection_reason {
            lines.push(format!("       {}", reason));
        }
    }
    lines.join("\n")
}

/// Copies of `stocks` ranked 1..N by position.
pub fn numbered(stocks: &[Stock]) -> Vec<Stock> {
    stocks
        .iter()
        .enumerate()
        .map(|(i, stock)| Stock {
            rank: i as u32 + 1,
            ..stock.clone()
        })
        .collect()
}

pub fn chart_table(points: &[ChartPoint]) -> String {
    points
        .iter()
        .map(|p| {
            format!(
                "{}  {:>10.2} {:>8} {:>9}",
                p.date,
                p.price,
                format_change(p.change_percent),
                format_volume(p.volume)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn briefing(response: &BriefingResponse) -> String {
    let generated = response
        .generated_at_parsed()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| response.generated_at.clone());
    format!(
        "{} ({}) generated {}\n\n{}",
        response.ticker, response.screener, generated, response.content
    )
}
