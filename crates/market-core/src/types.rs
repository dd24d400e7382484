use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::MarketError;

/// Display bounds for `Stock::composite_score`.
pub const COMPOSITE_SCORE_MIN: f64 = 0.0;
pub const COMPOSITE_SCORE_MAX: f64 = 100.0;

/// Sector label used when the provider has none.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Provider-curated ranking a symbol may appear in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScreenerType {
    #[default]
    MostActives,
    DayGainers,
    DayLosers,
}

impl ScreenerType {
    pub const ALL: [ScreenerType; 3] = [
        ScreenerType::MostActives,
        ScreenerType::DayGainers,
        ScreenerType::DayLosers,
    ];

    /// Wire identifier used in query strings and persisted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenerType::MostActives => "most_actives",
            ScreenerType::DayGainers => "day_gainers",
            ScreenerType::DayLosers => "day_losers",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ScreenerType::MostActives => "Volume Surge",
            ScreenerType::DayGainers => "Top Gainers",
            ScreenerType::DayLosers => "Top Losers",
        }
    }
}

impl fmt::Display for ScreenerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScreenerType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "most_actives" => Ok(ScreenerType::MostActives),
            "day_gainers" => Ok(ScreenerType::DayGainers),
            "day_losers" => Ok(ScreenerType::DayLosers),
            other => Err(MarketError::InvalidRequest(format!(
                "unknown screener type '{}'",
                other
            ))),
        }
    }
}

/// Additive parts of a composite score. Never clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub volume_score: f64,
    pub change_score: f64,
    pub appearance_bonus: f64,
}

impl ScoreBreakdown {
    /// Unclamped composite value.
    pub fn total(&self) -> f64 {
        self.volume_score + self.change_score + self.appearance_bonus
    }
}

/// Canonical quote record shared by ranked lists and the watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub rank: u32,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_percent: f64,
    pub change_amount: f64,
    pub volume: u64,
    pub market_cap: u64,
    pub composite_score: f64,
    pub score_breakdown: ScoreBreakdown,
    #[serde(default)]
    pub sources: BTreeSet<ScreenerType>,
    pub sector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_reason: Option<String>,
}

impl Stock {
    /// Replace the breakdown and recompute the displayed composite score from it.
    pub fn set_score_breakdown(&mut self, breakdown: ScoreBreakdown) {
        self.score_breakdown = breakdown;
        self.composite_score = breakdown
            .total()
            .clamp(COMPOSITE_SCORE_MIN, COMPOSITE_SCORE_MAX);
    }

    /// Drop any derived scores, e.g. for quotes fetched without screener context.
    pub fn clear_scores(&mut self) {
        self.set_score_breakdown(ScoreBreakdown::default());
    }

    pub fn is_gaining(&self) -> bool {
        self.change_percent >= 0.0
    }
}

// ---------------------------------------------------------------------------
// Provider wire types
// ---------------------------------------------------------------------------

/// `GET /stocks/info/{symbol}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockInfo {
    #[serde(default)]
    pub symbol: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub market_cap: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

/// `GET /stocks/price/{symbol}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockPrice {
    #[serde(default)]
    pub symbol: String,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub open_price: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<u64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
}

/// Provider-shaped quote (`GET /stocks/quote/{symbol}`), before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub info: StockInfo,
    pub price: StockPrice,
}

pub type RawQuote = StockQuote;

impl StockQuote {
    /// Ticker carried by the record, preferring the info block.
    pub fn symbol(&self) -> &str {
        if self.info.symbol.is_empty() {
            &self.price.symbol
        } else {
            &self.info.symbol
        }
    }
}

/// Entry of `GET /api/stocks/trending/top`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedQuote {
    pub rank: u32,
    pub quote: StockQuote,
}

/// Lookback window accepted by the history endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    #[default]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl HistoryPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::OneDay => "1d",
            HistoryPeriod::FiveDays => "5d",
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
            HistoryPeriod::FiveYears => "5y",
            HistoryPeriod::TenYears => "10y",
            HistoryPeriod::YearToDate => "ytd",
            HistoryPeriod::Max => "max",
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryPeriod {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let period = match s.trim() {
            "1d" => HistoryPeriod::OneDay,
            "5d" => HistoryPeriod::FiveDays,
            "1mo" => HistoryPeriod::OneMonth,
            "3mo" => HistoryPeriod::ThreeMonths,
            "6mo" => HistoryPeriod::SixMonths,
            "1y" => HistoryPeriod::OneYear,
            "2y" => HistoryPeriod::TwoYears,
            "5y" => HistoryPeriod::FiveYears,
            "10y" => HistoryPeriod::TenYears,
            "ytd" => HistoryPeriod::YearToDate,
            "max" => HistoryPeriod::Max,
            other => {
                return Err(MarketError::InvalidRequest(format!(
                    "unsupported history period '{}'",
                    other
                )))
            }
        };
        Ok(period)
    }
}

/// One OHLCV row of `GET /stocks/history/{symbol}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalData {
    pub symbol: String,
    pub period: String,
    pub data: Vec<HistoricalDataPoint>,
}

/// Point on a price chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: u64,
    pub change_percent: f64,
}

// ---------------------------------------------------------------------------
// Briefing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingRequest {
    pub ticker: String,
    #[serde(rename = "type")]
    pub screener: ScreenerType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingResponse {
    pub ticker: String,
    #[serde(rename = "type")]
    pub screener: String,
    pub generated_at: String,
    /// Markdown body.
    pub content: String,
}

impl BriefingResponse {
    /// `generated_at` is a naive ISO-8601 timestamp with optional fraction.
    pub fn generated_at_parsed(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.generated_at, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}
