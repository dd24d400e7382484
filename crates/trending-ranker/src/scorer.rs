//! Composite Scoring Module
//!
//! Scores each distinct symbol of a screener cohort:
//!
//! - `volume_score = volume_weight * volume / max_volume`
//! - `change_score = change_weight * |change_percent| / max_abs_change`
//! - `appearance_bonus = appearance_increment * (lists - 1)`
//!
//! Maxima are taken over the scored cohort. The composite is the plain sum
//! of the three parts, clamped to 0..=100 only for display.

use market_core::{ScoreBreakdown, ScreenerType, Stock};
use std::collections::HashMap;

/// Weights for the composite score parts
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    /// Score given to the highest-volume symbol in the cohort
    pub volume_weight: f64,
    /// Score given to the largest absolute move in the cohort
    pub change_weight: f64,
    /// Added once per screener list beyond the first
    pub appearance_increment: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            volume_weight: 40.0,
            change_weight: 40.0,
            appearance_increment: 10.0,
        }
    }
}

/// Stocks as delivered by one screener, in provider order.
#[derive(Debug, Clone)]
pub struct ScreenerList {
    pub screener: ScreenerType,
    pub stocks: Vec<Stock>,
}

impl ScreenerList {
    pub fn new(screener: ScreenerType, stocks: Vec<Stock>) -> Self {
        Self { screener, stocks }
    }
}

/// Merges, scores and ranks screener cohorts
pub struct CompositeScorer {
    weights: ScoringWeights,
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeScorer {
    /// Create a scorer with default weights
    pub fn new() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    /// Create scorer with custom weights
    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Collapse the lists into one record per symbol.
    ///
    /// Records keep the order in which their symbol was first seen, walking
    /// the lists in the given order. The first record wins; later
    /// appearances only add their screener to `sources`.
    pub fn merge(&self, lists: &[ScreenerList]) -> Vec<Stock> {
        let mut merged: Vec<Stock> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for list in lists {
            for stock in &list.stocks {
                match index.get(&stock.symbol) {
                    Some(&i) => {
                        merged[i].sources.extend(stock.sources.iter().copied());
                        merged[i].sources.insert(list.screener);
                    }
                    None => {
                        let mut record = stock.clone();
                        record.sources.insert(list.screener);
                        index.insert(record.symbol.clone(), merged.len());
                        merged.push(record);
                    }
                }
            }
        }

        merged
    }

    /// Fill in score breakdowns for a merged cohort.
    ///
    /// Stocks with no screener source have no context to be scored in and
    /// get all-zero scores; they are also left out of the cohort maxima.
    pub fn score(&self, stocks: &mut [Stock]) {
        let (max_volume, max_change) = stocks
            .iter()
            .filter(|s| !s.sources.is_empty())
            .fold((0.0_f64, 0.0_f64), |(v, c), s| {
                (v.max(s.volume as f64), c.max(s.change_percent.abs()))
            });

        for stock in stocks.iter_mut() {
            if stock.sources.is_empty() {
                stock.clear_scores();
                continue;
            }
            let breakdown = self.calculate_breakdown(stock, max_volume, max_change);
            stock.set_score_breakdown(breakdown);
        }
    }

    fn calculate_breakdown(&self, stock: &Stock, max_volume: f64, max_change: f64) -> ScoreBreakdown {
        let volume_score = if max_volume > 0.0 {
            self.weights.volume_weight * stock.volume as f64 / max_volume
        } else {
            0.0
        };

        let change_score = if max_change > 0.0 {
            self.weights.change_weight * stock.change_percent.abs() / max_change
        } else {
            0.0
        };

        let extra_lists = stock.sources.len().saturating_sub(1);
        let appearance_bonus = self.weights.appearance_increment * extra_lists as f64;

        ScoreBreakdown {
            volume_score,
            change_score,
            appearance_bonus,
        }
    }

    /// Score and order an already-merged cohort, assigning ranks 1..=N.
    ///
    /// Ordering is by the unclamped composite, descending; ties keep input
    /// order.
    pub fn rank_stocks(&self, mut stocks: Vec<Stock>) -> Vec<Stock> {
        self.score(&mut stocks);

        // sort_by is stable
        stocks.sort_by(|a, b| {
            b.score_breakdown
                .total()
                .partial_cmp(&a.score_breakdown.total())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for (i, stock) in stocks.iter_mut().enumerate() {
            stock.rank = i as u32 + 1;
            if stock.selection_reason.is_none() && !stock.sources.is_empty() {
                stock.selection_reason = Some(selection_reason(stock));
            }
        }

        stocks
    }

    /// Merge the screener lists, then score and rank the result.
    pub fn rank(&self, lists: &[ScreenerList]) -> Vec<Stock> {
        let merged = self.merge(lists);
        tracing::debug!(
            "Merged {} screener lists into {} distinct symbols",
            lists.len(),
            merged.len()
        );
        self.rank_stocks(merged)
    }

    /// Get top N stocks of a ranked list
    pub fn top_n(&self, ranked: &[Stock], n: usize) -> Vec<Stock> {
        ranked.iter().take(n).cloned().collect()
    }
}

fn selection_reason(stock: &Stock) -> String {
    let titles: Vec<&str> = stock.sources.iter().map(|s| s.title()).collect();
    format!("Listed in {}", titles.join(" + "))
}
