//! Concurrent per-symbol fetching.
//!
//! Every symbol settles on its own: one failure never aborts the batch.
//! [`settle_quotes`] hands back every outcome; [`fetch_quotes`] keeps only
//! the successes.

use futures_util::future::join_all;
use market_core::{MarketDataSource, MarketError, StockQuote};
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;

/// Result of fetching a single symbol inside a batch.
#[derive(Debug)]
pub struct QuoteOutcome {
    pub symbol: String,
    pub result: Result<StockQuote, MarketError>,
}

impl QuoteOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Trimmed, non-empty symbols in first-seen order.
fn unique_symbols(symbols: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}

/// Fetch all symbols concurrently and wait for every one of them.
///
/// Outcomes come back in input order (duplicates removed). When `cancel`
/// fires, requests still in flight are dropped and settle as
/// `Err(MarketError::Cancelled)`.
pub async fn settle_quotes<S>(
    source: &S,
    symbols: &[String],
    cancel: Option<&CancellationToken>,
) -> Vec<QuoteOutcome>
where
    S: MarketDataSource + ?Sized,
{
    let requests = unique_symbols(symbols).into_iter().map(|symbol| async move {
        let result = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(MarketError::Cancelled),
                    result = source.fetch_quote(&symbol) => result,
                }
            }
            None => source.fetch_quote(&symbol).await,
        };
        QuoteOutcome { symbol, result }
    });

    join_all(requests).await
}

/// Fetch all symbols and keep the ones that succeeded.
///
/// A symbol missing from the map is unavailable, not an error.
pub async fn fetch_quotes<S>(
    source: &S,
    symbols: &[String],
    cancel: Option<&CancellationToken>,
) -> HashMap<String, StockQuote>
where
    S: MarketDataSource + ?Sized,
{
    let outcomes = settle_quotes(source, symbols, cancel).await;
    let requested = outcomes.len();

    let quotes: HashMap<String, StockQuote> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome.result {
            Ok(quote) => Some((outcome.symbol, quote)),
            Err(MarketError::Cancelled) => {
                tracing::debug!("Quote fetch for {} cancelled", outcome.symbol);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to fetch quote for {}: {}", outcome.symbol, e);
                None
            }
        })
        .collect();

    tracing::debug!("Fetched {}/{} quotes", quotes.len(), requested);
    quotes
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_core::{RankedQuote, ScreenerType, StockInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Answers every symbol except the ones listed as failing or hanging.
    #[derive(Default)]
    struct FakeSource {
        failing: Vec<&'static str>,
        hanging: Vec<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn fetch_quote(&self, symbol: &str) -> Result<StockQuote, MarketError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hanging.iter().any(|s| *s == symbol) {
                return std::future::pending().await;
            }
            if self.failing.iter().any(|s| *s == symbol) {
                return Err(MarketError::Network(format!("{} timed out", symbol)));
            }
            Ok(StockQuote {
                info: StockInfo {
                    symbol: symbol.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            })
        }

        async fn fetch_top_stocks(
            &self,
            _screener: ScreenerType,
            _count: u8,
        ) -> Result<Vec<RankedQuote>, MarketError> {
            Ok(Vec::new())
        }

        async fn fetch_trending(&self) -> Result<Vec<StockQuote>, MarketError> {
            Ok(Vec::new())
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_one_failure_keeps_the_rest() {
        let source = FakeSource {
            failing: vec!["TSLA"],
            ..Default::default()
        };
        let quotes = fetch_quotes(
            &source,
            &symbols(&["AAPL", "MSFT", "TSLA", "NVDA", "AMZN"]),
            None,
        )
        .await;

        assert_eq!(quotes.len(), 4);
        assert!(!quotes.contains_key("TSLA"));
        assert_eq!(quotes["AMZN"].info.symbol, "AMZN");
    }

    #[tokio::test]
    async fn test_every_outcome_reported_in_order() {
        let source = FakeSource {
            failing: vec!["MSFT"],
            ..Default::default()
        };
        let outcomes = settle_quotes(&source, &symbols(&["AAPL", "MSFT", "NVDA"]), None).await;

        let order: Vec<&str> = outcomes.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(order, vec!["AAPL", "MSFT", "NVDA"]);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1].result, Err(MarketError::Network(_))));
        assert!(outcomes[2].is_ok());
    }

    #[tokio::test]
    async fn test_duplicates_and_blanks_fetched_once() {
        let source = FakeSource::default();
        let outcomes = settle_quotes(
            &source,
            &symbols(&["AAPL", " AAPL ", "", "MSFT", "AAPL"]),
            None,
        )
        .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_failing_returns_empty_map() {
        let source = FakeSource {
            failing: vec!["AAPL", "MSFT"],
            ..Default::default()
        };
        let quotes = fetch_quotes(&source, &symbols(&["AAPL", "MSFT"]), None).await;
        assert!(quotes.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_drops_in_flight_requests() {
        let source = FakeSource {
            hanging: vec!["GME"],
            ..Default::default()
        };
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcomes = settle_quotes(&source, &symbols(&["AAPL", "GME", "MSFT"]), Some(&token)).await;

        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[1].result, Err(MarketError::Cancelled));
        assert!(outcomes[2].is_ok());
    }

    #[tokio::test]
    async fn test_already_cancelled_token_fetches_nothing() {
        let source = Arc::new(FakeSource::default());
        let token = CancellationToken::new();
        token.cancel();

        let quotes = fetch_quotes(source.as_ref(), &symbols(&["AAPL", "MSFT"]), Some(&token)).await;
        assert!(quotes.is_empty());
    }
}
