use market_core::{quote_to_stock, MarketDataSource, MarketError, ScreenerType, Stock};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::scorer::{CompositeScorer, ScreenerList};

/// Entries requested from each screener unless configured otherwise.
pub const DEFAULT_LIST_SIZE: u8 = 5;

/// Pulls the screener lists from a data source and ranks the combined cohort.
pub struct TrendingFeed<S: MarketDataSource + ?Sized + 'static> {
    source: Arc<S>,
    scorer: CompositeScorer,
    screeners: Vec<ScreenerType>,
    list_size: u8,
}

impl<S: MarketDataSource + ?Sized + 'static> TrendingFeed<S> {
    /// Feed over all three screeners with default weights.
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            scorer: CompositeScorer::new(),
            screeners: ScreenerType::ALL.to_vec(),
            list_size: DEFAULT_LIST_SIZE,
        }
    }

    pub fn with_scorer(mut self, scorer: CompositeScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Screeners to combine; their order decides tie-breaks.
    pub fn with_screeners(mut self, screeners: Vec<ScreenerType>) -> Self {
        let mut unique = Vec::with_capacity(screeners.len());
        for screener in screeners {
            if !unique.contains(&screener) {
                unique.push(screener);
            }
        }
        self.screeners = unique;
        self
    }

    pub fn with_list_size(mut self, list_size: u8) -> Self {
        self.list_size = list_size;
        self
    }

    pub fn screeners(&self) -> &[ScreenerType] {
        &self.screeners
    }

    /// Fetch every configured screener concurrently.
    ///
    /// A list that fails is logged and skipped. The call fails only when
    /// every list failed, returning the last error seen.
    pub async fn fetch_lists(&self) -> Result<Vec<ScreenerList>, MarketError> {
        if self.screeners.is_empty() {
            return Err(MarketError::InvalidRequest(
                "no screener lists configured".to_string(),
            ));
        }

        let mut tasks = JoinSet::new();
        for (position, screener) in self.screeners.iter().copied().enumerate() {
            let source = Arc::clone(&self.source);
            let list_size = self.list_size;
            tasks.spawn(async move {
                let result = source.fetch_top_stocks(screener, list_size).await;
                (position, screener, result)
            });
        }

        let mut lists: Vec<(usize, ScreenerList)> = Vec::new();
        let mut last_error = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, screener, Ok(mut ranked))) => {
                    ranked.sort_by_key(|r| r.rank);
                    let received = ranked.len();
                    // symbol is the merge key; unkeyed quotes cannot be ranked
                    let stocks: Vec<Stock> = ranked
                        .iter()
                        .filter(|r| !r.quote.symbol().trim().is_empty())
                        .map(|r| quote_to_stock(&r.quote, r.rank))
                        .collect();
                    if stocks.len() < received {
                        tracing::warn!(
                            "{} returned {} quotes without a symbol",
                            screener,
                            received - stocks.len()
                        );
                    }
                    tracing::debug!("{} returned {} stocks", screener, stocks.len());
                    lists.push((position, ScreenerList::new(screener, stocks)));
                }
                Ok((_, screener, Err(e))) => {
                    tracing::warn!("Failed to fetch {} list: {}", screener, e);
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::error!("Screener task error: {}", e);
                    last_error = Some(MarketError::Network(e.to_string()));
                }
            }
        }

        if lists.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                MarketError::Network("no screener list could be fetched".to_string())
            }));
        }

        lists.sort_by_key(|(position, _)| *position);
        Ok(lists.into_iter().map(|(_, list)| list).collect())
    }

    /// Fetch, merge and rank. `limit` truncates the ranked list.
    pub async fn refresh(&self, limit: Option<usize>) -> Result<Vec<Stock>, MarketError> {
        let lists = self.fetch_lists().await?;
        let mut ranked = self.scorer.rank(&lists);
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }

        tracing::info!(
            "Trending refresh complete: {} of {} screener lists, {} ranked stocks",
            lists.len(),
            self.screeners.len(),
            ranked.len()
        );

        Ok(ranked)
    }
}
