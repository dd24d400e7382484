use async_trait::async_trait;

use crate::{MarketError, RankedQuote, ScreenerType, StockQuote};

/// Source of provider-shaped quotes.
///
/// The HTTP client implements this; batch helpers and the trending feed
/// are written against the trait so they can run over any source.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the combined info + price record for one symbol.
    async fn fetch_quote(&self, symbol: &str) -> Result<StockQuote, MarketError>;

    /// Fetch the provider-ranked list for one screener.
    async fn fetch_top_stocks(
        &self,
        screener: ScreenerType,
        count: u8,
    ) -> Result<Vec<RankedQuote>, MarketError>;

    /// Fetch the provider's trending list.
    async fn fetch_trending(&self) -> Result<Vec<StockQuote>, MarketError>;
}
