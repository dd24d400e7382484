use async_trait::async_trait;
use market_core::{
    BriefingRequest, BriefingResponse, HistoricalData, HistoryPeriod, MarketDataSource,
    MarketError, RankedQuote, ScreenerType, StockInfo, StockPrice, StockQuote,
};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use crate::batch;
use crate::config::ClientConfig;

/// Bounds the top-stocks endpoint accepts for `count`.
pub const MIN_TOP_COUNT: u8 = 1;
pub const MAX_TOP_COUNT: u8 = 10;

#[derive(Clone)]
pub struct QuoteClient {
    client: Client,
    base_url: Url,
}

impl QuoteClient {
    pub fn new(config: &ClientConfig) -> Result<Self, MarketError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            MarketError::InvalidRequest(format!("invalid base url '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MarketError::InvalidRequest(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| MarketError::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn from_env() -> Result<Self, MarketError> {
        Self::new(&ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build `base/segment/segment`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<T, MarketError> {
        let response = builder
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} returned HTTP {}", resource, status);
            return Err(MarketError::NotFound {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| MarketError::Decode(format!("{}: {}", resource, e)))
    }

    /// Get basic company info for a symbol
    pub async fn fetch_stock_info(&self, symbol: &str) -> Result<StockInfo, MarketError> {
        let url = self.endpoint(&["stocks", "info", symbol]);
        self.send_json(self.client.get(url), &format!("stock info {}", symbol))
            .await
    }

    /// Get the latest price block for a symbol
    pub async fn fetch_stock_price(&self, symbol: &str) -> Result<StockPrice, MarketError> {
        let url = self.endpoint(&["stocks", "price", symbol]);
        self.send_json(self.client.get(url), &format!("stock price {}", symbol))
            .await
    }

    /// Get info + price for a symbol in one request
    pub async fn fetch_quote(&self, symbol: &str) -> Result<StockQuote, MarketError> {
        let url = self.endpoint(&["stocks", "quote", symbol]);
        self.send_json(self.client.get(url), &format!("quote {}", symbol))
            .await
    }

    /// Quote lookup by ticker on the `/api` surface; the ticker is upper-cased.
    pub async fn fetch_stock_by_ticker(&self, ticker: &str) -> Result<StockQuote, MarketError> {
        let ticker = ticker.trim().to_ascii_uppercase();
        let url = self.endpoint(&["api", "stocks", &ticker]);
        self.send_json(self.client.get(url), &format!("ticker {}", ticker))
            .await
    }

    /// Get OHLCV history over `period`
    pub async fn fetch_history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
    ) -> Result<HistoricalData, MarketError> {
        let url = self.endpoint(&["stocks", "history", symbol]);
        self.send_json(
            self.client.get(url).query(&[("period", period.as_str())]),
            &format!("history {} ({})", symbol, period),
        )
        .await
    }

    /// Provider trending list. Single request: fails as a whole.
    pub async fn fetch_trending(&self) -> Result<Vec<StockQuote>, MarketError> {
        let url = self.endpoint(&["api", "stocks", "trending"]);
        let quotes: Vec<StockQuote> = self
            .send_json(self.client.get(url), "trending stocks")
            .await?;
        tracing::debug!("Fetched {} trending quotes", quotes.len());
        Ok(quotes)
    }

    /// Top `count` entries of a screener list, `count` clamped to 1..=10.
    pub async fn fetch_top_stocks(
        &self,
        screener: ScreenerType,
        count: u8,
    ) -> Result<Vec<RankedQuote>, MarketError> {
        let clamped = count.clamp(MIN_TOP_COUNT, MAX_TOP_COUNT);
        if clamped != count {
            tracing::debug!("Top stocks count {} clamped to {}", count, clamped);
        }

        let url = self.endpoint(&["api", "stocks", "trending", "top"]);
        self.send_json(
            self.client.get(url).query(&[
                ("type", screener.as_str().to_string()),
                ("count", clamped.to_string()),
            ]),
            &format!("top stocks ({})", screener),
        )
        .await
    }

    /// Ask the backend to write a briefing for `ticker`.
    pub async fn generate_briefing(
        &self,
        ticker: &str,
        screener: ScreenerType,
    ) -> Result<BriefingResponse, MarketError> {
        let request = BriefingRequest {
            ticker: ticker.trim().to_ascii_uppercase(),
            screener,
        };
        let url = self.endpoint(&["api", "briefing", "generate"]);
        let resource = format!("briefing {}", request.ticker);
        self.send_json(self.client.post(url).json(&request), &resource)
            .await
    }

    /// Fetch many quotes concurrently; failed symbols are simply absent.
    pub async fn fetch_quotes(&self, symbols: &[String]) -> HashMap<String, StockQuote> {
        batch::fetch_quotes(self, symbols, None).await
    }

    /// As [`fetch_quotes`](Self::fetch_quotes), abandoning in-flight requests once `cancel` fires.
    pub async fn fetch_quotes_until_cancelled(
        &self,
        symbols: &[String],
        cancel: &CancellationToken,
    ) -> HashMap<String, StockQuote> {
        batch::fetch_quotes(self, symbols, Some(cancel)).await
    }
}

#[async_trait]
impl MarketDataSource for QuoteClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<StockQuote, MarketError> {
        QuoteClient::fetch_quote(self, symbol).await
    }

    async fn fetch_top_stocks(
        &self,
        screener: ScreenerType,
        count: u8,
    ) -> Result<Vec<RankedQuote>, MarketError> {
        QuoteClient::fetch_top_stocks(self, screener, count).await
    }

    async fn fetch_trending(&self) -> Result<Vec<StockQuote>, MarketError> {
        QuoteClient::fetch_trending(self).await
    }
}
