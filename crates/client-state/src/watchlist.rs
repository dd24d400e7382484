use market_core::{MarketError, Stock};
use std::collections::HashSet;
use std::sync::Arc;

use crate::storage::KeyValueStore;

pub const WATCHLIST_KEY: &str = "watchlist";

/// The user's tracked stocks, unique by symbol, in insertion order.
///
/// Every mutation updates memory first and then rewrites the persisted blob.
pub struct WatchlistStore {
    entries: Vec<Stock>,
    storage: Arc<dyn KeyValueStore>,
}

impl WatchlistStore {
    /// Rehydrate from storage. A missing, unreadable or corrupt blob yields
    /// an empty watchlist.
    pub fn init(storage: Arc<dyn KeyValueStore>) -> Self {
        let entries = match Self::load(storage.as_ref()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Discarding persisted watchlist: {}", e);
                Vec::new()
            }
        };

        tracing::debug!("Watchlist rehydrated with {} entries", entries.len());
        Self { entries, storage }
    }

    fn load(storage: &dyn KeyValueStore) -> Result<Vec<Stock>, MarketError> {
        let Some(blob) = storage.load(WATCHLIST_KEY)? else {
            return Ok(Vec::new());
        };

        let stored: Vec<Stock> =
            serde_json::from_str(&blob).map_err(|e| MarketError::MalformedPersistedState {
                key: WATCHLIST_KEY.to_string(),
                reason: e.to_string(),
            })?;

        // hand-edited blobs may repeat a symbol; the first one wins
        let mut seen = HashSet::new();
        let entries: Vec<Stock> = stored
            .into_iter()
            .filter(|s| !s.symbol.is_empty() && seen.insert(s.symbol.clone()))
            .collect();
        Ok(entries)
    }

    /// Add a snapshot. Returns false when the symbol is already tracked
    /// (the existing entry is left untouched) or the symbol is empty.
    pub fn add(&mut self, stock: Stock) -> bool {
        if stock.symbol.is_empty() || self.contains(&stock.symbol) {
            return false;
        }
        tracing::info!("Added {} to watchlist", stock.symbol);
        self.entries.push(stock);
        self.persist();
        true
    }

    /// Returns false when the symbol was not tracked.
    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|s| s.symbol != symbol);
        if self.entries.len() == before {
            return false;
        }
        tracing::info!("Removed {} from watchlist", symbol);
        self.persist();
        true
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.iter().any(|s| s.symbol == symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Stock> {
        self.entries.iter().find(|s| s.symbol == symbol)
    }

    pub fn list(&self) -> &[Stock] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Memory stays authoritative when the write fails.
    fn persist(&self) {
        let result = serde_json::to_string(&self.entries)
            .map_err(|e| MarketError::Storage(e.to_string()))
            .and_then(|blob| self.storage.save(WATCHLIST_KEY, &blob));
        if let Err(e) = result {
            tracing::error!("Failed to persist watchlist: {}", e);
        }
    }
}
