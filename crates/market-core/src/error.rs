use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found (HTTP {status}): {resource}")]
    NotFound { resource: String, status: u16 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Malformed persisted state for '{key}': {reason}")]
    MalformedPersistedState { key: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl MarketError {
    /// True for failures that concern a single symbol and can be skipped
    /// inside a batch.
    pub fn is_per_symbol(&self) -> bool {
        matches!(
            self,
            MarketError::Network(_)
                | MarketError::NotFound { .. }
                | MarketError::Decode(_)
                | MarketError::Cancelled
        )
    }
}
