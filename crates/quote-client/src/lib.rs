//! HTTP client for the stock quote API.
//!
//! One request attempt per call, no caching. Batch fetches settle every
//! symbol independently; see [`batch`].

pub mod batch;
pub mod client;
pub mod config;

pub use batch::{fetch_quotes, settle_quotes, QuoteOutcome};
pub use client::QuoteClient;
pub use config::ClientConfig;
pub use tokio_util::sync::CancellationToken;
