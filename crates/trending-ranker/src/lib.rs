//! Trending Stocks Ranking
//!
//! Merges the provider's screener lists into one cohort and orders it by a
//! composite of volume, move size and how many lists a symbol made.

pub mod feed;
pub mod scorer;

pub use feed::{TrendingFeed, DEFAULT_LIST_SIZE};
pub use scorer::{CompositeScorer, ScoringWeights, ScreenerList};
