//! Client-local state that survives restarts: the watchlist and the theme
//! preference. Each store owns its value, keeps it in memory, and writes
//! the whole blob through a [`KeyValueStore`] on every change.

pub mod storage;
pub mod theme;
pub mod watchlist;

pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use theme::{AppearanceSignal, EnvAppearance, FixedAppearance, Theme, ThemeStore, THEME_KEY};
pub use watchlist::{WatchlistStore, WATCHLIST_KEY};
