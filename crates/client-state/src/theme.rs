use market_core::MarketError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::storage::KeyValueStore;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(MarketError::InvalidRequest(format!(
                "unknown theme '{}', expected light or dark",
                other
            ))),
        }
    }
}

/// The platform's light/dark preference, consulted when the user never chose.
pub trait AppearanceSignal: Send + Sync {
    fn prefers_dark(&self) -> bool;

    fn theme(&self) -> Theme {
        if self.prefers_dark() {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

/// Signal pinned to one theme.
#[derive(Debug, Clone, Copy)]
pub struct FixedAppearance(pub Theme);

impl AppearanceSignal for FixedAppearance {
    fn prefers_dark(&self) -> bool {
        self.0 == Theme::Dark
    }
}

/// Reads `DASHBOARD_APPEARANCE`, then the terminal's `COLORFGBG`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvAppearance {
    dark: bool,
}

impl EnvAppearance {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var("DASHBOARD_APPEARANCE") {
            match value.parse::<Theme>() {
                Ok(theme) => return Self { dark: theme == Theme::Dark },
                Err(_) => tracing::warn!("Ignoring DASHBOARD_APPEARANCE={}", value),
            }
        }

        // "fg;bg" or "fg;default;bg"; low ANSI colours other than 7 are dark
        let dark = var("COLORFGBG")
            .and_then(|v| v.rsplit(';').next().and_then(|bg| bg.trim().parse::<u8>().ok()))
            .map(|bg| bg <= 6 || bg == 8)
            .unwrap_or(false);
        Self { dark }
    }
}

impl AppearanceSignal for EnvAppearance {
    fn prefers_dark(&self) -> bool {
        self.dark
    }
}

/// Persisted light/dark choice.
///
/// Until the user toggles or sets a theme, the ambient signal decides and
/// nothing is written.
pub struct ThemeStore {
    theme: Theme,
    explicit: bool,
    storage: Arc<dyn KeyValueStore>,
}

impl ThemeStore {
    pub fn init(storage: Arc<dyn KeyValueStore>, ambient: &dyn AppearanceSignal) -> Self {
        let persisted = match Self::load(storage.as_ref()) {
            Ok(theme) => theme,
            Err(e) => {
                tracing::warn!("Discarding persisted theme: {}", e);
                None
            }
        };

        let (theme, explicit) = match persisted {
            Some(theme) => (theme, true),
            None => (ambient.theme(), false),
        };
        tracing::debug!("Theme {} (explicit: {})", theme, explicit);

        Self {
            theme,
            explicit,
            storage,
        }
    }

    fn load(storage: &dyn KeyValueStore) -> Result<Option<Theme>, MarketError> {
        let Some(blob) = storage.load(THEME_KEY)? else {
            return Ok(None);
        };
        let trimmed = blob.trim();
        let raw = trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(trimmed);
        raw.parse::<Theme>()
            .map(Some)
            .map_err(|_| MarketError::MalformedPersistedState {
                key: THEME_KEY.to_string(),
                reason: format!("unexpected value '{}'", raw),
            })
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Whether the current theme was chosen by the user rather than inherited.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn toggle(&mut self) -> Theme {
        self.set(self.theme.toggled());
        self.theme
    }

    pub fn set(&mut self, theme: Theme) {
        self.theme = theme;
        self.explicit = true;
        if let Err(e) = self.storage.save(THEME_KEY, theme.as_str()) {
            tracing::error!("Failed to persist theme: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use std::collections::HashMap;

    /// Reads nothing, refuses every write.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn load(&self, _key: &str) -> Result<Option<String>, MarketError> {
            Ok(None)
        }

        fn save(&self, key: &str, _value: &str) -> Result<(), MarketError> {
            Err(MarketError::Storage(format!("{} is read-only", key)))
        }

        fn remove(&self, _key: &str) -> Result<(), MarketError> {
            Err(MarketError::Storage("read-only".to_string()))
        }
    }

    fn appearance(vars: &[(&str, &str)]) -> EnvAppearance {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvAppearance::from_vars(move |key: &str| map.get(key).cloned())
    }

    #[test]
    fn test_first_run_follows_ambient_dark() {
        let storage = Arc::new(MemoryStore::new());
        let store = ThemeStore::init(storage.clone(), &FixedAppearance(Theme::Dark));

        assert_eq!(store.theme(), Theme::Dark);
        assert_eq!(store.theme().as_str(), "dark");
        assert!(!store.is_explicit());
        assert_eq!(storage.load(THEME_KEY).unwrap(), None);
    }

    #[test]
    fn test_persisted_value_beats_ambient() {
        let storage = Arc::new(MemoryStore::with_entry(THEME_KEY, "light"));
        let store = ThemeStore::init(storage, &FixedAppearance(Theme::Dark));
        assert_eq!(store.theme(), Theme::Light);
        assert!(store.is_explicit());
    }

    #[test]
    fn test_quoted_value_accepted() {
        let storage = Arc::new(MemoryStore::with_entry(THEME_KEY, "\"dark\"\n"));
        let store = ThemeStore::init(storage, &FixedAppearance(Theme::Light));
        assert_eq!(store.theme(), Theme::Dark);
    }

    #[test]
    fn test_malformed_value_falls_back_to_ambient() {
        let storage = Arc::new(MemoryStore::with_entry(THEME_KEY, "solarized"));
        let store = ThemeStore::init(storage, &FixedAppearance(Theme::Dark));
        assert_eq!(store.theme(), Theme::Dark);
        assert!(!store.is_explicit());
    }

    #[test]
    fn test_toggle_persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()));

        let mut store = ThemeStore::init(Arc::clone(&storage), &FixedAppearance(Theme::Light));
        assert_eq!(store.toggle(), Theme::Dark);
        assert!(store.is_explicit());

        // ambient now says light, but the explicit choice wins
        let reloaded = ThemeStore::init(storage, &FixedAppearance(Theme::Light));
        assert_eq!(reloaded.theme(), Theme::Dark);
    }

    #[test]
    fn test_set_writes_bare_literal() {
        let storage = Arc::new(MemoryStore::new());
        let mut store = ThemeStore::init(storage.clone(), &FixedAppearance(Theme::Dark));
        store.set(Theme::Dark);
        assert_eq!(storage.load(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_failed_write_keeps_new_theme() {
        let mut store = ThemeStore::init(Arc::new(ReadOnlyStore), &FixedAppearance(Theme::Light));
        store.set(Theme::Dark);
        assert_eq!(store.theme(), Theme::Dark);
        assert!(store.is_explicit());

        assert_eq!(store.toggle(), Theme::Light);
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn test_env_appearance() {
        assert!(appearance(&[("DASHBOARD_APPEARANCE", "Dark")]).prefers_dark());
        assert!(!appearance(&[("DASHBOARD_APPEARANCE", "light"), ("COLORFGBG", "15;0")]).prefers_dark());
        assert!(appearance(&[("COLORFGBG", "15;0")]).prefers_dark());
        assert!(appearance(&[("COLORFGBG", "15;default;8")]).prefers_dark());
        assert!(!appearance(&[("COLORFGBG", "0;15")]).prefers_dark());
        assert!(!appearance(&[("COLORFGBG", "0;7")]).prefers_dark());
        assert!(!appearance(&[]).prefers_dark());
        // unparsable override falls through to COLORFGBG
        assert!(appearance(&[("DASHBOARD_APPEARANCE", "auto"), ("COLORFGBG", "7;0")]).prefers_dark());
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("DARK".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("blue".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }
}
