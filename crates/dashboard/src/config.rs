use anyhow::{Context, Result};
use client_state::FileStore;
use quote_client::ClientConfig;
use std::path::PathBuf;
use trending_ranker::DEFAULT_LIST_SIZE;

const MIN_TRENDING_COUNT: u8 = 1;
const MAX_TRENDING_COUNT: u8 = 10;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub client: ClientConfig,
    pub state_dir: PathBuf,
    /// Entries requested per screener list.
    pub trending_count: u8,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client = ClientConfig::from_vars(&var).context("Invalid quote API configuration")?;

        let state_dir = var("DASHBOARD_STATE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(|v| PathBuf::from(v.trim()))
            .unwrap_or_else(FileStore::default_dir);

        let trending_count = match var("TRENDING_COUNT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("TRENDING_COUNT must be a number, got '{}'", raw))?
                .clamp(MIN_TRENDING_COUNT as u32, MAX_TRENDING_COUNT as u32)
                as u8,
            None => DEFAULT_LIST_SIZE,
        };

        Ok(Self {
            client,
            state_dir,
            trending_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config(vars: &[(&str, &str)]) -> Result<DashboardConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DashboardConfig::from_vars(move |key: &str| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.client, ClientConfig::default());
        assert_eq!(config.trending_count, DEFAULT_LIST_SIZE);
        assert_eq!(config.state_dir, FileStore::default_dir());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("STOCK_API_BASE_URL", "https://quotes.example.com/"),
            ("STOCK_API_TIMEOUT_SECS", "15"),
            ("DASHBOARD_STATE_DIR", "/tmp/pulse"),
            ("TRENDING_COUNT", "8"),
        ])
        .unwrap();
        assert_eq!(config.client.base_url, "https://quotes.example.com");
        assert_eq!(config.client.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.state_dir, PathBuf::from("/tmp/pulse"));
        assert_eq!(config.trending_count, 8);
    }

    #[test]
    fn test_trending_count_clamped() {
        assert_eq!(config(&[("TRENDING_COUNT", "50")]).unwrap().trending_count, 10);
        assert_eq!(config(&[("TRENDING_COUNT", "0")]).unwrap().trending_count, 1);
        assert!(config(&[("TRENDING_COUNT", "many")]).is_err());
    }

    #[test]
    fn test_bad_timeout_rejected() {
        assert!(config(&[("STOCK_API_TIMEOUT_SECS", "soon")]).is_err());
    }
}
