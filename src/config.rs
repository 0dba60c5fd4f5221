// src/config.rs
//! Settings resolved once at startup and passed into constructors.
//! Tunables live in TOML; credentials only ever come from the environment.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "PCP_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/point_counterpoint.toml";

pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const ENV_GNEWS_API_KEY: &str = "GNEWS_API_KEY";
pub const ENV_WEBZIO_API_KEY: &str = "WEBZIO_API_KEY";
pub const ENV_THE_NEWS_API_KEY: &str = "THE_NEWS_API_KEY";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_KEY: &str = "SUPABASE_KEY";

/// Non-secret knobs, all optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub provider_timeout_ms: u64,
    pub page_size: usize,
    pub refresh_interval_secs: u64,
    pub retention_days: i64,
    pub refresh_per_category: usize,
    pub persist_live: bool,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            provider_timeout_ms: 8_000,
            page_size: 5,
            refresh_interval_secs: 3 * 3600,
            retention_days: 7,
            refresh_per_category: 10,
            persist_live: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderKeys {
    pub news_api: Option<String>,
    pub gnews: Option<String>,
    pub webz: Option<String>,
    pub the_news_api: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseCreds {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub tunables: Tunables,
    pub providers: ProviderKeys,
    pub supabase: Option<SupabaseCreds>,
}

impl Settings {
    /// Load tunables via env path / default file, then credentials from env.
    pub fn load() -> Result<Self> {
        let tunables = load_tunables_default()?;
        Ok(Self::from_parts(tunables, |k| std::env::var(k).ok()))
    }

    /// Build from tunables plus a key lookup (env in production, a map in tests).
    pub fn from_parts<F>(tunables: Tunables, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let providers = ProviderKeys {
            news_api: get(ENV_NEWS_API_KEY),
            gnews: get(ENV_GNEWS_API_KEY),
            webz: get(ENV_WEBZIO_API_KEY),
            the_news_api: get(ENV_THE_NEWS_API_KEY),
        };
        let supabase = match (get(ENV_SUPABASE_URL), get(ENV_SUPABASE_KEY)) {
            (Some(url), Some(key)) => Some(SupabaseCreds {
                url: url.trim_end_matches('/').to_string(),
                key,
            }),
            _ => None,
        };

        Self {
            tunables,
            providers,
            supabase,
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.tunables.provider_timeout_ms.max(1))
    }

    /// Names of providers whose credential is present, in request order.
    pub fn enabled_providers(&self) -> Vec<&'static str> {
        let p = &self.providers;
        [
            ("webz", p.webz.is_some()),
            ("newsapi", p.news_api.is_some()),
            ("gnews", p.gnews.is_some()),
            ("thenewsapi", p.the_news_api.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }
}

/// Load tunables from an explicit TOML file.
pub fn load_tunables_from(path: &Path) -> Result<Tunables> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing settings in {}", path.display()))
}

/// 1) $PCP_CONFIG_PATH  2) config/point_counterpoint.toml  3) defaults
pub fn load_tunables_default() -> Result<Tunables> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_tunables_from(&pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default.exists() {
        return load_tunables_from(&default);
    }
    Ok(Tunables::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn blank_keys_count_as_unset() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_NEWS_API_KEY, "abc"),
            (ENV_GNEWS_API_KEY, "   "),
            (ENV_THE_NEWS_API_KEY, "t"),
            (ENV_SUPABASE_URL, "https://db.example.co/"),
        ]);
        let s = Settings::from_parts(Tunables::default(), |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(s.enabled_providers(), vec!["newsapi", "thenewsapi"]);
        // url without key is not a usable store
        assert!(s.supabase.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let t: Tunables = toml::from_str("page_size = 8\npersist_live = false").unwrap();
        assert_eq!(t.page_size, 8);
        assert!(!t.persist_live);
        assert_eq!(t.provider_timeout_ms, 8_000);
        assert_eq!(t.retention_days, 7);
    }
}
