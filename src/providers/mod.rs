// src/providers/mod.rs
//! News provider adapters. Each adapter owns its wire schema and category
//! vocabulary and hands back `NormalizedArticle`s.

pub mod gnews;
pub mod newsapi;
pub mod thenewsapi;
pub mod webz;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::article::{Category, NormalizedArticle};
use crate::config::Settings;

pub const USER_AGENT: &str = "PointCounterpoint/1.0";

#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the provider has what it needs to issue a request.
    fn is_enabled(&self) -> bool;

    /// Top headlines for `category`, already normalized. `count` is the size
    /// the caller wants after dedup; adapters over-fetch on their own.
    async fn fetch(&self, category: Category, count: usize) -> Result<Vec<NormalizedArticle>>;
}

pub type DynProvider = Arc<dyn NewsProvider>;

/// Where an adapter gets its raw body from.
pub enum Mode {
    /// Raw response body, parsed as if it came over the wire.
    Fixture(String),
    Http {
        client: reqwest::Client,
        api_key: String,
    },
}

impl Mode {
    pub fn http(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Mode::Http {
            client,
            api_key: api_key.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            Mode::Fixture(_) => true,
            Mode::Http { api_key, .. } => !api_key.trim().is_empty(),
        }
    }
}

/// Shared outbound client: one UA, one bounded timeout for every provider.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(timeout.min(Duration::from_secs(4)))
        .timeout(timeout)
        .build()
        .context("building provider http client")
}

/// GET `url` with `query` and return the body of a 2xx response.
pub(crate) async fn get_body(
    client: &reqwest::Client,
    provider: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<String> {
    let resp = client
        .get(url)
        .query(query)
        .send()
        .await
        .with_context(|| format!("{provider} http get"))?;
    let status = resp.status();
    let body = resp
        .text()
        .await
        .with_context(|| format!("{provider} http .text()"))?;
    if !status.is_success() {
        let snippet: String = body.chars().take(200).collect();
        bail!("{provider} returned HTTP {status}: {snippet}");
    }
    Ok(body)
}

/// Over-fetch size: `max(count * 2, floor)`.
pub(crate) fn overfetch(count: usize, floor: usize) -> usize {
    count.saturating_mul(2).max(floor)
}

/// Category stamped on normalized records. `All` is a filter, not a label.
pub(crate) fn record_category(requested: Category) -> Category {
    match requested {
        Category::All => Category::General,
        c => c,
    }
}

/// Enabled providers in request order: Webz, NewsAPI, GNews, TheNewsAPI.
pub fn from_settings(settings: &Settings, client: &reqwest::Client) -> Vec<DynProvider> {
    let keys = &settings.providers;
    let mut out: Vec<DynProvider> = Vec::new();
    if let Some(k) = &keys.webz {
        out.push(Arc::new(webz::WebzProvider::new(Mode::http(client.clone(), k))));
    }
    if let Some(k) = &keys.news_api {
        out.push(Arc::new(newsapi::NewsApiProvider::new(Mode::http(client.clone(), k))));
    }
    if let Some(k) = &keys.gnews {
        out.push(Arc::new(gnews::GNewsProvider::new(Mode::http(client.clone(), k))));
    }
    if let Some(k) = &keys.the_news_api {
        out.push(Arc::new(thenewsapi::TheNewsApiProvider::new(Mode::http(
            client.clone(),
            k,
        ))));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderKeys, Settings};

    #[test]
    fn overfetch_respects_floor() {
        assert_eq!(overfetch(5, 20), 20);
        assert_eq!(overfetch(15, 20), 30);
    }

    #[test]
    fn registry_only_builds_keyed_providers_in_order() {
        let settings = Settings {
            providers: ProviderKeys {
                the_news_api: Some("t".into()),
                webz: Some("w".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let client = reqwest::Client::new();
        let names: Vec<_> = from_settings(&settings, &client)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["webz", "thenewsapi"]);
    }
}
