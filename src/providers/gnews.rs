// src/providers/gnews.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{get_body, record_category, Mode, NewsProvider};
use crate::article::{ArticleDraft, Category, NormalizedArticle};

const NAME: &str = "gnews";
const URL: &str = "https://gnews.io/api/v4/top-headlines";

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    articles: Option<Vec<Item>>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    url: Option<String>,
    source: Option<Source>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    #[serde(rename = "published_at")]
    published_at_snake: Option<String>,
    published: Option<String>,
    description: Option<String>,
    content: Option<String>,
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Source {
    name: Option<String>,
    url: Option<String>,
}

/// GNews topic vocabulary ("nation" is their politics).
pub fn map_category(c: Category) -> &'static str {
    match c {
        Category::World => "world",
        Category::Politics => "nation",
        Category::Business => "business",
        Category::Technology => "technology",
        Category::Entertainment => "entertainment",
        Category::Sports => "sports",
        Category::Science => "science",
        Category::Health => "health",
        Category::General | Category::Local | Category::All => "general",
    }
}

fn page_size(count: usize) -> usize {
    count.saturating_mul(2).clamp(10, 50)
}

pub struct GNewsProvider {
    mode: Mode,
}

impl GNewsProvider {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    pub fn from_fixture_str(s: &str) -> Self {
        Self::new(Mode::Fixture(s.to_string()))
    }

    pub fn parse_items(
        body: &str,
        category: Category,
        now: DateTime<Utc>,
    ) -> Result<Vec<NormalizedArticle>> {
        let resp: Response = serde_json::from_str(body).context("parsing gnews json")?;
        if let Some(errs) = resp.errors {
            bail!("gnews error: {errs}");
        }
        let tag = record_category(category);
        Ok(resp
            .articles
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, it)| {
                let (source_name, source_url) = match it.source {
                    Some(s) => (s.name, s.url),
                    None => (None, None),
                };
                ArticleDraft {
                    provider: NAME,
                    index,
                    title: it.title,
                    source_url: source_url.or_else(|| it.url.clone()),
                    url: it.url,
                    source_name: source_name.or_else(|| Some("GNews".to_string())),
                    published_at: it
                        .published_at
                        .or(it.published_at_snake)
                        .or(it.published),
                    content: it.description.or(it.content).or(it.summary),
                }
                .build(tag, now)
            })
            .collect())
    }
}

#[async_trait]
impl NewsProvider for GNewsProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_enabled(&self) -> bool {
        self.mode.is_enabled()
    }

    async fn fetch(&self, category: Category, count: usize) -> Result<Vec<NormalizedArticle>> {
        let now = Utc::now();
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items(s, category, now),
            Mode::Http { client, api_key } => {
                let query = [
                    ("apikey", api_key.clone()),
                    ("lang", "en".to_string()),
                    ("country", "us".to_string()),
                    ("topic", map_category(category).to_string()),
                    ("max", page_size(count).to_string()),
                ];
                let body = get_body(client, NAME, URL, &query).await?;
                Self::parse_items(&body, category, now)
            }
        }
    }
}
