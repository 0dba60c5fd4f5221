// src/providers/newsapi.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{get_body, overfetch, record_category, Mode, NewsProvider};
use crate::article::{ArticleDraft, Category, NormalizedArticle};

const NAME: &str = "newsapi";
const URL: &str = "https://newsapi.org/v2/top-headlines";

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    url: Option<String>,
    author: Option<String>,
    source: Option<Source>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    #[serde(rename = "published_at")]
    published_at_snake: Option<String>,
    date: Option<String>,
    content: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Source {
    name: Option<String>,
}

/// NewsAPI.org categories. `None` means "send no category".
pub fn map_category(c: Category) -> Option<&'static str> {
    match c {
        Category::All => None,
        Category::Business => Some("business"),
        Category::Technology => Some("technology"),
        Category::Entertainment => Some("entertainment"),
        Category::Sports => Some("sports"),
        Category::Science => Some("science"),
        Category::Health => Some("health"),
        Category::General | Category::Politics | Category::World | Category::Local => {
            Some("general")
        }
    }
}

pub struct NewsApiProvider {
    mode: Mode,
}

impl NewsApiProvider {
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
        let resp: Response = serde_json::from_str(body).context("parsing newsapi json")?;
        if resp.status.as_deref() == Some("error") {
            bail!(
                "newsapi error: {}",
                resp.message.unwrap_or_else(|| "unknown".into())
            );
        }
        let tag = record_category(category);
        Ok(resp
            .articles
            .into_iter()
            .enumerate()
            .map(|(index, it)| {
                let source_name = it
                    .source
                    .and_then(|s| s.name)
                    .or(it.author)
                    .or_else(|| Some("NewsAPI".to_string()));
                ArticleDraft {
                    provider: NAME,
                    index,
                    title: it.title,
                    source_url: it.url.clone(),
                    url: it.url,
                    source_name,
                    published_at: it.published_at.or(it.published_at_snake).or(it.date),
                    content: it.content.or(it.description),
                }
                .build(tag, now)
            })
            .collect())
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
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
                let mut query = vec![
                    ("apiKey", api_key.clone()),
                    ("country", "us".to_string()),
                    ("pageSize", overfetch(count, 20).to_string()),
                ];
                if let Some(c) = map_category(category) {
                    query.push(("category", c.to_string()));
                }
                let body = get_body(client, NAME, URL, &query).await?;
                Self::parse_items(&body, category, now)
            }
        }
    }
}
