// src/providers/thenewsapi.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{get_body, overfetch, record_category, Mode, NewsProvider};
use crate::article::{ArticleDraft, Category, NormalizedArticle};

const NAME: &str = "thenewsapi";
const URL: &str = "https://api.thenewsapi.com/v1/news/top";

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    data: Option<Vec<Item>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    url: Option<String>,
    source: Option<SourceField>,
    published_at: Option<String>,
    date: Option<String>,
    snippet: Option<String>,
    description: Option<String>,
    content: Option<String>,
}

/// `source` is a bare domain string in most payloads, an object in some.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceField {
    Name(String),
    Object {
        title: Option<String>,
        name: Option<String>,
        url: Option<String>,
    },
}

pub fn map_category(c: Category) -> &'static str {
    match c {
        Category::World => "world",
        Category::Politics => "politics",
        Category::Business => "business",
        Category::Technology => "tech",
        Category::Entertainment => "entertainment",
        Category::Sports => "sports",
        Category::Science => "science",
        Category::Health => "health",
        Category::General | Category::Local | Category::All => "general",
    }
}

pub struct TheNewsApiProvider {
    mode: Mode,
}

impl TheNewsApiProvider {
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
        let resp: Response = serde_json::from_str(body).context("parsing thenewsapi json")?;
        if let Some(err) = resp.error {
            bail!("thenewsapi error: {err}");
        }
        let tag = record_category(category);
        Ok(resp
            .data
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, it)| {
                let (source_name, source_url) = match it.source {
                    Some(SourceField::Name(n)) => (Some(n), None),
                    Some(SourceField::Object { title, name, url }) => (title.or(name), url),
                    None => (None, None),
                };
                ArticleDraft {
                    provider: NAME,
                    index,
                    title: it.title,
                    source_url: source_url.or_else(|| it.url.clone()),
                    url: it.url,
                    source_name: source_name.or_else(|| Some("TheNewsAPI".to_string())),
                    published_at: it.published_at.or(it.date),
                    content: it.snippet.or(it.description).or(it.content),
                }
                .build(tag, now)
            })
            .collect())
    }
}

#[async_trait]
impl NewsProvider for TheNewsApiProvider {
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
                    ("locale", "us".to_string()),
                    ("language", "en".to_string()),
                    ("categories", map_category(category).to_string()),
                    ("api_token", api_key.clone()),
                    ("limit", overfetch(count, 20).to_string()),
                ];
                let body = get_body(client, NAME, URL, &query).await?;
                Self::parse_items(&body, category, now)
            }
        }
    }
}
