// src/providers/webz.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{get_body, overfetch, record_category, Mode, NewsProvider};
use crate::article::{ArticleDraft, Category, NormalizedArticle};

const NAME: &str = "webz";
const URL: &str = "https://api.webz.io/news-api/v1/search";

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    posts: Option<Vec<Post>>,
    #[serde(default)]
    articles: Option<Vec<Post>>,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    url: Option<String>,
    canonical_url: Option<String>,
    link: Option<String>,
    thread: Option<Thread>,
    source: Option<PostSource>,
    published: Option<String>,
    text: Option<String>,
    excerpt: Option<String>,
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thread {
    url: Option<String>,
    site_full: Option<String>,
    site: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostSource {
    title: Option<String>,
}

/// Webz filters by category inside the query string.
pub fn search_query(c: Category) -> String {
    format!("site_type:news AND language:english AND category:{}", c.as_str())
}

pub struct WebzProvider {
    mode: Mode,
}

impl WebzProvider {
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
        let resp: Response = serde_json::from_str(body).context("parsing webz json")?;
        let posts = resp.posts.or(resp.articles).unwrap_or_default();
        let tag = record_category(category);
        Ok(posts
            .into_iter()
            .enumerate()
            .map(|(index, p)| {
                let (thread_url, site_full, site) = match p.thread {
                    Some(t) => (t.url, t.site_full, t.site),
                    None => (None, None, None),
                };
                let url = p
                    .url
                    .clone()
                    .or(thread_url)
                    .or(p.canonical_url)
                    .or(p.link);
                ArticleDraft {
                    provider: NAME,
                    index,
                    title: p.title,
                    source_name: site_full.or_else(|| p.source.and_then(|s| s.title)),
                    source_url: site.or(p.url),
                    url,
                    published_at: p.published,
                    content: p.text.or(p.excerpt).or(p.summary),
                }
                .build(tag, now)
            })
            .collect())
    }
}

#[async_trait]
impl NewsProvider for WebzProvider {
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
                    ("token", api_key.clone()),
                    ("q", search_query(category)),
                    ("sort", "published".to_string()),
                    ("size", overfetch(count, 20).to_string()),
                ];
                let body = get_body(client, NAME, URL, &query).await?;
                Self::parse_items(&body, category, now)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_fields_feed_source() {
        let body = r#"{"posts":[{"title":"Quake","thread":{"url":"https://w.test/q",
            "site_full":"www.bbc.co.uk","site":"bbc.co.uk"},"published":"2025-02-01T10:00:00.000+02:00",
            "text":"Body"}]}"#;
        let out = WebzProvider::parse_items(body, Category::World, Utc::now()).unwrap();
        assert_eq!(out[0].url, "https://w.test/q");
        assert_eq!(out[0].source_name(), "www.bbc.co.uk");
        assert_eq!(out[0].source_url(), "bbc.co.uk");
        assert_eq!(out[0].content, "Body");
    }

    #[test]
    fn articles_key_is_accepted_and_empty_is_ok() {
        let body = r#"{"articles":[{"title":"x","url":"https://w.test/x"}]}"#;
        let out = WebzProvider::parse_items(body, Category::General, Utc::now()).unwrap();
        assert_eq!(out.len(), 1);
        let none =
            WebzProvider::parse_items(r#"{"totalResults":0}"#, Category::General, Utc::now())
                .unwrap();
        assert!(none.is_empty());
    }
}
