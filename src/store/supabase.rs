// src/store/supabase.rs
//! Supabase (PostgREST) backed store: `articles` and `perspectives` tables.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ArticleStore, Freshness};
use crate::article::{
    parse_timestamp, ArticleSource, Category, NormalizedArticle, Perspective, UNKNOWN_SOURCE,
    UNTITLED,
};
use crate::config::SupabaseCreds;

const RETURN_ROWS: &str = "return=representation";

#[derive(Debug, Deserialize)]
struct Row {
    id: serde_json::Value,
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
    source_name: Option<String>,
    source_url: Option<String>,
    published_at: Option<String>,
    category: Option<String>,
    last_shown_at: Option<String>,
    #[serde(default)]
    perspectives: Vec<PerspectiveRow>,
}

#[derive(Debug, Deserialize, Serialize)]
struct PerspectiveRow {
    viewpoint: String,
    summary: String,
}

#[derive(Debug, Serialize)]
struct NewRow<'a> {
    title: &'a str,
    content: &'a str,
    source_name: &'a str,
    source_url: &'a str,
    url: &'a str,
    published_at: DateTime<Utc>,
    category: &'a str,
}

impl Row {
    fn into_article(self) -> NormalizedArticle {
        // ids are uuids in the schema but numeric ids show up in older tables
        let id = match self.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        let url = self.url.unwrap_or_default();
        NormalizedArticle {
            id,
            title: self.title.unwrap_or_else(|| UNTITLED.to_string()),
            source: ArticleSource {
                name: self.source_name.unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
                url: self.source_url.unwrap_or_else(|| url.clone()),
            },
            url,
            published_at: self
                .published_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(Utc::now),
            content: self.content.unwrap_or_default(),
            category: self
                .category
                .as_deref()
                .and_then(|c| c.parse().ok())
                .unwrap_or_default(),
            perspectives: self
                .perspectives
                .into_iter()
                .map(|p| Perspective {
                    viewpoint: p.viewpoint,
                    summary: p.summary,
                    title: None,
                })
                .collect(),
            last_shown_at: self.last_shown_at.as_deref().and_then(parse_timestamp),
        }
    }
}

pub struct SupabaseStore {
    http: reqwest::Client,
    base: String,
    key: String,
}

impl SupabaseStore {
    pub fn new(http: reqwest::Client, creds: &SupabaseCreds) -> Self {
        Self {
            http,
            base: format!("{}/rest/v1", creds.url),
            key: creds.key.clone(),
        }
    }

    fn table(&self, name: &str) -> String {
        format!("{}/{}", self.base, name)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.key).bearer_auth(&self.key)
    }

    async fn send(&self, req: reqwest::RequestBuilder, op: &str) -> Result<reqwest::Response> {
        let resp = self
            .authed(req)
            .send()
            .await
            .with_context(|| format!("supabase {op}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            bail!("supabase {op} returned HTTP {status}: {snippet}");
        }
        Ok(resp)
    }

    async fn rows(&self, req: reqwest::RequestBuilder, op: &str) -> Result<Vec<Row>> {
        self.send(req, op)
            .await?
            .json::<Vec<Row>>()
            .await
            .with_context(|| format!("decoding supabase {op} rows"))
    }
}

fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

#[async_trait]
impl ArticleStore for SupabaseStore {
    fn kind(&self) -> &'static str {
        "supabase"
    }

    async fn list(
        &self,
        category: Category,
        freshness: Freshness,
        limit: usize,
    ) -> Result<Vec<NormalizedArticle>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "published_at.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        if category != Category::All {
            query.push(("category", format!("eq.{category}")));
        }
        if let Freshness::Since(since) = freshness {
            query.push(("published_at", format!("gte.{}", ts(since))));
        }
        let req = self.http.get(self.table("articles")).query(&query);
        Ok(self
            .rows(req, "list")
            .await?
            .into_iter()
            .map(Row::into_article)
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<NormalizedArticle>> {
        let req = self.http.get(self.table("articles")).query(&[
            ("select", "*,perspectives(*)".to_string()),
            ("id", format!("eq.{id}")),
        ]);
        Ok(self
            .rows(req, "get")
            .await?
            .into_iter()
            .next()
            .map(Row::into_article))
    }

    async fn upsert(&self, article: &NormalizedArticle) -> Result<NormalizedArticle> {
        let lookup = self.http.get(self.table("articles")).query(&[
            ("select", "id".to_string()),
            ("url", format!("eq.{}", article.url)),
        ]);
        let existing = self.rows(lookup, "upsert lookup").await?;

        let req = match existing.first() {
            Some(row) => {
                let id = match &row.id {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                self.http
                    .patch(self.table("articles"))
                    .query(&[("id", format!("eq.{id}"))])
                    .header("Prefer", RETURN_ROWS)
                    .json(&json!({
                        "title": article.title,
                        "content": article.content,
                        "category": article.category.as_str(),
                        "updated_at": ts(Utc::now()),
                    }))
            }
            None => self
                .http
                .post(self.table("articles"))
                .header("Prefer", RETURN_ROWS)
                .json(&NewRow {
                    title: &article.title,
                    content: &article.content,
                    source_name: article.source_name(),
                    source_url: article.source_url(),
                    url: &article.url,
                    published_at: article.published_at,
                    category: article.category.as_str(),
                }),
        };

        let row = self
            .rows(req, "upsert")
            .await?
            .into_iter()
            .next()
            .context("supabase upsert returned no row")?;
        Ok(row.into_article())
    }

    async fn touch_last_shown(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let req = self
            .http
            .patch(self.table("articles"))
            .query(&[("id", format!("eq.{id}"))])
            .json(&json!({ "last_shown_at": ts(at) }));
        self.send(req, "touch_last_shown").await.map(|_| ())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let req = self
            .http
            .delete(self.table("articles"))
            .query(&[
                ("published_at", format!("lt.{}", ts(cutoff))),
                ("select", "id".to_string()),
            ])
            .header("Prefer", RETURN_ROWS);
        Ok(self.rows(req, "delete_older_than").await?.len())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let perspectives = self
            .http
            .delete(self.table("perspectives"))
            .query(&[("article_id", format!("eq.{id}"))]);
        self.send(perspectives, "delete perspectives").await?;

        let req = self
            .http
            .delete(self.table("articles"))
            .query(&[("id", format!("eq.{id}")), ("select", "id".to_string())])
            .header("Prefer", RETURN_ROWS);
        Ok(!self.rows(req, "delete").await?.is_empty())
    }

    async fn save_perspectives(&self, id: &str, perspectives: &[Perspective]) -> Result<()> {
        let clear = self
            .http
            .delete(self.table("perspectives"))
            .query(&[("article_id", format!("eq.{id}"))]);
        self.send(clear, "clear perspectives").await?;

        if perspectives.is_empty() {
            return Ok(());
        }
        let payload: Vec<_> = perspectives
            .iter()
            .map(|p| json!({ "article_id": id, "viewpoint": p.viewpoint, "summary": p.summary }))
            .collect();
        let req = self.http.post(self.table("perspectives")).json(&payload);
        self.send(req, "save perspectives").await.map(|_| ())
    }
}
