// src/article.rs
//! Canonical article shape shared by providers, the store, and the selector.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NewsError;

pub const UNTITLED: &str = "Untitled Article";
pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// Fixed category vocabulary used across the app. `All` means "no filter".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Business,
    Technology,
    Entertainment,
    Sports,
    Science,
    Health,
    Politics,
    Local,
    World,
    All,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::General,
        Category::Business,
        Category::Technology,
        Category::Entertainment,
        Category::Sports,
        Category::Science,
        Category::Health,
        Category::Politics,
        Category::Local,
        Category::World,
        Category::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Business => "business",
            Category::Technology => "technology",
            Category::Entertainment => "entertainment",
            Category::Sports => "sports",
            Category::Science => "science",
            Category::Health => "health",
            Category::Politics => "politics",
            Category::Local => "local",
            Category::World => "world",
            Category::All => "all",
        }
    }

    /// True when `other` belongs under this category filter.
    pub fn admits(&self, other: Category) -> bool {
        *self == Category::All || *self == other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = NewsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(t))
            .ok_or_else(|| NewsError::UnknownCategory(t.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perspective {
    pub viewpoint: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub name: String,
    pub url: String,
}

/// Provider-independent article. Built once, never mutated by the selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedArticle {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub source: ArticleSource,
    pub url: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
    pub category: Category,
    #[serde(default)]
    pub perspectives: Vec<Perspective>,
    #[serde(default)]
    pub last_shown_at: Option<DateTime<Utc>>,
}

impl NormalizedArticle {
    pub fn source_name(&self) -> &str {
        &self.source.name
    }

    pub fn source_url(&self) -> &str {
        &self.source.url
    }

    pub fn dedup_key(&self) -> String {
        dedup_key(&self.url, &self.title, &self.source.name)
    }
}

/// `lowercase(url)|lowercase(title)|lowercase(source)`.
pub fn dedup_key(url: &str, title: &str, source_name: &str) -> String {
    format!(
        "{}|{}|{}",
        url.to_lowercase(),
        title.to_lowercase(),
        source_name.to_lowercase()
    )
}

/// First-seen-wins dedup. Relative order of survivors is kept.
pub fn dedupe(articles: Vec<NormalizedArticle>) -> Vec<NormalizedArticle> {
    let mut seen = HashSet::with_capacity(articles.len());
    articles
        .into_iter()
        .filter(|a| seen.insert(a.dedup_key()))
        .collect()
}

/// Raw, provider-agnostic fields before defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct ArticleDraft<'a> {
    pub provider: &'a str,
    pub index: usize,
    pub title: Option<String>,
    pub url: Option<String>,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

impl ArticleDraft<'_> {
    /// Apply defaults and coerce fields into a `NormalizedArticle`.
    pub fn build(self, category: Category, now: DateTime<Utc>) -> NormalizedArticle {
        let source_url = non_empty(self.source_url);
        let url = non_empty(self.url)
            .or_else(|| source_url.clone())
            .unwrap_or_default();
        let source_name = non_empty(self.source_name).unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
        let title = non_empty(self.title)
            .map(|t| normalize_text(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());
        let published_at = self
            .published_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now);
        let content = self.content.as_deref().map(normalize_text).unwrap_or_default();
        let suffix: u16 = rand::rng().random_range(0..1000);

        NormalizedArticle {
            id: format!(
                "{}-{}-{}-{}",
                self.provider,
                now.timestamp_millis(),
                self.index,
                suffix
            ),
            title,
            source: ArticleSource {
                name: source_name,
                url: source_url.unwrap_or_else(|| url.clone()),
            },
            url,
            published_at,
            content,
            category,
            perspectives: Vec::new(),
            last_shown_at: None,
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Accepts RFC 3339, RFC 2822 and `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|n| n.and_utc())
}

/// Decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());

    let decoded = html_escape::decode_html_entities(s);
    let stripped = re_tags.replace_all(&decoded, " ");
    re_ws.replace_all(&stripped, " ").trim().to_string()
}
