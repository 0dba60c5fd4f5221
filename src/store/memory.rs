// src/store/memory.rs
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ArticleStore, Freshness};
use crate::article::{Category, NormalizedArticle, Perspective};

/// Process-local store. Used when Supabase is not configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<NormalizedArticle>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows as-is (ids included).
    pub fn with_rows(rows: Vec<NormalizedArticle>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("memory store lock poisoned")
}

#[async_trait]
impl ArticleStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn list(
        &self,
        category: Category,
        freshness: Freshness,
        limit: usize,
    ) -> Result<Vec<NormalizedArticle>> {
        let rows = self.rows.read().map_err(poisoned)?;
        let mut out: Vec<NormalizedArticle> = rows
            .iter()
            .filter(|a| category.admits(a.category) && freshness.admits(a.published_at))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        out.truncate(limit);
        Ok(out)
    }

    async fn get(&self, id: &str) -> Result<Option<NormalizedArticle>> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.iter().find(|a| a.id == id).cloned())
    }

    async fn upsert(&self, article: &NormalizedArticle) -> Result<NormalizedArticle> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        if let Some(existing) = rows.iter_mut().find(|a| a.url == article.url) {
            existing.title = article.title.clone();
            existing.content = article.content.clone();
            existing.category = article.category;
            return Ok(existing.clone());
        }
        rows.push(article.clone());
        Ok(article.clone())
    }

    async fn touch_last_shown(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        if let Some(a) = rows.iter_mut().find(|a| a.id == id) {
            a.last_shown_at = Some(at);
        }
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        let before = rows.len();
        rows.retain(|a| a.published_at >= cutoff);
        Ok(before - rows.len())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() != before)
    }

    async fn save_perspectives(&self, id: &str, perspectives: &[Perspective]) -> Result<()> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        let row = rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| anyhow!("article {id} not found"))?;
        row.perspectives = perspectives.to_vec();
        Ok(())
    }
}
