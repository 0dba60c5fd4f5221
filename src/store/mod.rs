// src/store/mod.rs
//! Persisted article store seam. The selector and the HTTP layer only see
//! `ArticleStore`; rows live in Supabase in production and in memory in tests.

pub mod memory;
pub mod supabase;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::article::{Category, NormalizedArticle, Perspective};

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

/// Row filter on `published_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Since(DateTime<Utc>),
    Any,
}

impl Freshness {
    pub fn admits(&self, published_at: DateTime<Utc>) -> bool {
        match self {
            Freshness::Since(ts) => published_at >= *ts,
            Freshness::Any => true,
        }
    }
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Short label for logs and the health endpoint.
    fn kind(&self) -> &'static str;

    /// Newest first, at most `limit` rows. `Category::All` lists every category.
    async fn list(
        &self,
        category: Category,
        freshness: Freshness,
        limit: usize,
    ) -> Result<Vec<NormalizedArticle>>;

    async fn get(&self, id: &str) -> Result<Option<NormalizedArticle>>;

    /// Insert, or update title/content/category of the row with the same url.
    /// Returns the stored row with its store-assigned id.
    async fn upsert(&self, article: &NormalizedArticle) -> Result<NormalizedArticle>;

    async fn touch_last_shown(&self, id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Deletes rows published before `cutoff`; returns how many went.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    async fn delete(&self, id: &str) -> Result<bool>;

    /// Replaces the perspectives stored for `id`.
    async fn save_perspectives(&self, id: &str, perspectives: &[Perspective]) -> Result<()>;
}

pub type DynStore = Arc<dyn ArticleStore>;
