// src/samples.rs
//! Static fallback articles, the last tier of headline selection.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::article::{ArticleSource, Category, NormalizedArticle, Perspective};

const ENV_PATH: &str = "PCP_SAMPLES_PATH";
const BUNDLED: &str = include_str!("../data/samples.json");

#[derive(Debug, Clone, Deserialize)]
pub struct SampleRow {
    pub id: String,
    pub title: String,
    pub source: ArticleSource,
    pub url: String,
    #[serde(default)]
    pub content: String,
    pub category: Category,
    #[serde(default)]
    pub perspectives: Vec<Perspective>,
}

impl SampleRow {
    /// Samples are always stamped "now" so they never look stale.
    fn to_article(&self, category: Category, now: DateTime<Utc>) -> NormalizedArticle {
        NormalizedArticle {
            id: self.id.clone(),
            title: self.title.clone(),
            source: self.source.clone(),
            url: self.url.clone(),
            published_at: now,
            content: self.content.clone(),
            category,
            perspectives: self.perspectives.clone(),
            last_shown_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleSet {
    rows: Vec<SampleRow>,
}

impl SampleSet {
    pub fn new(rows: Vec<SampleRow>) -> Self {
        Self { rows }
    }

    pub fn bundled() -> Self {
        // The bundled file is checked by `bundled_set_covers_every_feed_category`.
        Self::new(serde_json::from_str(BUNDLED).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Samples in `category` (everything for `All`). Categories without
    /// samples borrow the general set, re-tagged.
    pub fn for_category(&self, category: Category, now: DateTime<Utc>) -> Vec<NormalizedArticle> {
        let own: Vec<_> = self
            .rows
            .iter()
            .filter(|r| category.admits(r.category))
            .map(|r| r.to_article(r.category, now))
            .collect();
        if !own.is_empty() {
            return own;
        }
        self.rows
            .iter()
            .filter(|r| r.category == Category::General)
            .map(|r| r.to_article(category, now))
            .collect()
    }

    pub fn find(&self, id: &str, now: DateTime<Utc>) -> Option<NormalizedArticle> {
        self.rows
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.to_article(r.category, now))
    }

    /// Two zip-specific stories followed by the generic local set.
    pub fn local(&self, zip: &str, count: usize, now: DateTime<Utc>) -> Vec<NormalizedArticle> {
        let zip_specific = [
            SampleRow {
                id: format!("sample-local-{zip}-1"),
                title: format!("New Community Center Opens in {zip} Area"),
                source: ArticleSource {
                    name: "Local News Network".into(),
                    url: "https://example.com/local".into(),
                },
                url: format!("https://example.com/local/{zip}/community-center"),
                content: format!(
                    "Residents of the {zip} area now have access to a state-of-the-art community center featuring recreational facilities, meeting spaces, and educational programs."
                ),
                category: Category::Local,
                perspectives: Vec::new(),
            },
            SampleRow {
                id: format!("sample-local-{zip}-2"),
                title: format!("{zip} School District Announces Curriculum Changes"),
                source: ArticleSource {
                    name: "Education Today".into(),
                    url: "https://example.com/local".into(),
                },
                url: format!("https://example.com/local/{zip}/curriculum"),
                content: format!(
                    "The school district serving {zip} has unveiled a new curriculum that emphasizes STEM education and practical life skills."
                ),
                category: Category::Local,
                perspectives: Vec::new(),
            },
        ];
        zip_specific
            .iter()
            .chain(self.rows.iter().filter(|r| r.category == Category::Local))
            .take(count)
            .map(|r| r.to_article(Category::Local, now))
            .collect()
    }
}

impl Default for SampleSet {
    fn default() -> Self {
        Self::bundled()
    }
}

/// Load samples from an explicit path (JSON array or TOML `[[articles]]`).
pub fn load_samples_from(path: &Path) -> Result<SampleSet> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading samples from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_samples(&content, &ext)
}

/// 1) $PCP_SAMPLES_PATH  2) config/samples.json  3) config/samples.toml  4) bundled
pub fn load_samples_default() -> Result<SampleSet> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_samples_from(&pb);
        }
        return Err(anyhow!("{ENV_PATH} points to non-existent path"));
    }
    for candidate in ["config/samples.json", "config/samples.toml"] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return load_samples_from(&pb);
        }
    }
    Ok(SampleSet::bundled())
}

fn parse_samples(s: &str, hint_ext: &str) -> Result<SampleSet> {
    #[derive(Deserialize)]
    struct TomlSamples {
        articles: Vec<SampleRow>,
    }
    if hint_ext == "toml" {
        let v: TomlSamples = toml::from_str(s).context("parsing samples toml")?;
        return Ok(SampleSet::new(v.articles));
    }
    let rows: Vec<SampleRow> = serde_json::from_str(s).context("parsing samples json")?;
    Ok(SampleSet::new(rows))
}
