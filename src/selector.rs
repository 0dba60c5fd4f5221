// src/selector.rs
//! Freshness-weighted headline selection.
//!
//! Candidates come from three tiers tried in order until enough unique
//! articles are collected:
//!   1. the persisted store (weighted by age and time since last shown),
//!   2. a live provider aggregation,
//!   3. the static sample set.
//! Every tier boundary re-applies dedup and the caller's exclusion set.
//! Selection never fails; a data source that errors just contributes nothing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Timelike, Utc};
use metrics::{counter, histogram};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::aggregate::Aggregator;
use crate::article::{dedupe, Category, NormalizedArticle};
use crate::error::NewsError;
use crate::samples::SampleSet;
use crate::store::{DynStore, Freshness};

pub const FRESHNESS_WINDOW_HOURS: i64 = 48;
/// Fewer unique articles than this after a tier triggers the next tier.
pub const MIN_UNIQUE: usize = 4;
pub const LIVE_TOP_UP: usize = 15;

const BASE_WEIGHT: f64 = 100.0;
const AGE_PENALTY_PER_HOUR: f64 = 2.0;
const AGE_PENALTY_CAP: f64 = 50.0;
const UNSEEN_BONUS_PER_HOUR: f64 = 5.0;
const UNSEEN_BONUS_CAP: f64 = 50.0;

/// Known bad row left over in the production table. Never show it.
pub const SENTINEL_ID: &str = "dfe323d2-e241-4cac-8714-a4d1051e538e";
pub const SENTINEL_TITLE: &str = "Test Article";
pub const SENTINEL_SOURCE: &str = "Test Source";

pub fn is_sentinel(a: &NormalizedArticle) -> bool {
    a.id == SENTINEL_ID || (a.title == SENTINEL_TITLE && a.source_name() == SENTINEL_SOURCE)
}

fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_seconds().max(0) as f64 / 3600.0
}

/// Small deterministic perturbation in `[0, 3]`: stable within an hour of
/// day, drifting across hours.
pub fn jitter(id: &str, now: DateTime<Utc>) -> f64 {
    let byte = Sha256::digest(id.as_bytes())[0];
    f64::from(now.hour() % 4) * (f64::from(byte) / 255.0)
}

/// `100 - min(age_h*2, 50) + min(unseen_h*5, 50) + jitter`.
/// Never-shown articles get the full unseen bonus.
pub fn selection_weight(a: &NormalizedArticle, now: DateTime<Utc>) -> f64 {
    let age_penalty =
        (hours_between(a.published_at, now) * AGE_PENALTY_PER_HOUR).min(AGE_PENALTY_CAP);
    let unseen_bonus = match a.last_shown_at {
        None => UNSEEN_BONUS_CAP,
        Some(shown) => {
            (hours_between(shown, now) * UNSEEN_BONUS_PER_HOUR).min(UNSEEN_BONUS_CAP)
        }
    };
    BASE_WEIGHT - age_penalty + unseen_bonus + jitter(&a.id, now)
}

/// Sort by descending weight (stable for ties) and keep the top `count`.
pub fn rank_by_weight(
    rows: Vec<NormalizedArticle>,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<NormalizedArticle> {
    let mut weighted: Vec<(f64, NormalizedArticle)> = rows
        .into_iter()
        .map(|a| (selection_weight(&a, now), a))
        .collect();
    weighted.sort_by(|x, y| y.0.total_cmp(&x.0));
    weighted.into_iter().take(count).map(|(_, a)| a).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Store,
    Live,
    Static,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Store => "store",
            Tier::Live => "live",
            Tier::Static => "static",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionRequest {
    pub category: Category,
    pub count: usize,
    pub exclude_ids: HashSet<String>,
    /// Set for local news; skips the live tier and uses zip-specific samples.
    pub zip_code: Option<String>,
}

impl SelectionRequest {
    pub fn new(category: Category, count: usize) -> Self {
        Self {
            category,
            count,
            ..Default::default()
        }
    }

    pub fn local(zip: impl Into<String>, count: usize) -> Self {
        Self {
            category: Category::Local,
            count,
            zip_code: Some(zip.into()),
            ..Default::default()
        }
    }

    pub fn excluding<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    fn tiers(&self) -> &'static [Tier] {
        if self.zip_code.is_some() {
            &[Tier::Store, Tier::Static]
        } else {
            &[Tier::Store, Tier::Live, Tier::Static]
        }
    }
}

pub struct Selector {
    store: DynStore,
    aggregator: Arc<Aggregator>,
    samples: Arc<SampleSet>,
    persist_live: bool,
}

impl Selector {
    pub fn new(
        store: DynStore,
        aggregator: Arc<Aggregator>,
        samples: Arc<SampleSet>,
        persist_live: bool,
    ) -> Self {
        Self {
            store,
            aggregator,
            samples,
            persist_live,
        }
    }

    pub async fn select(&self, req: &SelectionRequest) -> Vec<NormalizedArticle> {
        self.select_at(req, Utc::now()).await
    }

    /// Same as `select` with an explicit clock.
    pub async fn select_at(
        &self,
        req: &SelectionRequest,
        now: DateTime<Utc>,
    ) -> Vec<NormalizedArticle> {
        if req.count == 0 {
            return Vec::new();
        }
        let t0 = Instant::now();
        let threshold = MIN_UNIQUE.min(req.count);
        let mut picked: Vec<NormalizedArticle> = Vec::new();

        for (i, tier) in req.tiers().iter().enumerate() {
            if i > 0 && picked.len() >= threshold {
                break;
            }
            let mut candidates = self.run_tier(*tier, req, now).await;
            candidates.retain(|a| !req.exclude_ids.contains(&a.id));
            counter!("news_tier_articles_total", "tier" => tier.as_str())
                .increment(candidates.len() as u64);
            debug!(
                target: "selector",
                tier = tier.as_str(),
                candidates = candidates.len(),
                "tier done"
            );

            picked.extend(candidates);
            picked = dedupe(picked);
            // live rows persisted by url can come back carrying a store id already picked
            let mut ids = HashSet::new();
            picked.retain(|a| !req.exclude_ids.contains(&a.id) && ids.insert(a.id.clone()));
        }

        picked.truncate(req.count);
        histogram!("news_select_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        info!(
            target: "selector",
            category = %req.category,
            requested = req.count,
            returned = picked.len(),
            "headlines selected"
        );
        picked
    }

    async fn run_tier(
        &self,
        tier: Tier,
        req: &SelectionRequest,
        now: DateTime<Utc>,
    ) -> Vec<NormalizedArticle> {
        match tier {
            Tier::Store => self.from_store(req, now).await,
            Tier::Live => self.from_live(req).await,
            Tier::Static => match &req.zip_code {
                Some(zip) => self.samples.local(zip, LIVE_TOP_UP, now),
                None => self.samples.for_category(req.category, now),
            },
        }
    }

    async fn from_store(
        &self,
        req: &SelectionRequest,
        now: DateTime<Utc>,
    ) -> Vec<NormalizedArticle> {
        let limit = req.count.saturating_mul(3);
        let since = now - Duration::hours(FRESHNESS_WINDOW_HOURS);

        let mut rows = match self.store.list(req.category, Freshness::Since(since), limit).await {
            Ok(rows) => rows,
            Err(source) => {
                self.store_failed("list", source);
                return Vec::new();
            }
        };
        if rows.len() < req.count {
            match self.store.list(req.category, Freshness::Any, limit).await {
                Ok(older) => {
                    rows.extend(older);
                    rows = dedupe(rows);
                }
                Err(source) => self.store_failed("list backfill", source),
            }
        }

        rows.retain(|a| !is_sentinel(a) && !req.exclude_ids.contains(&a.id));
        let chosen = rank_by_weight(rows, req.count, now);

        for a in &chosen {
            if let Err(source) = self.store.touch_last_shown(&a.id, now).await {
                self.store_failed("touch_last_shown", source);
            }
        }
        chosen
    }

    async fn from_live(&self, req: &SelectionRequest) -> Vec<NormalizedArticle> {
        let live = self.aggregator.aggregate(req.category, LIVE_TOP_UP).await;
        if !self.persist_live {
            return live;
        }
        let mut out = Vec::with_capacity(live.len());
        for a in live {
            match self.store.upsert(&a).await {
                Ok(stored) => out.push(stored),
                Err(source) => {
                    self.store_failed("upsert", source);
                    out.push(a);
                }
            }
        }
        out
    }

    fn store_failed(&self, op: &'static str, source: anyhow::Error) {
        let err = NewsError::StoreUnavailable { op, source };
        warn!(target: "selector", store = self.store.kind(), error = %err, "store call failed");
        counter!("news_store_errors_total", "op" => op).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ArticleDraft;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, 0, 0).unwrap()
    }

    fn article(
        id: &str,
        published: DateTime<Utc>,
        shown: Option<DateTime<Utc>>,
    ) -> NormalizedArticle {
        let mut a = ArticleDraft {
            provider: "t",
            title: Some(id.into()),
            url: Some(format!("https://t.test/{id}")),
            ..Default::default()
        }
        .build(Category::General, published);
        a.id = id.into();
        a.published_at = published;
        a.last_shown_at = shown;
        a
    }

    #[test]
    fn older_never_outweighs_newer() {
        let now = at(13);
        let shown = Some(now - Duration::hours(2));
        let mut prev = f64::INFINITY;
        for age in [0, 1, 5, 12, 24, 25, 48, 200] {
            let w = selection_weight(&article("same", now - Duration::hours(age), shown), now);
            assert!(w <= prev, "age {age}h weight {w} > {prev}");
            prev = w;
        }
    }

    #[test]
    fn never_shown_gets_full_bonus() {
        let now = at(10);
        let published = now - Duration::hours(3);
        let never = selection_weight(&article("x", published, None), now);
        for h in [0, 1, 9, 10, 1000] {
            let seen =
                selection_weight(&article("x", published, Some(now - Duration::hours(h))), now);
            assert!(never >= seen);
        }
    }

    #[test]
    fn jitter_is_zero_on_hours_divisible_by_four_and_bounded() {
        assert_eq!(jitter("anything", at(8)), 0.0);
        for h in 0..24 {
            let j = jitter("abc", at(h));
            assert!((0.0..=3.0).contains(&j));
            assert_eq!(j, jitter("abc", at(h)));
        }
    }

    #[test]
    fn caps_hold() {
        let now = at(0);
        // jitter is 0 at hour 0
        let ancient = article("a", now - Duration::days(30), Some(now - Duration::days(30)));
        assert_eq!(selection_weight(&ancient, now), 100.0);
        let fresh = article("b", now, Some(now));
        assert_eq!(selection_weight(&fresh, now), 100.0);
        let fresh_unseen = article("c", now, None);
        assert_eq!(selection_weight(&fresh_unseen, now), 150.0);
    }

    #[test]
    fn sentinel_matches_id_or_title_and_source() {
        let now = at(1);
        let by_id = article(SENTINEL_ID, now, None);
        assert!(is_sentinel(&by_id));
        let mut by_pair = article("other", now, None);
        by_pair.title = SENTINEL_TITLE.into();
        by_pair.source.name = SENTINEL_SOURCE.into();
        assert!(is_sentinel(&by_pair));
        by_pair.source.name = "Real Source".into();
        assert!(!is_sentinel(&by_pair));
    }

    #[test]
    fn tiers_for_local_skip_live() {
        assert_eq!(
            SelectionRequest::local("10001", 5).tiers(),
            &[Tier::Store, Tier::Static]
        );
        assert_eq!(
            SelectionRequest::new(Category::Sports, 5).tiers(),
            &[Tier::Store, Tier::Live, Tier::Static]
        );
    }
}
