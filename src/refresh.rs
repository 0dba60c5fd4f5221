// src/refresh.rs
//! Periodic store refresh: drop expired rows, then pull fresh articles for
//! every feed category and upsert them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use tokio::task::JoinHandle;

use crate::aggregate::Aggregator;
use crate::article::Category;
use crate::config::Tunables;
use crate::store::DynStore;

/// Categories refreshed on every run, in this order.
pub const REFRESH_CATEGORIES: [Category; 8] = [
    Category::General,
    Category::Business,
    Category::Technology,
    Category::Entertainment,
    Category::Sports,
    Category::Science,
    Category::Health,
    Category::Politics,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshCfg {
    pub interval_secs: u64,
    pub retention_days: i64,
    pub per_category: usize,
}

impl From<&Tunables> for RefreshCfg {
    fn from(t: &Tunables) -> Self {
        Self {
            interval_secs: t.refresh_interval_secs,
            retention_days: t.retention_days,
            per_category: t.refresh_per_category,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub expired: usize,
    pub fetched: usize,
    pub saved: usize,
    pub failed: usize,
}

/// One refresh pass. Store failures are logged and counted, never returned.
pub async fn refresh_once(
    cfg: RefreshCfg,
    aggregator: &Aggregator,
    store: &DynStore,
    now: DateTime<Utc>,
) -> RefreshReport {
    let mut report = RefreshReport::default();

    let cutoff = now - chrono::Duration::days(cfg.retention_days);
    match store.delete_older_than(cutoff).await {
        Ok(n) => report.expired = n,
        Err(e) => {
            tracing::warn!(target: "refresh", error = ?e, "retention cleanup failed");
            counter!("news_store_errors_total", "op" => "delete_older_than").increment(1);
        }
    }

    if !aggregator.has_providers() {
        tracing::warn!(target: "refresh", "no providers configured; skipping fetch");
        return report;
    }

    for category in REFRESH_CATEGORIES {
        let articles = aggregator.aggregate(category, cfg.per_category).await;
        report.fetched += articles.len();
        for a in &articles {
            match store.upsert(a).await {
                Ok(_) => report.saved += 1,
                Err(e) => {
                    report.failed += 1;
                    counter!("news_store_errors_total", "op" => "upsert").increment(1);
                    tracing::warn!(
                        target: "refresh",
                        %category,
                        url = %a.url,
                        error = ?e,
                        "upsert failed"
                    );
                }
            }
        }
    }

    gauge!("news_refresh_last_run_ts").set(now.timestamp() as f64);
    tracing::info!(
        target: "refresh",
        expired = report.expired,
        fetched = report.fetched,
        saved = report.saved,
        failed = report.failed,
        "refresh run finished"
    );
    report
}

/// Spawn the interval task. The first tick fires immediately.
pub fn spawn_refresh_scheduler(
    cfg: RefreshCfg,
    aggregator: Arc<Aggregator>,
    store: DynStore,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs.max(1)));
        loop {
            ticker.tick().await;
            refresh_once(cfg, &aggregator, &store, Utc::now()).await;
        }
    })
}
