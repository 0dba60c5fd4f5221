// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the news_* series.
    /// Fails if a global recorder is already installed.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("news_provider_requests_total", "Provider fetches started");
    describe_counter!("news_provider_errors_total", "Provider fetches that failed or timed out");
    describe_counter!("news_provider_articles_total", "Articles returned per provider");
    describe_counter!("news_dedup_dropped_total", "Articles dropped as duplicates");
    describe_counter!("news_store_errors_total", "Store calls that failed, by op");
    describe_counter!("news_tier_articles_total", "Candidates contributed per selection tier");
    describe_histogram!(
        "news_select_duration_ms",
        Unit::Milliseconds,
        "Headline selection latency"
    );
    describe_gauge!(
        "news_refresh_last_run_ts",
        Unit::Seconds,
        "Unix time of the last refresh run"
    );
}
