// tests/metrics.rs
// Installs the global recorder, so it only runs with `--features strict-metrics`.
#![cfg(feature = "strict-metrics")]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use point_counterpoint::aggregate::Aggregator;
use point_counterpoint::article::Category;
use point_counterpoint::metrics::Metrics;
use point_counterpoint::providers::newsapi::NewsApiProvider;
use point_counterpoint::samples::SampleSet;
use point_counterpoint::selector::{SelectionRequest, Selector};
use point_counterpoint::store::MemoryStore;

#[tokio::test]
async fn metrics_endpoint_contains_expected_series() {
    let metrics = Metrics::init().expect("first recorder install");

    let agg = Arc::new(Aggregator::new(
        vec![Arc::new(NewsApiProvider::from_fixture_str(include_str!(
            "fixtures/newsapi.json"
        )))],
        Duration::from_secs(2),
    ));
    let selector = Selector::new(
        Arc::new(MemoryStore::new()),
        agg,
        Arc::new(SampleSet::bundled()),
        true,
    );
    let out = selector
        .select(&SelectionRequest::new(Category::Business, 5))
        .await;
    assert_eq!(out.len(), 5);

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "news_provider_requests_total",
        "news_provider_articles_total",
        "news_tier_articles_total",
        "news_select_duration_ms",
    ] {
        assert!(text.contains(needle), "missing series {needle}:\n{text}");
    }
    assert!(text.contains(r#"tier="live""#));
}
