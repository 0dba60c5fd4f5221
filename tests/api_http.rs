// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use http::{Request, StatusCode};
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use point_counterpoint::aggregate::Aggregator;
use point_counterpoint::api::{router, AppState};
use point_counterpoint::article::{ArticleDraft, Category, NormalizedArticle};
use point_counterpoint::perspectives::FallbackGenerator;
use point_counterpoint::samples::SampleSet;
use point_counterpoint::selector::SENTINEL_ID;
use point_counterpoint::store::{ArticleStore, MemoryStore};

const BODY_LIMIT: usize = 1024 * 1024;

fn stored_row(id: &str) -> NormalizedArticle {
    let mut a = ArticleDraft {
        provider: "seed",
        title: Some("City Council Approves \"Bold\" Transit Plan".into()),
        url: Some(format!("https://seed.test/{id}")),
        source_name: Some("Metro Desk".into()),
        content: Some("The plan adds three bus lines.".into()),
        ..Default::default()
    }
    .build(Category::Politics, Utc::now());
    a.id = id.into();
    a
}

fn test_app(store: Arc<MemoryStore>) -> Router {
    let state = AppState::new(
        store,
        Arc::new(Aggregator::new(Vec::new(), Duration::from_secs(1))),
        Arc::new(SampleSet::bundled()),
        Arc::new(FallbackGenerator),
        5,
        false,
    );
    router(state)
}

async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let app = test_app(Arc::new(MemoryStore::new()));
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), "ok");
}

#[tokio::test]
async fn api_health_reports_store_and_providers() {
    let (status, v) = call(test_app(Arc::new(MemoryStore::new())), "GET", "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "healthy");
    assert_eq!(v["store"], "memory");
    assert_eq!(v["providers"], serde_json::json!([]));
}

#[tokio::test]
async fn headlines_fall_back_to_samples_with_perspectives() {
    let (status, v) = call(
        test_app(Arc::new(MemoryStore::new())),
        "GET",
        "/api/news/headlines?category=technology&writingStyle=eli5",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = v.as_array().expect("array body");
    assert_eq!(items.len(), 5);
    for it in items {
        assert_eq!(it["category"], "technology");
        assert!(it["_id"].as_str().unwrap().starts_with("sample-technology-"));
        assert!(it.get("publishedAt").is_some());
        let views: Vec<_> = it["perspectives"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["viewpoint"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(views, vec!["point", "counterpoint", "neutral"]);
    }
}

#[tokio::test]
async fn headlines_respect_exclude_ids() {
    let (status, v) = call(
        test_app(Arc::new(MemoryStore::new())),
        "GET",
        "/api/news/headlines?category=sports&excludeIds=sample-sports-1,%20sample-sports-3",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["sample-sports-2", "sample-sports-4", "sample-sports-5"]);
}

#[tokio::test]
async fn unknown_category_is_400() {
    let (status, v) = call(
        test_app(Arc::new(MemoryStore::new())),
        "GET",
        "/api/news/headlines?category=gossip",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"]["status"], 400);
}

#[tokio::test]
async fn article_lookup_generates_and_saves_missing_perspectives() {
    let store = Arc::new(MemoryStore::with_rows(vec![stored_row("a1")]));
    let (status, v) = call(test_app(store.clone()), "GET", "/api/news/article/a1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["_id"], "a1");
    let point = v["perspectives"][0]["summary"].as_str().unwrap();
    assert!(point.starts_with("City Council Approves Bold Transit Plan reports:"));

    let saved = store.get("a1").await.unwrap().unwrap();
    assert_eq!(saved.perspectives.len(), 3);
}

#[tokio::test]
async fn sample_articles_resolve_by_id() {
    let (status, v) = call(
        test_app(Arc::new(MemoryStore::new())),
        "GET",
        "/api/news/article/sample-health-2",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["category"], "health");
}

#[tokio::test]
async fn missing_article_is_404() {
    let (status, v) = call(
        test_app(Arc::new(MemoryStore::new())),
        "GET",
        "/api/news/article/does-not-exist",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["error"]["message"], "Article not found");
}

#[tokio::test]
async fn sentinel_row_is_never_served_or_regenerated() {
    let store = Arc::new(MemoryStore::with_rows(vec![stored_row(SENTINEL_ID)]));

    let uri = format!("/api/news/article/{SENTINEL_ID}");
    let (status, v) = call(test_app(store.clone()), "GET", &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["error"]["message"], "Article not found");

    let uri = format!("/api/news/regenerate/{SENTINEL_ID}");
    let (status, _) = call(test_app(store.clone()), "POST", &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let untouched = store.get(SENTINEL_ID).await.unwrap().unwrap();
    assert!(untouched.perspectives.is_empty());
}

#[tokio::test]
async fn regenerate_replaces_stored_perspectives() {
    let mut row = stored_row("a2");
    row.perspectives = vec![point_counterpoint::article::Perspective {
        viewpoint: "liberal".into(),
        summary: "old".into(),
        title: None,
    }];
    let store = Arc::new(MemoryStore::with_rows(vec![row]));

    let (status, v) = call(
        test_app(store.clone()),
        "POST",
        "/api/news/regenerate/a2?writingStyle=sagan",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["perspectives"].as_array().unwrap().len(), 3);
    let saved = store.get("a2").await.unwrap().unwrap();
    assert_eq!(saved.perspectives[0].viewpoint, "point");
}

#[tokio::test]
async fn delete_then_delete_again() {
    let store = Arc::new(MemoryStore::with_rows(vec![stored_row("a3")]));
    let (status, _) = call(test_app(store.clone()), "DELETE", "/api/news/article/a3").await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.is_empty());

    let (status, _) = call(test_app(store), "DELETE", "/api/news/article/a3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn local_news_validates_zip() {
    let app = test_app(Arc::new(MemoryStore::new()));
    let (status, _) = call(app.clone(), "GET", "/api/news/local/1234").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, v) = call(app, "GET", "/api/news/local/02139").await;
    assert_eq!(status, StatusCode::OK);
    let items = v.as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert!(items[0]["title"].as_str().unwrap().contains("02139"));
}
