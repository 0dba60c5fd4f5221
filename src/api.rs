// src/api.rs
use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::aggregate::Aggregator;
use crate::article::{Category, NormalizedArticle};
use crate::config::Settings;
use crate::error::NewsError;
use crate::perspectives::{FallbackGenerator, PerspectiveGenerator, WritingStyle};
use crate::providers::{self, build_http_client};
use crate::samples::{load_samples_default, SampleSet};
use crate::selector::{is_sentinel, SelectionRequest, Selector};
use crate::store::{DynStore, MemoryStore, SupabaseStore};

#[derive(Clone)]
pub struct AppState {
    pub selector: Arc<Selector>,
    pub store: DynStore,
    pub aggregator: Arc<Aggregator>,
    pub samples: Arc<SampleSet>,
    pub generator: Arc<dyn PerspectiveGenerator>,
    pub page_size: usize,
}

impl AppState {
    pub fn new(
        store: DynStore,
        aggregator: Arc<Aggregator>,
        samples: Arc<SampleSet>,
        generator: Arc<dyn PerspectiveGenerator>,
        page_size: usize,
        persist_live: bool,
    ) -> Self {
        let selector = Arc::new(Selector::new(
            store.clone(),
            aggregator.clone(),
            samples.clone(),
            persist_live,
        ));
        Self {
            selector,
            store,
            aggregator,
            samples,
            generator,
            page_size,
        }
    }

    /// Production wiring: Supabase when configured, otherwise an in-memory store.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = build_http_client(settings.provider_timeout())?;
        let aggregator = Arc::new(Aggregator::new(
            providers::from_settings(settings, &http),
            settings.provider_timeout(),
        ));
        let store: DynStore = match &settings.supabase {
            Some(creds) => Arc::new(SupabaseStore::new(http.clone(), creds)),
            None => {
                warn!(target: "api", "SUPABASE_URL/SUPABASE_KEY not set; using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };
        let samples = Arc::new(load_samples_default()?);
        Ok(Self::new(
            store,
            aggregator,
            samples,
            Arc::new(FallbackGenerator),
            settings.tunables.page_size,
            settings.tunables.persist_live,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .route("/api/health", get(health))
        .route("/api/news/headlines", get(headlines))
        .route("/api/news/article/{id}", get(get_article).delete(delete_article))
        .route("/api/news/regenerate/{id}", post(regenerate))
        .route("/api/news/local/{zip}", get(local_news))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    status: u16,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: ErrorBody {
                message: message.into(),
                status: status.as_u16(),
            },
        }),
    )
        .into_response()
}

fn status_for(e: &NewsError) -> StatusCode {
    match e {
        NewsError::UnknownCategory(_) | NewsError::InvalidZipCode(_) => StatusCode::BAD_REQUEST,
        NewsError::StoreUnavailable { .. } | NewsError::ProviderUnavailable { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        NewsError::NoProvidersConfigured => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for NewsError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(target: "api", kind = self.kind(), error = %self, "request failed");
        }
        error_response(status, self.to_string())
    }
}

/// Five ASCII digits.
pub fn validate_zip(zip: &str) -> Result<&str, NewsError> {
    let z = zip.trim();
    if z.len() == 5 && z.bytes().all(|b| b.is_ascii_digit()) {
        Ok(z)
    } else {
        Err(NewsError::InvalidZipCode(zip.to_string()))
    }
}

/// Comma separated ids; blanks are ignored.
pub fn parse_exclude_ids(raw: Option<&str>) -> HashSet<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeadlinesQuery {
    category: Option<String>,
    writing_style: Option<String>,
    exclude_ids: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StyleQuery {
    writing_style: Option<String>,
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "message": "PointCounterpoint API is running",
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "providers": state.aggregator.provider_names(),
        "store": state.store.kind(),
    }))
}

/// Fill in perspectives for articles that have none. Not persisted.
async fn with_perspectives(
    state: &AppState,
    mut articles: Vec<NormalizedArticle>,
    style: WritingStyle,
) -> Vec<NormalizedArticle> {
    for a in articles.iter_mut().filter(|a| a.perspectives.is_empty()) {
        match state.generator.generate(&a.title, &a.content, style).await {
            Ok(p) => a.perspectives = p,
            Err(e) => {
                warn!(target: "api", id = %a.id, error = ?e, "perspective generation failed")
            }
        }
    }
    articles
}

async fn headlines(
    State(state): State<AppState>,
    Query(q): Query<HeadlinesQuery>,
) -> Result<Json<Vec<NormalizedArticle>>, NewsError> {
    let category: Category = match q.category.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw.parse()?,
        _ => Category::General,
    };
    let style = WritingStyle::parse_or_default(q.writing_style.as_deref());
    let req = SelectionRequest::new(category, state.page_size)
        .excluding(parse_exclude_ids(q.exclude_ids.as_deref()));

    info!(target: "api", %category, %style, excluded = req.exclude_ids.len(), "headlines");
    let picked = state.selector.select(&req).await;
    Ok(Json(with_perspectives(&state, picked, style).await))
}

async fn local_news(
    State(state): State<AppState>,
    Path(zip): Path<String>,
    Query(q): Query<HeadlinesQuery>,
) -> Result<Json<Vec<NormalizedArticle>>, NewsError> {
    let zip = validate_zip(&zip)?;
    let style = WritingStyle::parse_or_default(q.writing_style.as_deref());
    let req = SelectionRequest::local(zip, state.page_size)
        .excluding(parse_exclude_ids(q.exclude_ids.as_deref()));

    info!(target: "api", zip, "local headlines");
    let picked = state.selector.select(&req).await;
    Ok(Json(with_perspectives(&state, picked, style).await))
}

/// Store row first, then the bundled samples (their ids are served by headlines too).
/// The sentinel row is reported as missing.
async fn lookup(
    state: &AppState,
    id: &str,
) -> Result<Option<(NormalizedArticle, bool)>, NewsError> {
    let stored = state
        .store
        .get(id)
        .await
        .map_err(|source| NewsError::StoreUnavailable { op: "get", source })?;
    match stored {
        Some(a) if is_sentinel(&a) => return Ok(None),
        Some(a) => return Ok(Some((a, true))),
        None => {}
    }
    Ok(state.samples.find(id, Utc::now()).map(|a| (a, false)))
}

async fn refresh_perspectives(
    state: &AppState,
    mut article: NormalizedArticle,
    persisted: bool,
    style: WritingStyle,
) -> Response {
    let generated = match state
        .generator
        .generate(&article.title, &article.content, style)
        .await
    {
        Ok(p) => p,
        Err(e) => {
            error!(target: "api", id = %article.id, error = ?e, "perspective generation failed");
            return error_response(StatusCode::BAD_GATEWAY, "Failed to generate perspectives");
        }
    };
    if persisted {
        if let Err(e) = state.store.save_perspectives(&article.id, &generated).await {
            warn!(target: "api", id = %article.id, error = ?e, "saving perspectives failed");
        }
    }
    article.perspectives = generated;
    Json(article).into_response()
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<StyleQuery>,
) -> Response {
    let (article, persisted) = match lookup(&state, &id).await {
        Ok(Some(found)) => found,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Article not found"),
        Err(e) => return e.into_response(),
    };
    if !article.perspectives.is_empty() {
        return Json(article).into_response();
    }
    let style = WritingStyle::parse_or_default(q.writing_style.as_deref());
    refresh_perspectives(&state, article, persisted, style).await
}

async fn regenerate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<StyleQuery>,
) -> Response {
    let (article, persisted) = match lookup(&state, &id).await {
        Ok(Some(found)) => found,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Article not found"),
        Err(e) => return e.into_response(),
    };
    let style = WritingStyle::parse_or_default(q.writing_style.as_deref());
    info!(target: "api", id = %id, %style, "regenerating perspectives");
    refresh_perspectives(&state, article, persisted, style).await
}

async fn delete_article(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.delete(&id).await {
        Ok(true) => {
            info!(target: "api", id = %id, "article deleted");
            Json(serde_json::json!({ "message": "Article deleted", "id": id })).into_response()
        }
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Article not found"),
        Err(source) => NewsError::StoreUnavailable { op: "delete", source }.into_response(),
    }
}
