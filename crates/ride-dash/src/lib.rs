//! HTTP dashboard over the ridership tables

pub mod charts;
pub mod html;
pub mod pages;

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;
use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use opentelemetry::metrics::{Counter, MeterProvider};
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use ride_core::{
    aggregate, compact_count, count_in_seasons, top_route_stations, top_stations, SeasonError,
    SeasonSet,
};
use ride_data::{read_asset, DataStore, LoadError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinError;

use crate::html::NoticeKind;
use crate::pages::{render_bad_selection, render_notice, render_overview, render_page, Page, Rendered};

/// Presentation settings
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub title: String,
    pub top_n: usize,
    pub intro_image: PathBuf,
    pub recommendation_image: PathBuf,
}

impl DashboardSettings {
    pub fn from_config(cfg: &ride_config::AppConfig) -> Self {
        Self {
            title: cfg.title(),
            top_n: cfg.top_n(),
            intro_image: cfg.intro_image(),
            recommendation_image: cfg.recommendation_image(),
        }
    }
}

pub struct AppState {
    ready: AtomicBool,
    registry: Registry,
    #[allow(dead_code)]
    provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    pub store: DataStore,
    pub settings: DashboardSettings,
}

pub fn build_app(store: DataStore, settings: DashboardSettings) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter().with_registry(registry.clone()).build()?;
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = provider.meter("ride-dash");

    let requests_total = meter
        .u64_counter("ride_requests_total")
        .with_description("Total HTTP requests served")
        .init();

    let state = Arc::new(AppState {
        ready: AtomicBool::new(false),
        registry,
        provider,
        requests_total,
        store,
        settings,
    });

    let router = Router::new()
        .route("/", get(overview))
        .route("/pages/:slug", get(page))
        .route("/assets/map", get(map_asset))
        .route("/assets/images/:name", get(image_asset))
        .route("/api/v1/pages", get(list_pages))
        .route("/api/v1/daily", get(daily))
        .route("/api/v1/stations/top", get(top_route_ranking))
        .route("/api/v1/stations/seasonal", get(seasonal_stations))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            count_requests,
        ))
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

pub fn set_ready(state: &Arc<AppState>, is_ready: bool) {
    state.ready.store(is_ready, Ordering::Relaxed);
}

async fn count_requests(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    state.requests_total.add(1, &[]);
    next.run(req).await
}

/// Season selection from the query string.
///
/// No `seasons` parameter means every season; `seasons=` means none.
#[derive(Debug, Deserialize)]
struct SelectionQuery {
    seasons: Option<String>,
    n: Option<usize>,
}

impl SelectionQuery {
    fn seasons(&self) -> Result<SeasonSet, SeasonError> {
        match self.seasons.as_deref() {
            None => Ok(SeasonSet::all()),
            Some(list) => SeasonSet::parse_list(list),
        }
    }

    fn top_n(&self, state: &AppState) -> usize {
        self.n.unwrap_or(state.settings.top_n)
    }
}

/// Errors surfaced by the JSON API
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Unavailable(LoadError),
    Internal(JoinError),
}

impl From<LoadError> for ApiError {
    fn from(e: LoadError) -> Self {
        ApiError::Unavailable(e)
    }
}

impl From<SeasonError> for ApiError {
    fn from(e: SeasonError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unavailable(e) => {
                tracing::warn!(error = %e, "data unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "blocking task failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        (self.status, Html(self.body)).into_response()
    }
}

/// Run table access on the blocking pool.
///
/// Store accessors re-parse a changed input file synchronously.
async fn blocking<T, F>(state: &Arc<AppState>, work: F) -> Result<T, JoinError>
where
    F: FnOnce(&AppState) -> T + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&state)).await
}

fn render_failed(state: &AppState, page: Option<Page>, e: JoinError) -> Rendered {
    tracing::error!(error = %e, "render task failed");
    render_notice(
        state,
        page,
        StatusCode::INTERNAL_SERVER_ERROR,
        NoticeKind::Error,
        "The page could not be rendered.",
    )
}

async fn overview(State(state): State<Arc<AppState>>) -> Rendered {
    match blocking(&state, render_overview).await {
        Ok(rendered) => rendered,
        Err(e) => render_failed(&state, None, e),
    }
}

async fn page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(q): Query<SelectionQuery>,
) -> Response {
    let Some(page) = Page::from_slug(&slug) else {
        return (StatusCode::NOT_FOUND, Html(format!("unknown page: {}", html::escape(&slug))))
            .into_response();
    };
    let seasons = match q.seasons() {
        Ok(seasons) => seasons,
        Err(e) => return render_bad_selection(&state, page, &e.to_string()).into_response(),
    };
    match blocking(&state, move |s| render_page(s, page, seasons)).await {
        Ok(rendered) => rendered.into_response(),
        Err(e) => render_failed(&state, Some(page), e).into_response(),
    }
}

/// The route map, passed through byte for byte
async fn map_asset(State(state): State<Arc<AppState>>) -> Response {
    match state.store.map_html() {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, HeaderValue::from_static("text/html"))],
            bytes,
        )
            .into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

fn content_type_for(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

async fn image_asset(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    let path = match name.as_str() {
        "intro" => &state.settings.intro_image,
        "recommendation" => &state.settings.recommendation_image,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    match read_asset(path) {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, HeaderValue::from_static(content_type_for(path)))],
            bytes,
        )
            .into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

#[derive(Serialize)]
struct PageEntry {
    slug: Page,
    title: &'static str,
}

async fn list_pages() -> Json<Vec<PageEntry>> {
    Json(
        Page::ALL
            .into_iter()
            .map(|p| PageEntry {
                slug: p,
                title: p.title(),
            })
            .collect(),
    )
}

async fn daily(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let table = blocking(&state, |s| s.store.daily()).await??;
    Ok(Json(&table.rows).into_response())
}

async fn top_route_ranking(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SelectionQuery>,
) -> Result<Response, ApiError> {
    let routes = blocking(&state, |s| s.store.routes()).await??;
    let ranking = top_route_stations(&routes.rows, q.top_n(&state));
    Ok(Json(ranking).into_response())
}

async fn seasonal_stations(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SelectionQuery>,
) -> Result<Response, ApiError> {
    let seasons = q.seasons()?;
    let top_n = q.top_n(&state);
    let trips = blocking(&state, |s| s.store.trips()).await??;
    let total = count_in_seasons(&trips.rows, seasons);

    Ok(Json(json!({
        "seasons": seasons.iter().collect::<Vec<_>>(),
        "totalRides": total,
        "totalRidesDisplay": compact_count(total as u64),
        "ranking": top_stations(&trips.rows, seasons, top_n),
        "aggregates": aggregate(&trips.rows, seasons, top_n),
    }))
    .into_response())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(
    State(state): State<Arc<AppState>>,
) -> (
    [(axum::http::header::HeaderName, axum::http::HeaderValue); 1],
    String,
) {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::warn!(error=?e, "failed to encode metrics");
    }
    let body = String::from_utf8(buf).unwrap_or_default();
    let header = (
        header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([header], body)
}
