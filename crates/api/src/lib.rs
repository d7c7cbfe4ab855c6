mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use voyage_core::{
    Activity, PricedSelection, PricingLineItem, QueryError, QuoteError, Travelers,
    DEFAULT_PROXIMITY_RADIUS_KM, DEFAULT_TAX_RATE,
};
use voyage_engine::PlannerEngine;
use voyage_observability::AppMetrics;
use voyage_store::{Kv, PlannerState};

use crate::rate_limit::ClientRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<PlannerEngine<Kv>>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: ClientRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptRequest {
    transcript: String,
    #[serde(default = "default_true")]
    is_final: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct QuoteRequest {
    items: Vec<PricingLineItem>,
    margin_percent: f64,
    tax_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GroupRequest {
    activities: Vec<Activity>,
    radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FavoriteToggleRequest {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TripUpdateRequest {
    destination: Option<String>,
    start_date: Option<NaiveDate>,
    duration_days: Option<u32>,
    travelers: Option<Travelers>,
    budget: Option<u64>,
    transport: Option<PricedSelection>,
    transfer: Option<PricedSelection>,
    activities: Option<Vec<PricedSelection>>,
}

#[derive(Debug, Deserialize)]
struct BudgetOptimizationRequest {
    enabled: bool,
}

pub async fn build_app() -> Result<Router> {
    let metrics = AppMetrics::shared();

    let kv = if let Ok(database_url) = env::var("VOYAGE_DATABASE_URL") {
        Kv::sqlite(&database_url).await?
    } else {
        Kv::memory()
    };

    let planner_state = PlannerState::load(Arc::new(kv))
        .await
        .context("failed to load planner state")?;
    let engine = Arc::new(PlannerEngine::new(
        Arc::new(planner_state),
        metrics.clone(),
    ));

    let api_key = env::var("VOYAGE_API_KEY").unwrap_or_else(|_| "dev-voyage-key".to_string());
    let rate_limit_window = Duration::from_secs(
        env::var("VOYAGE_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(60),
    );
    let rate_limit_max = env::var("VOYAGE_RATE_LIMIT_MAX")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(80);

    let state = ApiState {
        engine,
        metrics,
        api_key,
        limiter: ClientRateLimiter::new(rate_limit_window, rate_limit_max),
        allowed_origins: Arc::new(parse_allowed_origins()),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/search", post(search))
        .route("/v1/voice/transcript", post(voice_transcript))
        .route("/v1/quote", post(quote))
        .route("/v1/itinerary/group", post(itinerary_group))
        .route("/v1/favorites", get(favorites_list))
        .route("/v1/favorites/toggle", post(favorites_toggle))
        .route("/v1/trip", get(trip_get).post(trip_update))
        .route("/v1/history", get(history_list))
        .route(
            "/v1/settings/budget_optimization",
            post(budget_optimization_set),
        )
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = serde_json::json!({
        "status": "ok",
        "timestamp_utc": chrono::Utc::now().to_rfc3339(),
        "metrics": state.metrics.snapshot(),
    });
    (StatusCode::OK, Json(payload))
}

async fn search(State(state): State<ApiState>, Json(input): Json<SearchRequest>) -> Response {
    match state.engine.handle_search(&input.query).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => domain_error_response(error),
    }
}

async fn voice_transcript(
    State(state): State<ApiState>,
    Json(input): Json<TranscriptRequest>,
) -> Response {
    match state
        .engine
        .handle_transcript(&input.transcript, input.is_final)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => domain_error_response(error),
    }
}

async fn quote(State(state): State<ApiState>, Json(input): Json<QuoteRequest>) -> Response {
    let tax_rate = input.tax_rate.unwrap_or(DEFAULT_TAX_RATE);

    match state
        .engine
        .build_quote(&input.items, input.margin_percent, tax_rate)
    {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(error) => domain_error_response(error),
    }
}

async fn itinerary_group(
    State(state): State<ApiState>,
    Json(input): Json<GroupRequest>,
) -> Response {
    let radius_km = input.radius_km.unwrap_or(DEFAULT_PROXIMITY_RADIUS_KM);
    let grouped = state.engine.group_itinerary(&input.activities, radius_km);
    (StatusCode::OK, Json(grouped)).into_response()
}

async fn favorites_list(State(state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "favorites": state.engine.favorites() })),
    )
}

async fn favorites_toggle(
    State(state): State<ApiState>,
    Json(input): Json<FavoriteToggleRequest>,
) -> Response {
    match state.engine.toggle_favorite(&input.id).await {
        Ok(favorite) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": input.id, "favorite": favorite })),
        )
            .into_response(),
        Err(error) => domain_error_response(error),
    }
}

async fn trip_get(State(state): State<ApiState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.engine.trip_draft()))
}

async fn trip_update(
    State(state): State<ApiState>,
    Json(input): Json<TripUpdateRequest>,
) -> Response {
    let result = state
        .engine
        .update_trip(move |trip| {
            if let Some(destination) = input.destination {
                trip.destination = Some(destination);
            }
            if let Some(start_date) = input.start_date {
                trip.start_date = Some(start_date);
            }
            if let Some(duration_days) = input.duration_days {
                trip.duration_days = duration_days;
            }
            if let Some(travelers) = input.travelers {
                trip.travelers = travelers;
            }
            if let Some(budget) = input.budget {
                trip.budget = Some(budget);
            }
            if let Some(transport) = input.transport {
                trip.transport = Some(transport);
            }
            if let Some(transfer) = input.transfer {
                trip.transfer = Some(transfer);
            }
            if let Some(activities) = input.activities {
                trip.activities = activities;
            }
        })
        .await;

    match result {
        Ok(draft) => (StatusCode::OK, Json(draft)).into_response(),
        Err(error) => domain_error_response(error),
    }
}

async fn history_list(State(state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "entries": state.engine.search_history() })),
    )
}

async fn budget_optimization_set(
    State(state): State<ApiState>,
    Json(input): Json<BudgetOptimizationRequest>,
) -> Response {
    match state.engine.set_budget_optimization(input.enabled).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "enabled": input.enabled })),
        )
            .into_response(),
        Err(error) => domain_error_response(error),
    }
}

/// Caller mistakes (bad numbers, negative prices) map to 400; anything else
/// is a 500 without leaking internals.
fn domain_error_response(error: anyhow::Error) -> Response {
    if let Some(query_error) = error.downcast_ref::<QueryError>() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "invalid_query",
                "message": query_error.to_string()
            })),
        )
            .into_response();
    }

    if let Some(quote_error) = error.downcast_ref::<QuoteError>() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "invalid_quote_request",
                "message": quote_error.to_string()
            })),
        )
            .into_response();
    }

    tracing::error!(error = %error, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "internal",
            "message": "request failed"
        })),
    )
        .into_response()
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if request.method() == Method::OPTIONS || is_public_endpoint(path.as_str()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header_key != state.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let client = request_client(&request);
    if !state.limiter.allow(&client) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this client"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

fn request_client(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}

fn parse_allowed_origins() -> Vec<String> {
    let default_origins = ["http://localhost:3000", "http://127.0.0.1:3000"];

    env::var("VOYAGE_ALLOWED_ORIGINS")
        .ok()
        .map(|value| {
            value
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|| {
            default_origins
                .iter()
                .map(|value| value.to_string())
                .collect()
        })
}
