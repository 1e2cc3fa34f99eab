//! API routes for harvestd
//!
//! The engines are synchronous (one SQLite round-trip per operation), so
//! every handler hops onto the blocking pool before touching the service.

use crate::server::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use harvest_core::api::{
    AchievementsRequest, AchievementsResponse, CollectRequest, CollectResponse, EvaluateRequest,
    EvaluateResponse, HealthResponse, LoginRequest, LoginResponse, RankingResponse,
    RegisterRequest, RegisterResponse, ResourcesRequest, ResourcesResponse, SellAllRequest,
    SellAllResponse, SellRequest, SellResponse, UpgradeRequest, UpgradeResponse,
};
use harvest_core::GameError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

type AppStateArc = Arc<AppState>;

/// Map a domain error to an HTTP status and message.
fn to_http(err: GameError) -> (StatusCode, String) {
    let status = match &err {
        GameError::NotFound(_) => StatusCode::NOT_FOUND,
        GameError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        GameError::InsufficientResource { .. }
        | GameError::InsufficientFunds { .. }
        | GameError::Conflict(_) => StatusCode::CONFLICT,
        GameError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        GameError::Storage(_) | GameError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("  internal error: {err}");
    }
    (status, err.to_string())
}

/// Run a synchronous service call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<Json<T>, (StatusCode, String)>
where
    F: FnOnce() -> harvest_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(Json(value)),
        Ok(Err(err)) => Err(to_http(err)),
        Err(err) => {
            error!("  blocking task failed: {err}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal task failure".to_string(),
            ))
        }
    }
}

// ============================================================================
// Auth Routes
// ============================================================================

pub fn auth_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
}

async fn register(
    State(state): State<AppStateArc>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, (StatusCode, String)> {
    let service = state.service.clone();
    run_blocking(move || service.register(&req.username, &req.password)).await
}

async fn login(
    State(state): State<AppStateArc>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    let service = state.service.clone();
    run_blocking(move || service.login(&req.username, &req.password)).await
}

// ============================================================================
// Game Routes
// ============================================================================

pub fn game_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/game/collect", post(collect))
        .route("/v1/game/sell", post(sell))
        .route("/v1/game/sell-all", post(sell_all))
        .route("/v1/game/upgrade", post(upgrade))
        .route("/v1/game/resources/list", post(resources))
}

async fn collect(
    State(state): State<AppStateArc>,
    Json(req): Json<CollectRequest>,
) -> Result<Json<CollectResponse>, (StatusCode, String)> {
    let service = state.service.clone();
    run_blocking(move || service.collect(req.user_id, &req.product)).await
}

async fn sell(
    State(state): State<AppStateArc>,
    Json(req): Json<SellRequest>,
) -> Result<Json<SellResponse>, (StatusCode, String)> {
    let service = state.service.clone();
    run_blocking(move || service.sell(req.user_id, &req.product, req.quantity)).await
}

async fn sell_all(
    State(state): State<AppStateArc>,
    Json(req): Json<SellAllRequest>,
) -> Result<Json<SellAllResponse>, (StatusCode, String)> {
    let service = state.service.clone();
    run_blocking(move || service.sell_all(req.user_id)).await
}

async fn upgrade(
    State(state): State<AppStateArc>,
    Json(req): Json<UpgradeRequest>,
) -> Result<Json<UpgradeResponse>, (StatusCode, String)> {
    let service = state.service.clone();
    run_blocking(move || service.upgrade_production(req.user_id, &req.product)).await
}

async fn resources(
    State(state): State<AppStateArc>,
    Json(req): Json<ResourcesRequest>,
) -> Result<Json<ResourcesResponse>, (StatusCode, String)> {
    let service = state.service.clone();
    run_blocking(move || service.resources(req.user_id)).await
}

// ============================================================================
// Achievement Routes
// ============================================================================

pub fn achievement_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/achievements/list", post(achievements))
        .route("/v1/achievements/evaluate", post(evaluate))
}

async fn achievements(
    State(state): State<AppStateArc>,
    Json(req): Json<AchievementsRequest>,
) -> Result<Json<AchievementsResponse>, (StatusCode, String)> {
    let service = state.service.clone();
    run_blocking(move || service.achievements_overview(req.user_id)).await
}

async fn evaluate(
    State(state): State<AppStateArc>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, (StatusCode, String)> {
    let service = state.service.clone();
    run_blocking(move || service.evaluate_achievements(req.user_id)).await
}

// ============================================================================
// Ranking Routes
// ============================================================================

#[derive(Debug, Deserialize)]
struct RankingParams {
    limit: Option<i64>,
}

pub fn ranking_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/ranking", get(ranking))
}

async fn ranking(
    State(state): State<AppStateArc>,
    Query(params): Query<RankingParams>,
) -> Result<Json<RankingResponse>, (StatusCode, String)> {
    let service = state.service.clone();
    let limit = params.limit.unwrap_or(state.ranking_limit);
    run_blocking(move || service.ranking(Some(limit))).await
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
