//! HTTP server for harvestd

use crate::routes;
use anyhow::Result;
use axum::Router;
use harvest_core::GameService;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers.
pub struct AppState {
    pub service: GameService,
    pub start_time: Instant,
    /// Leaderboard size when the request does not pass a limit.
    pub ranking_limit: i64,
}

impl AppState {
    pub fn new(service: GameService, ranking_limit: i64) -> Self {
        Self {
            service,
            start_time: Instant::now(),
            ranking_limit,
        }
    }
}

/// Run the HTTP server.
pub async fn run(state: AppState, bind_addr: &str) -> Result<()> {
    let state = Arc::new(state);

    let app = Router::new()
        .merge(routes::auth_routes())
        .merge(routes::game_routes())
        .merge(routes::achievement_routes())
        .merge(routes::ranking_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("  Listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
