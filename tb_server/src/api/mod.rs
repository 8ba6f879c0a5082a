//! HTTP API for the bracket server.
//!
//! A thin adapter over [`BracketManager`]: handlers parse the request, call
//! one manager operation and map its error to a status code. No bracket
//! rules live here.
//!
//! # Modules
//!
//! - [`brackets`]: Bracket generation, queries and result recording
//! - [`request_id`]: Request correlation and HTTP metrics middleware
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                                                - Server health status
//! POST /api/v1/tournaments/{tournament_id}/bracket            - Generate bracket
//! GET  /api/v1/tournaments/{tournament_id}/bracket            - Bracket of a tournament
//! GET  /api/v1/brackets/{bracket_id}                          - Bracket with all matches
//! GET  /api/v1/brackets/{bracket_id}/rounds                   - Matches grouped by round
//! POST /api/v1/brackets/{bracket_id}/matches/{match_id}/result - Record a result
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tb_server::api::{AppState, create_router};
//! use tourney_bracket::BracketManager;
//! use tourney_bracket::db::{MemoryBracketRepository, MemoryRoster};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = BracketManager::new(
//!     Arc::new(MemoryBracketRepository::new()),
//!     Arc::new(MemoryRoster::new()),
//! );
//! let state = AppState {
//!     bracket_manager: Arc::new(manager),
//!     pool: None,
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:7070").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod brackets;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tourney_bracket::BracketManager;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request (cheap due to Arc wrappers).
///
/// # Fields
///
/// - `bracket_manager`: Bracket operations over the configured storage
/// - `pool`: Database connection pool, `None` when running in memory
#[derive(Clone)]
pub struct AppState {
    pub bracket_manager: Arc<BracketManager>,
    pub pool: Option<Arc<PgPool>>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    let tournament_routes = Router::new().route(
        "/tournaments/{tournament_id}/bracket",
        post(brackets::generate_bracket).get(brackets::get_tournament_bracket),
    );

    let bracket_routes = Router::new()
        .route("/brackets/{bracket_id}", get(brackets::get_bracket))
        .route("/brackets/{bracket_id}/rounds", get(brackets::get_rounds))
        .route(
            "/brackets/{bracket_id}/matches/{match_id}/result",
            post(brackets::record_result),
        );

    Router::new().merge(tournament_routes).merge(bracket_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage is reachable, `503 Service Unavailable`
/// otherwise. In-memory storage is always reachable.
///
/// # Example
///
/// ```bash
/// curl http://localhost:7070/health
/// # {"status":"healthy","storage":"postgres","database":true,"timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, db_healthy) = match &state.pool {
        Some(pool) => (
            "postgres",
            sqlx::query("SELECT 1").fetch_one(&**pool).await.is_ok(),
        ),
        None => ("memory", true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
