//! wxmc-server library - weather Markov-chain forecast service
//!
//! Accounts with bearer tokens, per-user dataset upload and N-day state
//! prediction, with a default model for users who have not uploaded.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use wxmc_common::db::{ModelRecord, SqliteModelStore};
use wxmc_common::markov::CategorySet;

pub mod api;
pub mod forecast;
pub mod locks;

use forecast::ForecastService;

/// Default request body cap (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Accounts and sessions (and, by default, model storage)
    pub db: SqlitePool,
    pub forecasts: Arc<ForecastService>,
    /// Lifetime of issued bearer tokens
    pub token_ttl: chrono::Duration,
    pub max_upload_bytes: usize,
    /// Empty allows any origin
    pub cors_allowed_origins: Vec<String>,
}

impl AppState {
    /// State backed by the SQLite model store on `db`
    pub fn new(db: SqlitePool, default_model: ModelRecord, categories: CategorySet) -> Self {
        let store = Arc::new(SqliteModelStore::new(db.clone()));
        Self {
            db,
            forecasts: Arc::new(ForecastService::new(store, default_model, categories)),
            token_ttl: chrono::Duration::minutes(30),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_allowed_origins: Vec::new(),
        }
    }

    pub fn with_token_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn with_cors_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_allowed_origins = origins;
        self
    }
}

/// Build application router
///
/// `/health`, `/register` and `/token` are public; everything else needs a
/// bearer token.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = Router::new()
        .merge(api::account_routes())
        .merge(api::forecast_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .merge(api::health_routes())
        .merge(api::registration_routes());

    let cors = cors_layer(&state.cors_allowed_origins);
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}
