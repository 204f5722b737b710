//! Yield Vault Backend
//!
//! HTTP surface over a yield vault deployment: manager-driven rebalances,
//! timelock governance, reward distribution with proof lookup and claims,
//! and read-only vault and state views.

pub mod error;
pub mod routes;
pub mod services;
pub mod types;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    Router,
};
use constant_time_eq::constant_time_eq;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::warn;

use routes::{
    governance_router, health_router, rewards_router, state_router, vaults_router, AppState,
    SignerScope,
};
use services::Deployment;
use types::{ApiKey, Config};

/// Maximum accepted request body size
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the full router over `deployment`
pub fn app(config: Arc<Config>, deployment: Deployment) -> Router {
    let state = AppState::new(deployment);
    let cors = build_cors_layer(&config);

    Router::new()
        .merge(health_router())
        .merge(vaults_router(state.clone()))
        .merge(rewards_router(state.clone()))
        .merge(governance_router(state.clone()))
        .merge(state_router(state))
        .layer(middleware::from_fn_with_state(config, api_key_middleware))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}

/// Paths served without an API key
const OPEN_PATHS: &[&str] = &["/health"];

const API_KEY_HEADER: &str = "x-api-key";

fn build_cors_layer(config: &Config) -> CorsLayer {
    let origins = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(API_KEY_HEADER),
        ])
}

fn matching_key<'a>(config: &'a Config, presented: &str) -> Option<&'a ApiKey> {
    config
        .api_keys
        .iter()
        .find(|key| constant_time_eq(key.key.as_bytes(), presented.as_bytes()))
}

/// Rejects `/api` requests without a configured key. An empty key list
/// leaves the API open. Requests made with a bound key carry its
/// [`SignerScope`] for the handlers to enforce.
async fn api_key_middleware(
    State(config): State<Arc<Config>>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let path = request.uri().path();
    if config.api_keys.is_empty() || OPEN_PATHS.contains(&path) {
        return Ok(next.run(request).await);
    }

    let presented = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    match presented.map(|presented| matching_key(&config, presented)) {
        Some(Some(key)) => {
            if !key.signers.is_empty() {
                request
                    .extensions_mut()
                    .insert(SignerScope::bound(&key.signers));
            }
            Ok(next.run(request).await)
        }
        Some(None) => {
            warn!(path, "rejected request with unknown API key");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            warn!(path, "rejected request without API key");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
