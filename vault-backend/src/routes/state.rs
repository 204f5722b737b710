//! Persisted-layout snapshot of the whole deployment

use axum::{extract::State, routing::get, Json, Router};

use super::AppState;
use crate::services::now;
use crate::types::StateResponse;

pub fn state_router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(snapshot))
        .with_state(state)
}

/// GET /api/state
async fn snapshot(State(state): State<AppState>) -> Json<StateResponse> {
    let deployment = state.deployment.lock().await;
    Json(deployment.state(now()))
}
