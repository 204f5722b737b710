//! Timelock queue, execute and cancel
//!
//! The body's `signer` is the timelock owner the call is made as. Under an
//! API key bound to signers it must be one of them.

use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use super::{AppState, SignerScope};
use crate::error::Result;
use crate::services::{now, ProofGenerator};
use crate::types::{GovernanceRequest, GovernanceResponse};

/// Create governance router
pub fn governance_router(state: AppState) -> Router {
    Router::new()
        .route("/api/governance/queue", post(queue))
        .route("/api/governance/execute", post(execute))
        .route("/api/governance/cancel", post(cancel))
        .with_state(state)
}

/// POST /api/governance/queue
async fn queue(
    State(state): State<AppState>,
    scope: SignerScope,
    Json(req): Json<GovernanceRequest>,
) -> Result<Json<GovernanceResponse>> {
    info!(signer = %req.signer, vault_id = ?req.vault_id, eta = req.eta, "Queueing transaction");
    scope.check(&ProofGenerator::parse_address(&req.signer)?)?;

    let mut deployment = state.deployment.lock().await;
    Ok(Json(deployment.queue(&req, now())?))
}

/// POST /api/governance/execute
async fn execute(
    State(state): State<AppState>,
    scope: SignerScope,
    Json(req): Json<GovernanceRequest>,
) -> Result<Json<GovernanceResponse>> {
    info!(signer = %req.signer, vault_id = ?req.vault_id, eta = req.eta, "Executing transaction");
    scope.check(&ProofGenerator::parse_address(&req.signer)?)?;

    let mut deployment = state.deployment.lock().await;
    Ok(Json(deployment.execute(&req, now())?))
}

/// POST /api/governance/cancel
async fn cancel(
    State(state): State<AppState>,
    scope: SignerScope,
    Json(req): Json<GovernanceRequest>,
) -> Result<Json<GovernanceResponse>> {
    info!(signer = %req.signer, vault_id = ?req.vault_id, "Cancelling transaction");
    scope.check(&ProofGenerator::parse_address(&req.signer)?)?;

    let mut deployment = state.deployment.lock().await;
    Ok(Json(deployment.cancel(&req)?))
}
