//! Reward distribution, proof lookup and claims

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use super::{AppState, SignerScope};
use crate::error::Result;
use crate::services::{now, ProofGenerator};
use crate::types::{
    ClaimRequest, ClaimResponse, DistributionRequest, DistributionResponse, ProofResponse,
    RootResponse,
};

/// Create rewards router
pub fn rewards_router(state: AppState) -> Router {
    Router::new()
        .route("/api/rewards/root", get(current_root))
        .route("/api/rewards/distribution", post(publish_distribution))
        .route("/api/rewards/proof/{account}/{token}", get(proof))
        .route("/api/rewards/claim", post(claim))
        .with_state(state)
}

/// GET /api/rewards/root
async fn current_root(State(state): State<AppState>) -> Json<RootResponse> {
    let deployment = state.deployment.lock().await;
    Json(deployment.root())
}

/// Build a reward tree and publish its root as `req.signer`, the
/// RootUpdater. Under a bound API key the signer must be one of its signers.
///
/// POST /api/rewards/distribution
async fn publish_distribution(
    State(state): State<AppState>,
    scope: SignerScope,
    Json(req): Json<DistributionRequest>,
) -> Result<Json<DistributionResponse>> {
    info!(
        signer = %req.signer,
        entries = req.entries.len(),
        "Publishing reward distribution"
    );

    let signer = ProofGenerator::parse_address(&req.signer)?;
    scope.check(&signer)?;
    // Hashing happens before the lock is taken
    let tree = ProofGenerator::build_tree(&req.entries)?;

    let mut deployment = state.deployment.lock().await;
    let response = deployment.publish(&signer, tree)?;

    info!(root = %response.root, "Reward root published");
    Ok(Json(response))
}

/// GET /api/rewards/proof/{account}/{token}
async fn proof(
    State(state): State<AppState>,
    Path((account, token)): Path<(String, String)>,
) -> Result<Json<ProofResponse>> {
    let deployment = state.deployment.lock().await;
    Ok(Json(deployment.proof(&account, &token)?))
}

/// Claims pay out only to `req.account`, so any key may submit one.
///
/// POST /api/rewards/claim
async fn claim(
    State(state): State<AppState>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>> {
    info!(
        account = %req.account,
        token = %req.token,
        claimable = %req.claimable,
        "Claiming rewards"
    );

    let mut deployment = state.deployment.lock().await;
    let response = deployment.claim(&req, now())?;

    info!(amount = response.amount, "Rewards claimed");
    Ok(Json(response))
}
