//! Vault listing and manager-driven rebalancing

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use super::{AppState, SignerScope};
use crate::error::Result;
use crate::services::{now, ProofGenerator};
use crate::types::{RebalanceBody, RebalanceResponse, VaultDetail, VaultSummary};

/// Create vaults router
pub fn vaults_router(state: AppState) -> Router {
    Router::new()
        .route("/api/vaults", get(list_vaults))
        .route("/api/vaults/{id}", get(get_vault))
        .route("/api/vaults/{id}/rebalance", post(rebalance))
        .with_state(state)
}

/// GET /api/vaults
async fn list_vaults(State(state): State<AppState>) -> Result<Json<Vec<VaultSummary>>> {
    let deployment = state.deployment.lock().await;
    Ok(Json(deployment.summaries()?))
}

/// GET /api/vaults/{id}
async fn get_vault(
    State(state): State<AppState>,
    Path(vault_id): Path<u64>,
) -> Result<Json<VaultDetail>> {
    let deployment = state.deployment.lock().await;
    Ok(Json(deployment.detail(vault_id)?))
}

/// Rebalance through the vault manager as `body.signer`, which must hold the
/// manager's Executor role and, under a bound API key, be one of its signers.
///
/// POST /api/vaults/{id}/rebalance
async fn rebalance(
    State(state): State<AppState>,
    Path(vault_id): Path<u64>,
    scope: SignerScope,
    Json(body): Json<RebalanceBody>,
) -> Result<Json<RebalanceResponse>> {
    info!(
        vault_id,
        executor = %body.signer,
        assets = %body.assets,
        from = %body.from,
        to = %body.to,
        "Rebalance requested"
    );
    scope.check(&ProofGenerator::parse_address(&body.signer)?)?;

    let mut deployment = state.deployment.lock().await;
    let response = deployment.rebalance(vault_id, &body, now())?;

    info!(vault_id, total_assets = response.total_assets, "Rebalance applied");
    Ok(Json(response))
}
