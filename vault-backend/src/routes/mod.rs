//! API Routes

pub mod governance;
pub mod health;
pub mod rewards;
pub mod state;
pub mod vaults;

use std::convert::Infallible;
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tokio::sync::Mutex;
use yield_vault::Address;

use crate::error::{BackendError, Result};
use crate::services::Deployment;

pub use governance::governance_router;
pub use health::health_router;
pub use rewards::rewards_router;
pub use state::state_router;
pub use vaults::vaults_router;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub deployment: Arc<Mutex<Deployment>>,
}

impl AppState {
    pub fn new(deployment: Deployment) -> Self {
        Self {
            deployment: Arc::new(Mutex::new(deployment)),
        }
    }
}

/// Signers the request's API key may act as. Requests on an open API or
/// made with an unbound key may name any signer.
#[derive(Debug, Clone, Default)]
pub struct SignerScope {
    allowed: Option<Arc<[Address]>>,
}

impl SignerScope {
    pub fn bound(signers: &[Address]) -> Self {
        Self {
            allowed: Some(signers.into()),
        }
    }

    /// Fails unless this request may act as `signer`
    pub fn check(&self, signer: &Address) -> Result<()> {
        match &self.allowed {
            Some(allowed) if !allowed.contains(signer) => {
                tracing::warn!(%signer, "rejected request for a signer outside the key's scope");
                Err(BackendError::SignerNotAllowed(signer.to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SignerScope {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<SignerScope>().cloned().unwrap_or_default())
    }
}
