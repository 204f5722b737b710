//! Request and response types for the vault backend

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use yield_vault::rewards::DistributorSnapshot;
use yield_vault::{
    Address, PauseFlags, ProviderView, TimelockSnapshot, VaultConfig, VaultError, VaultSnapshot,
};

/// Summary row for `GET /api/vaults`
#[derive(Debug, Serialize, Deserialize)]
pub struct VaultSummary {
    pub vault_id: u64,
    pub address: String,
    pub asset_mint: String,
    pub shares_mint: String,
    pub total_assets: u64,
    pub total_shares: u64,
    pub active_provider: String,
    pub paused: PauseFlags,
    pub setup_completed: bool,
}

/// Full view for `GET /api/vaults/{id}`
#[derive(Debug, Serialize, Deserialize)]
pub struct VaultDetail {
    pub summary: VaultSummary,
    pub governor: String,
    pub config: VaultConfig,
    pub providers: Vec<ProviderView>,
}

/// Rebalance routed through the vault manager
///
/// `signer` must hold the Executor role on the manager.
#[derive(Debug, Deserialize)]
pub struct RebalanceBody {
    /// Executor address (base58)
    pub signer: String,

    /// Amount to move (as string to handle u64), or `"max"` for the full
    /// balance held at `from`
    pub assets: String,

    /// Source provider (base58)
    pub from: String,

    /// Destination provider (base58)
    pub to: String,

    /// Fee sent to the treasury out of the moved assets
    #[serde(default = "zero_amount")]
    pub fee: String,

    /// Make `to` the active provider afterwards
    #[serde(default)]
    pub activate_to: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RebalanceResponse {
    pub vault_id: u64,
    pub rebalanced: bool,
    pub total_assets: u64,
    pub providers: Vec<ProviderView>,
}

/// Published reward root, base58 encoded
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub root: Option<String>,
    pub paused: bool,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionEntry {
    /// Recipient address (base58)
    pub account: String,

    /// Reward token mint (base58)
    pub token: String,

    /// Cumulative amount claimable (as string to handle u64)
    pub claimable: String,
}

/// New cumulative distribution. The backend builds the tree, publishes its
/// root and serves proofs for it until the next distribution.
#[derive(Debug, Deserialize)]
pub struct DistributionRequest {
    /// RootUpdater address (base58)
    pub signer: String,
    pub entries: Vec<DistributionEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistributionResponse {
    pub root: String,
    pub entries: usize,
}

/// Proof for one `(account, token)` leaf of the current tree
#[derive(Debug, Serialize, Deserialize)]
pub struct ProofResponse {
    pub account: String,
    pub token: String,
    pub claimable: String,
    pub claimed: String,

    /// Sibling hashes, leaf to root (32 bytes each, base64 encoded)
    pub proof: Vec<String>,
}

/// Claim submitted on behalf of `account`
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub account: String,
    pub token: String,
    pub claimable: String,
    pub proof: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub account: String,
    pub token: String,
    pub amount: u64,
    pub total_claimed: u64,
}

/// A governor or timelock-administration call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GovernanceCallBody {
    SetProviders { providers: Vec<String> },
    SetGovernor { governor: String },
    SetDelay { delay: i64 },
    SetOwner { owner: String },
}

/// Queue, execute or cancel request. The same body must be sent for all
/// three so that the transaction hash matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceRequest {
    /// Timelock owner (base58)
    pub signer: String,

    /// Vault the call targets. Omitted for timelock self-calls.
    #[serde(default)]
    pub vault_id: Option<u64>,

    /// Unix timestamp the call unlocks at
    pub eta: i64,

    pub call: GovernanceCallBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GovernanceResponse {
    pub tx_hash: String,
    pub target: String,
    pub signature: String,
    pub eta: i64,
    pub status: String,
}

/// Persisted layout of every component in the deployment
#[derive(Debug, Serialize, Deserialize)]
pub struct StateResponse {
    pub vaults: Vec<VaultSnapshot>,
    pub timelock: TimelockSnapshot,
    pub distributor: DistributorSnapshot,
    pub timestamp: i64,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: i64,
}

fn zero_amount() -> String {
    "0".to_string()
}

/// An accepted API key. A key bound to signers may only submit requests that
/// name one of them; an unbound key may name any signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub key: String,
    pub signers: Vec<Address>,
}

impl ApiKey {
    pub fn unbound(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            signers: vec![],
        }
    }

    pub fn bound(key: impl Into<String>, signers: Vec<Address>) -> Self {
        Self {
            key: key.into(),
            signers,
        }
    }

    /// Parse `key` or `key:signer1+signer2`. Any bad signer rejects the
    /// whole entry rather than leaving the key unbound.
    pub fn parse(entry: &str) -> std::result::Result<Self, VaultError> {
        let Some((key, signers)) = entry.split_once(':') else {
            return Ok(Self::unbound(entry));
        };
        let signers = signers
            .split('+')
            .map(|s| s.trim().parse())
            .collect::<std::result::Result<Vec<Address>, _>>()?;
        Ok(Self::bound(key, signers))
    }
}

/// Configuration for the backend server
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,

    /// API keys for authentication
    pub api_keys: Vec<ApiKey>,

    /// JSON deployment description. The demo deployment is used when unset.
    pub deployment_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            cors_origins: vec!["http://localhost:3000".to_string()],
            api_keys: vec![],
            deployment_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);

        let cors_origins = std::env::var("CORS_ORIGINS")
            .ok()
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        let api_keys = std::env::var("API_KEYS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .filter_map(|entry| match ApiKey::parse(entry) {
                        Ok(key) => Some(key),
                        Err(e) => {
                            tracing::warn!(error = %e, "Ignoring API key with invalid signer");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let deployment_file = std::env::var("DEPLOYMENT_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            port,
            cors_origins,
            api_keys,
            deployment_file,
        }
    }
}
