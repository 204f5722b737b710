//! Reward proof service
//!
//! Builds reward trees from distribution requests and converts proofs and
//! request fields between their wire encodings and the vault library types.
//! Addresses and roots travel as base58, proof nodes as base64.

use base64::{engine::general_purpose::STANDARD, Engine};
use yield_vault::constants::SENTINEL_MAX;
use yield_vault::rewards::distributor::encode_hash;
use yield_vault::rewards::merkle::MAX_PROOF_DEPTH;
use yield_vault::rewards::Hash;
use yield_vault::{Address, RewardEntry, RewardTree};

use crate::error::{BackendError, Result};
use crate::types::DistributionEntry;

/// Proof generator service
pub struct ProofGenerator;

impl ProofGenerator {
    /// Build the tree for a cumulative distribution
    pub fn build_tree(entries: &[DistributionEntry]) -> Result<RewardTree> {
        if entries.is_empty() {
            return Err(BackendError::BadRequest(
                "Distribution must list at least one entry".to_string(),
            ));
        }

        let entries = entries
            .iter()
            .map(|entry| {
                Ok(RewardEntry {
                    account: Self::parse_address(&entry.account)?,
                    token: Self::parse_address(&entry.token)?,
                    claimable: Self::parse_amount("claimable", &entry.claimable)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RewardTree::new(entries)?)
    }

    /// Look up `(account, token)` in `tree` and return its entry with the
    /// encoded proof
    pub fn proof_for(
        tree: &RewardTree,
        account: &Address,
        token: &Address,
    ) -> Result<(RewardEntry, Vec<String>)> {
        let (entry, proof) = tree.proof_for(account, token).ok_or_else(|| {
            BackendError::NotFound(format!("No reward entry for {account} / {token}"))
        })?;
        Ok((entry, Self::encode_proof(&proof)))
    }

    pub fn encode_root(root: &Hash) -> String {
        encode_hash(root)
    }

    pub fn encode_proof(proof: &[Hash]) -> Vec<String> {
        proof.iter().map(|node| STANDARD.encode(node)).collect()
    }

    /// Decode base64 proof nodes (32 bytes each)
    pub fn decode_proof(proof: &[String]) -> Result<Vec<Hash>> {
        if proof.len() > MAX_PROOF_DEPTH {
            return Err(BackendError::InvalidProof(format!(
                "Proof has {} nodes, at most {MAX_PROOF_DEPTH} allowed",
                proof.len()
            )));
        }

        proof
            .iter()
            .map(|node| {
                let bytes = STANDARD
                    .decode(node)
                    .map_err(|e| BackendError::InvalidProof(format!("Invalid base64: {e}")))?;
                let len = bytes.len();
                let node: Hash = bytes.try_into().map_err(|_| {
                    BackendError::InvalidProof(format!("Proof node must be 32 bytes, got {len}"))
                })?;
                Ok(node)
            })
            .collect()
    }

    /// Parse a base58 address
    pub fn parse_address(s: &str) -> Result<Address> {
        s.parse()
            .map_err(|e| BackendError::InvalidAddress(format!("{s}: {e}")))
    }

    /// Parse a decimal u64 amount
    pub fn parse_amount(field: &str, s: &str) -> Result<u64> {
        s.trim()
            .parse()
            .map_err(|e| BackendError::BadRequest(format!("Invalid {field}: {e}")))
    }

    /// Like [`ProofGenerator::parse_amount`], with `"max"` standing for the
    /// full balance at the source provider
    pub fn parse_rebalance_amount(s: &str) -> Result<u64> {
        if s.trim().eq_ignore_ascii_case("max") {
            return Ok(SENTINEL_MAX);
        }
        Self::parse_amount("assets", s)
    }
}
