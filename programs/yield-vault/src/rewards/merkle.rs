//! Merkle commitments over cumulative reward entitlements.
//!
//! Leaves commit to `(account, token, claimable)`. Interior nodes hash the
//! sorted pair of their children, so a proof is just the sibling path with no
//! direction bits. Leaves and nodes use distinct domain prefixes.

use std::collections::BTreeSet;

use constant_time_eq::constant_time_eq_32;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{Result, VaultError};
use crate::require;

pub type Hash = [u8; 32];

/// Proofs longer than this cannot come from a tree we would publish.
pub const MAX_PROOF_DEPTH: usize = 32;

const LEAF_DOMAIN: &[u8] = b"yield-vault/reward-leaf";
const NODE_DOMAIN: &[u8] = b"yield-vault/reward-node";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub account: Address,
    pub token: Address,
    /// Cumulative entitlement, not the increment since the last root.
    pub claimable: u64,
}

pub fn leaf_hash(account: &Address, token: &Address, claimable: u64) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(LEAF_DOMAIN);
    hasher.update(account.as_ref());
    hasher.update(token.as_ref());
    hasher.update(&claimable.to_le_bytes());
    *hasher.finalize().as_bytes()
}

pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = blake3::Hasher::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(left);
    hasher.update(right);
    *hasher.finalize().as_bytes()
}

/// Fold a sibling path from `leaf` up to a root.
pub fn compute_root(leaf: Hash, proof: &[Hash]) -> Result<Hash> {
    require!(proof.len() <= MAX_PROOF_DEPTH, VaultError::MalformedProof);
    Ok(proof
        .iter()
        .fold(leaf, |current, sibling| hash_pair(&current, sibling)))
}

pub fn verify(root: &Hash, leaf: Hash, proof: &[Hash]) -> Result<bool> {
    let computed = compute_root(leaf, proof)?;
    Ok(constant_time_eq_32(&computed, root))
}

/// A published distribution: entries plus every level of the tree built over
/// them. An odd node at the end of a level is carried up unchanged.
#[derive(Clone, Debug)]
pub struct RewardTree {
    entries: Vec<RewardEntry>,
    levels: Vec<Vec<Hash>>,
}

impl RewardTree {
    pub fn new(entries: Vec<RewardEntry>) -> Result<Self> {
        require!(!entries.is_empty(), VaultError::MalformedProof);

        let mut seen = BTreeSet::new();
        for entry in &entries {
            require!(
                seen.insert((entry.account, entry.token)),
                VaultError::DuplicateRewardEntry
            );
        }

        let mut levels = vec![entries
            .iter()
            .map(|e| leaf_hash(&e.account, &e.token, e.claimable))
            .collect::<Vec<_>>()];

        while let Some(level) = levels.last().filter(|level| level.len() > 1) {
            let next = level
                .chunks(2)
                .filter_map(|pair| match pair {
                    [left, right] => Some(hash_pair(left, right)),
                    [single] => Some(*single),
                    _ => None,
                })
                .collect();
            levels.push(next);
        }

        Ok(Self { entries, levels })
    }

    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_default()
    }

    pub fn entries(&self) -> &[RewardEntry] {
        &self.entries
    }

    pub fn entry(&self, account: &Address, token: &Address) -> Option<&RewardEntry> {
        self.entries
            .iter()
            .find(|e| e.account == *account && e.token == *token)
    }

    /// Sibling path for the entry at `index`.
    pub fn proof(&self, index: usize) -> Option<Vec<Hash>> {
        if index >= self.entries.len() {
            return None;
        }

        let mut proof = Vec::new();
        let mut index = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = index ^ 1;
            if let Some(hash) = level.get(sibling) {
                proof.push(*hash);
            }
            index /= 2;
        }
        Some(proof)
    }

    pub fn proof_for(&self, account: &Address, token: &Address) -> Option<(RewardEntry, Vec<Hash>)> {
        let index = self
            .entries
            .iter()
            .position(|e| e.account == *account && e.token == *token)?;
        Some((self.entries[index], self.proof(index)?))
    }
}
