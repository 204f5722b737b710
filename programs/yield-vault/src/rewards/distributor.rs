use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::access::{Role, RoleRegistry};
use crate::address::Address;
use crate::constants::DISTRIBUTOR_SEED;
use crate::context::Context;
use crate::error::{Result, VaultError};
use crate::events::{
    DistributorStatusChanged, EmergencyWithdraw, EventLog, RewardsClaimed, RoleGranted,
    RoleRevoked, RootUpdated,
};
use crate::require;
use crate::rewards::merkle::{self, Hash, MAX_PROOF_DEPTH};

pub fn encode_hash(hash: &Hash) -> String {
    bs58::encode(hash).into_string()
}

pub fn decode_hash(s: &str) -> Result<Hash> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|_| VaultError::MalformedProof)?;
    bytes.try_into().map_err(|_| VaultError::MalformedProof)
}

/// Cumulative Merkle reward ledger. Holds reward tokens under its own
/// address and pays out the difference between an account's certified
/// cumulative entitlement and what it has already claimed.
#[derive(Debug)]
pub struct RewardDistributor {
    address: Address,
    roles: RoleRegistry,
    root: Option<Hash>,
    claimed: BTreeMap<(Address, Address), u64>,
    paused: bool,
    events: EventLog,
}

impl RewardDistributor {
    pub fn new(admin: Address) -> Result<Self> {
        require!(!admin.is_zero(), VaultError::ZeroAddress);
        Ok(Self {
            address: Address::derive(&[DISTRIBUTOR_SEED, admin.as_ref()]),
            roles: RoleRegistry::new(admin),
            root: None,
            claimed: BTreeMap::new(),
            paused: false,
            events: EventLog::default(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn root(&self) -> Option<Hash> {
        self.root
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Total already paid to `account` in `token`.
    pub fn claimed(&self, account: &Address, token: &Address) -> u64 {
        self.claimed.get(&(*account, *token)).copied().unwrap_or(0)
    }

    /// Claim up to `claimable` (the cumulative amount certified by the
    /// current root). Pays and returns the delta over what was claimed before.
    pub fn claim(
        &mut self,
        ctx: &mut Context,
        account: Address,
        token: Address,
        claimable: u64,
        proof: &[Hash],
    ) -> Result<u64> {
        require!(!self.paused, VaultError::DistributorPaused);
        require!(ctx.signer == account, VaultError::NotClaimAccount);
        require!(proof.len() <= MAX_PROOF_DEPTH, VaultError::MalformedProof);

        let root = self.root.ok_or(VaultError::InvalidProof)?;
        let leaf = merkle::leaf_hash(&account, &token, claimable);
        require!(merkle::verify(&root, leaf, proof)?, VaultError::InvalidProof);

        let already = self.claimed(&account, &token);
        require!(claimable > already, VaultError::AlreadyClaimed);
        let amount = claimable - already;

        ctx.bank.transfer(&token, &self.address, &account, amount)?;
        self.claimed.insert((account, token), claimable);

        self.events.emit(RewardsClaimed {
            account,
            token,
            amount,
            total_claimed: claimable,
        });

        Ok(amount)
    }

    pub fn update_root(&mut self, signer: &Address, root: Hash) -> Result<()> {
        self.roles.require_role(Role::RootUpdater, signer)?;

        self.root = Some(root);
        self.events.emit(RootUpdated {
            root: encode_hash(&root),
            sender: *signer,
        });
        Ok(())
    }

    pub fn pause(&mut self, signer: &Address) -> Result<()> {
        self.roles.require_role(Role::Admin, signer)?;
        require!(!self.paused, VaultError::DistributorPaused);

        self.paused = true;
        self.events.emit(DistributorStatusChanged { paused: true });
        Ok(())
    }

    pub fn unpause(&mut self, signer: &Address) -> Result<()> {
        self.roles.require_role(Role::Admin, signer)?;
        require!(self.paused, VaultError::DistributorNotPaused);

        self.paused = false;
        self.events.emit(DistributorStatusChanged { paused: false });
        Ok(())
    }

    /// Emergency recovery of reward tokens held by the distributor.
    pub fn withdraw(
        &mut self,
        ctx: &mut Context,
        token: Address,
        receiver: Address,
        amount: u64,
    ) -> Result<()> {
        self.roles.require_role(Role::Admin, &ctx.signer)?;
        require!(!receiver.is_zero(), VaultError::ZeroAddress);
        require!(amount > 0, VaultError::ZeroAmount);

        ctx.bank.transfer(&token, &self.address, &receiver, amount)?;

        tracing::warn!(token = %token, receiver = %receiver, amount, "Emergency withdraw from distributor");
        self.events.emit(EmergencyWithdraw {
            token,
            receiver,
            amount,
        });
        Ok(())
    }

    pub fn grant_role(&mut self, signer: &Address, role: Role, account: Address) -> Result<()> {
        if self.roles.grant_role(signer, role, account)? {
            self.events.emit(RoleGranted {
                component: self.address,
                role,
                account,
                sender: *signer,
            });
        }
        Ok(())
    }

    pub fn revoke_role(&mut self, signer: &Address, role: Role, account: Address) -> Result<()> {
        if self.roles.revoke_role(signer, role, &account)? {
            self.events.emit(RoleRevoked {
                component: self.address,
                role,
                account,
                sender: *signer,
            });
        }
        Ok(())
    }

    pub fn snapshot(&self) -> DistributorSnapshot {
        DistributorSnapshot {
            address: self.address,
            roles: self.roles.clone(),
            root: self.root.as_ref().map(encode_hash),
            claimed: self
                .claimed
                .iter()
                .map(|(&(account, token), &amount)| ClaimRecord {
                    account,
                    token,
                    amount,
                })
                .collect(),
            paused: self.paused,
        }
    }

    pub fn restore(snapshot: DistributorSnapshot) -> Result<Self> {
        let root = snapshot.root.as_deref().map(decode_hash).transpose()?;
        Ok(Self {
            address: snapshot.address,
            roles: snapshot.roles,
            root,
            claimed: snapshot
                .claimed
                .into_iter()
                .map(|record| ((record.account, record.token), record.amount))
                .collect(),
            paused: snapshot.paused,
            events: EventLog::default(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub account: Address,
    pub token: Address,
    pub amount: u64,
}

/// Current root plus the claimed map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorSnapshot {
    pub address: Address,
    pub roles: RoleRegistry,
    pub root: Option<String>,
    pub claimed: Vec<ClaimRecord>,
    pub paused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::merkle::{RewardEntry, RewardTree};
    use crate::token::TokenBank;

    struct Fixture {
        bank: TokenBank,
        distributor: RewardDistributor,
        admin: Address,
        alice: Address,
        token: Address,
    }

    fn fixture() -> Fixture {
        let admin = Address::new_unique();
        let mut distributor = RewardDistributor::new(admin).unwrap();
        distributor.grant_role(&admin, Role::RootUpdater, admin).unwrap();

        let token = Address::new_unique();
        let mut bank = TokenBank::new();
        bank.mint_to(&token, &distributor.address(), 1_000_000).unwrap();

        Fixture {
            bank,
            distributor,
            admin,
            alice: Address::new_unique(),
            token,
        }
    }

    fn publish(f: &mut Fixture, claimable: u64) -> Vec<Hash> {
        let tree = RewardTree::new(vec![
            RewardEntry {
                account: f.alice,
                token: f.token,
                claimable,
            },
            RewardEntry {
                account: Address::new_unique(),
                token: f.token,
                claimable: 42,
            },
        ])
        .unwrap();
        f.distributor.update_root(&f.admin, tree.root()).unwrap();
        tree.proof(0).unwrap()
    }

    #[test]
    fn test_claim_pays_delta_over_cumulative_amount() {
        let mut f = fixture();
        let proof = publish(&mut f, 1000);

        let mut ctx = Context::new(f.alice, &mut f.bank, 0);
        let paid = f.distributor.claim(&mut ctx, f.alice, f.token, 1000, &proof).unwrap();
        assert_eq!(paid, 1000);

        let err = f
            .distributor
            .claim(&mut ctx, f.alice, f.token, 1000, &proof)
            .unwrap_err();
        assert_eq!(err, VaultError::AlreadyClaimed);

        let proof = publish(&mut f, 1500);
        let mut ctx = Context::new(f.alice, &mut f.bank, 0);
        let paid = f.distributor.claim(&mut ctx, f.alice, f.token, 1500, &proof).unwrap();
        assert_eq!(paid, 500);
        assert_eq!(f.distributor.claimed(&f.alice, &f.token), 1500);
        assert_eq!(f.bank.balance_of(&f.token, &f.alice), 1500);
    }

    #[test]
    fn test_claim_rejects_wrong_amount_and_signer() {
        let mut f = fixture();
        let proof = publish(&mut f, 1000);

        let mut ctx = Context::new(f.alice, &mut f.bank, 0);
        assert_eq!(
            f.distributor
                .claim(&mut ctx, f.alice, f.token, 1001, &proof)
                .unwrap_err(),
            VaultError::InvalidProof
        );

        let mut ctx = Context::new(Address::new_unique(), &mut f.bank, 0);
        assert_eq!(
            f.distributor
                .claim(&mut ctx, f.alice, f.token, 1000, &proof)
                .unwrap_err(),
            VaultError::NotClaimAccount
        );
    }

    #[test]
    fn test_claim_without_root_is_invalid() {
        let mut f = fixture();
        let mut ctx = Context::new(f.alice, &mut f.bank, 0);
        assert_eq!(
            f.distributor
                .claim(&mut ctx, f.alice, f.token, 1, &[])
                .unwrap_err(),
            VaultError::InvalidProof
        );
    }

    #[test]
    fn test_lower_root_never_reduces_claimed() {
        let mut f = fixture();
        let proof = publish(&mut f, 1000);
        let mut ctx = Context::new(f.alice, &mut f.bank, 0);
        f.distributor.claim(&mut ctx, f.alice, f.token, 1000, &proof).unwrap();

        let proof = publish(&mut f, 600);
        let mut ctx = Context::new(f.alice, &mut f.bank, 0);
        assert_eq!(
            f.distributor
                .claim(&mut ctx, f.alice, f.token, 600, &proof)
                .unwrap_err(),
            VaultError::AlreadyClaimed
        );
        assert_eq!(f.distributor.claimed(&f.alice, &f.token), 1000);
    }

    #[test]
    fn test_paused_blocks_claims() {
        let mut f = fixture();
        let proof = publish(&mut f, 1000);
        f.distributor.pause(&f.admin).unwrap();

        let mut ctx = Context::new(f.alice, &mut f.bank, 0);
        let err = f
            .distributor
            .claim(&mut ctx, f.alice, f.token, 1000, &proof)
            .unwrap_err();
        assert_eq!(err, VaultError::DistributorPaused);

        f.distributor.unpause(&f.admin).unwrap();
        let mut ctx = Context::new(f.alice, &mut f.bank, 0);
        assert!(f.distributor.claim(&mut ctx, f.alice, f.token, 1000, &proof).is_ok());
    }

    #[test]
    fn test_update_root_requires_root_updater() {
        let mut f = fixture();
        let err = f.distributor.update_root(&f.alice, [1u8; 32]).unwrap_err();
        assert_eq!(err, VaultError::MissingRole(Role::RootUpdater));
    }

    #[test]
    fn test_emergency_withdraw() {
        let mut f = fixture();
        let receiver = Address::new_unique();
        let mut ctx = Context::new(f.admin, &mut f.bank, 0);
        f.distributor.withdraw(&mut ctx, f.token, receiver, 400).unwrap();
        assert_eq!(f.bank.balance_of(&f.token, &receiver), 400);

        let mut ctx = Context::new(f.alice, &mut f.bank, 0);
        assert_eq!(
            f.distributor
                .withdraw(&mut ctx, f.token, receiver, 1)
                .unwrap_err(),
            VaultError::MissingRole(Role::Admin)
        );
    }

    #[test]
    fn test_snapshot_restore() {
        let mut f = fixture();
        let proof = publish(&mut f, 1000);
        let mut ctx = Context::new(f.alice, &mut f.bank, 0);
        f.distributor.claim(&mut ctx, f.alice, f.token, 1000, &proof).unwrap();

        let json = serde_json::to_string(&f.distributor.snapshot()).unwrap();
        let restored = RewardDistributor::restore(serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(restored.root(), f.distributor.root());
        assert_eq!(restored.claimed(&f.alice, &f.token), 1000);
    }
}
