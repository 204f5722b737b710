//! The set of components the backend serves: one token ledger, a vault
//! manager owning every vault, the timelock those vaults are governed by and
//! the reward distributor. Handlers reach it through a single async mutex, so
//! every mutation is applied by one writer at a time.

use serde::{Deserialize, Serialize};
use yield_vault::constants::{MIN_DELAY, RAY};
use yield_vault::timelock::{encode_payload, SET_DELAY, SET_OWNER};
use yield_vault::{
    Address, Context, GovernanceCall, Provider, RebalanceRequest, RewardDistributor, RewardTree,
    Role, RoleRegistry, SimulatedProvider, Timelock, TimelockCall, TokenBank,
    Vault, VaultConfig, VaultManager,
};

use crate::error::{BackendError, Result};
use crate::services::ProofGenerator;
use crate::types::{
    ClaimRequest, ClaimResponse, DistributionResponse, GovernanceCallBody, GovernanceRequest,
    GovernanceResponse, ProofResponse, RebalanceBody, RebalanceResponse, RootResponse,
    StateResponse, VaultDetail, VaultSummary,
};

/// One simulated yield backend for a vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,

    /// Annual rate of return in basis points
    #[serde(default)]
    pub rate_bps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSpec {
    pub vault_id: u64,
    pub asset: Address,
    #[serde(default)]
    pub config: VaultConfig,

    /// The first provider starts out active
    pub providers: Vec<ProviderSpec>,

    /// Bootstrap deposit made by the admin. The vault stays closed when zero.
    #[serde(default)]
    pub seed: u64,

    /// Accounts granted the Operator role besides the manager
    #[serde(default)]
    pub operators: Vec<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub mint: Address,
    pub owner: Address,
    pub amount: u64,
}

/// Deployment description, loaded from `DEPLOYMENT_FILE`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// Admin of the manager, the distributor and every vault
    pub admin: Address,
    pub executor: Address,
    pub timelock_owner: Address,
    #[serde(default = "default_delay")]
    pub timelock_delay: i64,
    pub root_updater: Address,
    pub vaults: Vec<VaultSpec>,

    /// Opening token balances
    #[serde(default)]
    pub balances: Vec<Allocation>,

    /// Reward tokens minted to the distributor, as `(token, amount)`
    #[serde(default)]
    pub reward_funding: Vec<(Address, u64)>,
}

fn default_delay() -> i64 {
    MIN_DELAY
}

impl DeploymentSpec {
    /// Self-contained deployment with deterministic addresses: one 6-decimal
    /// asset vault over two simulated providers, seeded with 1,000,000 units.
    pub fn demo() -> Self {
        let demo = |name: &str| Address::derive(&[b"demo", name.as_bytes()]);
        let asset = demo("asset");

        Self {
            admin: demo("admin"),
            executor: demo("executor"),
            timelock_owner: demo("timelock-owner"),
            timelock_delay: MIN_DELAY,
            root_updater: demo("root-updater"),
            vaults: vec![VaultSpec {
                vault_id: 1,
                asset,
                config: VaultConfig {
                    asset_decimals: 6,
                    treasury: demo("treasury"),
                    ..VaultConfig::default()
                },
                providers: vec![
                    ProviderSpec {
                        name: "Simulated_A".to_string(),
                        rate_bps: 500,
                    },
                    ProviderSpec {
                        name: "Simulated_B".to_string(),
                        rate_bps: 1_000,
                    },
                ],
                seed: 1_000_000,
                operators: Vec::new(),
            }],
            balances: vec![Allocation {
                mint: asset,
                owner: demo("depositor"),
                amount: 10_000_000,
            }],
            reward_funding: vec![(demo("reward-token"), 1_000_000_000)],
        }
    }
}

fn rate_from_bps(bps: u32) -> u128 {
    u128::from(bps) * RAY / 10_000
}

pub struct Deployment {
    pub bank: TokenBank,
    pub manager: VaultManager,
    pub timelock: Timelock,
    pub distributor: RewardDistributor,

    /// Tree behind the distributor's current root, when it was published
    /// through this backend
    pub tree: Option<RewardTree>,
}

impl Deployment {
    /// Build every component described by `spec`. Vaults are governed by the
    /// timelock and the manager is made an Operator on each of them.
    pub fn from_spec(spec: &DeploymentSpec, now: i64) -> Result<Self> {
        let admin = spec.admin;
        let mut bank = TokenBank::new();
        let timelock = Timelock::new(spec.timelock_owner, spec.timelock_delay)?;

        let mut manager = VaultManager::new(admin)?;
        manager.grant_role(&admin, Role::Executor, spec.executor)?;

        let mut distributor = RewardDistributor::new(admin)?;
        distributor.grant_role(&admin, Role::RootUpdater, spec.root_updater)?;

        for allocation in &spec.balances {
            bank.mint_to(&allocation.mint, &allocation.owner, allocation.amount)?;
        }
        for (token, amount) in &spec.reward_funding {
            bank.mint_to(token, &distributor.address(), *amount)?;
        }

        for vault_spec in &spec.vaults {
            let adapters: Vec<Box<dyn Provider>> = vault_spec
                .providers
                .iter()
                .map(|provider| {
                    Box::new(SimulatedProvider::new(
                        provider.name.clone(),
                        vault_spec.asset,
                        rate_from_bps(provider.rate_bps),
                    )) as Box<dyn Provider>
                })
                .collect();

            let mut roles = RoleRegistry::new(admin);
            roles.grant_role(&admin, Role::Operator, manager.address())?;
            for operator in &vault_spec.operators {
                roles.grant_role(&admin, Role::Operator, *operator)?;
            }

            let mut vault = Vault::initialize(
                vault_spec.vault_id,
                vault_spec.asset,
                vault_spec.config.clone(),
                roles,
                timelock.address(),
                adapters,
            )?;

            if vault_spec.seed > 0 {
                bank.mint_to(&vault_spec.asset, &admin, vault_spec.seed)?;
                let mut ctx = Context::new(admin, &mut bank, now);
                vault.setup_vault(&mut ctx, vault_spec.seed)?;
            }

            tracing::info!(
                vault_id = vault_spec.vault_id,
                vault = %vault.address(),
                providers = vault_spec.providers.len(),
                "Vault deployed"
            );
            manager.register_vault(&admin, vault)?;
        }

        Ok(Self {
            bank,
            manager,
            timelock,
            distributor,
            tree: None,
        })
    }

    // ============ Vaults ============

    fn summary(&self, vault: &Vault) -> Result<VaultSummary> {
        Ok(VaultSummary {
            vault_id: vault.vault_id(),
            address: vault.address().to_string(),
            asset_mint: vault.asset_mint().to_string(),
            shares_mint: vault.shares_mint().to_string(),
            total_assets: vault.total_assets(&self.bank)?,
            total_shares: vault.total_shares(&self.bank),
            active_provider: vault.active_provider().to_string(),
            paused: vault.paused(),
            setup_completed: vault.is_setup_completed(),
        })
    }

    pub fn summaries(&self) -> Result<Vec<VaultSummary>> {
        self.manager
            .vaults()
            .map(|vault| self.summary(vault))
            .collect()
    }

    pub fn detail(&self, vault_id: u64) -> Result<VaultDetail> {
        let vault = self.manager.vault(vault_id)?;
        Ok(VaultDetail {
            summary: self.summary(vault)?,
            governor: vault.governor().to_string(),
            config: vault.config().clone(),
            providers: vault.provider_views(&self.bank)?,
        })
    }

    /// Run a manager rebalance for `vault_id`
    pub fn rebalance(
        &mut self,
        vault_id: u64,
        body: &RebalanceBody,
        now: i64,
    ) -> Result<RebalanceResponse> {
        let signer = ProofGenerator::parse_address(&body.signer)?;
        let request = RebalanceRequest {
            assets: ProofGenerator::parse_rebalance_amount(&body.assets)?,
            from: ProofGenerator::parse_address(&body.from)?,
            to: ProofGenerator::parse_address(&body.to)?,
            fee: ProofGenerator::parse_amount("fee", &body.fee)?,
            activate_to: body.activate_to,
        };

        let mut ctx = Context::new(signer, &mut self.bank, now);
        let rebalanced = self.manager.rebalance_vault(&mut ctx, vault_id, request)?;

        let vault = self.manager.vault(vault_id)?;
        Ok(RebalanceResponse {
            vault_id,
            rebalanced,
            total_assets: vault.total_assets(&self.bank)?,
            providers: vault.provider_views(&self.bank)?,
        })
    }

    // ============ Rewards ============

    pub fn root(&self) -> RootResponse {
        RootResponse {
            root: self.distributor.root().map(|root| ProofGenerator::encode_root(&root)),
            paused: self.distributor.is_paused(),
            entries: self.tree.as_ref().map_or(0, |tree| tree.entries().len()),
        }
    }

    /// Publish `tree`'s root. The tree is kept for proof lookups only once
    /// the distributor accepted the root.
    pub fn publish(&mut self, signer: &Address, tree: RewardTree) -> Result<DistributionResponse> {
        let root = tree.root();
        self.distributor.update_root(signer, root)?;

        let response = DistributionResponse {
            root: ProofGenerator::encode_root(&root),
            entries: tree.entries().len(),
        };
        self.tree = Some(tree);
        Ok(response)
    }

    pub fn proof(&self, account: &str, token: &str) -> Result<ProofResponse> {
        let account = ProofGenerator::parse_address(account)?;
        let token = ProofGenerator::parse_address(token)?;
        let tree = self.tree.as_ref().ok_or_else(|| {
            BackendError::NotFound("No reward distribution has been published".to_string())
        })?;

        let (entry, proof) = ProofGenerator::proof_for(tree, &account, &token)?;
        Ok(ProofResponse {
            account: account.to_string(),
            token: token.to_string(),
            claimable: entry.claimable.to_string(),
            claimed: self.distributor.claimed(&account, &token).to_string(),
            proof,
        })
    }

    /// Claim for `request.account`. The backend submits the claim as the
    /// account itself.
    pub fn claim(&mut self, request: &ClaimRequest, now: i64) -> Result<ClaimResponse> {
        let account = ProofGenerator::parse_address(&request.account)?;
        let token = ProofGenerator::parse_address(&request.token)?;
        let claimable = ProofGenerator::parse_amount("claimable", &request.claimable)?;
        let proof = ProofGenerator::decode_proof(&request.proof)?;

        let mut ctx = Context::new(account, &mut self.bank, now);
        let amount = self
            .distributor
            .claim(&mut ctx, account, token, claimable, &proof)?;

        Ok(ClaimResponse {
            account: account.to_string(),
            token: token.to_string(),
            amount,
            total_claimed: self.distributor.claimed(&account, &token),
        })
    }

    // ============ Governance ============

    /// The timelock transaction a governance request describes
    pub fn governance_call(&self, request: &GovernanceRequest) -> Result<TimelockCall> {
        let vault_call = |call: GovernanceCall| -> Result<TimelockCall> {
            let vault_id = request.vault_id.ok_or_else(|| {
                BackendError::BadRequest("vault_id is required for vault calls".to_string())
            })?;
            let vault = self.manager.vault(vault_id)?;
            Ok(call.into_timelock_call(vault.address(), request.eta)?)
        };
        let self_call = |signature: &str, payload: Vec<u8>| -> Result<TimelockCall> {
            if request.vault_id.is_some() {
                return Err(BackendError::BadRequest(
                    "Timelock administration calls take no vault_id".to_string(),
                ));
            }
            Ok(self.timelock.self_call(signature, payload, request.eta))
        };

        match &request.call {
            GovernanceCallBody::SetProviders { providers } => {
                let providers = providers
                    .iter()
                    .map(|provider| ProofGenerator::parse_address(provider))
                    .collect::<Result<Vec<_>>>()?;
                vault_call(GovernanceCall::SetProviders(providers))
            }
            GovernanceCallBody::SetGovernor { governor } => {
                let governor = ProofGenerator::parse_address(governor)?;
                vault_call(GovernanceCall::SetGovernor(governor))
            }
            GovernanceCallBody::SetDelay { delay } => self_call(SET_DELAY, encode_payload(delay)?),
            GovernanceCallBody::SetOwner { owner } => {
                let owner = ProofGenerator::parse_address(owner)?;
                self_call(SET_OWNER, encode_payload(&owner)?)
            }
        }
    }

    pub fn queue(&mut self, request: &GovernanceRequest, now: i64) -> Result<GovernanceResponse> {
        let signer = ProofGenerator::parse_address(&request.signer)?;
        let call = self.governance_call(request)?;
        self.timelock.queue(&signer, call.clone(), now)?;
        Ok(governance_response(&call, "queued"))
    }

    pub fn execute(&mut self, request: &GovernanceRequest, now: i64) -> Result<GovernanceResponse> {
        let signer = ProofGenerator::parse_address(&request.signer)?;
        let call = self.governance_call(request)?;

        let Self {
            timelock,
            manager,
            bank,
            ..
        } = self;
        match request.vault_id {
            Some(vault_id) => {
                let mut target = manager.vault_mut(vault_id)?.governed(bank);
                timelock.execute(&signer, &call, now, Some(&mut target))?;
            }
            None => {
                timelock.execute(&signer, &call, now, None)?;
            }
        }

        Ok(governance_response(&call, "executed"))
    }

    pub fn cancel(&mut self, request: &GovernanceRequest) -> Result<GovernanceResponse> {
        let signer = ProofGenerator::parse_address(&request.signer)?;
        let call = self.governance_call(request)?;
        self.timelock.cancel(&signer, &call)?;
        Ok(governance_response(&call, "cancelled"))
    }

    // ============ State ============

    pub fn state(&self, now: i64) -> StateResponse {
        StateResponse {
            vaults: self.manager.vaults().map(Vault::snapshot).collect(),
            timelock: self.timelock.snapshot(),
            distributor: self.distributor.snapshot(),
            timestamp: now,
        }
    }
}

fn governance_response(call: &TimelockCall, status: &str) -> GovernanceResponse {
    GovernanceResponse {
        tx_hash: call.tx_hash().to_string(),
        target: call.target.to_string(),
        signature: call.signature.clone(),
        eta: call.eta,
        status: status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DistributionEntry;

    const NOW: i64 = 1_700_000_000;

    fn demo() -> (DeploymentSpec, Deployment) {
        let spec = DeploymentSpec::demo();
        let deployment = Deployment::from_spec(&spec, NOW).unwrap();
        (spec, deployment)
    }

    fn providers(deployment: &Deployment) -> Vec<Address> {
        deployment.manager.vault(1).unwrap().providers().to_vec()
    }

    #[test]
    fn test_demo_deployment_is_seeded_and_governed() {
        let (_, deployment) = demo();
        let summaries = deployment.summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_assets, 1_000_000);
        assert!(summaries[0].setup_completed);

        let detail = deployment.detail(1).unwrap();
        assert_eq!(detail.governor, deployment.timelock.address().to_string());
        assert_eq!(detail.providers.len(), 2);
        assert!(detail.providers[0].active);
    }

    #[test]
    fn test_rebalance_as_executor() {
        let (spec, mut deployment) = demo();
        let registered = providers(&deployment);
        let (a, b) = (registered[0], registered[1]);

        let body = RebalanceBody {
            signer: spec.executor.to_string(),
            assets: "400000".to_string(),
            from: a.to_string(),
            to: b.to_string(),
            fee: "0".to_string(),
            activate_to: false,
        };
        let response = deployment.rebalance(1, &body, NOW).unwrap();
        assert!(response.rebalanced);
        assert_eq!(response.total_assets, 1_000_000);
        assert_eq!(response.providers[1].balance, 400_000);

        let body = RebalanceBody {
            signer: spec.admin.to_string(),
            ..body
        };
        assert!(matches!(
            deployment.rebalance(1, &body, NOW).unwrap_err(),
            BackendError::Vault(yield_vault::VaultError::MissingRole(Role::Executor))
        ));
    }

    #[test]
    fn test_publish_and_claim() {
        let (spec, mut deployment) = demo();
        let token = spec.reward_funding[0].0;
        let alice = Address::new_unique();

        let tree = ProofGenerator::build_tree(&[DistributionEntry {
            account: alice.to_string(),
            token: token.to_string(),
            claimable: "1000".to_string(),
        }])
        .unwrap();

        // Only the root updater may publish; the tree is not kept on failure
        assert!(deployment.publish(&spec.admin, tree.clone()).is_err());
        assert!(deployment.tree.is_none());

        deployment.publish(&spec.root_updater, tree).unwrap();
        let proof = deployment
            .proof(&alice.to_string(), &token.to_string())
            .unwrap();
        assert_eq!(proof.claimed, "0");

        let request = ClaimRequest {
            account: proof.account,
            token: proof.token,
            claimable: proof.claimable,
            proof: proof.proof,
        };
        let response = deployment.claim(&request, NOW).unwrap();
        assert_eq!(response.amount, 1_000);
        assert_eq!(deployment.bank.balance_of(&token, &alice), 1_000);
        assert!(deployment.claim(&request, NOW).is_err());
    }

    #[test]
    fn test_governance_round_trip() {
        let (spec, mut deployment) = demo();
        let eta = NOW + MIN_DELAY;
        let providers = providers(&deployment);

        let request = GovernanceRequest {
            signer: spec.timelock_owner.to_string(),
            vault_id: Some(1),
            eta,
            call: GovernanceCallBody::SetProviders {
                providers: vec![providers[0].to_string()],
            },
        };

        let queued = deployment.queue(&request, NOW).unwrap();
        assert_eq!(queued.signature, GovernanceCall::SET_PROVIDERS);
        assert!(deployment.execute(&request, eta - 1).is_err());

        let executed = deployment.execute(&request, eta).unwrap();
        assert_eq!(executed.tx_hash, queued.tx_hash);
        assert_eq!(deployment.manager.vault(1).unwrap().providers().len(), 1);
    }

    #[test]
    fn test_timelock_self_call() {
        let (spec, mut deployment) = demo();
        let eta = NOW + MIN_DELAY;
        let request = GovernanceRequest {
            signer: spec.timelock_owner.to_string(),
            vault_id: None,
            eta,
            call: GovernanceCallBody::SetDelay {
                delay: 2 * MIN_DELAY,
            },
        };

        deployment.queue(&request, NOW).unwrap();
        deployment.execute(&request, eta).unwrap();
        assert_eq!(deployment.timelock.delay(), 2 * MIN_DELAY);

        let misdirected = GovernanceRequest {
            vault_id: Some(1),
            ..request
        };
        assert!(matches!(
            deployment.governance_call(&misdirected).unwrap_err(),
            BackendError::BadRequest(_)
        ));
    }

    #[test]
    fn test_state_lists_every_component() {
        let (spec, deployment) = demo();
        let state = deployment.state(NOW);
        assert_eq!(state.vaults.len(), 1);
        assert_eq!(state.timelock.owner, spec.timelock_owner);
        assert!(state.distributor.root.is_none());
    }

    #[test]
    fn test_spec_from_json_uses_defaults() {
        let demo = DeploymentSpec::demo();
        let json = serde_json::json!({
            "admin": demo.admin,
            "executor": demo.executor,
            "timelock_owner": demo.timelock_owner,
            "root_updater": demo.root_updater,
            "vaults": [{
                "vault_id": 7,
                "asset": demo.vaults[0].asset,
                "config": { "treasury": demo.admin },
                "providers": [{ "name": "Only" }]
            }]
        });

        let spec: DeploymentSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.timelock_delay, MIN_DELAY);
        let deployment = Deployment::from_spec(&spec, NOW).unwrap();
        let vault = deployment.manager.vault(7).unwrap();
        assert!(!vault.is_setup_completed());
    }
}
