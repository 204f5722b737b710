#![allow(dead_code)]

use yield_vault::constants::RAY;
use yield_vault::{
    Address, Context, Provider, RebalanceRequest, Result, Role, RoleRegistry, SimulatedProvider,
    TokenBank, Vault, VaultConfig,
};

pub const NOW: i64 = 1_700_000_000;

/// 1% withdraw fee.
pub const WITHDRAW_FEE_RATE: u64 = 10_000_000_000_000_000;

pub struct Harness {
    pub bank: TokenBank,
    pub vault: Vault,
    pub asset: Address,
    pub admin: Address,
    pub operator: Address,
    pub governor: Address,
    pub treasury: Address,
    pub alice: Address,
    pub bob: Address,
    pub provider_a: SimulatedProvider,
    pub provider_b: SimulatedProvider,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(tweak: impl FnOnce(&mut VaultConfig)) -> Self {
        let asset = Address::new_unique();
        let provider_a = SimulatedProvider::new("Simulated_A", asset, RAY / 20);
        let provider_b = SimulatedProvider::new("Simulated_B", asset, RAY / 10);
        let adapters: Vec<Box<dyn Provider>> = vec![
            Box::new(provider_a.clone()),
            Box::new(provider_b.clone()),
        ];
        Self::with_adapters(asset, provider_a, provider_b, adapters, tweak)
    }

    pub fn with_adapters(
        asset: Address,
        provider_a: SimulatedProvider,
        provider_b: SimulatedProvider,
        adapters: Vec<Box<dyn Provider>>,
        tweak: impl FnOnce(&mut VaultConfig),
    ) -> Self {
        let admin = Address::new_unique();
        let operator = Address::new_unique();
        let governor = Address::new_unique();
        let treasury = Address::new_unique();
        let alice = Address::new_unique();
        let bob = Address::new_unique();

        let mut config = VaultConfig {
            asset_decimals: 6,
            min_deposit_amount: 1_000,
            withdraw_fee_rate: WITHDRAW_FEE_RATE,
            treasury,
            ..VaultConfig::default()
        };
        tweak(&mut config);

        let mut roles = RoleRegistry::new(admin);
        roles.grant_role(&admin, Role::Operator, operator).unwrap();

        let vault = Vault::initialize(1, asset, config, roles, governor, adapters).unwrap();

        let mut bank = TokenBank::new();
        for account in [admin, alice, bob] {
            bank.mint_to(&asset, &account, 10_000_000).unwrap();
        }

        Self {
            bank,
            vault,
            asset,
            admin,
            operator,
            governor,
            treasury,
            alice,
            bob,
            provider_a,
            provider_b,
        }
    }

    /// Harness with the 1,000,000-unit seed deposit already absorbed.
    pub fn seeded() -> Self {
        let mut h = Self::new();
        h.setup(1_000_000);
        h
    }

    pub fn setup(&mut self, assets: u64) -> u64 {
        let admin = self.admin;
        let mut ctx = Context::new(admin, &mut self.bank, NOW);
        self.vault.setup_vault(&mut ctx, assets).unwrap()
    }

    pub fn deposit(&mut self, who: Address, assets: u64) -> u64 {
        let mut ctx = Context::new(who, &mut self.bank, NOW);
        self.vault.deposit(&mut ctx, assets, who).unwrap()
    }

    /// Operator moves `assets` between providers without a fee.
    pub fn move_funds(
        &mut self,
        from: &SimulatedProvider,
        to: &SimulatedProvider,
        assets: u64,
        activate_to: bool,
    ) -> Result<u64> {
        let request = RebalanceRequest {
            assets,
            from: from.address(),
            to: to.address(),
            fee: 0,
            activate_to,
        };
        let mut ctx = Context::new(self.operator, &mut self.bank, NOW);
        self.vault.rebalance(&mut ctx, request)
    }

    pub fn total_assets(&self) -> u64 {
        self.vault.total_assets(&self.bank).unwrap()
    }

    pub fn shares_of(&self, who: &Address) -> u64 {
        self.bank.balance_of(&self.vault.shares_mint(), who)
    }

    pub fn assets_of(&self, who: &Address) -> u64 {
        self.bank.balance_of(&self.asset, who)
    }

    pub fn balance_at(&self, provider: &SimulatedProvider) -> u64 {
        self.vault
            .provider_balance(&provider.address(), &self.bank)
            .unwrap()
    }
}
