//! Pooled-custody yield vault.
//!
//! One [`Vault`] per deployed asset pool: depositors receive shares, the pool
//! is parked at one of several yield [`Provider`]s and moved between them by
//! operators. A [`Timelock`] gates provider-set and governor changes, and a
//! [`RewardDistributor`] pays out cumulative Merkle-certified rewards.

pub mod access;
pub mod address;
pub mod constants;
pub mod context;
pub mod error;
pub mod events;
pub mod instructions;
pub mod manager;
pub mod math;
pub mod provider;
pub mod rewards;
pub mod state;
pub mod timelock;
pub mod token;

pub use access::{Role, RoleRegistry};
pub use address::Address;
pub use context::Context;
pub use error::{ErrorKind, Result, VaultError};
pub use events::{Event, EventLog};
pub use instructions::view::ProviderView;
pub use instructions::{GovernanceCall, GovernedVault, RebalanceRequest};
pub use manager::VaultManager;
pub use provider::{Provider, SimulatedProvider};
pub use rewards::{RewardDistributor, RewardEntry, RewardTree};
pub use state::{ActionKind, PauseFlags, Vault, VaultConfig, VaultSnapshot};
pub use timelock::{Timelock, TimelockCall, TimelockSnapshot, TimelockTarget, TxHash};
pub use token::TokenBank;

impl Vault {
    /// Create a vault for `asset_mint`. The first adapter becomes the active
    /// provider; deposits stay paused until [`Vault::setup_vault`].
    pub fn initialize(
        vault_id: u64,
        asset_mint: Address,
        config: VaultConfig,
        roles: RoleRegistry,
        governor: Address,
        adapters: Vec<Box<dyn Provider>>,
    ) -> Result<Self> {
        instructions::initialize::handler(vault_id, asset_mint, config, roles, governor, adapters)
    }

    /// One-time bootstrap deposit by an Admin. Opens deposits.
    pub fn setup_vault(&mut self, ctx: &mut Context, assets: u64) -> Result<u64> {
        instructions::setup::handler(self, ctx, assets)
    }

    /// Deposit assets and receive shares
    /// Returns shares minted (floor rounding - favors vault)
    pub fn deposit(&mut self, ctx: &mut Context, assets: u64, receiver: Address) -> Result<u64> {
        instructions::deposit::handler(self, ctx, assets, receiver)
    }

    /// Mint exact shares by depositing required assets
    /// Returns assets paid (ceiling rounding - favors vault)
    pub fn mint(&mut self, ctx: &mut Context, shares: u64, receiver: Address) -> Result<u64> {
        instructions::mint::handler(self, ctx, shares, receiver)
    }

    /// Withdraw assets by burning required shares
    /// Returns shares burned (ceiling rounding - favors vault)
    pub fn withdraw(
        &mut self,
        ctx: &mut Context,
        assets: u64,
        receiver: Address,
        owner: Address,
    ) -> Result<u64> {
        instructions::withdraw::handler(self, ctx, assets, receiver, owner)
    }

    /// Redeem shares for assets
    /// Returns assets withdrawn before fees (floor rounding - favors vault)
    pub fn redeem(
        &mut self,
        ctx: &mut Context,
        shares: u64,
        receiver: Address,
        owner: Address,
    ) -> Result<u64> {
        instructions::redeem::handler(self, ctx, shares, receiver, owner)
    }

    /// Let `spender` withdraw or redeem against the signer's shares.
    pub fn approve(&mut self, ctx: &mut Context, spender: Address, shares: u64) -> Result<()> {
        require!(!spender.is_zero(), VaultError::ZeroAddress);
        ctx.bank
            .approve(&self.shares_mint, &ctx.signer, &spender, shares)
    }

    /// Move funds between registered providers (Operator)
    pub fn rebalance(&mut self, ctx: &mut Context, request: RebalanceRequest) -> Result<u64> {
        instructions::rebalance::handler(self, ctx, request)
    }

    /// Sweep an incentive token to the rewards recipient (Operator or Admin)
    pub fn forward_rewards(&mut self, ctx: &mut Context, token: Address) -> Result<u64> {
        instructions::rewards::forward_rewards(self, ctx, token)
    }

    // ============ Admin ============

    pub fn pause(&mut self, signer: &Address, action: ActionKind) -> Result<()> {
        instructions::admin::pause(self, signer, action)
    }

    pub fn unpause(&mut self, signer: &Address, action: ActionKind) -> Result<()> {
        instructions::admin::unpause(self, signer, action)
    }

    pub fn set_treasury(&mut self, signer: &Address, treasury: Address) -> Result<()> {
        instructions::admin::set_treasury(self, signer, treasury)
    }

    pub fn set_withdraw_fee_rate(&mut self, signer: &Address, rate: u64) -> Result<()> {
        instructions::admin::set_withdraw_fee_rate(self, signer, rate)
    }

    pub fn set_min_deposit_amount(&mut self, signer: &Address, amount: u64) -> Result<()> {
        instructions::admin::set_min_deposit_amount(self, signer, amount)
    }

    pub fn set_deposit_ceilings(
        &mut self,
        signer: &Address,
        per_user: Option<u64>,
        per_vault: Option<u64>,
    ) -> Result<()> {
        instructions::admin::set_deposit_ceilings(self, signer, per_user, per_vault)
    }

    pub fn set_rewards_recipient(&mut self, signer: &Address, recipient: Option<Address>) -> Result<()> {
        instructions::admin::set_rewards_recipient(self, signer, recipient)
    }

    pub fn set_active_provider(&mut self, signer: &Address, provider: Address) -> Result<()> {
        instructions::admin::set_active_provider(self, signer, provider)
    }

    pub fn install_adapter(&mut self, signer: &Address, adapter: Box<dyn Provider>) -> Result<()> {
        instructions::admin::install_adapter(self, signer, adapter)
    }

    pub fn grant_role(&mut self, signer: &Address, role: Role, account: Address) -> Result<()> {
        instructions::admin::grant_role(self, signer, role, account)
    }

    pub fn revoke_role(&mut self, signer: &Address, role: Role, account: Address) -> Result<()> {
        instructions::admin::revoke_role(self, signer, role, account)
    }

    // ============ Governor ============

    /// Replace the registered provider list (governor only)
    pub fn set_providers(
        &mut self,
        bank: &TokenBank,
        signer: &Address,
        providers: Vec<Address>,
    ) -> Result<()> {
        instructions::admin::set_providers(self, bank, signer, providers)
    }

    pub fn set_governor(&mut self, signer: &Address, governor: Address) -> Result<()> {
        instructions::admin::set_governor(self, signer, governor)
    }

    /// Timelock target for this vault's governor calls
    pub fn governed<'a>(&'a mut self, bank: &'a TokenBank) -> GovernedVault<'a> {
        GovernedVault::new(self, bank)
    }

    // ============ View Functions ============

    /// Preview shares for deposit (floor rounding)
    pub fn preview_deposit(&self, bank: &TokenBank, assets: u64) -> Result<u64> {
        instructions::view::preview_deposit(self, bank, assets)
    }

    /// Preview assets required for mint (ceiling rounding)
    pub fn preview_mint(&self, bank: &TokenBank, shares: u64) -> Result<u64> {
        instructions::view::preview_mint(self, bank, shares)
    }

    /// Preview shares to burn for withdraw (ceiling rounding)
    pub fn preview_withdraw(&self, bank: &TokenBank, assets: u64) -> Result<u64> {
        instructions::view::preview_withdraw(self, bank, assets)
    }

    /// Preview assets for redeem (floor rounding)
    pub fn preview_redeem(&self, bank: &TokenBank, shares: u64) -> Result<u64> {
        instructions::view::preview_redeem(self, bank, shares)
    }

    /// Convert assets to shares (floor rounding)
    pub fn convert_to_shares(&self, bank: &TokenBank, assets: u64) -> Result<u64> {
        instructions::view::convert_to_shares_view(self, bank, assets)
    }

    /// Convert shares to assets (floor rounding)
    pub fn convert_to_assets(&self, bank: &TokenBank, shares: u64) -> Result<u64> {
        instructions::view::convert_to_assets_view(self, bank, shares)
    }

    /// Max assets depositable (0 before setup or while deposits are paused)
    pub fn max_deposit(&self, bank: &TokenBank, receiver: &Address) -> Result<u64> {
        instructions::view::max_deposit(self, bank, receiver)
    }

    /// Max shares mintable (0 before setup or while deposits are paused)
    pub fn max_mint(&self, bank: &TokenBank, receiver: &Address) -> Result<u64> {
        instructions::view::max_mint(self, bank, receiver)
    }

    /// Max assets owner can withdraw
    pub fn max_withdraw(&self, bank: &TokenBank, owner: &Address) -> Result<u64> {
        instructions::view::max_withdraw(self, bank, owner)
    }

    /// Max shares owner can redeem
    pub fn max_redeem(&self, bank: &TokenBank, owner: &Address) -> Result<u64> {
        instructions::view::max_redeem(self, bank, owner)
    }

    /// Balance held for this vault at each registered provider
    pub fn provider_balances(&self, bank: &TokenBank) -> Result<Vec<(Address, u64)>> {
        Ok(instructions::view::providers(self, bank)?
            .into_iter()
            .map(|view| (view.provider, view.balance))
            .collect())
    }

    /// Ray-scaled rate of return at each registered provider
    pub fn provider_rates(&self, bank: &TokenBank) -> Result<Vec<(Address, u128)>> {
        Ok(instructions::view::providers(self, bank)?
            .into_iter()
            .map(|view| (view.provider, view.rate))
            .collect())
    }

    pub fn provider_views(&self, bank: &TokenBank) -> Result<Vec<ProviderView>> {
        instructions::view::providers(self, bank)
    }
}
