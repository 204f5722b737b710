use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::access::{Role, RoleRegistry};
use crate::address::Address;
use crate::constants::{DEFAULT_MIN_DEPOSIT_AMOUNT, MAX_DECIMALS, MAX_WITHDRAW_FEE_RATE};
use crate::error::{Result, VaultError};
use crate::events::EventLog;
use crate::provider::Provider;
use crate::require;
use crate::token::TokenBank;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Deposit,
    Withdraw,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseFlags {
    pub deposit: bool,
    pub withdraw: bool,
}

impl PauseFlags {
    pub fn is_paused(&self, action: ActionKind) -> bool {
        match action {
            ActionKind::Deposit => self.deposit,
            ActionKind::Withdraw => self.withdraw,
        }
    }

    pub fn set(&mut self, action: ActionKind, paused: bool) {
        match action {
            ActionKind::Deposit => self.deposit = paused,
            ActionKind::Withdraw => self.withdraw = paused,
        }
    }
}

/// Vault parameters. The deposit ceilings are optional; leaving them unset
/// gives the bootstrap-only behaviour, setting them adds per-user and
/// per-vault caps on top.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Decimals of the underlying asset. Shares carry `MAX_DECIMALS`.
    pub asset_decimals: u8,
    pub min_deposit_amount: u64,
    /// WAD-scaled, at most 5%.
    pub withdraw_fee_rate: u64,
    pub treasury: Address,
    pub max_deposit_per_user: Option<u64>,
    pub max_deposit_per_vault: Option<u64>,
    /// Where swept incentive tokens go. Forwarding is disabled when unset.
    pub rewards_recipient: Option<Address>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            asset_decimals: 6,
            min_deposit_amount: DEFAULT_MIN_DEPOSIT_AMOUNT,
            withdraw_fee_rate: 0,
            treasury: Address::ZERO,
            max_deposit_per_user: None,
            max_deposit_per_vault: None,
            rewards_recipient: None,
        }
    }
}

impl VaultConfig {
    pub fn validate(&self) -> Result<()> {
        require!(
            self.asset_decimals <= MAX_DECIMALS,
            VaultError::InvalidAssetDecimals
        );
        require!(
            self.withdraw_fee_rate <= MAX_WITHDRAW_FEE_RATE,
            VaultError::FeeRateTooHigh
        );
        require!(!self.treasury.is_zero(), VaultError::ZeroAddress);
        if let Some(recipient) = self.rewards_recipient {
            require!(!recipient.is_zero(), VaultError::ZeroAddress);
        }
        Ok(())
    }

    /// Virtual offset exponent for inflation attack protection.
    pub fn decimals_offset(&self) -> u8 {
        MAX_DECIMALS.saturating_sub(self.asset_decimals)
    }
}

/// The pooled-asset ledger. Share balances live in the token bank under
/// `shares_mint`; everything else that is durable is listed in
/// [`VaultSnapshot`].
pub struct Vault {
    pub(crate) address: Address,
    pub(crate) vault_id: u64,
    pub(crate) asset_mint: Address,
    pub(crate) shares_mint: Address,
    pub(crate) config: VaultConfig,
    pub(crate) governor: Address,
    pub(crate) roles: RoleRegistry,
    pub(crate) providers: Vec<Address>,
    pub(crate) active_provider: Address,
    pub(crate) adapters: BTreeMap<Address, Box<dyn Provider>>,
    pub(crate) paused: PauseFlags,
    pub(crate) setup_completed: bool,
    pub(crate) events: EventLog,
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("address", &self.address)
            .field("vault_id", &self.vault_id)
            .field("asset_mint", &self.asset_mint)
            .field("providers", &self.providers)
            .field("active_provider", &self.active_provider)
            .field("paused", &self.paused)
            .field("setup_completed", &self.setup_completed)
            .finish_non_exhaustive()
    }
}

impl Vault {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn vault_id(&self) -> u64 {
        self.vault_id
    }

    pub fn asset_mint(&self) -> Address {
        self.asset_mint
    }

    pub fn shares_mint(&self) -> Address {
        self.shares_mint
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn governor(&self) -> Address {
        self.governor
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn providers(&self) -> &[Address] {
        &self.providers
    }

    pub fn active_provider(&self) -> Address {
        self.active_provider
    }

    pub fn paused(&self) -> PauseFlags {
        self.paused
    }

    pub fn is_setup_completed(&self) -> bool {
        self.setup_completed
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn adapter(&self, provider: &Address) -> Result<&dyn Provider> {
        self.adapters
            .get(provider)
            .map(|adapter| adapter.as_ref())
            .ok_or(VaultError::AdapterNotInstalled)
    }

    pub fn is_registered(&self, provider: &Address) -> bool {
        self.providers.contains(provider)
    }

    pub(crate) fn require_registered(&self, provider: &Address) -> Result<()> {
        require!(self.is_registered(provider), VaultError::ProviderNotRegistered);
        Ok(())
    }

    pub(crate) fn require_role(&self, role: Role, account: &Address) -> Result<()> {
        self.roles.require_role(role, account)
    }

    pub(crate) fn require_governor(&self, account: &Address) -> Result<()> {
        require!(*account == self.governor, VaultError::NotGovernor);
        Ok(())
    }

    pub fn total_shares(&self, bank: &TokenBank) -> u64 {
        bank.supply(&self.shares_mint)
    }

    /// Σ balance held for this vault across the registered providers.
    pub fn total_assets(&self, bank: &TokenBank) -> Result<u64> {
        self.providers.iter().try_fold(0u64, |total, provider| {
            let balance = self.provider_balance(provider, bank)?;
            total.checked_add(balance).ok_or(VaultError::MathOverflow)
        })
    }

    /// What the active provider holds, and so the most a single withdrawal
    /// can pay out.
    pub fn active_balance(&self, bank: &TokenBank) -> Result<u64> {
        self.provider_balance(&self.active_provider, bank)
    }

    pub fn provider_balance(&self, provider: &Address, bank: &TokenBank) -> Result<u64> {
        self.adapter(provider)?
            .balance_of(&self.address, &self.address, bank)
    }

    /// Hand `amount` of the vault's idle asset to `provider` and have it
    /// deposit. The vault's own balance must drop by exactly `amount`.
    pub(crate) fn push_to_provider(
        &mut self,
        bank: &mut TokenBank,
        provider: &Address,
        amount: u64,
    ) -> Result<()> {
        let vault = self.address;
        let asset = self.asset_mint;
        let adapter = self
            .adapters
            .get_mut(provider)
            .ok_or(VaultError::AdapterNotInstalled)?;

        let before = bank.balance_of(&asset, &vault);
        bank.transfer(&asset, &vault, &adapter.address(), amount)?;
        adapter.deposit(amount, &vault, bank)?;

        let expected = before.checked_sub(amount).ok_or(VaultError::MathOverflow)?;
        let actual = bank.balance_of(&asset, &vault);
        require!(
            actual == expected,
            VaultError::ProviderBalanceMismatch { expected, actual }
        );
        Ok(())
    }

    /// Have `provider` return `amount` to the vault. The vault's own balance
    /// must grow by exactly `amount`.
    pub(crate) fn pull_from_provider(
        &mut self,
        bank: &mut TokenBank,
        provider: &Address,
        amount: u64,
    ) -> Result<()> {
        let vault = self.address;
        let asset = self.asset_mint;
        let adapter = self
            .adapters
            .get_mut(provider)
            .ok_or(VaultError::AdapterNotInstalled)?;

        let available = adapter.balance_of(&vault, &vault, bank)?;
        require!(available >= amount, VaultError::InsufficientProviderBalance);

        let before = bank.balance_of(&asset, &vault);
        adapter.withdraw(amount, &vault, bank)?;

        let expected = before.checked_add(amount).ok_or(VaultError::MathOverflow)?;
        let actual = bank.balance_of(&asset, &vault);
        require!(
            actual == expected,
            VaultError::ProviderBalanceMismatch { expected, actual }
        );
        Ok(())
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            vault_id: self.vault_id,
            asset_mint: self.asset_mint,
            config: self.config.clone(),
            governor: self.governor,
            roles: self.roles.clone(),
            providers: self.providers.clone(),
            active_provider: self.active_provider,
            paused: self.paused,
            setup_completed: self.setup_completed,
        }
    }

    /// Rebuild a vault from its persisted layout. Every listed provider must
    /// be among `adapters`.
    pub fn restore(snapshot: VaultSnapshot, adapters: Vec<Box<dyn Provider>>) -> Result<Self> {
        snapshot.config.validate()?;
        let mut vault = Self::from_parts(
            snapshot.vault_id,
            snapshot.asset_mint,
            snapshot.config,
            snapshot.roles,
            snapshot.governor,
            adapters,
        );
        for provider in &snapshot.providers {
            require!(
                vault.adapters.contains_key(provider),
                VaultError::AdapterNotInstalled
            );
        }
        require!(
            snapshot.providers.contains(&snapshot.active_provider),
            VaultError::ActiveProviderRemoved
        );
        vault.providers = snapshot.providers;
        vault.active_provider = snapshot.active_provider;
        vault.paused = snapshot.paused;
        vault.setup_completed = snapshot.setup_completed;
        Ok(vault)
    }

    pub(crate) fn from_parts(
        vault_id: u64,
        asset_mint: Address,
        config: VaultConfig,
        roles: RoleRegistry,
        governor: Address,
        adapters: Vec<Box<dyn Provider>>,
    ) -> Self {
        let address = Address::derive(&[
            crate::constants::VAULT_SEED,
            asset_mint.as_ref(),
            &vault_id.to_le_bytes(),
        ]);
        let shares_mint = Address::derive(&[crate::constants::SHARES_MINT_SEED, address.as_ref()]);
        let providers: Vec<Address> = adapters.iter().map(|adapter| adapter.address()).collect();
        let active_provider = providers.first().copied().unwrap_or(Address::ZERO);
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.address(), adapter))
            .collect();

        Self {
            address,
            vault_id,
            asset_mint,
            shares_mint,
            config,
            governor,
            roles,
            providers,
            active_provider,
            adapters,
            // Deposits open only once the bootstrap deposit is absorbed.
            paused: PauseFlags {
                deposit: true,
                withdraw: false,
            },
            setup_completed: false,
            events: EventLog::default(),
        }
    }
}

/// Durable vault state: configuration, provider list, pause flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub vault_id: u64,
    pub asset_mint: Address,
    pub config: VaultConfig,
    pub governor: Address,
    pub roles: RoleRegistry,
    pub providers: Vec<Address>,
    pub active_provider: Address,
    pub paused: PauseFlags,
    pub setup_completed: bool,
}
