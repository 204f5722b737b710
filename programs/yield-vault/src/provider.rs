//! Provider adapters: the capability a yield backend exposes to the vault.
//!
//! The vault never lets adapter code touch ledger state. Deposits hand the
//! adapter exactly `amount` of the asset before calling it; withdrawals are
//! checked afterwards against the vault's own balance.

use crate::address::Address;
use crate::constants::POSITION_SEED;
use crate::error::{Result, VaultError};
use crate::token::TokenBank;

pub trait Provider: Send + Sync {
    /// Stable human-readable name, e.g. `"Aave_V3_Arbitrum"`.
    fn identifier(&self) -> &str;

    /// Account the vault hands deposits to. Doubles as the provider's identity
    /// in the vault's provider list.
    fn address(&self) -> Address;

    /// Move `amount`, already transferred to [`Provider::address`], into the
    /// backend on behalf of `vault`.
    fn deposit(&mut self, amount: u64, vault: &Address, bank: &mut TokenBank) -> Result<()>;

    /// Return `amount` of `vault`'s position to the vault's own account.
    fn withdraw(&mut self, amount: u64, vault: &Address, bank: &mut TokenBank) -> Result<()>;

    /// Assets currently attributable to `user` at this backend.
    fn balance_of(&self, user: &Address, vault: &Address, bank: &TokenBank) -> Result<u64>;

    /// Annualized rate of return in ray (1e27 = 100%).
    fn rate_of_return(&self, vault: &Address) -> Result<u128>;
}

/// In-memory yield backend. Each vault's position sits in a custody account
/// derived from the provider and vault addresses.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    name: String,
    address: Address,
    asset: Address,
    rate: u128,
}

impl SimulatedProvider {
    pub fn new(name: impl Into<String>, asset: Address, rate: u128) -> Self {
        let name = name.into();
        let address = Address::derive(&[b"provider", name.as_bytes(), asset.as_ref()]);
        Self {
            name,
            address,
            asset,
            rate,
        }
    }

    pub fn position_account(&self, vault: &Address) -> Address {
        Address::derive(&[POSITION_SEED, self.address.as_ref(), vault.as_ref()])
    }

    pub fn set_rate(&mut self, rate: u128) {
        self.rate = rate;
    }

    /// Credit `amount` of interest to `vault`'s position.
    pub fn accrue(&self, bank: &mut TokenBank, vault: &Address, amount: u64) -> Result<()> {
        bank.mint_to(&self.asset, &self.position_account(vault), amount)
    }
}

impl Provider for SimulatedProvider {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn address(&self) -> Address {
        self.address
    }

    fn deposit(&mut self, amount: u64, vault: &Address, bank: &mut TokenBank) -> Result<()> {
        let position = self.position_account(vault);
        bank.transfer(&self.asset, &self.address, &position, amount)
            .map_err(|e| VaultError::ProviderFailure(format!("{}: deposit: {e}", self.name)))
    }

    fn withdraw(&mut self, amount: u64, vault: &Address, bank: &mut TokenBank) -> Result<()> {
        let position = self.position_account(vault);
        bank.transfer(&self.asset, &position, vault, amount)
            .map_err(|e| VaultError::ProviderFailure(format!("{}: withdraw: {e}", self.name)))
    }

    fn balance_of(&self, user: &Address, _vault: &Address, bank: &TokenBank) -> Result<u64> {
        Ok(bank.balance_of(&self.asset, &self.position_account(user)))
    }

    fn rate_of_return(&self, _vault: &Address) -> Result<u128> {
        Ok(self.rate)
    }
}
