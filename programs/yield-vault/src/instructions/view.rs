use serde::{Deserialize, Serialize};

use crate::{
    address::Address,
    error::Result,
    instructions::deposit::deposit_headroom,
    math::{convert_to_assets, convert_to_shares, Rounding},
    state::{ActionKind, Vault},
    token::TokenBank,
};

/// Per-provider view used by operators deciding where funds should sit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderView {
    pub provider: Address,
    pub identifier: String,
    pub balance: u64,
    /// Annualized, ray-scaled.
    pub rate: u128,
    pub active: bool,
}

fn to_shares(vault: &Vault, bank: &TokenBank, assets: u64, rounding: Rounding) -> Result<u64> {
    convert_to_shares(
        assets,
        vault.total_assets(bank)?,
        vault.total_shares(bank),
        vault.config.decimals_offset(),
        rounding,
    )
}

fn to_assets(vault: &Vault, bank: &TokenBank, shares: u64, rounding: Rounding) -> Result<u64> {
    convert_to_assets(
        shares,
        vault.total_assets(bank)?,
        vault.total_shares(bank),
        vault.config.decimals_offset(),
        rounding,
    )
}

/// Preview how many shares would be minted for given assets (floor rounding)
pub fn preview_deposit(vault: &Vault, bank: &TokenBank, assets: u64) -> Result<u64> {
    to_shares(vault, bank, assets, Rounding::Floor)
}

/// Preview how many assets are required to mint exact shares (ceiling rounding)
pub fn preview_mint(vault: &Vault, bank: &TokenBank, shares: u64) -> Result<u64> {
    to_assets(vault, bank, shares, Rounding::Ceiling)
}

/// Preview how many shares must be burned to withdraw exact assets (ceiling rounding)
pub fn preview_withdraw(vault: &Vault, bank: &TokenBank, assets: u64) -> Result<u64> {
    to_shares(vault, bank, assets, Rounding::Ceiling)
}

/// Preview how many assets would be received for redeeming shares (floor rounding)
pub fn preview_redeem(vault: &Vault, bank: &TokenBank, shares: u64) -> Result<u64> {
    to_assets(vault, bank, shares, Rounding::Floor)
}

pub fn convert_to_shares_view(vault: &Vault, bank: &TokenBank, assets: u64) -> Result<u64> {
    to_shares(vault, bank, assets, Rounding::Floor)
}

pub fn convert_to_assets_view(vault: &Vault, bank: &TokenBank, shares: u64) -> Result<u64> {
    to_assets(vault, bank, shares, Rounding::Floor)
}

/// Maximum assets `receiver` can deposit (0 before setup or while paused)
pub fn max_deposit(vault: &Vault, bank: &TokenBank, receiver: &Address) -> Result<u64> {
    if !vault.setup_completed || vault.paused.is_paused(ActionKind::Deposit) {
        return Ok(0);
    }
    deposit_headroom(
        vault,
        bank,
        receiver,
        vault.total_assets(bank)?,
        vault.total_shares(bank),
    )
}

/// Maximum shares `receiver` can mint (0 before setup or while paused)
pub fn max_mint(vault: &Vault, bank: &TokenBank, receiver: &Address) -> Result<u64> {
    let max_assets = max_deposit(vault, bank, receiver)?;
    if max_assets == u64::MAX {
        return Ok(u64::MAX);
    }
    to_shares(vault, bank, max_assets, Rounding::Floor)
}

/// Maximum assets `owner` can withdraw: their shares' worth, bounded by what
/// the active provider holds
pub fn max_withdraw(vault: &Vault, bank: &TokenBank, owner: &Address) -> Result<u64> {
    if vault.paused.is_paused(ActionKind::Withdraw) {
        return Ok(0);
    }
    let owner_shares = bank.balance_of(&vault.shares_mint, owner);
    let owned = to_assets(vault, bank, owner_shares, Rounding::Floor)?;
    Ok(owned.min(vault.active_balance(bank)?))
}

/// Maximum shares `owner` can redeem: their balance, bounded by the shares
/// the active provider's holdings buy back
pub fn max_redeem(vault: &Vault, bank: &TokenBank, owner: &Address) -> Result<u64> {
    if vault.paused.is_paused(ActionKind::Withdraw) {
        return Ok(0);
    }
    let owner_shares = bank.balance_of(&vault.shares_mint, owner);
    let payable = to_shares(vault, bank, vault.active_balance(bank)?, Rounding::Floor)?;
    Ok(owner_shares.min(payable))
}

/// Balance and rate of every registered provider, in list order.
pub fn providers(vault: &Vault, bank: &TokenBank) -> Result<Vec<ProviderView>> {
    vault
        .providers
        .iter()
        .map(|provider| {
            let adapter = vault.adapter(provider)?;
            Ok(ProviderView {
                provider: *provider,
                identifier: adapter.identifier().to_string(),
                balance: adapter.balance_of(&vault.address, &vault.address, bank)?,
                rate: adapter.rate_of_return(&vault.address)?,
                active: *provider == vault.active_provider,
            })
        })
        .collect()
}
