use serde::{Deserialize, Serialize};

use crate::{
    access::Role,
    address::Address,
    constants::SENTINEL_MAX,
    context::Context,
    error::{Result, VaultError},
    events::{ActiveProviderChanged, FeesCharged, VaultRebalance},
    math::max_rebalance_fee,
    require,
    state::Vault,
};

/// Move funds between two registered providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceRequest {
    /// Amount to take out of `from`. `SENTINEL_MAX` means all of it.
    pub assets: u64,
    pub from: Address,
    pub to: Address,
    /// Skimmed to the treasury; at most 20% of the resolved `assets`.
    pub fee: u64,
    /// Promote `to` to active provider afterwards.
    pub activate_to: bool,
}

/// Withdraw from `from`, deposit the remainder into `to` and send the fee to
/// the treasury. Share supply is untouched; total assets drop by exactly
/// `fee`. Returns the resolved asset amount moved out of `from`.
pub fn handler(vault: &mut Vault, ctx: &mut Context, request: RebalanceRequest) -> Result<u64> {
    vault.require_role(Role::Operator, &ctx.signer)?;

    let RebalanceRequest {
        assets,
        from,
        to,
        fee,
        activate_to,
    } = request;

    vault.require_registered(&from)?;
    vault.require_registered(&to)?;
    require!(from != to, VaultError::SameProvider);

    let available = vault.provider_balance(&from, ctx.bank)?;
    let assets = if assets == SENTINEL_MAX { available } else { assets };
    require!(assets > 0, VaultError::ZeroAmount);
    require!(assets <= available, VaultError::InsufficientProviderBalance);
    require!(
        fee <= max_rebalance_fee(assets)?,
        VaultError::RebalanceFeeTooHigh
    );

    let deposited = assets.checked_sub(fee).ok_or(VaultError::MathOverflow)?;
    let vault_key = vault.address;
    let asset_mint = vault.asset_mint;
    let treasury = vault.config.treasury;

    ctx.bank.atomic(|bank| {
        vault.pull_from_provider(bank, &from, assets)?;
        vault.push_to_provider(bank, &to, deposited)?;
        bank.transfer(&asset_mint, &vault_key, &treasury, fee)
    })?;

    if activate_to {
        vault.active_provider = to;
        vault.events.emit(ActiveProviderChanged {
            vault: vault_key,
            provider: to,
        });
    }

    vault.events.emit(VaultRebalance {
        vault: vault_key,
        assets_from: assets,
        assets_to: deposited,
        from,
        to,
        fee,
    });
    if fee > 0 {
        vault.events.emit(FeesCharged {
            vault: vault_key,
            treasury,
            assets,
            fee,
        });
    }

    tracing::info!(
        vault = %vault_key,
        from = %from,
        to = %to,
        assets,
        fee,
        "Rebalance executed"
    );

    Ok(assets)
}
