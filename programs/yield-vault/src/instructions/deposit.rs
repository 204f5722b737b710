use crate::{
    address::Address,
    context::Context,
    error::{Result, VaultError},
    events::Deposit as DepositEvent,
    math::{convert_to_assets, convert_to_shares, Rounding},
    require,
    state::{ActionKind, Vault},
    token::TokenBank,
};

/// Deposit assets and receive shares (floor rounding - favors vault)
pub fn handler(vault: &mut Vault, ctx: &mut Context, assets: u64, receiver: Address) -> Result<u64> {
    require!(!receiver.is_zero(), VaultError::ZeroAddress);
    require!(assets > 0, VaultError::ZeroAmount);
    require_deposits_open(vault)?;
    require!(
        assets >= vault.config.min_deposit_amount,
        VaultError::DepositTooSmall
    );

    let total_assets = vault.total_assets(ctx.bank)?;
    let total_shares = vault.total_shares(ctx.bank);

    let headroom = deposit_headroom(vault, ctx.bank, &receiver, total_assets, total_shares)?;
    require!(assets <= headroom, VaultError::DepositCeilingExceeded);

    // Calculate shares to mint (floor rounding - user gets less)
    let shares = convert_to_shares(
        assets,
        total_assets,
        total_shares,
        vault.config.decimals_offset(),
        Rounding::Floor,
    )?;
    require!(shares > 0, VaultError::ZeroShares);

    execute(vault, ctx, assets, shares, receiver)?;
    Ok(shares)
}

pub(crate) fn require_deposits_open(vault: &Vault) -> Result<()> {
    require!(vault.setup_completed, VaultError::SetupNotCompleted);
    require!(
        !vault.paused.is_paused(ActionKind::Deposit),
        VaultError::ActionPaused(ActionKind::Deposit)
    );
    Ok(())
}

/// Assets `receiver` may still deposit under the optional ceilings,
/// ignoring pause state. `u64::MAX` when no ceiling is configured.
pub(crate) fn deposit_headroom(
    vault: &Vault,
    bank: &TokenBank,
    receiver: &Address,
    total_assets: u64,
    total_shares: u64,
) -> Result<u64> {
    let mut headroom = u64::MAX;

    if let Some(cap) = vault.config.max_deposit_per_vault {
        headroom = headroom.min(cap.saturating_sub(total_assets));
    }

    if let Some(cap) = vault.config.max_deposit_per_user {
        let held = convert_to_assets(
            bank.balance_of(&vault.shares_mint, receiver),
            total_assets,
            total_shares,
            vault.config.decimals_offset(),
            Rounding::Floor,
        )?;
        headroom = headroom.min(cap.saturating_sub(held));
    }

    Ok(headroom)
}

/// Pull `assets` from the signer, hand them to the active provider and mint
/// `shares` to `receiver`, all or nothing.
pub(crate) fn execute(
    vault: &mut Vault,
    ctx: &mut Context,
    assets: u64,
    shares: u64,
    receiver: Address,
) -> Result<()> {
    let caller = ctx.signer;
    let vault_key = vault.address;
    let asset_mint = vault.asset_mint;
    let shares_mint = vault.shares_mint;
    let active_provider = vault.active_provider;

    ctx.bank.atomic(|bank| {
        bank.transfer(&asset_mint, &caller, &vault_key, assets)?;
        vault.push_to_provider(bank, &active_provider, assets)?;
        bank.mint_to(&shares_mint, &receiver, shares)
    })?;

    vault.events.emit(DepositEvent {
        vault: vault_key,
        caller,
        owner: receiver,
        assets,
        shares,
    });

    Ok(())
}
