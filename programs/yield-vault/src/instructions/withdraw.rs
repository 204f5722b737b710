use crate::{
    address::Address,
    context::Context,
    error::{Result, VaultError},
    events::{FeesCharged, Withdraw as WithdrawEvent},
    math::{convert_to_assets, convert_to_shares, fee_amount, Rounding},
    require,
    state::{ActionKind, Vault},
};

/// Withdraw assets by burning the shares they cost (ceiling rounding -
/// favors vault). Requests above what `owner` holds, or above what the active
/// provider can pay out, are capped rather than rejected.
pub fn handler(
    vault: &mut Vault,
    ctx: &mut Context,
    assets: u64,
    receiver: Address,
    owner: Address,
) -> Result<u64> {
    require_exit_open(vault, &receiver, &owner)?;
    require!(assets > 0, VaultError::ZeroAmount);

    let total_assets = vault.total_assets(ctx.bank)?;
    let total_shares = vault.total_shares(ctx.bank);
    let offset = vault.config.decimals_offset();

    let owner_shares = ctx.bank.balance_of(&vault.shares_mint, &owner);
    let max_assets = convert_to_assets(owner_shares, total_assets, total_shares, offset, Rounding::Floor)?;
    require!(max_assets > 0, VaultError::InsufficientShares);

    let assets = assets.min(max_assets).min(vault.active_balance(ctx.bank)?);
    require!(assets > 0, VaultError::InsufficientProviderBalance);

    // Shares to burn (ceiling rounding - user burns more)
    let shares = convert_to_shares(assets, total_assets, total_shares, offset, Rounding::Ceiling)?;

    execute(vault, ctx, assets, shares, receiver, owner)?;
    Ok(shares)
}

pub(crate) fn require_exit_open(vault: &Vault, receiver: &Address, owner: &Address) -> Result<()> {
    require!(
        !receiver.is_zero() && !owner.is_zero(),
        VaultError::ZeroAddress
    );
    require!(
        !vault.paused.is_paused(ActionKind::Withdraw),
        VaultError::ActionPaused(ActionKind::Withdraw)
    );
    Ok(())
}

/// Burn `shares` from `owner`, pull `assets` back from the active provider,
/// send the withdraw fee to the treasury and the rest to `receiver`.
/// Returns the fee.
pub(crate) fn execute(
    vault: &mut Vault,
    ctx: &mut Context,
    assets: u64,
    shares: u64,
    receiver: Address,
    owner: Address,
) -> Result<u64> {
    let caller = ctx.signer;
    let vault_key = vault.address;
    let asset_mint = vault.asset_mint;
    let shares_mint = vault.shares_mint;
    let active_provider = vault.active_provider;
    let treasury = vault.config.treasury;

    let fee = fee_amount(assets, vault.config.withdraw_fee_rate)?;
    let net = assets.checked_sub(fee).ok_or(VaultError::MathOverflow)?;

    ctx.bank.atomic(|bank| {
        if caller != owner {
            bank.spend_allowance(&shares_mint, &owner, &caller, shares)?;
        }
        bank.burn(&shares_mint, &owner, shares)
            .map_err(|_| VaultError::InsufficientShares)?;
        vault.pull_from_provider(bank, &active_provider, assets)?;
        bank.transfer(&asset_mint, &vault_key, &treasury, fee)?;
        bank.transfer(&asset_mint, &vault_key, &receiver, net)
    })?;

    vault.events.emit(WithdrawEvent {
        vault: vault_key,
        caller,
        receiver,
        owner,
        assets,
        shares,
    });
    if fee > 0 {
        vault.events.emit(FeesCharged {
            vault: vault_key,
            treasury,
            assets,
            fee,
        });
    }

    Ok(fee)
}
