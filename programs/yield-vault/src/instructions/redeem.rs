use crate::{
    address::Address,
    context::Context,
    error::{Result, VaultError},
    instructions::withdraw::{self, require_exit_open},
    math::{convert_to_assets, convert_to_shares, Rounding},
    require,
    state::Vault,
};

/// Redeem shares for assets (floor rounding - protects vault). Requests above
/// the owner's share balance are capped to it. When the active provider holds
/// less than the shares are worth, only its balance is paid out and the burn
/// shrinks to match.
pub fn handler(
    vault: &mut Vault,
    ctx: &mut Context,
    shares: u64,
    receiver: Address,
    owner: Address,
) -> Result<u64> {
    require_exit_open(vault, &receiver, &owner)?;
    require!(shares > 0, VaultError::ZeroAmount);

    let owner_shares = ctx.bank.balance_of(&vault.shares_mint, &owner);
    let shares = shares.min(owner_shares);
    require!(shares > 0, VaultError::InsufficientShares);

    let total_assets = vault.total_assets(ctx.bank)?;
    let total_shares = vault.total_shares(ctx.bank);

    // Calculate assets to receive (floor rounding - user gets less)
    let assets = convert_to_assets(
        shares,
        total_assets,
        total_shares,
        vault.config.decimals_offset(),
        Rounding::Floor,
    )?;
    require!(assets > 0, VaultError::ZeroAmount);

    let payable = vault.active_balance(ctx.bank)?;
    let (assets, shares) = if assets > payable {
        require!(payable > 0, VaultError::InsufficientProviderBalance);
        let burn = convert_to_shares(
            payable,
            total_assets,
            total_shares,
            vault.config.decimals_offset(),
            Rounding::Ceiling,
        )?;
        (payable, burn)
    } else {
        (assets, shares)
    };

    withdraw::execute(vault, ctx, assets, shares, receiver, owner)?;
    Ok(assets)
}
