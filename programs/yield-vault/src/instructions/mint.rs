use crate::{
    address::Address,
    context::Context,
    error::{Result, VaultError},
    instructions::deposit::{self, deposit_headroom, require_deposits_open},
    math::{convert_to_assets, Rounding},
    require,
    state::Vault,
};

/// Mint exact shares, paying required assets (ceiling rounding - protects vault)
pub fn handler(vault: &mut Vault, ctx: &mut Context, shares: u64, receiver: Address) -> Result<u64> {
    require!(!receiver.is_zero(), VaultError::ZeroAddress);
    require!(shares > 0, VaultError::ZeroAmount);
    require_deposits_open(vault)?;

    let total_assets = vault.total_assets(ctx.bank)?;
    let total_shares = vault.total_shares(ctx.bank);

    // Calculate required assets (ceiling rounding - user pays more)
    let assets = convert_to_assets(
        shares,
        total_assets,
        total_shares,
        vault.config.decimals_offset(),
        Rounding::Ceiling,
    )?;

    require!(
        assets >= vault.config.min_deposit_amount,
        VaultError::DepositTooSmall
    );
    let headroom = deposit_headroom(vault, ctx.bank, &receiver, total_assets, total_shares)?;
    require!(assets <= headroom, VaultError::DepositCeilingExceeded);

    deposit::execute(vault, ctx, assets, shares, receiver)?;
    Ok(assets)
}
