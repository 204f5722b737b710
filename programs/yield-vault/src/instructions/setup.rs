use crate::{
    access::Role,
    context::Context,
    error::{Result, VaultError},
    events::{ActionPauseChanged, VaultSetup},
    instructions::deposit::{self, deposit_headroom},
    math::{convert_to_shares, Rounding},
    require,
    state::{ActionKind, Vault},
};

/// One-time bootstrap deposit, paid by the Admin. The seed shares are minted
/// to the vault itself and can never be redeemed, so share supply never drops
/// below the seed. Deposits open once it lands.
pub fn handler(vault: &mut Vault, ctx: &mut Context, assets: u64) -> Result<u64> {
    vault.require_role(Role::Admin, &ctx.signer)?;
    require!(!vault.setup_completed, VaultError::SetupAlreadyCompleted);
    require!(assets > 0, VaultError::ZeroAmount);
    require!(
        assets >= vault.config.min_deposit_amount,
        VaultError::DepositTooSmall
    );

    let caller = ctx.signer;
    let receiver = vault.address;
    let total_assets = vault.total_assets(ctx.bank)?;
    let total_shares = vault.total_shares(ctx.bank);

    let headroom = deposit_headroom(vault, ctx.bank, &receiver, total_assets, total_shares)?;
    require!(assets <= headroom, VaultError::DepositCeilingExceeded);

    let shares = convert_to_shares(
        assets,
        total_assets,
        total_shares,
        vault.config.decimals_offset(),
        Rounding::Floor,
    )?;
    require!(shares > 0, VaultError::ZeroShares);

    deposit::execute(vault, ctx, assets, shares, receiver)?;

    vault.setup_completed = true;
    vault.paused.set(ActionKind::Deposit, false);

    let vault_key = vault.address;
    vault.events.emit(VaultSetup {
        vault: vault_key,
        caller,
        assets,
        shares,
    });
    vault.events.emit(ActionPauseChanged {
        vault: vault_key,
        action: ActionKind::Deposit,
        paused: false,
    });

    Ok(shares)
}
