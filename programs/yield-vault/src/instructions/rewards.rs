use crate::{
    access::Role,
    address::Address,
    context::Context,
    error::{Result, VaultError},
    events::RewardsForwarded,
    require,
    state::Vault,
};

/// Sweep the vault's whole balance of an incentive `token` to the configured
/// rewards recipient. The vault asset and its own shares are never
/// forwardable. Returns the amount moved.
pub fn forward_rewards(vault: &mut Vault, ctx: &mut Context, token: Address) -> Result<u64> {
    let signer = ctx.signer;
    require!(
        vault.roles.has_role(Role::Operator, &signer) || vault.roles.has_role(Role::Admin, &signer),
        VaultError::MissingRole(Role::Operator)
    );

    let recipient = vault
        .config
        .rewards_recipient
        .ok_or(VaultError::RewardsForwardingDisabled)?;
    require!(
        token != vault.asset_mint && token != vault.shares_mint && !token.is_zero(),
        VaultError::InvalidRewardToken
    );

    let vault_key = vault.address;
    let amount = ctx.bank.balance_of(&token, &vault_key);
    require!(amount > 0, VaultError::ZeroAmount);

    ctx.bank.transfer(&token, &vault_key, &recipient, amount)?;

    vault.events.emit(RewardsForwarded {
        vault: vault_key,
        token,
        recipient,
        amount,
    });

    Ok(amount)
}
