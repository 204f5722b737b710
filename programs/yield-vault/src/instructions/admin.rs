use std::collections::BTreeSet;

use crate::{
    access::Role,
    address::Address,
    constants::MAX_WITHDRAW_FEE_RATE,
    error::{Result, VaultError},
    events::{
        ActionPauseChanged, ActiveProviderChanged, ConfigUpdated, ProvidersChanged, RoleGranted,
        RoleRevoked,
    },
    provider::Provider,
    require,
    state::{ActionKind, Vault},
    token::TokenBank,
};

/// Pause one action kind (emergency circuit breaker)
pub fn pause(vault: &mut Vault, signer: &Address, action: ActionKind) -> Result<()> {
    vault.require_role(Role::Admin, signer)?;
    require!(
        !vault.paused.is_paused(action),
        VaultError::ActionPaused(action)
    );

    vault.paused.set(action, true);

    let vault_key = vault.address;
    vault.events.emit(ActionPauseChanged {
        vault: vault_key,
        action,
        paused: true,
    });

    Ok(())
}

/// Unpause one action kind. Deposits can only be reopened after setup.
pub fn unpause(vault: &mut Vault, signer: &Address, action: ActionKind) -> Result<()> {
    vault.require_role(Role::Admin, signer)?;
    require!(
        vault.paused.is_paused(action),
        VaultError::ActionNotPaused(action)
    );
    if action == ActionKind::Deposit {
        require!(vault.setup_completed, VaultError::SetupNotCompleted);
    }

    vault.paused.set(action, false);

    let vault_key = vault.address;
    vault.events.emit(ActionPauseChanged {
        vault: vault_key,
        action,
        paused: false,
    });

    Ok(())
}

pub fn set_treasury(vault: &mut Vault, signer: &Address, treasury: Address) -> Result<()> {
    vault.require_role(Role::Admin, signer)?;
    require!(!treasury.is_zero(), VaultError::ZeroAddress);

    vault.config.treasury = treasury;
    emit_config(vault, "treasury", treasury.to_string());
    Ok(())
}

pub fn set_withdraw_fee_rate(vault: &mut Vault, signer: &Address, rate: u64) -> Result<()> {
    vault.require_role(Role::Admin, signer)?;
    require!(rate <= MAX_WITHDRAW_FEE_RATE, VaultError::FeeRateTooHigh);

    vault.config.withdraw_fee_rate = rate;
    emit_config(vault, "withdraw_fee_rate", rate.to_string());
    Ok(())
}

pub fn set_min_deposit_amount(vault: &mut Vault, signer: &Address, amount: u64) -> Result<()> {
    vault.require_role(Role::Admin, signer)?;

    vault.config.min_deposit_amount = amount;
    emit_config(vault, "min_deposit_amount", amount.to_string());
    Ok(())
}

pub fn set_deposit_ceilings(
    vault: &mut Vault,
    signer: &Address,
    per_user: Option<u64>,
    per_vault: Option<u64>,
) -> Result<()> {
    vault.require_role(Role::Admin, signer)?;

    vault.config.max_deposit_per_user = per_user;
    vault.config.max_deposit_per_vault = per_vault;
    emit_config(vault, "deposit_ceilings", format!("{per_user:?}/{per_vault:?}"));
    Ok(())
}

pub fn set_rewards_recipient(
    vault: &mut Vault,
    signer: &Address,
    recipient: Option<Address>,
) -> Result<()> {
    vault.require_role(Role::Admin, signer)?;
    if let Some(recipient) = recipient {
        require!(!recipient.is_zero(), VaultError::ZeroAddress);
    }

    vault.config.rewards_recipient = recipient;
    let value = recipient.map(|r| r.to_string()).unwrap_or_default();
    emit_config(vault, "rewards_recipient", value);
    Ok(())
}

/// Make `provider` receive new deposits and serve withdrawals. Funds already
/// placed elsewhere stay where they are until rebalanced.
pub fn set_active_provider(vault: &mut Vault, signer: &Address, provider: Address) -> Result<()> {
    vault.require_role(Role::Admin, signer)?;
    vault.require_registered(&provider)?;

    vault.active_provider = provider;

    let vault_key = vault.address;
    vault.events.emit(ActiveProviderChanged {
        vault: vault_key,
        provider,
    });
    Ok(())
}

/// Make an adapter available for a later `set_providers`. Installing does not
/// register it.
pub fn install_adapter(vault: &mut Vault, signer: &Address, adapter: Box<dyn Provider>) -> Result<()> {
    vault.require_role(Role::Admin, signer)?;
    let provider = adapter.address();
    require!(
        !vault.adapters.contains_key(&provider),
        VaultError::AdapterAlreadyInstalled
    );

    tracing::info!(
        vault = %vault.address,
        provider = %provider,
        identifier = adapter.identifier(),
        "Adapter installed"
    );
    vault.adapters.insert(provider, adapter);
    Ok(())
}

/// Replace the provider list. Governor only, normally reached through the
/// timelock. A provider still holding vault funds cannot be dropped; rebalance
/// out of it first.
pub fn set_providers(
    vault: &mut Vault,
    bank: &TokenBank,
    signer: &Address,
    providers: Vec<Address>,
) -> Result<()> {
    vault.require_governor(signer)?;
    require!(!providers.is_empty(), VaultError::InvalidProviderList);

    let unique: BTreeSet<&Address> = providers.iter().collect();
    require!(unique.len() == providers.len(), VaultError::InvalidProviderList);

    for provider in &providers {
        require!(
            vault.adapters.contains_key(provider),
            VaultError::AdapterNotInstalled
        );
    }
    require!(
        providers.contains(&vault.active_provider),
        VaultError::ActiveProviderRemoved
    );
    for dropped in vault.providers.iter().filter(|p| !providers.contains(p)) {
        let balance = vault.provider_balance(dropped, bank)?;
        require!(
            balance == 0,
            VaultError::ProviderHoldsFunds {
                provider: *dropped,
                balance
            }
        );
    }

    vault.providers = providers.clone();

    let vault_key = vault.address;
    vault.events.emit(ProvidersChanged {
        vault: vault_key,
        providers,
    });
    Ok(())
}

pub fn set_governor(vault: &mut Vault, signer: &Address, governor: Address) -> Result<()> {
    vault.require_governor(signer)?;
    require!(!governor.is_zero(), VaultError::ZeroAddress);

    vault.governor = governor;
    emit_config(vault, "governor", governor.to_string());
    Ok(())
}

pub fn grant_role(vault: &mut Vault, signer: &Address, role: Role, account: Address) -> Result<()> {
    if vault.roles.grant_role(signer, role, account)? {
        let component = vault.address;
        vault.events.emit(RoleGranted {
            component,
            role,
            account,
            sender: *signer,
        });
    }
    Ok(())
}

pub fn revoke_role(vault: &mut Vault, signer: &Address, role: Role, account: Address) -> Result<()> {
    if vault.roles.revoke_role(signer, role, &account)? {
        let component = vault.address;
        vault.events.emit(RoleRevoked {
            component,
            role,
            account,
            sender: *signer,
        });
    }
    Ok(())
}

fn emit_config(vault: &mut Vault, field: &'static str, value: String) {
    let vault_key = vault.address;
    vault.events.emit(ConfigUpdated {
        vault: vault_key,
        field,
        value,
    });
}
