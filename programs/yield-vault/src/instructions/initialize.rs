use std::collections::BTreeSet;

use crate::{
    access::RoleRegistry,
    address::Address,
    error::{Result, VaultError},
    events::VaultInitialized,
    provider::Provider,
    require,
    state::{Vault, VaultConfig},
};

/// Create a vault. The first adapter becomes the active provider; deposits
/// stay paused until `setup_vault` absorbs the seed deposit.
pub fn handler(
    vault_id: u64,
    asset_mint: Address,
    config: VaultConfig,
    roles: RoleRegistry,
    governor: Address,
    adapters: Vec<Box<dyn Provider>>,
) -> Result<Vault> {
    config.validate()?;
    require!(!asset_mint.is_zero(), VaultError::ZeroAddress);
    require!(!governor.is_zero(), VaultError::ZeroAddress);
    require!(!adapters.is_empty(), VaultError::InvalidProviderList);

    let unique: BTreeSet<Address> = adapters.iter().map(|adapter| adapter.address()).collect();
    require!(unique.len() == adapters.len(), VaultError::InvalidProviderList);

    let mut vault = Vault::from_parts(vault_id, asset_mint, config, roles, governor, adapters);

    let event = VaultInitialized {
        vault: vault.address,
        asset_mint: vault.asset_mint,
        shares_mint: vault.shares_mint,
        vault_id,
    };
    vault.events.emit(event);

    tracing::info!(
        vault = %vault.address,
        providers = vault.providers.len(),
        "Vault initialized"
    );

    Ok(vault)
}
