//! Fan-out entry point: one authorized executor can trigger rebalances on
//! any registered vault. The manager acts on vaults under its own address,
//! so it must hold the Operator role on each of them.

use std::collections::BTreeMap;

use crate::access::{Role, RoleRegistry};
use crate::address::Address;
use crate::constants::{MANAGER_SEED, SENTINEL_MAX};
use crate::context::Context;
use crate::error::{Result, VaultError};
use crate::events::{EventLog, RoleGranted, RoleRevoked, VaultRegistered};
use crate::instructions::rebalance::{self, RebalanceRequest};
use crate::require;
use crate::state::Vault;

#[derive(Debug)]
pub struct VaultManager {
    address: Address,
    roles: RoleRegistry,
    vaults: BTreeMap<u64, Vault>,
    events: EventLog,
}

impl VaultManager {
    pub fn new(admin: Address) -> Result<Self> {
        require!(!admin.is_zero(), VaultError::ZeroAddress);
        Ok(Self {
            address: Address::derive(&[MANAGER_SEED, admin.as_ref()]),
            roles: RoleRegistry::new(admin),
            vaults: BTreeMap::new(),
            events: EventLog::default(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn vault(&self, vault_id: u64) -> Result<&Vault> {
        self.vaults
            .get(&vault_id)
            .ok_or(VaultError::VaultNotFound(vault_id))
    }

    pub fn vault_mut(&mut self, vault_id: u64) -> Result<&mut Vault> {
        self.vaults
            .get_mut(&vault_id)
            .ok_or(VaultError::VaultNotFound(vault_id))
    }

    pub fn vaults(&self) -> impl Iterator<Item = &Vault> {
        self.vaults.values()
    }

    pub fn register_vault(&mut self, signer: &Address, vault: Vault) -> Result<()> {
        self.roles.require_role(Role::Admin, signer)?;
        let vault_id = vault.vault_id();
        require!(
            !self.vaults.contains_key(&vault_id),
            VaultError::VaultAlreadyRegistered(vault_id)
        );

        self.events.emit(VaultRegistered {
            vault_id,
            vault: vault.address(),
        });
        self.vaults.insert(vault_id, vault);
        Ok(())
    }

    /// Validate `request.assets` against the live `from` balance, then run the
    /// vault's rebalance as the manager.
    pub fn rebalance_vault(
        &mut self,
        ctx: &mut Context,
        vault_id: u64,
        request: RebalanceRequest,
    ) -> Result<bool> {
        self.roles.require_role(Role::Executor, &ctx.signer)?;

        let manager = self.address;
        let vault = self
            .vaults
            .get_mut(&vault_id)
            .ok_or(VaultError::VaultNotFound(vault_id))?;

        if request.assets != SENTINEL_MAX {
            let available = vault.provider_balance(&request.from, ctx.bank)?;
            require!(
                request.assets <= available,
                VaultError::InsufficientProviderBalance
            );
        }

        let mut as_manager = ctx.with_signer(manager);
        rebalance::handler(vault, &mut as_manager, request)?;

        tracing::info!(vault_id, executor = %ctx.signer, "Vault rebalanced via manager");
        Ok(true)
    }

    pub fn grant_role(&mut self, signer: &Address, role: Role, account: Address) -> Result<()> {
        if self.roles.grant_role(signer, role, account)? {
            self.events.emit(RoleGranted {
                component: self.address,
                role,
                account,
                sender: *signer,
            });
        }
        Ok(())
    }

    pub fn revoke_role(&mut self, signer: &Address, role: Role, account: Address) -> Result<()> {
        if self.roles.revoke_role(signer, role, &account)? {
            self.events.emit(RoleRevoked {
                component: self.address,
                role,
                account,
                sender: *signer,
            });
        }
        Ok(())
    }
}
