use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{Result, VaultError};
use crate::require;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Configuration, pausing, fee and treasury changes. Administers every role.
    Admin,
    /// Rebalance execution.
    Operator,
    /// Vault-manager fan-out.
    Executor,
    /// Reward root publication.
    RootUpdater,
}

/// Flat `role -> accounts` membership. Injected into each component, never
/// shared ambiently, so every instance's governance stands on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    members: BTreeMap<Role, BTreeSet<Address>>,
}

impl RoleRegistry {
    pub fn new(admin: Address) -> Self {
        let mut registry = Self::default();
        registry.members.entry(Role::Admin).or_default().insert(admin);
        registry
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|accounts| accounts.contains(account))
    }

    pub fn require_role(&self, role: Role, account: &Address) -> Result<()> {
        require!(self.has_role(role, account), VaultError::MissingRole(role));
        Ok(())
    }

    /// Grant `role` to `account`. Only an Admin may grant. Returns whether
    /// membership changed.
    pub fn grant_role(&mut self, signer: &Address, role: Role, account: Address) -> Result<bool> {
        self.require_role(Role::Admin, signer)?;
        require!(!account.is_zero(), VaultError::ZeroAddress);
        Ok(self.members.entry(role).or_default().insert(account))
    }

    /// Revoke `role` from `account`. Only an Admin may revoke.
    pub fn revoke_role(&mut self, signer: &Address, role: Role, account: &Address) -> Result<bool> {
        self.require_role(Role::Admin, signer)?;
        Ok(self
            .members
            .get_mut(&role)
            .is_some_and(|accounts| accounts.remove(account)))
    }

    pub fn members(&self, role: Role) -> impl Iterator<Item = &Address> {
        self.members.get(&role).into_iter().flatten()
    }
}
