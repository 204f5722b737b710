use crate::{
    address::Address,
    error::{Result, VaultError},
    instructions::admin,
    require,
    state::Vault,
    timelock::{decode_payload, encode_payload, TimelockCall, TimelockTarget},
    token::TokenBank,
};

/// Governor-only vault mutations, in the form the timelock queues them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernanceCall {
    SetProviders(Vec<Address>),
    SetGovernor(Address),
}

impl GovernanceCall {
    pub const SET_PROVIDERS: &'static str = "setProviders(address[])";
    pub const SET_GOVERNOR: &'static str = "setGovernor(address)";

    pub fn signature(&self) -> &'static str {
        match self {
            GovernanceCall::SetProviders(_) => Self::SET_PROVIDERS,
            GovernanceCall::SetGovernor(_) => Self::SET_GOVERNOR,
        }
    }

    pub fn payload(&self) -> Result<Vec<u8>> {
        match self {
            GovernanceCall::SetProviders(providers) => encode_payload(providers),
            GovernanceCall::SetGovernor(governor) => encode_payload(governor),
        }
    }

    pub fn decode(signature: &str, payload: &[u8]) -> Result<Self> {
        match signature {
            Self::SET_PROVIDERS => Ok(GovernanceCall::SetProviders(decode_payload(payload)?)),
            Self::SET_GOVERNOR => Ok(GovernanceCall::SetGovernor(decode_payload(payload)?)),
            other => Err(VaultError::UnknownCall(other.to_string())),
        }
    }

    /// Package this call for `vault` so it can be queued with the given `eta`.
    pub fn into_timelock_call(self, vault: Address, eta: i64) -> Result<TimelockCall> {
        Ok(TimelockCall {
            target: vault,
            value: 0,
            signature: self.signature().to_string(),
            payload: self.payload()?,
            eta,
        })
    }
}

/// A vault paired with the token bank its provider balances live in, which
/// is what the timelock executes governor calls against.
pub struct GovernedVault<'a> {
    vault: &'a mut Vault,
    bank: &'a TokenBank,
}

impl<'a> GovernedVault<'a> {
    pub fn new(vault: &'a mut Vault, bank: &'a TokenBank) -> Self {
        Self { vault, bank }
    }
}

impl TimelockTarget for GovernedVault<'_> {
    fn target_address(&self) -> Address {
        self.vault.address
    }

    fn execute_call(
        &mut self,
        caller: &Address,
        value: u64,
        signature: &str,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        require!(value == 0, VaultError::UnexpectedValue);

        match GovernanceCall::decode(signature, payload)? {
            GovernanceCall::SetProviders(providers) => {
                admin::set_providers(self.vault, self.bank, caller, providers)?
            }
            GovernanceCall::SetGovernor(governor) => {
                admin::set_governor(self.vault, caller, governor)?
            }
        }
        Ok(Vec::new())
    }
}
