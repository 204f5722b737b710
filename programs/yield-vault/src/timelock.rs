//! Delayed-execution queue gating governor-only vault mutations.
//!
//! A transaction is keyed by the hash of `(target, value, signature,
//! payload, eta)` and is either queued or absent. The timelock is the
//! governor of the vaults it controls, so those calls only ever reach a
//! vault after the delay has elapsed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::Address;
use crate::constants::{GRACE_PERIOD, MAX_DELAY, MIN_DELAY, TIMELOCK_SEED};
use crate::error::{Result, VaultError};
use crate::events::{
    CancelTransaction, EventLog, ExecuteTransaction, NewDelay, NewTimelockOwner, QueueTransaction,
};
use crate::require;

pub const SET_DELAY: &str = "setDelay(uint256)";
pub const SET_OWNER: &str = "setOwner(address)";

/// Component that accepts calls forwarded by a timelock.
pub trait TimelockTarget {
    fn target_address(&self) -> Address;

    /// Dispatch `signature` with its encoded arguments. `caller` is the
    /// timelock's own address.
    fn execute_call(
        &mut self,
        caller: &Address,
        value: u64,
        signature: &str,
        payload: &[u8],
    ) -> Result<Vec<u8>>;
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash([u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl FromStr for TxHash {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| VaultError::MalformedPayload(format!("bad tx hash: {s}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VaultError::MalformedPayload(format!("bad tx hash length: {s}")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockCall {
    pub target: Address,
    pub value: u64,
    pub signature: String,
    pub payload: Vec<u8>,
    pub eta: i64,
}

impl TimelockCall {
    pub fn tx_hash(&self) -> TxHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"yield-vault/timelock-tx");
        hasher.update(self.target.as_ref());
        hasher.update(&self.value.to_le_bytes());
        hasher.update(&(self.signature.len() as u64).to_le_bytes());
        hasher.update(self.signature.as_bytes());
        hasher.update(&(self.payload.len() as u64).to_le_bytes());
        hasher.update(&self.payload);
        hasher.update(&self.eta.to_le_bytes());
        TxHash(*hasher.finalize().as_bytes())
    }
}

pub struct Timelock {
    address: Address,
    owner: Address,
    delay: i64,
    queued: BTreeMap<TxHash, TimelockCall>,
    events: EventLog,
}

impl fmt::Debug for Timelock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timelock")
            .field("address", &self.address)
            .field("owner", &self.owner)
            .field("delay", &self.delay)
            .field("queued", &self.queued.len())
            .finish()
    }
}

impl Timelock {
    pub fn new(owner: Address, delay: i64) -> Result<Self> {
        require!(!owner.is_zero(), VaultError::ZeroAddress);
        check_delay(delay)?;

        Ok(Self {
            address: Address::derive(&[TIMELOCK_SEED, owner.as_ref()]),
            owner,
            delay,
            queued: BTreeMap::new(),
            events: EventLog::default(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn delay(&self) -> i64 {
        self.delay
    }

    pub fn is_queued(&self, tx_hash: &TxHash) -> bool {
        self.queued.contains_key(tx_hash)
    }

    pub fn queued(&self) -> impl Iterator<Item = (&TxHash, &TimelockCall)> {
        self.queued.iter()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// absent -> queued. `eta` must sit in `[now + delay, now + delay + GRACE_PERIOD]`.
    pub fn queue(&mut self, signer: &Address, call: TimelockCall, now: i64) -> Result<TxHash> {
        self.require_owner(signer)?;

        let earliest = now.checked_add(self.delay).ok_or(VaultError::MathOverflow)?;
        let latest = earliest
            .checked_add(GRACE_PERIOD)
            .ok_or(VaultError::MathOverflow)?;
        require!(
            call.eta >= earliest && call.eta <= latest,
            VaultError::InvalidEta
        );

        let tx_hash = call.tx_hash();
        require!(
            !self.queued.contains_key(&tx_hash),
            VaultError::TransactionAlreadyQueued
        );

        self.events.emit(QueueTransaction {
            tx_hash: tx_hash.to_string(),
            target: call.target,
            value: call.value,
            signature: call.signature.clone(),
            eta: call.eta,
        });
        self.queued.insert(tx_hash, call);

        Ok(tx_hash)
    }

    /// queued -> absent, performing the call. Only valid while
    /// `eta <= now <= eta + GRACE_PERIOD`. Self-calls (`target` is this
    /// timelock) need no `target` argument; any other call must be given the
    /// component it names.
    pub fn execute(
        &mut self,
        signer: &Address,
        call: &TimelockCall,
        now: i64,
        target: Option<&mut dyn TimelockTarget>,
    ) -> Result<Vec<u8>> {
        self.require_owner(signer)?;

        let tx_hash = call.tx_hash();
        require!(
            self.queued.contains_key(&tx_hash),
            VaultError::TransactionNotQueued
        );
        require!(
            now >= call.eta,
            VaultError::TransactionLocked { eta: call.eta }
        );
        let expired_at = call
            .eta
            .checked_add(GRACE_PERIOD)
            .ok_or(VaultError::MathOverflow)?;
        require!(now <= expired_at, VaultError::TransactionExpired { expired_at });

        let result = if call.target == self.address {
            require!(call.value == 0, VaultError::UnexpectedValue);
            self.execute_self(&call.signature, &call.payload)
        } else {
            let target = target.ok_or(VaultError::TargetMismatch)?;
            require!(
                target.target_address() == call.target,
                VaultError::TargetMismatch
            );
            target.execute_call(&self.address, call.value, &call.signature, &call.payload)
        };
        let output = result.map_err(|e| {
            tracing::warn!(tx_hash = %tx_hash, error = %e, "Timelock target call failed");
            VaultError::TargetCallFailed(e.to_string())
        })?;

        self.queued.remove(&tx_hash);
        self.events.emit(ExecuteTransaction {
            tx_hash: tx_hash.to_string(),
            target: call.target,
            value: call.value,
            signature: call.signature.clone(),
            eta: call.eta,
        });

        Ok(output)
    }

    /// queued -> absent, unconditionally.
    pub fn cancel(&mut self, signer: &Address, call: &TimelockCall) -> Result<()> {
        self.require_owner(signer)?;

        let tx_hash = call.tx_hash();
        require!(
            self.queued.remove(&tx_hash).is_some(),
            VaultError::TransactionNotQueued
        );

        self.events.emit(CancelTransaction {
            tx_hash: tx_hash.to_string(),
            target: call.target,
            eta: call.eta,
        });
        Ok(())
    }

    /// Only reachable through the timelock's own queue and execute path.
    pub fn set_delay(&mut self, caller: &Address, delay: i64) -> Result<()> {
        require!(*caller == self.address, VaultError::NotTimelock);
        check_delay(delay)?;

        self.delay = delay;
        self.events.emit(NewDelay { delay });
        Ok(())
    }

    /// Only reachable through the timelock's own queue and execute path.
    pub fn set_owner(&mut self, caller: &Address, owner: Address) -> Result<()> {
        require!(*caller == self.address, VaultError::NotTimelock);
        require!(!owner.is_zero(), VaultError::ZeroAddress);

        self.owner = owner;
        self.events.emit(NewTimelockOwner { owner });
        Ok(())
    }

    /// Build a call that targets this timelock itself.
    pub fn self_call(&self, signature: &str, payload: Vec<u8>, eta: i64) -> TimelockCall {
        TimelockCall {
            target: self.address,
            value: 0,
            signature: signature.to_string(),
            payload,
            eta,
        }
    }

    fn execute_self(&mut self, signature: &str, payload: &[u8]) -> Result<Vec<u8>> {
        let caller = self.address;
        match signature {
            SET_DELAY => {
                let delay: i64 = decode_payload(payload)?;
                self.set_delay(&caller, delay)?;
            }
            SET_OWNER => {
                let owner: Address = decode_payload(payload)?;
                self.set_owner(&caller, owner)?;
            }
            other => return Err(VaultError::UnknownCall(other.to_string())),
        }
        Ok(Vec::new())
    }

    fn require_owner(&self, signer: &Address) -> Result<()> {
        require!(*signer == self.owner, VaultError::NotTimelockOwner);
        Ok(())
    }

    pub fn snapshot(&self) -> TimelockSnapshot {
        TimelockSnapshot {
            address: self.address,
            owner: self.owner,
            delay: self.delay,
            queued: self.queued.values().cloned().collect(),
        }
    }

    pub fn restore(snapshot: TimelockSnapshot) -> Result<Self> {
        require!(!snapshot.owner.is_zero(), VaultError::ZeroAddress);
        check_delay(snapshot.delay)?;

        Ok(Self {
            address: snapshot.address,
            owner: snapshot.owner,
            delay: snapshot.delay,
            queued: snapshot
                .queued
                .into_iter()
                .map(|call| (call.tx_hash(), call))
                .collect(),
            events: EventLog::default(),
        })
    }
}

/// Pending-transaction set plus the parameters that bound it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockSnapshot {
    pub address: Address,
    pub owner: Address,
    pub delay: i64,
    pub queued: Vec<TimelockCall>,
}

fn check_delay(delay: i64) -> Result<()> {
    require!(
        (MIN_DELAY..=MAX_DELAY).contains(&delay),
        VaultError::InvalidDelay
    );
    Ok(())
}

/// Decode a JSON-encoded call argument.
pub fn decode_payload<T: serde::de::DeserializeOwned>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|e| VaultError::MalformedPayload(e.to_string()))
}

/// Encode a call argument the way queued payloads carry it.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| VaultError::MalformedPayload(e.to_string()))
}
