use std::collections::VecDeque;

use serde::Serialize;

use crate::access::Role;
use crate::address::Address;
use crate::constants::EVENT_LOG_CAPACITY;
use crate::state::ActionKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultInitialized {
    pub vault: Address,
    pub asset_mint: Address,
    pub shares_mint: Address,
    pub vault_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultSetup {
    pub vault: Address,
    pub caller: Address,
    pub assets: u64,
    pub shares: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleGranted {
    pub component: Address,
    pub role: Role,
    pub account: Address,
    pub sender: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRevoked {
    pub component: Address,
    pub role: Role,
    pub account: Address,
    pub sender: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deposit {
    pub vault: Address,
    pub caller: Address,
    pub owner: Address,
    pub assets: u64,
    pub shares: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Withdraw {
    pub vault: Address,
    pub caller: Address,
    pub receiver: Address,
    pub owner: Address,
    pub assets: u64,
    pub shares: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeesCharged {
    pub vault: Address,
    pub treasury: Address,
    pub assets: u64,
    pub fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvidersChanged {
    pub vault: Address,
    pub providers: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveProviderChanged {
    pub vault: Address,
    pub provider: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultRebalance {
    pub vault: Address,
    pub assets_from: u64,
    pub assets_to: u64,
    pub from: Address,
    pub to: Address,
    pub fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionPauseChanged {
    pub vault: Address,
    pub action: ActionKind,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigUpdated {
    pub vault: Address,
    pub field: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardsForwarded {
    pub vault: Address,
    pub token: Address,
    pub recipient: Address,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueTransaction {
    pub tx_hash: String,
    pub target: Address,
    pub value: u64,
    pub signature: String,
    pub eta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecuteTransaction {
    pub tx_hash: String,
    pub target: Address,
    pub value: u64,
    pub signature: String,
    pub eta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelTransaction {
    pub tx_hash: String,
    pub target: Address,
    pub eta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDelay {
    pub delay: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTimelockOwner {
    pub owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootUpdated {
    pub root: String,
    pub sender: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardsClaimed {
    pub account: Address,
    pub token: Address,
    pub amount: u64,
    pub total_claimed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributorStatusChanged {
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmergencyWithdraw {
    pub token: Address,
    pub receiver: Address,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultRegistered {
    pub vault_id: u64,
    pub vault: Address,
}

macro_rules! events {
    ($($name:ident),+ $(,)?) => {
        /// Every event any component emits, in commit order.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
        #[serde(tag = "event")]
        pub enum Event {
            $($name($name)),+
        }

        $(
            impl From<$name> for Event {
                fn from(event: $name) -> Self {
                    Event::$name(event)
                }
            }
        )+
    };
}

events!(
    VaultInitialized,
    VaultSetup,
    RoleGranted,
    RoleRevoked,
    Deposit,
    Withdraw,
    FeesCharged,
    ProvidersChanged,
    ActiveProviderChanged,
    VaultRebalance,
    ActionPauseChanged,
    ConfigUpdated,
    RewardsForwarded,
    QueueTransaction,
    ExecuteTransaction,
    CancelTransaction,
    NewDelay,
    NewTimelockOwner,
    RootUpdated,
    RewardsClaimed,
    DistributorStatusChanged,
    EmergencyWithdraw,
    VaultRegistered,
);

/// The most recent committed events. Every event is mirrored into `tracing`
/// when emitted; only the newest `capacity` are kept in memory.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<Event>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }
}

impl EventLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn emit(&mut self, event: impl Into<Event>) {
        let event = event.into();
        tracing::info!(?event, "event emitted");
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Retained events, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Event> + ExactSizeIterator {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(vault_id: u64) -> VaultRegistered {
        VaultRegistered {
            vault_id,
            vault: Address::ZERO,
        }
    }

    #[test]
    fn test_log_keeps_newest_events() {
        let mut log = EventLog::with_capacity(3);
        for vault_id in 1..=5 {
            log.emit(registered(vault_id));
        }

        assert_eq!(log.len(), 3);
        let kept: Vec<u64> = log
            .iter()
            .map(|event| match event {
                Event::VaultRegistered(e) => e.vault_id,
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(kept, vec![3, 4, 5]);
        assert_eq!(log.last(), Some(&Event::VaultRegistered(registered(5))));
    }

    #[test]
    fn test_default_capacity_bounds_growth() {
        let mut log = EventLog::default();
        for vault_id in 0..(EVENT_LOG_CAPACITY as u64 + 10) {
            log.emit(registered(vault_id));
        }
        assert_eq!(log.len(), EVENT_LOG_CAPACITY);
    }
}
