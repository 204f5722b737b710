use thiserror::Error;

use crate::access::Role;
use crate::address::Address;
use crate::state::ActionKind;

/// Broad classes of failure. Callers use these to tell "fix the input" apart
/// from "retry later" and "never valid".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    Authorization,
    StatePrecondition,
    ExternalCall,
    Arithmetic,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Zero address is not a valid party")]
    ZeroAddress,

    #[error("Invalid address encoding")]
    InvalidAddress,

    #[error("Deposit amount below minimum threshold")]
    DepositTooSmall,

    #[error("Deposit exceeds the configured ceiling")]
    DepositCeilingExceeded,

    #[error("Operation would mint zero shares")]
    ZeroShares,

    #[error("Asset decimals must be <= 9")]
    InvalidAssetDecimals,

    #[error("Fee rate above the allowed maximum")]
    FeeRateTooHigh,

    #[error("Rebalance fee exceeds 20% of moved assets")]
    RebalanceFeeTooHigh,

    #[error("Source and destination provider are the same")]
    SameProvider,

    #[error("Provider list must be non-empty and free of duplicates")]
    InvalidProviderList,

    #[error("Active provider must remain in the provider list")]
    ActiveProviderRemoved,

    #[error("Malformed Merkle proof")]
    MalformedProof,

    #[error("Merkle proof does not match the published root")]
    InvalidProof,

    #[error("Reward distribution lists the same account and token twice")]
    DuplicateRewardEntry,

    #[error("Timelock delay outside [MIN_DELAY, MAX_DELAY]")]
    InvalidDelay,

    #[error("Timelock eta outside the allowed queueing window")]
    InvalidEta,

    #[error("Unknown call signature: {0}")]
    UnknownCall(String),

    #[error("Malformed call payload: {0}")]
    MalformedPayload(String),

    #[error("Call does not accept a value transfer")]
    UnexpectedValue,

    #[error("Unauthorized - caller lacks the {0:?} role")]
    MissingRole(Role),

    #[error("Unauthorized - caller is not the governor")]
    NotGovernor,

    #[error("Unauthorized - caller is not the timelock owner")]
    NotTimelockOwner,

    #[error("Unauthorized - only the timelock itself may call this")]
    NotTimelock,

    #[error("Unauthorized - claims must be submitted by the claiming account")]
    NotClaimAccount,

    #[error("Insufficient allowance")]
    InsufficientAllowance,

    #[error("Vault setup already completed")]
    SetupAlreadyCompleted,

    #[error("Vault setup not completed")]
    SetupNotCompleted,

    #[error("{0:?} is paused")]
    ActionPaused(ActionKind),

    #[error("{0:?} is not paused")]
    ActionNotPaused(ActionKind),

    #[error("Provider is not registered with this vault")]
    ProviderNotRegistered,

    #[error("No adapter installed for provider")]
    AdapterNotInstalled,

    #[error("Adapter already installed for provider")]
    AdapterAlreadyInstalled,

    #[error("Vault not found: {0}")]
    VaultNotFound(u64),

    #[error("Vault id already registered: {0}")]
    VaultAlreadyRegistered(u64),

    #[error("Insufficient shares balance")]
    InsufficientShares,

    #[error("Insufficient assets held at provider")]
    InsufficientProviderBalance,

    #[error("Insufficient token balance")]
    InsufficientFunds,

    #[error("Transaction is not queued")]
    TransactionNotQueued,

    #[error("Transaction already queued")]
    TransactionAlreadyQueued,

    #[error("Transaction is still locked until {eta}")]
    TransactionLocked { eta: i64 },

    #[error("Transaction expired at {expired_at}")]
    TransactionExpired { expired_at: i64 },

    #[error("Call target does not match the queued transaction")]
    TargetMismatch,

    #[error("Rewards already claimed")]
    AlreadyClaimed,

    #[error("Reward distributor is paused")]
    DistributorPaused,

    #[error("Reward distributor is not paused")]
    DistributorNotPaused,

    #[error("Reward forwarding is not configured for this vault")]
    RewardsForwardingDisabled,

    #[error("Token cannot be forwarded as a reward")]
    InvalidRewardToken,

    #[error("Provider {provider} still holds {balance} of the vault's assets")]
    ProviderHoldsFunds { provider: Address, balance: u64 },

    #[error("Provider call failed: {0}")]
    ProviderFailure(String),

    #[error("Provider left the vault balance inconsistent: expected {expected}, found {actual}")]
    ProviderBalanceMismatch { expected: u64, actual: u64 },

    #[error("Timelock target call failed: {0}")]
    TargetCallFailed(String),

    #[error("Arithmetic overflow")]
    MathOverflow,

    #[error("Division by zero")]
    DivisionByZero,
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        use VaultError::*;
        match self {
            ZeroAmount | ZeroAddress | InvalidAddress | DepositTooSmall
            | DepositCeilingExceeded | ZeroShares | InvalidAssetDecimals | FeeRateTooHigh
            | RebalanceFeeTooHigh | SameProvider | InvalidProviderList
            | ActiveProviderRemoved | MalformedProof | InvalidProof | DuplicateRewardEntry
            | InvalidDelay | InvalidEta | UnknownCall(_) | MalformedPayload(_)
            | UnexpectedValue => {
                ErrorKind::InputValidation
            }
            MissingRole(_) | NotGovernor | NotTimelockOwner | NotTimelock | NotClaimAccount
            | InsufficientAllowance => ErrorKind::Authorization,
            SetupAlreadyCompleted | SetupNotCompleted | ActionPaused(_) | ActionNotPaused(_)
            | ProviderNotRegistered | AdapterNotInstalled | AdapterAlreadyInstalled
            | VaultNotFound(_) | VaultAlreadyRegistered(_) | InsufficientShares
            | InsufficientProviderBalance | InsufficientFunds | TransactionNotQueued
            | TransactionAlreadyQueued | TransactionLocked { .. }
            | TransactionExpired { .. } | TargetMismatch | AlreadyClaimed
            | DistributorPaused | DistributorNotPaused | RewardsForwardingDisabled
            | InvalidRewardToken | ProviderHoldsFunds { .. } => ErrorKind::StatePrecondition,
            ProviderFailure(_) | ProviderBalanceMismatch { .. } | TargetCallFailed(_) => {
                ErrorKind::ExternalCall
            }
            MathOverflow | DivisionByZero => ErrorKind::Arithmetic,
        }
    }

    /// True when the same call may succeed later without changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VaultError::TransactionLocked { .. } | VaultError::ActionPaused(_) | VaultError::DistributorPaused
        )
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;

/// Early-return with an error unless the condition holds.
#[macro_export]
macro_rules! require {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
