pub const VAULT_SEED: &[u8] = b"vault";
pub const SHARES_MINT_SEED: &[u8] = b"shares";
pub const POSITION_SEED: &[u8] = b"position";
pub const MANAGER_SEED: &[u8] = b"manager";
pub const TIMELOCK_SEED: &[u8] = b"timelock";
pub const DISTRIBUTOR_SEED: &[u8] = b"distributor";

pub const MAX_DECIMALS: u8 = 9;

/// Fixed-point scale for fee rates (1e18 = 100%).
pub const WAD: u64 = 1_000_000_000_000_000_000;

/// Fixed-point scale for provider rates of return (1e27 = 100% APR).
pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Withdraw fee ceiling: 5%.
pub const MAX_WITHDRAW_FEE_RATE: u64 = 50_000_000_000_000_000;

/// Rebalance fee ceiling: 20% of the moved assets.
pub const MAX_REBALANCE_FEE_RATE: u64 = 200_000_000_000_000_000;

/// Passing this as rebalance `assets` moves the full balance held at `from`.
pub const SENTINEL_MAX: u64 = u64::MAX;

pub const DEFAULT_MIN_DEPOSIT_AMOUNT: u64 = 1000;

/// Events each component keeps in memory.
pub const EVENT_LOG_CAPACITY: usize = 1024;

pub const MIN_DELAY: i64 = 30 * 60;
pub const MAX_DELAY: i64 = 30 * 24 * 60 * 60;
pub const GRACE_PERIOD: i64 = 14 * 24 * 60 * 60;
