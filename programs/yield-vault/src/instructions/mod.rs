pub mod admin;
pub mod deposit;
pub mod governance;
pub mod initialize;
pub mod mint;
pub mod rebalance;
pub mod redeem;
pub mod rewards;
pub mod setup;
pub mod view;
pub mod withdraw;

pub use governance::{GovernanceCall, GovernedVault};
pub use rebalance::RebalanceRequest;
