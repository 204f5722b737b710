pub mod distributor;
pub mod merkle;

pub use distributor::{ClaimRecord, DistributorSnapshot, RewardDistributor};
pub use merkle::{Hash, RewardEntry, RewardTree};
