//! Services backing the HTTP routes

pub mod deployment;
pub mod proof_generator;

pub use deployment::{Deployment, DeploymentSpec};
pub use proof_generator::ProofGenerator;

/// Current unix time, used as the clock for every state transition.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
