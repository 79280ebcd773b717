//! Agent reputation ledger.
//!
//! Reputation is a step function of staked value: the contract owner
//! configures a strictly increasing threshold per level, and an agent's level
//! is the highest index whose threshold its stake covers. Stakes move only
//! through deposit, time-locked withdrawal, and slashes requested by the
//! registered marketplace — this crate is the single writer for stake
//! balances.

pub mod error;
pub mod ledger;
pub mod levels;

pub use error::{AgentError, Result};
pub use ledger::{AgentLedger, AgentProfile, SlashPolicy};
pub use levels::LevelSchedule;
