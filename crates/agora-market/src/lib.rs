//! # Agora Market
//!
//! A staking-gated task marketplace: posting and completing jobs is approved
//! by peer vote instead of a trusted arbiter.
//!
//! ## Lifecycle
//!
//! 1. A buyer with sufficient stake-derived level creates a job; the payment
//!    escrows into custody and a posting-approval round opens.
//! 2. Eligible agents vote to validate or deny. Anyone may finalize once the
//!    window closes (or earlier, if the supermajority knob is configured);
//!    the losing side is slashed through the agent ledger.
//! 3. Outcomes can be disputed a bounded number of times; each dispute
//!    restarts the round under a fresh epoch.
//! 4. An approved job is posted, a seller is assigned, work is submitted,
//!    and a structurally identical completion round runs.
//! 5. On final approval the seller claims the escrow; on denial, removal, or
//!    timeout the buyer is refunded. `validate_job` drives any stale job to
//!    a terminal state, so every job terminates even with no further voters.
//!
//! All waiting is expressed as call-time clock comparisons; no operation
//! blocks, and each call commits or fails atomically.

pub mod config;
pub mod engine;
pub mod error;
pub mod escrow;
pub mod market;
pub mod registry;
pub mod types;

pub use config::{CompletionPolicy, EarlyFinalize, MarketParams};
pub use error::{MarketError, Result};
pub use market::Marketplace;
pub use types::{EscrowState, Job, JobDraft, JobStatus, RoundPhase, VoteRound};
