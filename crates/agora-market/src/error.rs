use crate::types::JobStatus;
use thiserror::Error;

/// Marketplace result type
pub type Result<T> = std::result::Result<T, MarketError>;

/// Marketplace errors
///
/// Every failure is synchronous and leaves no partial mutation behind; the
/// caller corrects the precondition and re-submits.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient level: required {required}, actual {actual}")]
    InsufficientLevel { required: u8, actual: u8 },

    #[error("Invalid state for {operation}: job is {status:?}")]
    InvalidState {
        operation: &'static str,
        status: JobStatus,
    },

    #[error("Invalid state transition: from {from:?} to {to:?}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Already voted in this round: {0}")]
    AlreadyVoted(String),

    #[error("Seller must differ from the buyer")]
    InvalidSeller,

    #[error("Escrow already disbursed")]
    AlreadyClaimed,

    #[error("Job not found: {0}")]
    JobNotFound(u64),

    #[error("Unknown job type index: {0}")]
    UnknownJobType(u32),

    #[error("Deadline must be in the future")]
    InvalidDeadline,

    #[error("Job amount must be non-zero")]
    InvalidAmount,

    #[error("Voting window still open: {remaining_secs}s remaining")]
    VotingNotEnded { remaining_secs: i64 },

    #[error("Nothing to validate yet: {remaining_secs}s remaining")]
    ValidationPending { remaining_secs: i64 },

    #[error("Dispute limit reached: {limit} rounds")]
    DisputeLimitReached { limit: u32 },

    #[error(transparent)]
    Agents(#[from] agora_agents::AgentError),

    #[error(transparent)]
    Economics(#[from] agora_economics::EconomicsError),
}
