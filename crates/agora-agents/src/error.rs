use agora_types::TokenAmount;
use thiserror::Error;

/// Agent ledger result type
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent ledger errors
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Time locked: {remaining_secs}s until withdrawal unlocks")]
    TimeLocked { remaining_secs: i64 },

    #[error("Insufficient stake: has {staked}, needs {required}")]
    InsufficientStake {
        required: TokenAmount,
        staked: TokenAmount,
    },

    #[error("Level thresholds must be strictly increasing: level {index} rejects {amount}")]
    InvalidOrdering { index: u8, amount: TokenAmount },

    #[error("Level threshold gap: level {index} may only extend the schedule by one")]
    ThresholdGap { index: u8 },

    #[error(
        "Partial withdrawal would drop stake below the level {level} threshold {threshold}; \
         withdraw the full stake to give up the level"
    )]
    StakeBelowLevel { level: u8, threshold: TokenAmount },

    #[error("Marketplace identity already registered")]
    MarketplaceAlreadySet,

    #[error(transparent)]
    Economics(#[from] agora_economics::EconomicsError),
}
