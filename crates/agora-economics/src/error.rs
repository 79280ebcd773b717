use agora_types::TokenAmount;
use thiserror::Error;

/// Ledger operation result type
pub type Result<T> = std::result::Result<T, EconomicsError>;

/// Ledger errors
#[derive(Debug, Clone, Error)]
pub enum EconomicsError {
    #[error("Insufficient balance: has {available}, needs {required}")]
    InsufficientBalance {
        required: TokenAmount,
        available: TokenAmount,
    },

    #[error("Insufficient allowance: approved {approved}, needs {required}")]
    InsufficientAllowance {
        required: TokenAmount,
        approved: TokenAmount,
    },

    #[error("Cannot transfer to same address")]
    SelfTransfer,

    #[error("Balance overflow for {0}")]
    BalanceOverflow(String),
}
