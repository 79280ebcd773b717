//! Token balance and allowance ledger.
//!
//! The marketplace moves two classes of value: the payment token that buyers
//! escrow against jobs, and the staking token that backs agent reputation.
//! Both live in one in-memory ledger with debit/credit semantics; persistence
//! and transfer mechanics beyond that are the host environment's concern.

pub mod error;
pub mod ledger;

pub use error::{EconomicsError, Result};
pub use ledger::{Token, TokenLedger};
