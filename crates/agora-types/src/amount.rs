use serde::{Deserialize, Serialize};
use std::fmt;

pub const TOKEN_DECIMALS: u32 = 9;
pub const TOKEN_BASE_UNIT: u64 = 1_000_000_000; // 10^9

/// A token value in minor units.
///
/// Both the payment and the staking token use the same precision, so a single
/// amount type serves both ledgers. Arithmetic never wraps: callers pick
/// `checked_*` when overflow is an error and `saturating_*` when clamping is
/// the intended behavior.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TokenAmount(u64);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn from_tokens(tokens: f64) -> Self {
        Self((tokens * TOKEN_BASE_UNIT as f64) as u64)
    }

    pub fn from_base_units(units: u64) -> Self {
        Self(units)
    }

    pub fn to_tokens(&self) -> f64 {
        self.0 as f64 / TOKEN_BASE_UNIT as f64
    }

    pub fn to_base_units(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn min(&self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9}", self.to_tokens())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_conversion() {
        let amount = TokenAmount::from_tokens(12.5);
        assert_eq!(amount.to_base_units(), 12_500_000_000);
        assert_eq!(amount.to_tokens(), 12.5);
    }

    #[test]
    fn test_checked_sub_underflow() {
        let a = TokenAmount::from_tokens(1.0);
        let b = TokenAmount::from_tokens(2.0);
        assert_eq!(a.checked_sub(b), None);
        assert_eq!(a.saturating_sub(b), TokenAmount::ZERO);
    }

    #[test]
    fn test_checked_add_overflow() {
        let a = TokenAmount::from_base_units(u64::MAX);
        assert_eq!(a.checked_add(TokenAmount::from_base_units(1)), None);
    }

    #[test]
    fn test_ordering() {
        assert!(TokenAmount::from_tokens(1.0) < TokenAmount::from_tokens(2.0));
        assert!(TokenAmount::ZERO.is_zero());
    }
}
