use serde::{Deserialize, Serialize};
use std::fmt;

/// A participant identity as supplied by the host environment.
///
/// The host is responsible for authenticating callers; the marketplace only
/// ever sees the resulting 32-byte address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Custody account holding escrowed job payments.
    pub fn market_custody() -> Self {
        let mut bytes = [0xEE; 32];
        bytes[0] = 0x01;
        Self(bytes)
    }

    /// Custody account holding staked tokens.
    pub fn staking_pool() -> Self {
        let mut bytes = [0xDD; 32];
        bytes[0] = 0x02;
        Self(bytes)
    }

    /// Burn sink. Tokens sent here are unrecoverable.
    pub fn burn_sink() -> Self {
        Self([0x00; 32])
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let addr = AccountAddress::from_bytes([7; 32]);
        let hex = addr.to_hex();
        assert_eq!(AccountAddress::from_hex(&hex).unwrap(), addr);
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(AccountAddress::from_hex("0707").is_err());
    }

    #[test]
    fn test_well_known_accounts_are_distinct() {
        assert_ne!(AccountAddress::market_custody(), AccountAddress::staking_pool());
        assert_ne!(AccountAddress::market_custody(), AccountAddress::burn_sink());
        assert_ne!(AccountAddress::staking_pool(), AccountAddress::burn_sink());
    }
}
