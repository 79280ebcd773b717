use crate::error::{EconomicsError, Result};
use agora_types::{AccountAddress, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// The two token classes the marketplace settles in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    /// Job payments and escrow.
    Payment,
    /// Agent staking and slashing.
    Stake,
}

#[derive(Default)]
struct LedgerBooks {
    balances: HashMap<(Token, AccountAddress), TokenAmount>,
    // (token, owner, spender) -> remaining approval
    allowances: HashMap<(Token, AccountAddress, AccountAddress), TokenAmount>,
}

/// In-memory dual-token ledger.
///
/// Every operation commits or fails atomically under one write lock; callers
/// never observe a half-applied transfer.
pub struct TokenLedger {
    books: Arc<RwLock<LedgerBooks>>,
}

impl Default for TokenLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenLedger {
    pub fn new() -> Self {
        Self {
            books: Arc::new(RwLock::new(LedgerBooks::default())),
        }
    }

    pub async fn balance_of(&self, token: Token, address: AccountAddress) -> TokenAmount {
        let books = self.books.read().await;
        books
            .balances
            .get(&(token, address))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    pub async fn allowance_of(
        &self,
        token: Token,
        owner: AccountAddress,
        spender: AccountAddress,
    ) -> TokenAmount {
        let books = self.books.read().await;
        books
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Mint new tokens to an account. Host-side fixture operation.
    pub async fn credit(
        &self,
        token: Token,
        address: AccountAddress,
        amount: TokenAmount,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let mut books = self.books.write().await;
        let balance = books
            .balances
            .entry((token, address))
            .or_insert(TokenAmount::ZERO);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| EconomicsError::BalanceOverflow(address.to_string()))?;

        info!(
            address = %address,
            token = ?token,
            amount = %amount,
            balance_after = %*balance,
            "💰 Balance credited"
        );
        Ok(())
    }

    /// Remove tokens from an account.
    pub async fn debit(
        &self,
        token: Token,
        address: AccountAddress,
        amount: TokenAmount,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let mut books = self.books.write().await;
        Self::debit_inner(&mut books, token, address, amount)?;

        info!(
            address = %address,
            token = ?token,
            amount = %amount,
            "💸 Balance debited"
        );
        Ok(())
    }

    pub async fn transfer(
        &self,
        token: Token,
        from: AccountAddress,
        to: AccountAddress,
        amount: TokenAmount,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        if from == to {
            return Err(EconomicsError::SelfTransfer);
        }

        let mut books = self.books.write().await;
        Self::transfer_inner(&mut books, token, from, to, amount)?;

        info!(
            from = %from,
            to = %to,
            token = ?token,
            amount = %amount,
            "💸 Transfer executed"
        );
        Ok(())
    }

    /// Authorize a spender to move up to `amount` of the owner's tokens.
    /// Overwrites any previous approval for the pair.
    pub async fn approve(
        &self,
        token: Token,
        owner: AccountAddress,
        spender: AccountAddress,
        amount: TokenAmount,
    ) {
        let mut books = self.books.write().await;
        books.allowances.insert((token, owner, spender), amount);

        debug!(
            owner = %owner,
            spender = %spender,
            token = ?token,
            amount = %amount,
            "Allowance set"
        );
    }

    /// Move tokens on behalf of `from`, consuming the spender's allowance.
    pub async fn transfer_from(
        &self,
        token: Token,
        spender: AccountAddress,
        from: AccountAddress,
        to: AccountAddress,
        amount: TokenAmount,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        if from == to {
            return Err(EconomicsError::SelfTransfer);
        }

        let mut books = self.books.write().await;

        let approved = books
            .allowances
            .get(&(token, from, spender))
            .copied()
            .unwrap_or(TokenAmount::ZERO);
        if approved < amount {
            return Err(EconomicsError::InsufficientAllowance {
                required: amount,
                approved,
            });
        }

        // Balance check happens before the allowance is consumed so a failed
        // transfer leaves the approval intact.
        Self::transfer_inner(&mut books, token, from, to, amount)?;
        books
            .allowances
            .insert((token, from, spender), approved.saturating_sub(amount));

        info!(
            spender = %spender,
            from = %from,
            to = %to,
            token = ?token,
            amount = %amount,
            "💸 Delegated transfer executed"
        );
        Ok(())
    }

    fn debit_inner(
        books: &mut LedgerBooks,
        token: Token,
        address: AccountAddress,
        amount: TokenAmount,
    ) -> Result<()> {
        let balance = books
            .balances
            .entry((token, address))
            .or_insert(TokenAmount::ZERO);
        let new_balance =
            balance
                .checked_sub(amount)
                .ok_or(EconomicsError::InsufficientBalance {
                    required: amount,
                    available: *balance,
                })?;
        *balance = new_balance;
        Ok(())
    }

    fn transfer_inner(
        books: &mut LedgerBooks,
        token: Token,
        from: AccountAddress,
        to: AccountAddress,
        amount: TokenAmount,
    ) -> Result<()> {
        let from_balance = books
            .balances
            .get(&(token, from))
            .copied()
            .unwrap_or(TokenAmount::ZERO);
        if from_balance < amount {
            return Err(EconomicsError::InsufficientBalance {
                required: amount,
                available: from_balance,
            });
        }

        let to_balance = books
            .balances
            .get(&(token, to))
            .copied()
            .unwrap_or(TokenAmount::ZERO);
        let new_to_balance = to_balance
            .checked_add(amount)
            .ok_or_else(|| EconomicsError::BalanceOverflow(to.to_string()))?;

        books
            .balances
            .insert((token, from), from_balance.saturating_sub(amount));
        books.balances.insert((token, to), new_to_balance);
        Ok(())
    }
}

impl Clone for TokenLedger {
    fn clone(&self) -> Self {
        Self {
            books: Arc::clone(&self.books),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_credit_and_debit() {
        let ledger = TokenLedger::new();
        let addr = AccountAddress::from_bytes([1; 32]);

        ledger
            .credit(Token::Payment, addr, TokenAmount::from_tokens(100.0))
            .await
            .unwrap();
        assert_eq!(
            ledger.balance_of(Token::Payment, addr).await,
            TokenAmount::from_tokens(100.0)
        );

        ledger
            .debit(Token::Payment, addr, TokenAmount::from_tokens(30.0))
            .await
            .unwrap();
        assert_eq!(
            ledger.balance_of(Token::Payment, addr).await,
            TokenAmount::from_tokens(70.0)
        );

        // The two token classes do not mix.
        assert_eq!(
            ledger.balance_of(Token::Stake, addr).await,
            TokenAmount::ZERO
        );
    }

    #[tokio::test]
    async fn test_transfer_insufficient_balance() {
        let ledger = TokenLedger::new();
        let from = AccountAddress::from_bytes([1; 32]);
        let to = AccountAddress::from_bytes([2; 32]);

        ledger
            .credit(Token::Payment, from, TokenAmount::from_tokens(10.0))
            .await
            .unwrap();

        let err = ledger
            .transfer(Token::Payment, from, to, TokenAmount::from_tokens(20.0))
            .await
            .unwrap_err();
        assert!(matches!(err, EconomicsError::InsufficientBalance { .. }));

        // Balances untouched after the failed transfer.
        assert_eq!(
            ledger.balance_of(Token::Payment, from).await,
            TokenAmount::from_tokens(10.0)
        );
        assert_eq!(ledger.balance_of(Token::Payment, to).await, TokenAmount::ZERO);
    }

    #[tokio::test]
    async fn test_transfer_to_self_rejected() {
        let ledger = TokenLedger::new();
        let addr = AccountAddress::from_bytes([1; 32]);

        ledger
            .credit(Token::Payment, addr, TokenAmount::from_tokens(10.0))
            .await
            .unwrap();
        let err = ledger
            .transfer(Token::Payment, addr, addr, TokenAmount::from_tokens(1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, EconomicsError::SelfTransfer));
    }

    #[tokio::test]
    async fn test_transfer_from_consumes_allowance() {
        let ledger = TokenLedger::new();
        let owner = AccountAddress::from_bytes([1; 32]);
        let spender = AccountAddress::from_bytes([2; 32]);
        let custody = AccountAddress::market_custody();

        ledger
            .credit(Token::Payment, owner, TokenAmount::from_tokens(100.0))
            .await
            .unwrap();
        ledger
            .approve(Token::Payment, owner, spender, TokenAmount::from_tokens(60.0))
            .await;

        ledger
            .transfer_from(
                Token::Payment,
                spender,
                owner,
                custody,
                TokenAmount::from_tokens(40.0),
            )
            .await
            .unwrap();

        assert_eq!(
            ledger.balance_of(Token::Payment, custody).await,
            TokenAmount::from_tokens(40.0)
        );
        assert_eq!(
            ledger.allowance_of(Token::Payment, owner, spender).await,
            TokenAmount::from_tokens(20.0)
        );

        // Remaining approval no longer covers another 40.
        let err = ledger
            .transfer_from(
                Token::Payment,
                spender,
                owner,
                custody,
                TokenAmount::from_tokens(40.0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EconomicsError::InsufficientAllowance { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_credits() {
        let ledger = TokenLedger::new();
        let addr = AccountAddress::from_bytes([1; 32]);

        let mut handles = vec![];
        for _ in 0..10 {
            let ledger_clone = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger_clone
                    .credit(Token::Stake, addr, TokenAmount::from_tokens(1.0))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // No lost updates under concurrent submission.
        assert_eq!(
            ledger.balance_of(Token::Stake, addr).await,
            TokenAmount::from_tokens(10.0)
        );
    }

    #[tokio::test]
    async fn test_transfer_from_keeps_allowance_on_failed_transfer() {
        let ledger = TokenLedger::new();
        let owner = AccountAddress::from_bytes([1; 32]);
        let spender = AccountAddress::from_bytes([2; 32]);
        let custody = AccountAddress::market_custody();

        ledger
            .credit(Token::Payment, owner, TokenAmount::from_tokens(5.0))
            .await
            .unwrap();
        ledger
            .approve(Token::Payment, owner, spender, TokenAmount::from_tokens(50.0))
            .await;

        let err = ledger
            .transfer_from(
                Token::Payment,
                spender,
                owner,
                custody,
                TokenAmount::from_tokens(10.0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EconomicsError::InsufficientBalance { .. }));
        assert_eq!(
            ledger.allowance_of(Token::Payment, owner, spender).await,
            TokenAmount::from_tokens(50.0)
        );
    }
}
