use crate::error::{AgentError, Result};
use crate::levels::LevelSchedule;
use agora_economics::{Token, TokenLedger};
use agora_types::{AccountAddress, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Destination of slashed stake, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashPolicy {
    /// Slashed value is burned.
    Burn,
    /// Slashed value is redirected to a sink account.
    Redirect(AccountAddress),
}

/// One staker's record. Created on first deposit (or profile save), never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub address: AccountAddress,
    pub staked: TokenAmount,
    /// Updated on every deposit; the withdrawal lock counts from here.
    pub deposit_timestamp: i64,
    pub display_name: Option<String>,
    pub logo_uri: Option<String>,
}

impl AgentProfile {
    fn new(address: AccountAddress) -> Self {
        Self {
            address,
            staked: TokenAmount::ZERO,
            deposit_timestamp: 0,
            display_name: None,
            logo_uri: None,
        }
    }
}

struct LedgerState {
    stakers: HashMap<AccountAddress, AgentProfile>,
    levels: LevelSchedule,
    /// The only identity allowed to slash. Registered once by the owner.
    marketplace: Option<AccountAddress>,
}

/// Staking ledger deriving each agent's reputation level.
pub struct AgentLedger {
    owner: AccountAddress,
    lock_duration_secs: i64,
    slash_policy: SlashPolicy,
    tokens: TokenLedger,
    state: Arc<RwLock<LedgerState>>,
}

impl AgentLedger {
    pub fn new(
        owner: AccountAddress,
        lock_duration_secs: i64,
        slash_policy: SlashPolicy,
        tokens: TokenLedger,
    ) -> Self {
        Self {
            owner,
            lock_duration_secs,
            slash_policy,
            tokens,
            state: Arc::new(RwLock::new(LedgerState {
                stakers: HashMap::new(),
                levels: LevelSchedule::new(),
                marketplace: None,
            })),
        }
    }

    pub fn owner(&self) -> AccountAddress {
        self.owner
    }

    /// Owner-only: set the minimum stake for a level.
    pub async fn set_level_threshold(
        &self,
        caller: AccountAddress,
        index: u8,
        amount: TokenAmount,
    ) -> Result<()> {
        self.require_owner(caller)?;
        let mut state = self.state.write().await;
        state.levels.set(index, amount)?;

        info!(level = index, threshold = %amount, "Level threshold set");
        Ok(())
    }

    /// Owner-only: register the marketplace identity allowed to slash.
    pub async fn set_marketplace(
        &self,
        caller: AccountAddress,
        marketplace: AccountAddress,
    ) -> Result<()> {
        self.require_owner(caller)?;
        let mut state = self.state.write().await;
        if state.marketplace.is_some() {
            return Err(AgentError::MarketplaceAlreadySet);
        }
        state.marketplace = Some(marketplace);

        info!(marketplace = %marketplace, "Marketplace registered as slasher");
        Ok(())
    }

    /// Stake tokens. The caller must have approved the staking pool for at
    /// least `amount` beforehand; the deposit timestamp resets on every call.
    pub async fn deposit(&self, caller: AccountAddress, amount: TokenAmount) -> Result<()> {
        let mut state = self.state.write().await;

        self.tokens
            .transfer_from(
                Token::Stake,
                AccountAddress::staking_pool(),
                caller,
                AccountAddress::staking_pool(),
                amount,
            )
            .await?;

        let profile = state
            .stakers
            .entry(caller)
            .or_insert_with(|| AgentProfile::new(caller));
        profile.staked = profile.staked.saturating_add(amount);
        profile.deposit_timestamp = chrono::Utc::now().timestamp();

        let level = state.levels.level_for(state.stakers[&caller].staked);
        info!(
            agent = %caller,
            amount = %amount,
            staked = %state.stakers[&caller].staked,
            level = level,
            "🔒 Stake deposited"
        );
        Ok(())
    }

    /// Withdraw staked tokens after the lock elapses. A partial withdrawal
    /// may not drop the remaining stake below the current level's threshold;
    /// withdrawing the full stake is always allowed once unlocked.
    pub async fn withdraw(&self, caller: AccountAddress, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut state = self.state.write().await;

        let (staked, deposited_at) = match state.stakers.get(&caller) {
            Some(profile) => (profile.staked, profile.deposit_timestamp),
            None => (TokenAmount::ZERO, 0),
        };

        let elapsed = chrono::Utc::now().timestamp() - deposited_at;
        if elapsed < self.lock_duration_secs {
            return Err(AgentError::TimeLocked {
                remaining_secs: self.lock_duration_secs - elapsed,
            });
        }
        if amount > staked {
            return Err(AgentError::InsufficientStake {
                required: amount,
                staked,
            });
        }

        let remaining = staked.saturating_sub(amount);
        if !remaining.is_zero() {
            let level = state.levels.level_for(staked);
            if let Some(threshold) = state.levels.threshold_of(level) {
                if remaining < threshold {
                    return Err(AgentError::StakeBelowLevel { level, threshold });
                }
            }
        }

        self.tokens
            .transfer(Token::Stake, AccountAddress::staking_pool(), caller, amount)
            .await?;

        if let Some(profile) = state.stakers.get_mut(&caller) {
            profile.staked = remaining;
        }

        info!(agent = %caller, amount = %amount, staked = %remaining, "🔓 Stake withdrawn");
        Ok(())
    }

    /// Marketplace-only: punitively reduce a voter's stake. The reduction is
    /// capped at the current stake and the amount actually taken is returned.
    pub async fn slash(
        &self,
        caller: AccountAddress,
        target: AccountAddress,
        amount: TokenAmount,
    ) -> Result<TokenAmount> {
        let mut state = self.state.write().await;

        match state.marketplace {
            Some(marketplace) if marketplace == caller => {}
            _ => {
                return Err(AgentError::Unauthorized(format!(
                    "{} is not the registered marketplace",
                    caller
                )))
            }
        }

        let staked = state
            .stakers
            .get(&target)
            .map(|p| p.staked)
            .unwrap_or(TokenAmount::ZERO);
        let slashed = amount.min(staked);
        if slashed.is_zero() {
            return Ok(TokenAmount::ZERO);
        }

        match self.slash_policy {
            SlashPolicy::Burn => {
                self.tokens
                    .debit(Token::Stake, AccountAddress::staking_pool(), slashed)
                    .await?;
            }
            SlashPolicy::Redirect(sink) => {
                self.tokens
                    .transfer(Token::Stake, AccountAddress::staking_pool(), sink, slashed)
                    .await?;
            }
        }

        let mut remaining = TokenAmount::ZERO;
        if let Some(profile) = state.stakers.get_mut(&target) {
            profile.staked = profile.staked.saturating_sub(slashed);
            remaining = profile.staked;
        }

        warn!(
            agent = %target,
            amount = %slashed,
            staked = %remaining,
            policy = ?self.slash_policy,
            "⚔️ Stake slashed"
        );
        Ok(slashed)
    }

    /// Attach a display name and logo to the caller's record.
    pub async fn save_profile(
        &self,
        caller: AccountAddress,
        display_name: String,
        logo_uri: String,
    ) {
        let mut state = self.state.write().await;
        let profile = state
            .stakers
            .entry(caller)
            .or_insert_with(|| AgentProfile::new(caller));
        profile.display_name = Some(display_name);
        profile.logo_uri = Some(logo_uri);
    }

    pub async fn level_of(&self, address: AccountAddress) -> u8 {
        let state = self.state.read().await;
        let staked = state
            .stakers
            .get(&address)
            .map(|p| p.staked)
            .unwrap_or(TokenAmount::ZERO);
        state.levels.level_for(staked)
    }

    pub async fn staked_amount_of(&self, address: AccountAddress) -> TokenAmount {
        let state = self.state.read().await;
        state
            .stakers
            .get(&address)
            .map(|p| p.staked)
            .unwrap_or(TokenAmount::ZERO)
    }

    pub async fn profile_of(&self, address: AccountAddress) -> Option<AgentProfile> {
        let state = self.state.read().await;
        state.stakers.get(&address).cloned()
    }

    pub async fn level_thresholds(&self) -> Vec<TokenAmount> {
        let state = self.state.read().await;
        state.levels.thresholds().to_vec()
    }

    fn require_owner(&self, caller: AccountAddress) -> Result<()> {
        if caller != self.owner {
            return Err(AgentError::Unauthorized(format!(
                "{} is not the ledger owner",
                caller
            )));
        }
        Ok(())
    }

    #[doc(hidden)]
    pub async fn backdate_deposit(&self, address: AccountAddress, secs: i64) {
        // Test support: pretend the last deposit happened `secs` ago.
        let mut state = self.state.write().await;
        if let Some(profile) = state.stakers.get_mut(&address) {
            profile.deposit_timestamp = chrono::Utc::now().timestamp() - secs;
        }
    }
}

impl Clone for AgentLedger {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            lock_duration_secs: self.lock_duration_secs,
            slash_policy: self.slash_policy,
            tokens: self.tokens.clone(),
            state: Arc::clone(&self.state),
        }
    }
}
