#![allow(dead_code)]

use agora_agents::{AgentLedger, SlashPolicy};
use agora_economics::{Token, TokenLedger};
use agora_market::{JobDraft, MarketParams, Marketplace};
use agora_types::{AccountAddress, TokenAmount};

pub const LOCK_SECS: i64 = 1000;

pub fn addr(n: u8) -> AccountAddress {
    AccountAddress::from_bytes([n; 32])
}

/// Zero-length windows so rounds finalize and validate without waiting.
pub fn instant_params() -> MarketParams {
    MarketParams {
        voting_window_secs: 0,
        dispute_window_secs: 0,
        ..MarketParams::default()
    }
}

/// A marketplace wired to a funded agent ledger with the reference level
/// schedule {0:0, 1:10, 2:100, 3:500, 4:5000, 5:50000}.
pub async fn setup(params: MarketParams) -> (Marketplace, AgentLedger, TokenLedger) {
    let tokens = TokenLedger::new();
    let owner = addr(0xAA);
    let agents = AgentLedger::new(owner, LOCK_SECS, SlashPolicy::Burn, tokens.clone());

    for (index, threshold) in [0.0, 10.0, 100.0, 500.0, 5000.0, 50000.0]
        .into_iter()
        .enumerate()
    {
        agents
            .set_level_threshold(owner, index as u8, TokenAmount::from_tokens(threshold))
            .await
            .unwrap();
    }

    let market = Marketplace::new(params, agents.clone(), tokens.clone());
    agents
        .set_marketplace(owner, market.identity())
        .await
        .unwrap();

    (market, agents, tokens)
}

/// Stake `stake` for the agent and give them `payment` approved spending
/// money for job escrow.
pub async fn fund(
    agents: &AgentLedger,
    tokens: &TokenLedger,
    who: AccountAddress,
    stake: f64,
    payment: f64,
) {
    if stake > 0.0 {
        tokens
            .credit(Token::Stake, who, TokenAmount::from_tokens(stake))
            .await
            .unwrap();
        tokens
            .approve(
                Token::Stake,
                who,
                AccountAddress::staking_pool(),
                TokenAmount::from_tokens(stake),
            )
            .await;
        agents
            .deposit(who, TokenAmount::from_tokens(stake))
            .await
            .unwrap();
    }
    if payment > 0.0 {
        tokens
            .credit(Token::Payment, who, TokenAmount::from_tokens(payment))
            .await
            .unwrap();
        tokens
            .approve(
                Token::Payment,
                who,
                AccountAddress::market_custody(),
                TokenAmount::from_tokens(payment),
            )
            .await;
    }
}

pub fn draft(amount: f64, required_level: u8) -> JobDraft {
    JobDraft {
        job_type: 2,
        required_level,
        title: "Backend worker".to_string(),
        description: "Implement the ingestion worker".to_string(),
        accepts_secondary_token: true,
        amount: TokenAmount::from_tokens(amount),
        deadline: chrono::Utc::now().timestamp() + 3600,
    }
}
