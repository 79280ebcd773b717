use crate::config::MarketParams;
use crate::error::{MarketError, Result};
use crate::types::{Job, JobStatus, RoundPhase};
use agora_agents::AgentLedger;
use agora_economics::TokenLedger;
use agora_types::AccountAddress;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub(crate) struct JobTable {
    pub jobs: HashMap<u64, Job>,
    pub next_id: u64,
}

/// Central coordinator for the task marketplace.
///
/// Owns the job records and wires the agent ledger (levels, slashing) and
/// the token ledger (escrow custody) together. Each operation takes the job
/// table's write lock for its whole duration, so calls are serialized and
/// atomic with respect to one another.
pub struct Marketplace {
    pub(crate) params: MarketParams,
    pub(crate) identity: AccountAddress,
    pub(crate) agents: AgentLedger,
    pub(crate) tokens: TokenLedger,
    pub(crate) jobs: Arc<RwLock<JobTable>>,
}

impl Marketplace {
    pub fn new(params: MarketParams, agents: AgentLedger, tokens: TokenLedger) -> Self {
        Self {
            params,
            identity: AccountAddress::market_custody(),
            agents,
            tokens,
            jobs: Arc::new(RwLock::new(JobTable {
                jobs: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// The identity this marketplace acts under. Register it with
    /// `AgentLedger::set_marketplace` so finalize may slash.
    pub fn identity(&self) -> AccountAddress {
        self.identity
    }

    pub fn params(&self) -> &MarketParams {
        &self.params
    }

    pub async fn job_count(&self) -> usize {
        let table = self.jobs.read().await;
        table.jobs.len()
    }

    pub async fn job_ids(&self) -> Vec<u64> {
        let table = self.jobs.read().await;
        let mut ids: Vec<u64> = table.jobs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub async fn job(&self, job_id: u64) -> Option<Job> {
        let table = self.jobs.read().await;
        table.jobs.get(&job_id).cloned()
    }

    pub async fn status_of(&self, job_id: u64) -> Result<JobStatus> {
        let table = self.jobs.read().await;
        table
            .jobs
            .get(&job_id)
            .map(|job| job.status)
            .ok_or(MarketError::JobNotFound(job_id))
    }

    pub(crate) fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    /// Level and party checks shared by voting and disputing: the buyer never
    /// votes on their own job, and the seller never votes on their own
    /// completion.
    pub(crate) async fn check_voter_eligibility(
        &self,
        job: &Job,
        caller: AccountAddress,
    ) -> Result<()> {
        if caller == job.buyer {
            return Err(MarketError::Unauthorized(
                "the buyer may not vote on their own job".to_string(),
            ));
        }
        if job.phase() == Some(RoundPhase::Completion) && job.seller == Some(caller) {
            return Err(MarketError::Unauthorized(
                "the seller may not vote on their own completion".to_string(),
            ));
        }

        let actual = self.agents.level_of(caller).await;
        if actual < job.required_level {
            return Err(MarketError::InsufficientLevel {
                required: job.required_level,
                actual,
            });
        }
        Ok(())
    }

    #[doc(hidden)]
    pub async fn backdate_job(&self, job_id: u64, secs: i64) {
        // Test support: shift the job's round clocks `secs` into the past.
        let mut table = self.jobs.write().await;
        if let Some(job) = table.jobs.get_mut(&job_id) {
            for round in [&mut job.posting_votes, &mut job.completion_votes] {
                if round.started_at > 0 {
                    round.started_at -= secs;
                }
                if let Some(resolved_at) = round.resolved_at.as_mut() {
                    *resolved_at -= secs;
                }
            }
        }
    }
}
