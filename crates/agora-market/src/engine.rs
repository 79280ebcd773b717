//! The verification engine: voting rounds, finalize-and-slash, disputes, and
//! the time-based fallback that guarantees every job terminates.
//!
//! The posting and completion phases run the same round algorithm; only the
//! vote-set pair and the target states differ.

use crate::error::{MarketError, Result};
use crate::market::Marketplace;
use crate::types::{JobStatus, VoteRound};
use agora_types::{AccountAddress, TokenAmount};
use tracing::{debug, info};

impl Marketplace {
    /// Cast one approval/denial ballot in the job's open round.
    pub async fn cast_vote(
        &self,
        caller: AccountAddress,
        job_id: u64,
        approve: bool,
    ) -> Result<()> {
        let mut table = self.jobs.write().await;
        let job = table
            .jobs
            .get_mut(&job_id)
            .ok_or(MarketError::JobNotFound(job_id))?;

        if !matches!(
            job.status,
            JobStatus::Verifying | JobStatus::VerifyingCompleted
        ) {
            return Err(MarketError::InvalidState {
                operation: "cast_vote",
                status: job.status,
            });
        }

        self.check_voter_eligibility(job, caller).await?;

        let round = job.current_round_mut();
        if round.has_voted(&caller) {
            return Err(MarketError::AlreadyVoted(caller.to_string()));
        }
        if approve {
            round.validators.insert(caller);
        } else {
            round.deniers.insert(caller);
        }

        debug!(
            job_id,
            voter = %caller,
            approve,
            epoch = round.epoch,
            validators = round.validators.len(),
            deniers = round.deniers.len(),
            "🗳️ Vote cast"
        );
        Ok(())
    }

    /// Resolve the open round: majority advances the job and the losing side
    /// is slashed; a tie counts as denial. Callable by anyone once the window
    /// has elapsed, or earlier when the configured supermajority is reached.
    pub async fn finalize(&self, caller: AccountAddress, job_id: u64) -> Result<JobStatus> {
        let now = Self::now();
        let mut table = self.jobs.write().await;
        let job = table
            .jobs
            .get_mut(&job_id)
            .ok_or(MarketError::JobNotFound(job_id))?;

        let (approved_state, denied_state) = match job.status {
            JobStatus::Verifying => (JobStatus::ValidatedPost, JobStatus::DeniedPost),
            JobStatus::VerifyingCompleted => {
                (JobStatus::ValidatedCompleted, JobStatus::DeniedCompleted)
            }
            _ => {
                return Err(MarketError::InvalidState {
                    operation: "finalize",
                    status: job.status,
                })
            }
        };

        let round = job.current_round();
        let closes_at = round.started_at + self.params.voting_window_secs;
        if now < closes_at && !self.early_finalize_reached(round) {
            return Err(MarketError::VotingNotEnded {
                remaining_secs: closes_at - now,
            });
        }

        let validators = round.validators.len();
        let deniers = round.deniers.len();
        let approved = validators > deniers;
        let losers: Vec<AccountAddress> = if approved {
            round.deniers.iter().copied().collect()
        } else {
            round.validators.iter().copied().collect()
        };

        // Slash the losing side before touching the status. The ledger caps
        // each take at the voter's remaining stake and the authorization
        // check rejects on the first voter, so a failure here cannot leave a
        // half-resolved round behind.
        let mut slashed_total = TokenAmount::ZERO;
        for loser in &losers {
            let taken = self
                .agents
                .slash(self.identity, *loser, self.params.vote_slash)
                .await?;
            slashed_total = slashed_total.saturating_add(taken);
        }

        let next = if approved { approved_state } else { denied_state };
        job.current_round_mut().resolved_at = Some(now);
        job.transition_to(next)?;

        info!(
            job_id,
            caller = %caller,
            validators,
            deniers,
            outcome = ?next,
            slashed_total = %slashed_total,
            "⚖️ Round finalized"
        );
        Ok(next)
    }

    /// Contest a round outcome before the job moves on. Clears the ballots
    /// and reopens the same round under a fresh epoch, up to the configured
    /// dispute cap.
    pub async fn dispute(&self, caller: AccountAddress, job_id: u64) -> Result<()> {
        let now = Self::now();
        let mut table = self.jobs.write().await;
        let job = table
            .jobs
            .get_mut(&job_id)
            .ok_or(MarketError::JobNotFound(job_id))?;

        let completion_phase = match job.status {
            JobStatus::ValidatedPost | JobStatus::DeniedPost => false,
            JobStatus::ValidatedCompleted | JobStatus::DeniedCompleted => true,
            _ => {
                return Err(MarketError::InvalidState {
                    operation: "dispute",
                    status: job.status,
                })
            }
        };

        self.check_voter_eligibility(job, caller).await?;

        if job.dispute_count >= self.params.max_dispute_rounds {
            return Err(MarketError::DisputeLimitReached {
                limit: self.params.max_dispute_rounds,
            });
        }
        job.dispute_count += 1;

        if completion_phase {
            job.transition_to(JobStatus::DisputeCompleted)?;
            job.completion_votes.restart(now);
            job.transition_to(JobStatus::VerifyingCompleted)?;
        } else {
            job.posting_votes.restart(now);
            job.transition_to(JobStatus::Verifying)?;
        }

        info!(
            job_id,
            disputer = %caller,
            dispute_count = job.dispute_count,
            epoch = job.current_round().epoch,
            "🔁 Outcome disputed, round reopened"
        );
        Ok(())
    }

    /// Buyer contests a job that completed without review (DirectComplete
    /// policy), forcing it into a completion-approval round.
    pub async fn dispute_submission(&self, caller: AccountAddress, job_id: u64) -> Result<()> {
        let now = Self::now();
        let mut table = self.jobs.write().await;
        let job = table
            .jobs
            .get_mut(&job_id)
            .ok_or(MarketError::JobNotFound(job_id))?;

        if job.status != JobStatus::Completed {
            return Err(MarketError::InvalidState {
                operation: "dispute_submission",
                status: job.status,
            });
        }
        if caller != job.buyer {
            return Err(MarketError::Unauthorized(
                "only the buyer may dispute the submission".to_string(),
            ));
        }
        if job.dispute_count >= self.params.max_dispute_rounds {
            return Err(MarketError::DisputeLimitReached {
                limit: self.params.max_dispute_rounds,
            });
        }
        job.dispute_count += 1;

        job.transition_to(JobStatus::DisputeCompleted)?;
        job.completion_votes.restart(now);
        job.transition_to(JobStatus::VerifyingCompleted)?;

        info!(job_id, buyer = %caller, "⚠️ Submission disputed by buyer");
        Ok(())
    }

    /// Time-based fallback. Advances a job whose dispute window has closed,
    /// and withdraws a job whose round has sat unresolved past the stall
    /// timeout — so every job reaches a terminal state without further voter
    /// participation.
    pub async fn validate_job(&self, caller: AccountAddress, job_id: u64) -> Result<JobStatus> {
        let now = Self::now();
        let mut table = self.jobs.write().await;
        let job = table
            .jobs
            .get_mut(&job_id)
            .ok_or(MarketError::JobNotFound(job_id))?;

        match job.status {
            JobStatus::ValidatedPost => {
                self.require_dispute_window_closed(job.current_round(), now)?;
                job.transition_to(JobStatus::Posted)?;
            }
            JobStatus::DeniedPost => {
                self.require_dispute_window_closed(job.current_round(), now)?;
                self.refund_to_buyer(job).await?;
                job.transition_to(JobStatus::Withdrawed)?;
            }
            JobStatus::ValidatedCompleted | JobStatus::Completed => {
                self.require_dispute_window_closed(job.current_round(), now)?;
                job.transition_to(JobStatus::Done)?;
            }
            JobStatus::DeniedCompleted => {
                self.require_dispute_window_closed(job.current_round(), now)?;
                self.refund_to_buyer(job).await?;
                job.transition_to(JobStatus::Withdrawed)?;
            }
            JobStatus::Verifying | JobStatus::VerifyingCompleted => {
                let abandoned_at =
                    job.current_round().started_at + self.params.stall_timeout_secs;
                if now < abandoned_at {
                    return Err(MarketError::ValidationPending {
                        remaining_secs: abandoned_at - now,
                    });
                }
                self.refund_to_buyer(job).await?;
                job.transition_to(JobStatus::Withdrawed)?;
            }
            _ => {
                return Err(MarketError::InvalidState {
                    operation: "validate_job",
                    status: job.status,
                })
            }
        }

        info!(job_id, caller = %caller, status = ?job.status, "✅ Job advanced by validation");
        Ok(job.status)
    }

    fn early_finalize_reached(&self, round: &VoteRound) -> bool {
        match self.params.early_finalize {
            Some(knob) => {
                let total = round.total_votes();
                if total == 0 || total < knob.min_votes {
                    return false;
                }
                let leading = round.validators.len().max(round.deniers.len());
                (leading as f64 / total as f64) >= knob.supermajority
            }
            None => false,
        }
    }

    fn require_dispute_window_closed(&self, round: &VoteRound, now: i64) -> Result<()> {
        let resolved_at = round.resolved_at.unwrap_or(round.started_at);
        let closes_at = resolved_at + self.params.dispute_window_secs;
        if now < closes_at {
            return Err(MarketError::ValidationPending {
                remaining_secs: closes_at - now,
            });
        }
        Ok(())
    }
}
