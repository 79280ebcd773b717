//! Job creation and the buyer/seller lifecycle calls.

use crate::error::{MarketError, Result};
use crate::market::Marketplace;
use crate::types::{Job, JobDraft, JobStatus, VoteRound};
use agora_economics::Token;
use agora_types::AccountAddress;
use tracing::info;

impl Marketplace {
    /// Create a job and immediately open its posting-approval round.
    ///
    /// The payment escrows out of the buyer's balance before the record is
    /// written, so a failed transfer leaves no trace. The buyer must have
    /// approved the marketplace identity for at least `amount`.
    pub async fn create_job(&self, caller: AccountAddress, draft: JobDraft) -> Result<u64> {
        let now = Self::now();

        if draft.amount.is_zero() {
            return Err(MarketError::InvalidAmount);
        }
        if draft.deadline <= now {
            return Err(MarketError::InvalidDeadline);
        }
        if draft.job_type as usize >= self.params.job_types.len() {
            return Err(MarketError::UnknownJobType(draft.job_type));
        }

        let actual = self.agents.level_of(caller).await;
        if actual < draft.required_level {
            return Err(MarketError::InsufficientLevel {
                required: draft.required_level,
                actual,
            });
        }

        let mut table = self.jobs.write().await;

        self.tokens
            .transfer_from(
                Token::Payment,
                self.identity,
                caller,
                self.identity,
                draft.amount,
            )
            .await?;

        let id = table.next_id;
        table.next_id += 1;

        let mut job = Job::new(id, caller, draft, now);
        job.transition_to(JobStatus::Verifying)?;

        info!(
            job_id = id,
            buyer = %caller,
            job_type = %self.params.job_types[job.job_type as usize],
            required_level = job.required_level,
            amount = %job.amount,
            "📋 Job created, posting round open"
        );

        table.jobs.insert(id, job);
        Ok(id)
    }

    /// Buyer picks a seller for a posted job. The seller is set exactly once;
    /// the state machine has no path back to `Posted`.
    pub async fn assign_seller(
        &self,
        caller: AccountAddress,
        job_id: u64,
        seller: AccountAddress,
    ) -> Result<()> {
        let mut table = self.jobs.write().await;
        let job = table
            .jobs
            .get_mut(&job_id)
            .ok_or(MarketError::JobNotFound(job_id))?;

        if job.status != JobStatus::Posted {
            return Err(MarketError::InvalidState {
                operation: "assign_seller",
                status: job.status,
            });
        }
        if caller != job.buyer {
            return Err(MarketError::Unauthorized(
                "only the buyer may assign a seller".to_string(),
            ));
        }
        if seller == job.buyer {
            return Err(MarketError::InvalidSeller);
        }

        job.seller = Some(seller);
        job.transition_to(JobStatus::Inprogressing)?;

        info!(job_id, buyer = %caller, seller = %seller, "🤝 Seller assigned");
        Ok(())
    }

    /// Seller hands the work in. Under the default policy this opens the
    /// completion-approval round; under `DirectComplete` the job completes
    /// and only a buyer dispute reopens it.
    pub async fn submit_completion(
        &self,
        caller: AccountAddress,
        job_id: u64,
        note: String,
    ) -> Result<()> {
        use crate::config::CompletionPolicy;

        let now = Self::now();
        let mut table = self.jobs.write().await;
        let job = table
            .jobs
            .get_mut(&job_id)
            .ok_or(MarketError::JobNotFound(job_id))?;

        if job.status != JobStatus::Inprogressing {
            return Err(MarketError::InvalidState {
                operation: "submit_completion",
                status: job.status,
            });
        }
        if job.seller != Some(caller) {
            return Err(MarketError::Unauthorized(
                "only the assigned seller may submit completion".to_string(),
            ));
        }

        job.submission_note = Some(note);
        match self.params.completion_policy {
            CompletionPolicy::ReviewAlways => {
                job.completion_votes = VoteRound::open(now);
                job.transition_to(JobStatus::VerifyingCompleted)?;
            }
            CompletionPolicy::DirectComplete => {
                // The dispute window for the buyer counts from submission.
                job.completion_votes.resolved_at = Some(now);
                job.transition_to(JobStatus::Completed)?;
            }
        }

        info!(job_id, seller = %caller, status = ?job.status, "📦 Completion submitted");
        Ok(())
    }

    /// Buyer withdraws a job that has no seller yet. Refunds the escrow and
    /// terminates the record.
    pub async fn remove_job(&self, caller: AccountAddress, job_id: u64) -> Result<()> {
        let mut table = self.jobs.write().await;
        let job = table
            .jobs
            .get_mut(&job_id)
            .ok_or(MarketError::JobNotFound(job_id))?;

        if caller != job.buyer {
            return Err(MarketError::Unauthorized(
                "only the buyer may remove the job".to_string(),
            ));
        }
        if job.seller.is_some()
            || !matches!(
                job.status,
                JobStatus::Created | JobStatus::Verifying | JobStatus::Posted
            )
        {
            return Err(MarketError::InvalidState {
                operation: "remove_job",
                status: job.status,
            });
        }

        self.refund_to_buyer(job).await?;
        job.transition_to(JobStatus::Withdrawed)?;

        info!(job_id, buyer = %caller, "🗑️ Job removed by buyer");
        Ok(())
    }
}
