//! Escrow settlement: exactly-once disbursement of the job payment.

use crate::error::{MarketError, Result};
use crate::market::Marketplace;
use crate::types::{EscrowState, Job, JobStatus};
use agora_economics::Token;
use agora_types::AccountAddress;
use tracing::info;

impl Marketplace {
    /// Seller collects the payment of a finally-approved job. Callable once;
    /// the job terminates in `Withdrawed`.
    pub async fn claim_escrow(&self, caller: AccountAddress, job_id: u64) -> Result<()> {
        let mut table = self.jobs.write().await;
        let job = table
            .jobs
            .get_mut(&job_id)
            .ok_or(MarketError::JobNotFound(job_id))?;

        if job.status != JobStatus::Done {
            return Err(MarketError::InvalidState {
                operation: "claim_escrow",
                status: job.status,
            });
        }
        if job.seller != Some(caller) {
            return Err(MarketError::Unauthorized(
                "only the assigned seller may claim the escrow".to_string(),
            ));
        }
        if job.escrow != EscrowState::Held {
            return Err(MarketError::AlreadyClaimed);
        }

        // Transfer first: if it fails the job stays in Done with the escrow
        // still held, never in a half-settled status.
        self.tokens
            .transfer(Token::Payment, self.identity, caller, job.amount)
            .await?;
        job.escrow = EscrowState::Released;
        job.transition_to(JobStatus::Withdrawed)?;

        info!(job_id, seller = %caller, amount = %job.amount, "💰 Escrow claimed");
        Ok(())
    }

    /// Return the escrow to the buyer, at most once per job.
    pub(crate) async fn refund_to_buyer(&self, job: &mut Job) -> Result<()> {
        if job.escrow != EscrowState::Held {
            return Err(MarketError::AlreadyClaimed);
        }

        self.tokens
            .transfer(Token::Payment, self.identity, job.buyer, job.amount)
            .await?;
        job.escrow = EscrowState::Refunded;

        info!(
            job_id = job.id,
            buyer = %job.buyer,
            amount = %job.amount,
            "🔄 Escrow refunded to buyer"
        );
        Ok(())
    }
}
