use crate::error::{MarketError, Result};
use agora_types::{AccountAddress, LifecycleState, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Job lifecycle status.
///
/// `Withdrawed` is the terminal state. `Done` permits exactly one further
/// transition: the seller's escrow claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Record created; immediately enters the posting round.
    Created,
    /// Posting-approval round open for ballots.
    Verifying,
    /// Posting approved by vote; awaiting the dispute window.
    ValidatedPost,
    /// Posting denied by vote; awaiting the dispute window.
    DeniedPost,
    /// Open for seller assignment.
    Posted,
    /// Seller assigned, work underway.
    Inprogressing,
    /// Work submitted and completed without review (policy-dependent).
    Completed,
    /// Completion-approval round open for ballots.
    VerifyingCompleted,
    /// Completion approved by vote; awaiting the dispute window.
    ValidatedCompleted,
    /// Completion denied by vote; awaiting the dispute window.
    DeniedCompleted,
    /// Completion outcome disputed; the round is about to reopen.
    DisputeCompleted,
    /// Finally approved; escrow claimable by the seller.
    Done,
    /// Escrow disbursed (to either side); no further mutation.
    Withdrawed,
}

impl LifecycleState for JobStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Withdrawed)
    }

    fn can_transition_to(&self, next: &Self) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Created, Verifying) => true,
            (Created, Withdrawed) => true, // buyer removal

            (Verifying, ValidatedPost) => true,
            (Verifying, DeniedPost) => true,
            (Verifying, Withdrawed) => true, // buyer removal or stalled round

            (ValidatedPost, Posted) => true,
            (ValidatedPost, Verifying) => true, // dispute re-vote
            (DeniedPost, Withdrawed) => true,   // posting denial is final
            (DeniedPost, Verifying) => true,    // dispute re-vote

            (Posted, Inprogressing) => true,
            (Posted, Withdrawed) => true, // buyer removal

            (Inprogressing, VerifyingCompleted) => true,
            (Inprogressing, Completed) => true, // DirectComplete policy

            (Completed, DisputeCompleted) => true, // buyer contests
            (Completed, Done) => true,             // undisputed

            (VerifyingCompleted, ValidatedCompleted) => true,
            (VerifyingCompleted, DeniedCompleted) => true,
            (VerifyingCompleted, Withdrawed) => true, // stalled round

            (ValidatedCompleted, Done) => true,
            (ValidatedCompleted, DisputeCompleted) => true,
            (DeniedCompleted, Withdrawed) => true,
            (DeniedCompleted, DisputeCompleted) => true,

            (DisputeCompleted, VerifyingCompleted) => true,

            (Done, Withdrawed) => true, // escrow claim

            _ => false,
        }
    }
}

/// Which verification phase a round belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Posting,
    Completion,
}

/// One voting cycle. Disputes restart the cycle under a fresh epoch instead
/// of mutating the old ballots in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRound {
    pub epoch: u32,
    pub started_at: i64,
    pub validators: HashSet<AccountAddress>,
    pub deniers: HashSet<AccountAddress>,
    /// Set by finalize; the dispute window counts from here.
    pub resolved_at: Option<i64>,
}

impl VoteRound {
    pub fn idle() -> Self {
        Self {
            epoch: 0,
            started_at: 0,
            validators: HashSet::new(),
            deniers: HashSet::new(),
            resolved_at: None,
        }
    }

    pub fn open(now: i64) -> Self {
        Self {
            epoch: 0,
            started_at: now,
            validators: HashSet::new(),
            deniers: HashSet::new(),
            resolved_at: None,
        }
    }

    /// Reopen after a dispute: ballots cleared, epoch bumped.
    pub fn restart(&mut self, now: i64) {
        self.epoch += 1;
        self.started_at = now;
        self.validators.clear();
        self.deniers.clear();
        self.resolved_at = None;
    }

    pub fn has_voted(&self, agent: &AccountAddress) -> bool {
        self.validators.contains(agent) || self.deniers.contains(agent)
    }

    pub fn total_votes(&self) -> usize {
        self.validators.len() + self.deniers.len()
    }
}

/// Where the escrowed payment currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowState {
    /// Held in market custody.
    Held,
    /// Returned to the buyer.
    Refunded,
    /// Paid out to the seller.
    Released,
}

/// Buyer-supplied fields for a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDraft {
    pub job_type: u32,
    pub required_level: u8,
    pub title: String,
    pub description: String,
    pub accepts_secondary_token: bool,
    pub amount: TokenAmount,
    pub deadline: i64,
}

/// A job record. Created by the buyer, mutated only through the marketplace
/// operations, terminal in `Withdrawed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub buyer: AccountAddress,
    pub job_type: u32,
    pub required_level: u8,
    pub title: String,
    pub description: String,
    pub accepts_secondary_token: bool,
    pub amount: TokenAmount,
    pub deadline: i64,
    pub status: JobStatus,
    /// Set exactly once, at assignment.
    pub seller: Option<AccountAddress>,
    pub posting_votes: VoteRound,
    pub completion_votes: VoteRound,
    pub dispute_count: u32,
    pub escrow: EscrowState,
    pub submission_note: Option<String>,
    pub created_at: i64,
}

impl Job {
    pub fn new(id: u64, buyer: AccountAddress, draft: JobDraft, now: i64) -> Self {
        Self {
            id,
            buyer,
            job_type: draft.job_type,
            required_level: draft.required_level,
            title: draft.title,
            description: draft.description,
            accepts_secondary_token: draft.accepts_secondary_token,
            amount: draft.amount,
            deadline: draft.deadline,
            status: JobStatus::Created,
            seller: None,
            posting_votes: VoteRound::open(now),
            completion_votes: VoteRound::idle(),
            dispute_count: 0,
            escrow: EscrowState::Held,
            submission_note: None,
            created_at: now,
        }
    }

    /// Move to a new status with FSM validation. Every status write goes
    /// through here; a rejected transition leaves the record untouched.
    pub fn transition_to(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(&next) {
            return Err(MarketError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        tracing::debug!(
            job_id = self.id,
            from = ?self.status,
            to = ?next,
            "Job state transition"
        );

        self.status = next;
        Ok(())
    }

    /// The verification phase the job is currently in, if any.
    pub fn phase(&self) -> Option<RoundPhase> {
        use JobStatus::*;
        match self.status {
            Verifying | ValidatedPost | DeniedPost => Some(RoundPhase::Posting),
            Completed | VerifyingCompleted | ValidatedCompleted | DeniedCompleted
            | DisputeCompleted => Some(RoundPhase::Completion),
            _ => None,
        }
    }

    pub fn current_round(&self) -> &VoteRound {
        match self.phase() {
            Some(RoundPhase::Completion) => &self.completion_votes,
            _ => &self.posting_votes,
        }
    }

    pub fn current_round_mut(&mut self) -> &mut VoteRound {
        match self.phase() {
            Some(RoundPhase::Completion) => &mut self.completion_votes,
            _ => &mut self.posting_votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> JobDraft {
        JobDraft {
            job_type: 2,
            required_level: 1,
            title: "Index rebuild".to_string(),
            description: "Rebuild the search index".to_string(),
            accepts_secondary_token: false,
            amount: TokenAmount::from_tokens(40.0),
            deadline: 2_000_000_000,
        }
    }

    #[test]
    fn test_fsm_happy_path() {
        use JobStatus::*;
        let mut job = Job::new(0, AccountAddress::from_bytes([1; 32]), draft(), 1000);

        for next in [
            Verifying,
            ValidatedPost,
            Posted,
            Inprogressing,
            VerifyingCompleted,
            ValidatedCompleted,
            Done,
            Withdrawed,
        ] {
            job.transition_to(next).unwrap();
        }
        assert!(job.status.is_terminal());
    }

    #[test]
    fn test_fsm_rejects_skips() {
        use JobStatus::*;
        let mut job = Job::new(0, AccountAddress::from_bytes([1; 32]), draft(), 1000);
        job.transition_to(Verifying).unwrap();

        // Cannot jump straight to Posted or Done.
        assert!(job.transition_to(Posted).is_err());
        assert!(job.transition_to(Done).is_err());
        assert_eq!(job.status, Verifying);
    }

    #[test]
    fn test_fsm_terminal_is_final() {
        use JobStatus::*;
        let mut job = Job::new(0, AccountAddress::from_bytes([1; 32]), draft(), 1000);
        job.transition_to(Verifying).unwrap();
        job.transition_to(Withdrawed).unwrap();

        for next in [Created, Verifying, Posted, Done] {
            assert!(job.transition_to(next).is_err());
        }
    }

    #[test]
    fn test_fsm_dispute_cycle() {
        use JobStatus::*;
        assert!(ValidatedPost.can_transition_to(&Verifying));
        assert!(DeniedPost.can_transition_to(&Verifying));
        assert!(ValidatedCompleted.can_transition_to(&DisputeCompleted));
        assert!(DeniedCompleted.can_transition_to(&DisputeCompleted));
        assert!(DisputeCompleted.can_transition_to(&VerifyingCompleted));
        // But a posting outcome never reaches the completion dispute path.
        assert!(!ValidatedPost.can_transition_to(&DisputeCompleted));
    }

    #[test]
    fn test_round_restart_bumps_epoch_and_clears() {
        let mut round = VoteRound::open(1000);
        round.validators.insert(AccountAddress::from_bytes([1; 32]));
        round.deniers.insert(AccountAddress::from_bytes([2; 32]));
        round.resolved_at = Some(1300);

        round.restart(1400);
        assert_eq!(round.epoch, 1);
        assert_eq!(round.total_votes(), 0);
        assert_eq!(round.started_at, 1400);
        assert!(round.resolved_at.is_none());
    }

    #[test]
    fn test_phase_mapping() {
        let mut job = Job::new(0, AccountAddress::from_bytes([1; 32]), draft(), 1000);
        assert_eq!(job.phase(), None);
        job.transition_to(JobStatus::Verifying).unwrap();
        assert_eq!(job.phase(), Some(RoundPhase::Posting));
        job.transition_to(JobStatus::ValidatedPost).unwrap();
        job.transition_to(JobStatus::Posted).unwrap();
        assert_eq!(job.phase(), None);
        job.transition_to(JobStatus::Inprogressing).unwrap();
        job.transition_to(JobStatus::VerifyingCompleted).unwrap();
        assert_eq!(job.phase(), Some(RoundPhase::Completion));
    }
}
