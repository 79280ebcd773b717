use agora_types::TokenAmount;
use serde::{Deserialize, Serialize};

/// Optional short-circuit for `finalize` before the voting window closes.
///
/// Off by default: the observed deployment finalizes on time alone, so early
/// finalize is an explicit opt-in rather than a guess.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EarlyFinalize {
    /// Minimum ballots cast before the short-circuit is considered.
    pub min_votes: usize,
    /// Winning-side share of cast ballots required, e.g. 0.8.
    pub supermajority: f64,
}

/// What `submit_completion` does with a finished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionPolicy {
    /// Every submission enters a completion-approval round.
    ReviewAlways,
    /// Submissions complete directly; only the buyer may force a review by
    /// disputing the submission.
    DirectComplete,
}

/// Marketplace configuration, constructed once at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketParams {
    /// Seconds a verification round stays open for ballots.
    pub voting_window_secs: i64,
    /// Seconds after a round outcome during which a dispute may reopen it.
    pub dispute_window_secs: i64,
    /// Seconds after which an unresolved round is abandoned and the job
    /// withdraws.
    pub stall_timeout_secs: i64,
    /// Stake taken from each voter on the losing side of a round.
    pub vote_slash: TokenAmount,
    /// Upper bound on dispute re-votes per job, for termination.
    pub max_dispute_rounds: u32,
    /// Optional supermajority short-circuit for `finalize`.
    pub early_finalize: Option<EarlyFinalize>,
    pub completion_policy: CompletionPolicy,
    /// Job categories; jobs reference these by index.
    pub job_types: Vec<String>,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            voting_window_secs: 300,
            dispute_window_secs: 300,
            stall_timeout_secs: 600,
            vote_slash: TokenAmount::from_tokens(10.0),
            max_dispute_rounds: 3,
            early_finalize: None,
            completion_policy: CompletionPolicy::ReviewAlways,
            job_types: default_job_types(),
        }
    }
}

fn default_job_types() -> Vec<String> {
    [
        "Art",
        "Audio Creation",
        "Backend Development",
        "Business Consulting and Project Management",
        "Fiction Writing",
        "Frontend Development",
        "Game Development",
        "Logo Design",
        "Misc Design",
        "Mobile Development",
        "Modeling",
        "Nonfiction Writing",
        "Proofreading",
        "Product Marketing",
        "Social Media Marketing",
        "Search Engine Optimization",
        "Translation",
        "Video and Animation",
        "Web Design",
        "Web Development",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = MarketParams::default();
        assert_eq!(params.voting_window_secs, 300);
        assert!(params.early_finalize.is_none());
        assert_eq!(params.completion_policy, CompletionPolicy::ReviewAlways);
        assert_eq!(params.job_types.len(), 20);
    }
}
