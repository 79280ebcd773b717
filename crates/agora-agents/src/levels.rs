use crate::error::{AgentError, Result};
use agora_types::TokenAmount;
use serde::{Deserialize, Serialize};

/// Owner-configured stake thresholds, one per level index.
///
/// Thresholds are strictly increasing by index so level derivation stays
/// well-defined: an agent's level is the highest index whose threshold its
/// stake covers, and level 0 when no index qualifies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelSchedule {
    thresholds: Vec<TokenAmount>,
}

impl LevelSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum stake for a level. Levels may be appended one at a
    /// time or overwritten in place; either way strict ordering against the
    /// neighbors is enforced.
    pub fn set(&mut self, index: u8, amount: TokenAmount) -> Result<()> {
        let idx = index as usize;
        if idx > self.thresholds.len() {
            return Err(AgentError::ThresholdGap { index });
        }

        if idx > 0 && amount <= self.thresholds[idx - 1] {
            return Err(AgentError::InvalidOrdering { index, amount });
        }
        if idx + 1 < self.thresholds.len() && amount >= self.thresholds[idx + 1] {
            return Err(AgentError::InvalidOrdering { index, amount });
        }

        if idx == self.thresholds.len() {
            self.thresholds.push(amount);
        } else {
            self.thresholds[idx] = amount;
        }
        Ok(())
    }

    /// Highest level index whose threshold the stake covers.
    pub fn level_for(&self, staked: TokenAmount) -> u8 {
        let mut level = 0;
        for (index, threshold) in self.thresholds.iter().enumerate() {
            if staked >= *threshold {
                level = index as u8;
            } else {
                break;
            }
        }
        level
    }

    pub fn threshold_of(&self, level: u8) -> Option<TokenAmount> {
        self.thresholds.get(level as usize).copied()
    }

    pub fn thresholds(&self) -> &[TokenAmount] {
        &self.thresholds
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_schedule() -> LevelSchedule {
        // The deployment fixture: {0:0, 1:10, 2:100, 3:500, 4:5000, 5:50000}.
        let mut schedule = LevelSchedule::new();
        for (index, tokens) in [0.0, 10.0, 100.0, 500.0, 5000.0, 50000.0]
            .into_iter()
            .enumerate()
        {
            schedule
                .set(index as u8, TokenAmount::from_tokens(tokens))
                .unwrap();
        }
        schedule
    }

    #[test]
    fn test_level_for_reference_schedule() {
        let schedule = reference_schedule();

        assert_eq!(schedule.level_for(TokenAmount::ZERO), 0);
        assert_eq!(schedule.level_for(TokenAmount::from_tokens(9.0)), 0);
        assert_eq!(schedule.level_for(TokenAmount::from_tokens(10.0)), 1);
        assert_eq!(schedule.level_for(TokenAmount::from_tokens(99.0)), 1);
        assert_eq!(schedule.level_for(TokenAmount::from_tokens(100.0)), 2);
        assert_eq!(schedule.level_for(TokenAmount::from_tokens(500.0)), 3);
        assert_eq!(schedule.level_for(TokenAmount::from_tokens(4999.0)), 3);
        assert_eq!(schedule.level_for(TokenAmount::from_tokens(5000.0)), 4);
        assert_eq!(schedule.level_for(TokenAmount::from_tokens(50000.0)), 5);
        // No level 6 configured: more stake stays at the top level.
        assert_eq!(schedule.level_for(TokenAmount::from_tokens(50001.0)), 5);
    }

    #[test]
    fn test_set_rejects_non_increasing() {
        let mut schedule = reference_schedule();

        let err = schedule.set(3, TokenAmount::from_tokens(100.0)).unwrap_err();
        assert!(matches!(err, AgentError::InvalidOrdering { index: 3, .. }));

        let err = schedule
            .set(3, TokenAmount::from_tokens(5000.0))
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidOrdering { index: 3, .. }));

        // In-place overwrite within the neighbors is fine.
        schedule.set(3, TokenAmount::from_tokens(600.0)).unwrap();
        assert_eq!(
            schedule.threshold_of(3),
            Some(TokenAmount::from_tokens(600.0))
        );
    }

    #[test]
    fn test_set_rejects_gap() {
        let mut schedule = LevelSchedule::new();
        schedule.set(0, TokenAmount::ZERO).unwrap();
        let err = schedule.set(2, TokenAmount::from_tokens(10.0)).unwrap_err();
        assert!(matches!(err, AgentError::ThresholdGap { index: 2 }));
    }

    #[test]
    fn test_empty_schedule_is_level_zero() {
        let schedule = LevelSchedule::new();
        assert_eq!(schedule.level_for(TokenAmount::from_tokens(1000.0)), 0);
    }
}
