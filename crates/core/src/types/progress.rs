//! Reward progress computation.
//!
//! Pure arithmetic over the stamp counter; no I/O. The server layers this
//! over whatever goal is configured for the café.

use serde::{Deserialize, Serialize};

/// Default number of stamps required to unlock one reward.
pub const DEFAULT_STAMPS_FOR_REWARD: u32 = 6;

/// How far a customer is from their next free drink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardProgress {
    /// Stamps still needed before the next reward unlocks (0 if unlocked).
    pub stamps_to_next: u32,
    /// Whether a reward can be redeemed right now.
    pub unlocked: bool,
}

impl RewardProgress {
    /// Compute progress for a stamp count against a reward goal.
    ///
    /// `stamps_to_next` saturates at zero once the goal is reached; stamps
    /// beyond the goal keep the card unlocked until a redemption consumes
    /// them.
    #[must_use]
    pub const fn for_stamps(stamps: u32, goal: u32) -> Self {
        Self {
            stamps_to_next: goal.saturating_sub(stamps),
            unlocked: stamps >= goal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_progress() {
        let progress = RewardProgress::for_stamps(4, DEFAULT_STAMPS_FOR_REWARD);
        assert_eq!(progress.stamps_to_next, 2);
        assert!(!progress.unlocked);
    }

    #[test]
    fn test_exactly_at_goal() {
        let progress = RewardProgress::for_stamps(6, DEFAULT_STAMPS_FOR_REWARD);
        assert_eq!(progress.stamps_to_next, 0);
        assert!(progress.unlocked);
    }

    #[test]
    fn test_beyond_goal() {
        let progress = RewardProgress::for_stamps(9, DEFAULT_STAMPS_FOR_REWARD);
        assert_eq!(progress.stamps_to_next, 0);
        assert!(progress.unlocked);
    }

    #[test]
    fn test_zero_stamps() {
        let progress = RewardProgress::for_stamps(0, DEFAULT_STAMPS_FOR_REWARD);
        assert_eq!(progress.stamps_to_next, 6);
        assert!(!progress.unlocked);
    }

    #[test]
    fn test_custom_goal() {
        let progress = RewardProgress::for_stamps(7, 10);
        assert_eq!(progress.stamps_to_next, 3);
        assert!(!progress.unlocked);
    }
}
