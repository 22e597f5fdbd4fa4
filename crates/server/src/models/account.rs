//! Loyalty account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use punchcard_core::{AccountId, RewardProgress, Username};

/// A customer's loyalty account.
///
/// The passcode hash deliberately lives outside this struct; it is only
/// reachable through `AccountStore::get_passcode_hash`, so accounts can be
/// rendered and serialized without risk of leaking credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub username: Username,
    pub stamps: i64,
    pub rewards: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Progress toward the next reward at the given goal.
    #[must_use]
    pub fn progress(&self, stamps_for_reward: u32) -> RewardProgress {
        let stamps = u32::try_from(self.stamps).unwrap_or(0);
        RewardProgress::for_stamps(stamps, stamps_for_reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(stamps: i64) -> Account {
        Account {
            id: AccountId::new(1),
            username: Username::parse("tester").expect("valid"),
            stamps,
            rewards: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn progress_counts_down_to_goal() {
        let progress = account(4).progress(6);
        assert_eq!(progress.stamps_to_next, 2);
        assert!(!progress.unlocked);
    }

    #[test]
    fn progress_unlocks_at_goal() {
        let progress = account(6).progress(6);
        assert_eq!(progress.stamps_to_next, 0);
        assert!(progress.unlocked);
    }

    #[test]
    fn serialization_never_includes_credentials() {
        let json = serde_json::to_string(&account(2)).expect("serialize");
        assert!(!json.contains("passcode"));
        assert!(!json.contains("hash"));
    }
}
