//! Stamp ledger: granting stamps, redeeming rewards, passcode resets.
//!
//! All staff-initiated actions on a customer account live here, keyed by
//! username because that is what staff read off the customer's screen.

use thiserror::Error;
use tracing::info;

use punchcard_core::{RewardProgress, Username};

use crate::db::{AccountStore, RepositoryError};
use crate::models::account::Account;
use crate::services::auth::{self, AuthError, CredentialVerifier};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No account with that username or ID.
    #[error("no such account")]
    NotFound,

    /// Redeeming would drive the stamp counter negative.
    #[error("not enough stamps for a reward")]
    InsufficientStamps,

    /// Replacement passcode failed validation.
    #[error("{0}")]
    WeakPasscode(String),

    /// Underlying store failure.
    #[error(transparent)]
    Repository(RepositoryError),

    /// Passcode hashing failed.
    #[error("failed to hash passcode")]
    PasscodeHash,
}

impl From<RepositoryError> for LedgerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Ledger service over an account store.
pub struct LedgerService<'a> {
    store: &'a dyn AccountStore,
    verifier: &'a CredentialVerifier,
    stamps_for_reward: u32,
}

impl<'a> LedgerService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn AccountStore,
        verifier: &'a CredentialVerifier,
        stamps_for_reward: u32,
    ) -> Self {
        Self {
            store,
            verifier,
            stamps_for_reward,
        }
    }

    /// Stamps required to unlock one reward.
    #[must_use]
    pub const fn stamps_for_reward(&self) -> u32 {
        self.stamps_for_reward
    }

    /// Grant one stamp to the named account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if no such account exists.
    pub async fn add_stamp(&self, username: &Username) -> Result<Account, LedgerError> {
        let account = self.lookup(username).await?;
        let updated = self.store.apply_counter_delta(account.id, 1, 0).await?;
        info!(account_id = %updated.id, stamps = updated.stamps, "granted stamp");
        Ok(updated)
    }

    /// Exchange stamps for one reward on the named account.
    ///
    /// Deducts [`Self::stamps_for_reward`] stamps and credits one reward as
    /// a single atomic mutation, so concurrent redeems of the same balance
    /// cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if no such account exists and
    /// `LedgerError::InsufficientStamps` if the balance is below the goal.
    pub async fn redeem(&self, username: &Username) -> Result<Account, LedgerError> {
        let account = self.lookup(username).await?;
        let goal = i64::from(self.stamps_for_reward);
        if account.stamps < goal {
            return Err(LedgerError::InsufficientStamps);
        }

        let updated = self
            .store
            .apply_counter_delta(account.id, -goal, 1)
            .await
            .map_err(|err| match err {
                // Losing the race to another redeem looks exactly like having
                // too few stamps, because by then it's true.
                RepositoryError::InvalidDelta => LedgerError::InsufficientStamps,
                other => other.into(),
            })?;

        info!(account_id = %updated.id, rewards = updated.rewards, "redeemed reward");
        Ok(updated)
    }

    /// Current balance and progress for the card page.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if no such account exists.
    pub async fn progress(
        &self,
        id: punchcard_core::AccountId,
    ) -> Result<(Account, RewardProgress), LedgerError> {
        let account = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(LedgerError::NotFound)?;
        let progress = account.progress(self.stamps_for_reward);
        Ok((account, progress))
    }

    /// Replace the named account's passcode.
    ///
    /// The old passcode stops working only once the new one is fully
    /// validated and hashed; a rejected replacement changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::WeakPasscode` if the new passcode fails
    /// validation and `LedgerError::NotFound` if no such account exists.
    pub async fn reset_passcode(
        &self,
        username: &Username,
        new_passcode: &str,
    ) -> Result<Account, LedgerError> {
        match auth::validate_passcode(new_passcode) {
            Ok(()) => {}
            Err(AuthError::WeakPasscode(msg)) => return Err(LedgerError::WeakPasscode(msg)),
            Err(_) => return Err(LedgerError::PasscodeHash),
        }

        let account = self.lookup(username).await?;
        let hash = self
            .verifier
            .hash(new_passcode)
            .map_err(|_| LedgerError::PasscodeHash)?;

        let updated = self.store.set_passcode_hash(account.id, &hash).await?;
        info!(account_id = %updated.id, "reset passcode");
        Ok(updated)
    }

    async fn lookup(&self, username: &Username) -> Result<Account, LedgerError> {
        self.store
            .get_by_username(username)
            .await?
            .ok_or(LedgerError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::HashingConfig;
    use crate::db::MemoryAccountStore;

    use super::*;

    fn fast_verifier() -> CredentialVerifier {
        CredentialVerifier::new(&HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("valid params")
    }

    fn username(s: &str) -> Username {
        Username::parse(s).expect("valid username")
    }

    async fn seeded_store(name: &str, stamps: i64) -> MemoryAccountStore {
        let store = MemoryAccountStore::new();
        let account = store.create(&username(name), "hash").await.unwrap();
        if stamps > 0 {
            store
                .apply_counter_delta(account.id, stamps, 0)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn add_stamp_increments_by_one() {
        let store = seeded_store("maria", 0).await;
        let verifier = fast_verifier();
        let ledger = LedgerService::new(&store, &verifier, 6);

        let account = ledger.add_stamp(&username("maria")).await.unwrap();
        assert_eq!(account.stamps, 1);

        let account = ledger.add_stamp(&username("maria")).await.unwrap();
        assert_eq!(account.stamps, 2);
    }

    #[tokio::test]
    async fn add_stamp_unknown_account_is_not_found() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let ledger = LedgerService::new(&store, &verifier, 6);

        let err = ledger.add_stamp(&username("ghost")).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound));
    }

    #[tokio::test]
    async fn redeem_exchanges_goal_stamps_for_one_reward() {
        let store = seeded_store("maria", 7).await;
        let verifier = fast_verifier();
        let ledger = LedgerService::new(&store, &verifier, 6);

        let account = ledger.redeem(&username("maria")).await.unwrap();
        assert_eq!(account.stamps, 1);
        assert_eq!(account.rewards, 1);
    }

    #[tokio::test]
    async fn redeem_below_goal_is_rejected_without_mutation() {
        let store = seeded_store("maria", 5).await;
        let verifier = fast_verifier();
        let ledger = LedgerService::new(&store, &verifier, 6);

        let err = ledger.redeem(&username("maria")).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStamps));

        let account = store
            .get_by_username(&username("maria"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.stamps, 5);
        assert_eq!(account.rewards, 0);
    }

    #[tokio::test]
    async fn concurrent_redeems_of_exact_balance_yield_one_reward() {
        let store = seeded_store("maria", 6).await;
        let verifier = fast_verifier();
        let ledger = LedgerService::new(&store, &verifier, 6);

        let name = username("maria");
        let (a, b) = tokio::join!(ledger.redeem(&name), ledger.redeem(&name));

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one redeem should win");
        for result in [a, b] {
            if let Err(err) = result {
                assert!(matches!(err, LedgerError::InsufficientStamps));
            }
        }

        let account = store.get_by_username(&name).await.unwrap().unwrap();
        assert_eq!(account.stamps, 0);
        assert_eq!(account.rewards, 1);
    }

    #[tokio::test]
    async fn progress_reflects_custom_goal() {
        let store = seeded_store("maria", 8).await;
        let verifier = fast_verifier();
        let ledger = LedgerService::new(&store, &verifier, 10);

        let account = store
            .get_by_username(&username("maria"))
            .await
            .unwrap()
            .unwrap();
        let (_, progress) = ledger.progress(account.id).await.unwrap();
        assert_eq!(progress.stamps_to_next, 2);
        assert!(!progress.unlocked);
    }

    #[tokio::test]
    async fn reset_passcode_replaces_credential() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let old_hash = verifier.hash("1234").unwrap();
        store.create(&username("maria"), &old_hash).await.unwrap();

        let ledger = LedgerService::new(&store, &verifier, 6);
        ledger
            .reset_passcode(&username("maria"), "5678")
            .await
            .unwrap();

        let (_, hash) = store
            .get_passcode_hash(&username("maria"))
            .await
            .unwrap()
            .unwrap();
        assert!(verifier.verify("5678", &hash));
        assert!(!verifier.verify("1234", &hash));
    }

    #[tokio::test]
    async fn weak_reset_leaves_old_passcode_working() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let old_hash = verifier.hash("1234").unwrap();
        store.create(&username("maria"), &old_hash).await.unwrap();

        let ledger = LedgerService::new(&store, &verifier, 6);
        let err = ledger
            .reset_passcode(&username("maria"), "123")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::WeakPasscode(_)));

        let (_, hash) = store
            .get_passcode_hash(&username("maria"))
            .await
            .unwrap()
            .unwrap();
        assert!(verifier.verify("1234", &hash));
    }
}
