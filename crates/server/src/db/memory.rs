//! In-memory account store for tests and local experimentation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use punchcard_core::{AccountId, Username};

use crate::models::account::Account;

use super::{AccountStore, RepositoryError};

#[derive(Debug, Clone)]
struct StoredAccount {
    username: Username,
    passcode_hash: String,
    stamps: i64,
    rewards: i64,
    created_at: DateTime<Utc>,
}

impl StoredAccount {
    fn to_account(&self, id: i64) -> Account {
        Account {
            id: AccountId::new(id),
            username: self.username.clone(),
            stamps: self.stamps,
            rewards: self.rewards,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    accounts: HashMap<i64, StoredAccount>,
}

/// Account store backed by a mutex-guarded map.
///
/// Mirrors the transactional behavior of the `SQLite` backend: each method
/// holds the lock for its full duration, so mutations are atomic.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    inner: Mutex<Inner>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(
        &self,
        username: &Username,
        passcode_hash: &str,
    ) -> Result<Account, RepositoryError> {
        let mut inner = self.lock();

        if inner.accounts.values().any(|a| a.username == *username) {
            return Err(RepositoryError::Conflict(format!(
                "username '{username}' already exists"
            )));
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let stored = StoredAccount {
            username: username.clone(),
            passcode_hash: passcode_hash.to_owned(),
            stamps: 0,
            rewards: 0,
            created_at: Utc::now(),
        };
        let account = stored.to_account(id);
        inner.accounts.insert(id, stored);

        Ok(account)
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .accounts
            .get(&id.as_i64())
            .map(|a| a.to_account(id.as_i64())))
    }

    async fn get_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .accounts
            .iter()
            .find(|(_, a)| a.username == *username)
            .map(|(id, a)| a.to_account(*id)))
    }

    async fn get_passcode_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .accounts
            .iter()
            .find(|(_, a)| a.username == *username)
            .map(|(id, a)| (a.to_account(*id), a.passcode_hash.clone())))
    }

    async fn apply_counter_delta(
        &self,
        id: AccountId,
        stamps_delta: i64,
        rewards_delta: i64,
    ) -> Result<Account, RepositoryError> {
        let mut inner = self.lock();
        let stored = inner
            .accounts
            .get_mut(&id.as_i64())
            .ok_or(RepositoryError::NotFound)?;

        let stamps = stored.stamps + stamps_delta;
        let rewards = stored.rewards + rewards_delta;
        if stamps < 0 || rewards < 0 {
            return Err(RepositoryError::InvalidDelta);
        }

        stored.stamps = stamps;
        stored.rewards = rewards;
        Ok(stored.to_account(id.as_i64()))
    }

    async fn set_passcode_hash(
        &self,
        id: AccountId,
        passcode_hash: &str,
    ) -> Result<Account, RepositoryError> {
        let mut inner = self.lock();
        let stored = inner
            .accounts
            .get_mut(&id.as_i64())
            .ok_or(RepositoryError::NotFound)?;

        stored.passcode_hash = passcode_hash.to_owned();
        Ok(stored.to_account(id.as_i64()))
    }

    async fn list(&self, query: Option<&str>) -> Result<Vec<Account>, RepositoryError> {
        let filter = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let inner = self.lock();
        let mut accounts: Vec<Account> = inner
            .accounts
            .iter()
            .filter(|(_, a)| {
                filter
                    .as_deref()
                    .is_none_or(|q| a.username.as_ref().contains(q))
            })
            .map(|(id, a)| a.to_account(*id))
            .collect();

        accounts.sort_by(|a, b| {
            b.stamps
                .cmp(&a.stamps)
                .then_with(|| a.username.as_ref().cmp(b.username.as_ref()))
        });

        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn username(s: &str) -> Username {
        Username::parse(s).expect("valid username")
    }

    #[tokio::test]
    async fn create_and_lookup() {
        let store = MemoryAccountStore::new();
        let created = store.create(&username("alice"), "hash").await.unwrap();

        let by_id = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username.as_ref(), "alice");

        let by_name = store
            .get_by_username(&username("ALICE"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemoryAccountStore::new();
        store.create(&username("bob"), "h").await.unwrap();

        let err = store.create(&username("Bob"), "h2").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn delta_floor_is_enforced() {
        let store = MemoryAccountStore::new();
        let account = store.create(&username("carol"), "h").await.unwrap();

        let err = store
            .apply_counter_delta(account.id, -1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidDelta));

        let account = store.get_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(account.stamps, 0);
    }

    #[tokio::test]
    async fn list_matches_sqlite_ordering() {
        let store = MemoryAccountStore::new();
        let a = store.create(&username("zoe"), "h").await.unwrap();
        let b = store.create(&username("amy"), "h").await.unwrap();
        store.apply_counter_delta(b.id, 3, 0).await.unwrap();
        store.apply_counter_delta(a.id, 3, 0).await.unwrap();

        let all = store.list(None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|a| a.username.as_ref()).collect();
        assert_eq!(names, vec!["amy", "zoe"]);

        let filtered = store.list(Some("ZO")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].username.as_ref(), "zoe");
    }
}
