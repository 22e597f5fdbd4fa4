//! `SQLite` implementation of the account store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use punchcard_core::{AccountId, Username};

use crate::models::account::Account;

use super::{AccountStore, RepositoryError};

const ACCOUNT_COLUMNS: &str = "id, username, stamps, rewards, created_at";

/// Account store backed by the `accounts` table.
#[derive(Debug, Clone)]
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

/// Raw row shape shared by every account query.
#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    stamps: i64,
    rewards: i64,
    created_at: i64,
}

impl AccountRow {
    fn into_account(self) -> Result<Account, RepositoryError> {
        let username = Username::parse(&self.username).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid username in accounts row {}: {e}",
                self.id
            ))
        })?;
        let created_at = DateTime::<Utc>::from_timestamp(self.created_at, 0).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "invalid created_at in accounts row {}",
                self.id
            ))
        })?;

        Ok(Account {
            id: AccountId::new(self.id),
            username,
            stamps: self.stamps,
            rewards: self.rewards,
            created_at,
        })
    }
}

impl SqliteAccountStore {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`
/// pattern, so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn create(
        &self,
        username: &Username,
        passcode_hash: &str,
    ) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "INSERT INTO accounts (username, passcode_hash, stamps, rewards, created_at)
             VALUES (?1, ?2, 0, 0, ?3)
             RETURNING id, username, stamps, rewards, created_at",
        )
        .bind(username.as_ref())
        .bind(passcode_hash)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict(format!("username '{username}' already exists"))
            } else {
                RepositoryError::Database(e)
            }
        })?;

        row.into_account()
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn get_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?1"
        ))
        .bind(username.as_ref())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn get_passcode_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct RowWithHash {
            #[sqlx(flatten)]
            account: AccountRow,
            passcode_hash: String,
        }

        let row = sqlx::query_as::<_, RowWithHash>(&format!(
            "SELECT {ACCOUNT_COLUMNS}, passcode_hash FROM accounts WHERE username = ?1"
        ))
        .bind(username.as_ref())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Ok((r.account.into_account()?, r.passcode_hash)))
            .transpose()
    }

    async fn apply_counter_delta(
        &self,
        id: AccountId,
        stamps_delta: i64,
        rewards_delta: i64,
    ) -> Result<Account, RepositoryError> {
        // The WHERE guard makes the read-check-write a single atomic
        // statement, so concurrent deltas against the same account cannot
        // both succeed past the floor.
        let row = sqlx::query_as::<_, AccountRow>(
            "UPDATE accounts
             SET stamps = stamps + ?1, rewards = rewards + ?2
             WHERE id = ?3 AND stamps + ?1 >= 0 AND rewards + ?2 >= 0
             RETURNING id, username, stamps, rewards, created_at",
        )
        .bind(stamps_delta)
        .bind(rewards_delta)
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_account(),
            // No row updated: either the account is missing or the guard
            // rejected the delta. Disambiguate with a second read.
            None => match self.get_by_id(id).await? {
                Some(_) => Err(RepositoryError::InvalidDelta),
                None => Err(RepositoryError::NotFound),
            },
        }
    }

    async fn set_passcode_hash(
        &self,
        id: AccountId,
        passcode_hash: &str,
    ) -> Result<Account, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "UPDATE accounts SET passcode_hash = ?1 WHERE id = ?2
             RETURNING id, username, stamps, rewards, created_at",
        )
        .bind(passcode_hash)
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.into_account()
    }

    async fn list(&self, query: Option<&str>) -> Result<Vec<Account>, RepositoryError> {
        let filter = query.map(str::trim).filter(|q| !q.is_empty());

        let rows = match filter {
            Some(q) => {
                sqlx::query_as::<_, AccountRow>(&format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts
                     WHERE username LIKE ?1 ESCAPE '\\'
                     ORDER BY stamps DESC, username ASC"
                ))
                .bind(format!("%{}%", escape_like(q)))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, AccountRow>(&format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts
                     ORDER BY stamps DESC, username ASC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(AccountRow::into_account).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteAccountStore {
        // One connection only: each in-memory connection is its own database.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("connect to in-memory sqlite");
        crate::db::run_migrations(&pool).await.expect("migrations");
        SqliteAccountStore::new(pool)
    }

    fn username(s: &str) -> Username {
        Username::parse(s).expect("valid username")
    }

    #[tokio::test]
    async fn create_starts_with_zeroed_counters() {
        let store = test_store().await;
        let account = store.create(&username("alice"), "hash").await.unwrap();

        assert_eq!(account.username.as_ref(), "alice");
        assert_eq!(account.stamps, 0);
        assert_eq!(account.rewards, 0);
    }

    #[tokio::test]
    async fn create_rejects_case_insensitive_duplicate() {
        let store = test_store().await;
        store.create(&username("Bob"), "hash").await.unwrap();

        // Username::parse lowercases, but the database constraint holds even
        // for a raw mixed-case insert.
        let err = store.create(&username("BOB"), "hash2").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn lookup_by_username_is_case_insensitive() {
        let store = test_store().await;
        let created = store.create(&username("carol"), "hash").await.unwrap();

        let found = store
            .get_by_username(&username("CAROL"))
            .await
            .unwrap()
            .expect("account should be found");
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn get_passcode_hash_returns_stored_hash() {
        let store = test_store().await;
        store.create(&username("dave"), "the-hash").await.unwrap();

        let (account, hash) = store
            .get_passcode_hash(&username("dave"))
            .await
            .unwrap()
            .expect("account should be found");
        assert_eq!(account.username.as_ref(), "dave");
        assert_eq!(hash, "the-hash");

        let missing = store.get_passcode_hash(&username("nobody")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn counter_delta_applies_both_fields() {
        let store = test_store().await;
        let account = store.create(&username("erin"), "hash").await.unwrap();

        let updated = store.apply_counter_delta(account.id, 6, 0).await.unwrap();
        assert_eq!(updated.stamps, 6);

        let redeemed = store.apply_counter_delta(account.id, -6, 1).await.unwrap();
        assert_eq!(redeemed.stamps, 0);
        assert_eq!(redeemed.rewards, 1);
    }

    #[tokio::test]
    async fn counter_delta_rejects_negative_result() {
        let store = test_store().await;
        let account = store.create(&username("frank"), "hash").await.unwrap();
        store.apply_counter_delta(account.id, 3, 0).await.unwrap();

        let err = store
            .apply_counter_delta(account.id, -6, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidDelta));

        // Rejection leaves the record untouched.
        let account = store.get_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(account.stamps, 3);
        assert_eq!(account.rewards, 0);
    }

    #[tokio::test]
    async fn counter_delta_on_missing_account_is_not_found() {
        let store = test_store().await;
        let err = store
            .apply_counter_delta(AccountId::new(999), 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn set_passcode_hash_replaces_hash() {
        let store = test_store().await;
        let account = store.create(&username("grace"), "old").await.unwrap();

        store.set_passcode_hash(account.id, "new").await.unwrap();

        let (_, hash) = store
            .get_passcode_hash(&username("grace"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hash, "new");
    }

    #[tokio::test]
    async fn list_orders_by_stamps_then_username() {
        let store = test_store().await;
        let a = store.create(&username("zoe"), "h").await.unwrap();
        let b = store.create(&username("amy"), "h").await.unwrap();
        let c = store.create(&username("mia"), "h").await.unwrap();

        store.apply_counter_delta(a.id, 2, 0).await.unwrap();
        store.apply_counter_delta(b.id, 5, 0).await.unwrap();
        store.apply_counter_delta(c.id, 2, 0).await.unwrap();

        let all = store.list(None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|a| a.username.as_ref()).collect();
        assert_eq!(names, vec!["amy", "mia", "zoe"]);
    }

    #[tokio::test]
    async fn list_filters_by_substring_and_escapes_wildcards() {
        let store = test_store().await;
        store.create(&username("anna"), "h").await.unwrap();
        store.create(&username("hannah"), "h").await.unwrap();
        store.create(&username("bob"), "h").await.unwrap();

        let matched = store.list(Some("ann")).await.unwrap();
        let names: Vec<&str> = matched.iter().map(|a| a.username.as_ref()).collect();
        assert_eq!(names, vec!["anna", "hannah"]);

        // Wildcard characters in the query match literally, not as patterns.
        let none = store.list(Some("%")).await.unwrap();
        assert!(none.is_empty());

        // Blank queries behave like no filter at all.
        let all = store.list(Some("   ")).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn concurrent_redeems_only_one_succeeds() {
        // File-backed database so two pool connections see the same data.
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("punchcard-test.db");
        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .expect("connect to file-backed sqlite");
        crate::db::run_migrations(&pool).await.expect("migrations");
        let store = SqliteAccountStore::new(pool);

        let account = store.create(&username("race"), "h").await.unwrap();
        store.apply_counter_delta(account.id, 6, 0).await.unwrap();

        let s1 = store.clone();
        let s2 = store.clone();
        let id = account.id;
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { s1.apply_counter_delta(id, -6, 1).await }),
            tokio::spawn(async move { s2.apply_counter_delta(id, -6, 1).await }),
        );
        let results = [r1.unwrap(), r2.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one redeem should win");

        let account = store.get_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(account.stamps, 0);
        assert_eq!(account.rewards, 1);
    }

    #[test]
    fn escape_like_escapes_pattern_characters() {
        assert_eq!(escape_like("a%b_c\\d"), "a\\%b\\_c\\\\d");
        assert_eq!(escape_like("plain"), "plain");
    }
}
