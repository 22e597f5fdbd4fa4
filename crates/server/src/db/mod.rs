//! Database operations for the Punchcard `SQLite` store.
//!
//! # Tables
//!
//! - `accounts` - Loyalty accounts (username, passcode hash, counters)
//! - `tower_sessions` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p punchcard-cli -- migrate
//! ```

pub mod accounts;
pub mod memory;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

use punchcard_core::{AccountId, Username};

use crate::models::account::Account;

pub use accounts::SqliteAccountStore;
pub use memory::MemoryAccountStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    ///
    /// This is the one unrecoverable-per-request failure class: the backing
    /// store is unreachable or misbehaving. Never conflated with `NotFound`.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A counter delta would drive `stamps` or `rewards` negative.
    ///
    /// The whole mutation is rejected; no partial application.
    #[error("delta would make a counter negative")]
    InvalidDelta,
}

/// Persistent store of loyalty accounts.
///
/// The domain layer (ledger, auth) only sees this trait, never a concrete
/// backend. Every mutating operation is atomic per account: two concurrent
/// mutations against the same account serialize rather than interleave, and
/// a rejected mutation leaves the record untouched.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create a new account with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a case-insensitively equal
    /// username already exists. The uniqueness check and the insert are a
    /// single atomic operation.
    async fn create(
        &self,
        username: &Username,
        passcode_hash: &str,
    ) -> Result<Account, RepositoryError>;

    /// Get an account by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    /// Get an account by username (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    async fn get_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Account>, RepositoryError>;

    /// Get an account together with its stored passcode hash.
    ///
    /// Returns `None` if the username doesn't exist. The hash never appears
    /// on [`Account`] itself, so this is the only way to read it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    async fn get_passcode_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(Account, String)>, RepositoryError>;

    /// Atomically apply both counter deltas to one account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::InvalidDelta` if either counter would go
    /// negative; in that case no mutation occurs.
    async fn apply_counter_delta(
        &self,
        id: AccountId,
        stamps_delta: i64,
        rewards_delta: i64,
    ) -> Result<Account, RepositoryError>;

    /// Replace an account's passcode hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    async fn set_passcode_hash(
        &self,
        id: AccountId,
        passcode_hash: &str,
    ) -> Result<Account, RepositoryError>;

    /// List accounts for the admin dashboard, ordered by stamps descending
    /// then username ascending.
    ///
    /// `query`, when non-empty, filters to usernames containing it
    /// (case-insensitive substring match).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    async fn list(&self, query: Option<&str>) -> Result<Vec<Account>, RepositoryError>;
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// Creates the database file if it does not exist yet.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Run the embedded schema migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}
