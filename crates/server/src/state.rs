//! Shared application state.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ServerConfig;
use crate::db::{AccountStore, SqliteAccountStore};
use crate::services::auth::{AuthService, CredentialVerifier};
use crate::services::ledger::LedgerService;

/// Application state shared across all request handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: SqlitePool,
    store: SqliteAccountStore,
    verifier: CredentialVerifier,
}

impl AppState {
    /// Build the state from loaded configuration and a connected pool.
    ///
    /// # Errors
    ///
    /// Returns `argon2::Error` if the hashing parameters are out of range.
    pub fn new(config: ServerConfig, pool: SqlitePool) -> Result<Self, argon2::Error> {
        let verifier = CredentialVerifier::new(&config.hashing)?;
        let store = SqliteAccountStore::new(pool.clone());
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                store,
                verifier,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    #[must_use]
    pub fn store(&self) -> &dyn AccountStore {
        &self.inner.store
    }

    #[must_use]
    pub fn verifier(&self) -> &CredentialVerifier {
        &self.inner.verifier
    }

    /// Authentication service borrowing this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            &self.inner.store,
            &self.inner.verifier,
            &self.inner.config.admin,
        )
    }

    /// Ledger service borrowing this state.
    #[must_use]
    pub fn ledger(&self) -> LedgerService<'_> {
        LedgerService::new(
            &self.inner.store,
            &self.inner.verifier,
            self.inner.config.stamps_for_reward,
        )
    }
}
