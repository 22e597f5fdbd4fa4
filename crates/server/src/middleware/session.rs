//! Session middleware configuration.
//!
//! Sets up `SQLite`-backed sessions using tower-sessions. The session cookie
//! is signed with a key derived from `PUNCHCARD_SESSION_SECRET`.

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "punchcard_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the `SQLite`-backed session store, running its table migration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the session table migration fails.
pub async fn create_session_store(pool: &SqlitePool) -> Result<SqliteStore, sqlx::Error> {
    let store = SqliteStore::new(pool.clone());
    store.migrate().await?;
    Ok(store)
}

/// Derive the cookie signing key from the configured session secret.
///
/// `Key::derive_from` requires at least 32 bytes of master key material;
/// config loading enforces that minimum before this is reached.
fn signing_key(secret: &SecretString) -> Key {
    Key::derive_from(secret.expose_secret().as_bytes())
}

/// Create the session layer over a prepared store.
#[must_use]
pub fn create_session_layer(
    store: SqliteStore,
    config: &ServerConfig,
) -> SessionManagerLayer<SqliteStore, SignedCookie> {
    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}
