//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PUNCHCARD_DATABASE_URL` - `SQLite` connection string (e.g. `sqlite://punchcard.db`)
//! - `PUNCHCARD_BASE_URL` - Public URL for the application
//! - `PUNCHCARD_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Admin identity (one required depending on mode)
//! - `ADMIN_AUTH_MODE` - `dashboard` (default) or `pin`
//! - `ADMIN_USERNAME` - Admin login name (default: admin)
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC hash of the admin password
//!   (required in `dashboard` mode; generate via `punchcard-cli admin hash-password`)
//! - `ADMIN_PIN` - Shared staff PIN (required in `pin` mode)
//!
//! ## Optional
//! - `PUNCHCARD_HOST` - Bind address (default: 127.0.0.1)
//! - `PUNCHCARD_PORT` - Listen port (default: 3000)
//! - `STAMPS_FOR_REWARD` - Stamps per free drink (default: 6)
//! - `PASSCODE_HASH_MEMORY_KIB` - Argon2 memory cost (default: 19456)
//! - `PASSCODE_HASH_ITERATIONS` - Argon2 time cost (default: 2)
//! - `PASSCODE_HASH_PARALLELISM` - Argon2 lanes (default: 1)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Sentry event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry tracing sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use punchcard_core::DEFAULT_STAMPS_FOR_REWARD;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which authorization strategy gates stamp/redeem/reset actions.
///
/// Exactly one strategy is active per deployment; the routes belonging to
/// the inactive strategy reject with Forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminAuthMode {
    /// Staff log into the admin dashboard with username + password and act
    /// on customers by username.
    #[default]
    Dashboard,
    /// A logged-in customer may self-apply stamp/redeem/reset actions by
    /// entering a shared staff PIN on their own card page.
    SharedPin,
}

/// Punchcard application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the application
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Admin identity and authorization strategy
    pub admin: AdminConfig,
    /// Stamps required to unlock one reward
    pub stamps_for_reward: u32,
    /// Argon2 cost parameters for passcode hashing
    pub hashing: HashingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry event sample rate
    pub sentry_sample_rate: f32,
    /// Sentry tracing sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Operator-provisioned admin identity.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct AdminConfig {
    /// Which authorization strategy is active.
    pub auth_mode: AdminAuthMode,
    /// Admin login name (dashboard mode).
    pub username: String,
    /// Argon2 PHC hash of the admin password (dashboard mode).
    pub password_hash: Option<String>,
    /// Shared staff PIN (pin mode).
    pub pin: Option<SecretString>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("auth_mode", &self.auth_mode)
            .field("username", &self.username)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "[REDACTED]"))
            .field("pin", &self.pin.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Argon2 cost parameters for the credential verifier.
#[derive(Debug, Clone, Copy)]
pub struct HashingConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of iterations (time cost).
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        // Argon2id defaults per the argon2 crate (OWASP first recommendation)
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PUNCHCARD_DATABASE_URL")?;
        let host = get_env_or_default("PUNCHCARD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PUNCHCARD_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PUNCHCARD_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PUNCHCARD_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("PUNCHCARD_BASE_URL")?;
        let session_secret = get_validated_secret("PUNCHCARD_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "PUNCHCARD_SESSION_SECRET")?;

        let admin = AdminConfig::from_env()?;
        let stamps_for_reward = parse_env_or_default(
            "STAMPS_FOR_REWARD",
            DEFAULT_STAMPS_FOR_REWARD,
        )?;
        let hashing = HashingConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_env_or_default("SENTRY_SAMPLE_RATE", 1.0_f32)?;
        let sentry_traces_sample_rate = parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", 0.0_f32)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            admin,
            stamps_for_reward,
            hashing,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let auth_mode = match get_env_or_default("ADMIN_AUTH_MODE", "dashboard").as_str() {
            "dashboard" => AdminAuthMode::Dashboard,
            "pin" => AdminAuthMode::SharedPin,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "ADMIN_AUTH_MODE".to_string(),
                    format!("expected 'dashboard' or 'pin', got '{other}'"),
                ));
            }
        };

        let username = get_env_or_default("ADMIN_USERNAME", "admin");
        let password_hash = get_optional_env("ADMIN_PASSWORD_HASH");
        let pin = get_optional_env("ADMIN_PIN").map(SecretString::from);

        // The active strategy must be fully provisioned at startup, not at
        // first use.
        match auth_mode {
            AdminAuthMode::Dashboard if password_hash.is_none() => {
                return Err(ConfigError::MissingEnvVar("ADMIN_PASSWORD_HASH".to_string()));
            }
            AdminAuthMode::SharedPin if pin.is_none() => {
                return Err(ConfigError::MissingEnvVar("ADMIN_PIN".to_string()));
            }
            _ => {}
        }

        Ok(Self {
            auth_mode,
            username,
            password_hash,
            pin,
        })
    }
}

impl HashingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            memory_kib: parse_env_or_default("PASSCODE_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_env_or_default("PASSCODE_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_env_or_default("PASSCODE_HASH_PARALLELISM", defaults.parallelism)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable into `T`, using a default when unset.
fn parse_env_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
