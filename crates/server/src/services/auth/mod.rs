//! Registration and login.
//!
//! Customers authenticate with a username and a short numeric-friendly
//! passcode. Staff authenticate either against the dashboard credentials or,
//! in shared-PIN deployments, with the staff PIN entered alongside customer
//! actions. All credential checks funnel through [`CredentialVerifier`].

pub mod error;
pub mod verifier;

use secrecy::ExposeSecret;
use tracing::{info, warn};

use punchcard_core::Username;

use crate::config::{AdminAuthMode, AdminConfig};
use crate::db::AccountStore;
use crate::models::account::Account;

pub use error::AuthError;
pub use verifier::CredentialVerifier;

/// Minimum passcode length, in characters.
pub const MIN_PASSCODE_LENGTH: usize = 4;

/// Authentication service over an account store.
pub struct AuthService<'a> {
    store: &'a dyn AccountStore,
    verifier: &'a CredentialVerifier,
    admin: &'a AdminConfig,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn AccountStore,
        verifier: &'a CredentialVerifier,
        admin: &'a AdminConfig,
    ) -> Self {
        Self {
            store,
            verifier,
            admin,
        }
    }

    /// Register a new customer account.
    ///
    /// Validates the username and passcode, hashes the passcode, and creates
    /// the account with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` or `AuthError::WeakPasscode` on
    /// validation failure, `AuthError::UsernameTaken` on a duplicate, and
    /// `AuthError::Repository` on store failure.
    pub async fn register_customer(
        &self,
        username: &str,
        passcode: &str,
    ) -> Result<Account, AuthError> {
        let username = Username::parse(username)?;
        validate_passcode(passcode)?;

        let hash = self
            .verifier
            .hash(passcode)
            .map_err(|_| AuthError::PasscodeHash)?;

        let account = self.store.create(&username, &hash).await?;
        info!(account_id = %account.id, "registered new customer");
        Ok(account)
    }

    /// Log a customer in by username and passcode.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown username or a
    /// wrong passcode, without distinguishing the two.
    pub async fn login_customer(
        &self,
        username: &str,
        passcode: &str,
    ) -> Result<Account, AuthError> {
        // An unparseable username can't match any stored account, so it gets
        // the same answer as a wrong passcode.
        let Ok(username) = Username::parse(username) else {
            return Err(AuthError::InvalidCredentials);
        };

        let Some((account, stored_hash)) = self.store.get_passcode_hash(&username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verifier.verify(passcode, &stored_hash) {
            warn!(account_id = %account.id, "failed customer login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(account)
    }

    /// Log staff into the admin dashboard.
    ///
    /// Only available in [`AdminAuthMode::Dashboard`] deployments.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on a mismatch or when the
    /// dashboard strategy is not active.
    pub fn login_admin(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.admin.auth_mode != AdminAuthMode::Dashboard {
            return Err(AuthError::InvalidCredentials);
        }
        let Some(password_hash) = self.admin.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials);
        };

        // Verify the hash even on a username mismatch to keep timing flat.
        let password_ok = self.verifier.verify(password, password_hash);
        if username != self.admin.username || !password_ok {
            warn!("failed admin login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        info!("admin logged in");
        Ok(())
    }

    /// Check a shared staff PIN.
    ///
    /// Only available in [`AdminAuthMode::SharedPin`] deployments.
    #[must_use]
    pub fn verify_admin_pin(&self, pin: &str) -> bool {
        if self.admin.auth_mode != AdminAuthMode::SharedPin {
            return false;
        }
        self.admin
            .pin
            .as_ref()
            .is_some_and(|expected| constant_time_eq(pin, expected.expose_secret()))
    }
}

/// Validate a customer passcode.
///
/// # Errors
///
/// Returns `AuthError::WeakPasscode` if the passcode is shorter than
/// [`MIN_PASSCODE_LENGTH`].
pub fn validate_passcode(passcode: &str) -> Result<(), AuthError> {
    if passcode.chars().count() < MIN_PASSCODE_LENGTH {
        return Err(AuthError::WeakPasscode(format!(
            "passcode must be at least {MIN_PASSCODE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Compare two strings without short-circuiting on the first mismatch.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

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

    fn dashboard_admin(verifier: &CredentialVerifier) -> AdminConfig {
        AdminConfig {
            auth_mode: AdminAuthMode::Dashboard,
            username: "staff".to_string(),
            password_hash: Some(verifier.hash("correct horse").expect("hash")),
            pin: None,
        }
    }

    fn pin_admin() -> AdminConfig {
        AdminConfig {
            auth_mode: AdminAuthMode::SharedPin,
            username: "staff".to_string(),
            password_hash: None,
            pin: Some(SecretString::from("2468")),
        }
    }

    #[tokio::test]
    async fn register_rejects_short_username() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let admin = dashboard_admin(&verifier);
        let auth = AuthService::new(&store, &verifier, &admin);

        let err = auth.register_customer("ab", "1234").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidUsername(_)));
    }

    #[tokio::test]
    async fn register_rejects_short_passcode() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let admin = dashboard_admin(&verifier);
        let auth = AuthService::new(&store, &verifier, &admin);

        let err = auth.register_customer("abc", "123").await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPasscode(_)));
    }

    #[tokio::test]
    async fn register_accepts_minimum_lengths() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let admin = dashboard_admin(&verifier);
        let auth = AuthService::new(&store, &verifier, &admin);

        let account = auth.register_customer("abc", "1234").await.unwrap();
        assert_eq!(account.username.as_ref(), "abc");
        assert_eq!(account.stamps, 0);
        assert_eq!(account.rewards, 0);
    }

    #[tokio::test]
    async fn register_rejects_case_variant_duplicate() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let admin = dashboard_admin(&verifier);
        let auth = AuthService::new(&store, &verifier, &admin);

        auth.register_customer("Bob", "1234").await.unwrap();
        let err = auth.register_customer("bob", "5678").await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
    }

    #[tokio::test]
    async fn login_succeeds_with_any_case() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let admin = dashboard_admin(&verifier);
        let auth = AuthService::new(&store, &verifier, &admin);

        let registered = auth.register_customer("Maria", "1234").await.unwrap();
        let logged_in = auth.login_customer("MARIA", "1234").await.unwrap();
        assert_eq!(logged_in.id, registered.id);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let admin = dashboard_admin(&verifier);
        let auth = AuthService::new(&store, &verifier, &admin);

        auth.register_customer("maria", "1234").await.unwrap();

        let unknown_user = auth.login_customer("nobody", "1234").await.unwrap_err();
        let wrong_passcode = auth.login_customer("maria", "9999").await.unwrap_err();
        let invalid_username = auth.login_customer("x", "1234").await.unwrap_err();

        assert_eq!(unknown_user.to_string(), wrong_passcode.to_string());
        assert_eq!(unknown_user.to_string(), invalid_username.to_string());
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn admin_login_checks_username_and_password() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let admin = dashboard_admin(&verifier);
        let auth = AuthService::new(&store, &verifier, &admin);

        assert!(auth.login_admin("staff", "correct horse").is_ok());
        assert!(auth.login_admin("staff", "wrong").is_err());
        assert!(auth.login_admin("intruder", "correct horse").is_err());
    }

    #[tokio::test]
    async fn admin_login_rejected_in_pin_mode() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();
        let admin = pin_admin();
        let auth = AuthService::new(&store, &verifier, &admin);

        let err = auth.login_admin("staff", "anything").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn pin_verification_respects_mode() {
        let store = MemoryAccountStore::new();
        let verifier = fast_verifier();

        let pin_mode = pin_admin();
        let auth = AuthService::new(&store, &verifier, &pin_mode);
        assert!(auth.verify_admin_pin("2468"));
        assert!(!auth.verify_admin_pin("0000"));

        let dashboard = dashboard_admin(&verifier);
        let auth = AuthService::new(&store, &verifier, &dashboard);
        assert!(!auth.verify_admin_pin("2468"));
    }

    #[test]
    fn constant_time_eq_compares_exactly() {
        assert!(constant_time_eq("abcd", "abcd"));
        assert!(!constant_time_eq("abcd", "abce"));
        assert!(!constant_time_eq("abcd", "abc"));
        assert!(constant_time_eq("", ""));
    }
}
