//! Argon2id passcode hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::config::HashingConfig;

/// Hashes and verifies customer passcodes with Argon2id.
///
/// Construction fails fast on bad parameters, so a misconfigured deployment
/// dies at startup instead of at first registration.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    argon2: Argon2<'static>,
}

impl CredentialVerifier {
    /// Build a verifier from hashing configuration.
    ///
    /// # Errors
    ///
    /// Returns `argon2::Error` if the parameters are out of range.
    pub fn new(config: &HashingConfig) -> Result<Self, argon2::Error> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a passcode into a PHC-format string.
    ///
    /// # Errors
    ///
    /// Returns `argon2::password_hash::Error` if hashing fails.
    pub fn hash(&self, passcode: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2
            .hash_password(passcode.as_bytes(), &salt)?
            .to_string())
    }

    /// Verify a passcode against a stored PHC-format hash.
    ///
    /// A malformed stored hash verifies as false rather than erroring, so a
    /// corrupted row behaves like a wrong passcode instead of a 500.
    #[must_use]
    pub fn verify(&self, passcode: &str, stored_hash: &str) -> bool {
        PasswordHash::new(stored_hash).is_ok_and(|hash| {
            self.argon2
                .verify_password(passcode.as_bytes(), &hash)
                .is_ok()
        })
    }
}
