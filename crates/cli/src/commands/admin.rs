//! Staff credential provisioning.
//!
//! # Usage
//!
//! ```bash
//! # Hash a staff password, then export it:
//! punchcard-cli admin hash-password
//! export ADMIN_PASSWORD_HASH='<output>'
//! ```

use std::io::BufRead;

use thiserror::Error;

use punchcard_server::config::HashingConfig;
use punchcard_server::services::auth::CredentialVerifier;

/// Errors that can occur while hashing credentials.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Reading the password from stdin failed.
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    /// Hashing failed.
    #[error("Failed to hash password")]
    Hash,

    /// The password is empty.
    #[error("Password must not be empty")]
    Empty,
}

/// Hash a staff password and print the PHC string for `ADMIN_PASSWORD_HASH`.
///
/// Reads the password from stdin when not passed as an argument.
///
/// # Errors
///
/// Returns `AdminError` if reading or hashing fails.
pub fn hash_password(password: Option<&str>) -> Result<(), AdminError> {
    let password = match password {
        Some(p) => p.to_owned(),
        None => {
            // Prompt on stderr so it shows regardless of the log filter.
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Enter password:");
            }
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_owned()
        }
    };

    if password.is_empty() {
        return Err(AdminError::Empty);
    }

    let verifier =
        CredentialVerifier::new(&HashingConfig::default()).map_err(|_| AdminError::Hash)?;
    let hash = verifier.hash(&password).map_err(|_| AdminError::Hash)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }
    Ok(())
}
