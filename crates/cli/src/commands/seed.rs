//! Seed the database with demo customer accounts.
//!
//! Useful for trying the dashboard and card pages locally. Every demo
//! account gets the passcode `1234`.

use tracing::info;

use punchcard_core::Username;
use punchcard_server::config::HashingConfig;
use punchcard_server::db::{self, AccountStore, RepositoryError, SqliteAccountStore};
use punchcard_server::services::auth::CredentialVerifier;

use super::migrate::MigrationError;

/// Demo accounts: username and starting stamp count.
const DEMO_ACCOUNTS: &[(&str, i64)] = &[
    ("maria", 4),
    ("jonas", 6),
    ("priya", 1),
    ("otto", 0),
];

/// Insert demo accounts, skipping any that already exist.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails for a
/// reason other than a duplicate username.
pub async fn demo_accounts() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::migrate::database_url()?;

    let pool = db::create_pool(&database_url).await.map_err(MigrationError::from)?;
    db::run_migrations(&pool).await.map_err(MigrationError::from)?;
    let store = SqliteAccountStore::new(pool);

    let verifier = CredentialVerifier::new(&HashingConfig::default())?;
    let passcode_hash = verifier.hash("1234")?;

    for &(name, stamps) in DEMO_ACCOUNTS {
        let username = Username::parse(name)?;
        match store.create(&username, &passcode_hash).await {
            Ok(account) => {
                if stamps > 0 {
                    store.apply_counter_delta(account.id, stamps, 0).await?;
                }
                info!("Created demo account '{name}' with {stamps} stamps (passcode 1234)");
            }
            Err(RepositoryError::Conflict(_)) => {
                info!("Demo account '{name}' already exists, skipping");
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!("Seeding complete!");
    Ok(())
}
