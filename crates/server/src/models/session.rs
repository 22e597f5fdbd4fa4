//! Session principal: who the current browser session is acting as.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;

use punchcard_core::AccountId;

/// Key under which the principal is stored in the session.
pub const PRINCIPAL_KEY: &str = "principal";

/// The attempted action requires a role this session does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not authenticated for this action")]
pub struct Unauthenticated;

/// The identity attached to a session.
///
/// A session holds exactly one principal. Logging in as staff replaces a
/// customer principal and vice versa, so a single browser can never act as
/// both at once. A session without a stored value resolves to `Anonymous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Principal {
    /// No login has happened on this session.
    #[default]
    Anonymous,
    /// A logged-in customer, identified by account ID.
    Customer { account_id: AccountId },
    /// Café staff with access to the admin dashboard.
    Admin,
}

impl Principal {
    /// Authorize an action performed on behalf of the calling customer.
    ///
    /// # Errors
    ///
    /// Returns [`Unauthenticated`] unless the session belongs to a customer.
    pub const fn authorize_customer(&self) -> Result<AccountId, Unauthenticated> {
        match self {
            Self::Customer { account_id } => Ok(*account_id),
            Self::Anonymous | Self::Admin => Err(Unauthenticated),
        }
    }

    /// Authorize a by-username admin action or the customer listing.
    ///
    /// # Errors
    ///
    /// Returns [`Unauthenticated`] unless the session belongs to staff.
    pub const fn authorize_admin(&self) -> Result<(), Unauthenticated> {
        match self {
            Self::Admin => Ok(()),
            Self::Anonymous | Self::Customer { .. } => Err(Unauthenticated),
        }
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

/// Read the principal from the session; a missing value is `Anonymous`.
///
/// # Errors
///
/// Returns `tower_sessions::session::Error` if the session backend fails.
pub async fn get_principal(
    session: &Session,
) -> Result<Principal, tower_sessions::session::Error> {
    Ok(session
        .get::<Principal>(PRINCIPAL_KEY)
        .await?
        .unwrap_or_default())
}

/// Store the principal, replacing whatever was there.
///
/// Cycles the session ID first so an attacker who planted a session cookie
/// before login cannot ride the authenticated session.
///
/// # Errors
///
/// Returns `tower_sessions::session::Error` if the session backend fails.
pub async fn set_principal(
    session: &Session,
    principal: Principal,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(PRINCIPAL_KEY, principal).await
}

/// Remove the principal and destroy the session record.
///
/// All prior authorization for the session is invalidated at once.
///
/// # Errors
///
/// Returns `tower_sessions::session::Error` if the session backend fails.
pub async fn clear_principal(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_sessions_authorize_customer_actions_only() {
        let customer = Principal::Customer {
            account_id: AccountId::new(7),
        };
        assert_eq!(customer.authorize_customer(), Ok(AccountId::new(7)));
        assert_eq!(customer.authorize_admin(), Err(Unauthenticated));
    }

    #[test]
    fn admin_sessions_authorize_admin_actions_only() {
        assert_eq!(Principal::Admin.authorize_admin(), Ok(()));
        assert_eq!(
            Principal::Admin.authorize_customer(),
            Err(Unauthenticated)
        );
    }

    #[test]
    fn anonymous_sessions_authorize_nothing() {
        assert!(Principal::Anonymous.is_anonymous());
        assert_eq!(
            Principal::Anonymous.authorize_customer(),
            Err(Unauthenticated)
        );
        assert_eq!(Principal::Anonymous.authorize_admin(), Err(Unauthenticated));
    }

    #[test]
    fn serde_roundtrip_is_stable() {
        let customer = Principal::Customer {
            account_id: AccountId::new(3),
        };
        let json = serde_json::to_string(&customer).expect("serialize");
        assert_eq!(json, r#"{"role":"customer","account_id":3}"#);

        let parsed: Principal = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, customer);

        let admin = serde_json::to_string(&Principal::Admin).expect("serialize");
        assert_eq!(admin, r#"{"role":"admin"}"#);
    }
}
