//! Customer registration, login and logout handlers.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use punchcard_core::UsernameError;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::session::{Principal, clear_principal, set_principal};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Login and registration form data.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub passcode: String,
}

/// Handle registration form submission.
///
/// Creates the account and logs the new customer straight in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match state
        .auth()
        .register_customer(&form.username, &form.passcode)
        .await
    {
        Ok(account) => {
            if let Err(e) = set_principal(
                &session,
                Principal::Customer {
                    account_id: account.id,
                },
            )
            .await
            {
                tracing::error!("Failed to set session: {e}");
                return Redirect::to("/?error=session").into_response();
            }
            set_sentry_user(&account.id);
            Redirect::to("/card").into_response()
        }
        Err(err) => {
            tracing::warn!("Registration failed: {err}");
            let code = match err {
                AuthError::InvalidUsername(UsernameError::TooShort { .. }) => "username_short",
                AuthError::InvalidUsername(UsernameError::TooLong { .. }) => "username_long",
                AuthError::WeakPasscode(_) => "passcode_short",
                AuthError::UsernameTaken => "username_taken",
                AuthError::InvalidCredentials
                | AuthError::Repository(_)
                | AuthError::PasscodeHash => "failed",
            };
            Redirect::to(&format!("/?tab=register&error={code}")).into_response()
        }
    }
}

/// Handle customer login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match state
        .auth()
        .login_customer(&form.username, &form.passcode)
        .await
    {
        Ok(account) => {
            if let Err(e) = set_principal(
                &session,
                Principal::Customer {
                    account_id: account.id,
                },
            )
            .await
            {
                tracing::error!("Failed to set session: {e}");
                return Redirect::to("/?error=session").into_response();
            }
            set_sentry_user(&account.id);
            Redirect::to("/card").into_response()
        }
        Err(err) => {
            tracing::warn!("Login failed: {err}");
            Redirect::to("/?error=credentials").into_response()
        }
    }
}

/// Handle logout for any principal.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_principal(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();
    Redirect::to("/?success=logged_out").into_response()
}
