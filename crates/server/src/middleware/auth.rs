//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a customer or admin principal in route
//! handlers. The role checks themselves live on [`Principal`]; these
//! extractors only translate a failed check into an HTTP response.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use punchcard_core::AccountId;

use crate::models::session::{Principal, get_principal};

/// Extractor that requires a logged-in customer.
///
/// If no customer is logged in, returns a redirect to the home page for HTML
/// requests and 401 for API requests. An admin principal does not satisfy it.
///
/// # Example
///
/// ```rust,ignore
/// async fn card(RequireCustomer(account_id): RequireCustomer) -> impl IntoResponse {
///     format!("card for account {account_id}")
/// }
/// ```
pub struct RequireCustomer(pub AccountId);

/// Extractor that requires an admin principal.
///
/// If no admin is logged in, returns a redirect to the home page (which
/// carries the staff login form) for HTML requests and 401 for API requests.
pub struct RequireAdmin;

/// Error returned when a required principal is missing.
pub enum AuthRejection {
    /// Redirect to the login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

fn rejection_for(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin
    }
}

async fn principal_from(parts: &Parts) -> Principal {
    match parts.extensions.get::<Session>() {
        Some(session) => get_principal(session).await.unwrap_or_default(),
        None => Principal::Anonymous,
    }
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from(parts)
            .await
            .authorize_customer()
            .map(Self)
            .map_err(|_| rejection_for(parts))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from(parts)
            .await
            .authorize_admin()
            .map(|()| Self)
            .map_err(|_| rejection_for(parts))
    }
}

/// Extractor that resolves the current principal without rejecting.
///
/// Sessions with no stored login resolve to [`Principal::Anonymous`].
///
/// # Example
///
/// ```rust,ignore
/// async fn home(CurrentPrincipal(principal): CurrentPrincipal) -> impl IntoResponse {
///     match principal {
///         Principal::Anonymous => "hello, guest",
///         _ => "welcome back",
///     }
/// }
/// ```
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(principal_from(parts).await))
    }
}
