//! Staff login and admin dashboard handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use punchcard_core::Username;

use crate::error::{AppError, clear_sentry_user};
use crate::middleware::auth::RequireAdmin;
use crate::models::account::Account;
use crate::models::session::{Principal, clear_principal, set_principal};
use crate::services::ledger::LedgerError;
use crate::state::AppState;

use super::flash;

/// Staff login form data.
#[derive(Debug, Deserialize)]
pub struct AdminLoginForm {
    pub username: String,
    pub password: String,
}

/// Dashboard query parameters.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Username substring filter.
    pub q: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Form for by-username stamp and redeem actions.
#[derive(Debug, Deserialize)]
pub struct CustomerForm {
    pub username: String,
}

/// Form for the by-username passcode reset.
#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub username: String,
    pub new_passcode: String,
}

/// One row of the dashboard customer table.
pub struct CustomerRow {
    pub username: String,
    pub stamps: i64,
    pub rewards: i64,
    pub joined: String,
}

impl From<Account> for CustomerRow {
    fn from(account: Account) -> Self {
        Self {
            username: account.username.to_string(),
            stamps: account.stamps,
            rewards: account.rewards,
            joined: account.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub customers: Vec<CustomerRow>,
    pub query: String,
    pub stamps_for_reward: u32,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Handle staff login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AdminLoginForm>,
) -> Response {
    match state.auth().login_admin(&form.username, &form.password) {
        Ok(()) => {
            if let Err(e) = set_principal(&session, Principal::Admin).await {
                tracing::error!("Failed to set session: {e}");
                return Redirect::to("/?error=session&tab=staff").into_response();
            }
            Redirect::to("/admin/dashboard").into_response()
        }
        Err(err) => {
            tracing::warn!("Admin login failed: {err}");
            Redirect::to("/?error=admin_credentials&tab=staff").into_response()
        }
    }
}

/// Handle staff logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_principal(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();
    Redirect::to("/?success=logged_out").into_response()
}

/// Display the customer table, optionally filtered by username substring.
pub async fn dashboard(
    State(state): State<AppState>,
    _: RequireAdmin,
    Query(query): Query<DashboardQuery>,
) -> Response {
    match state.store().list(query.q.as_deref()).await {
        Ok(accounts) => DashboardTemplate {
            customers: accounts.into_iter().map(CustomerRow::from).collect(),
            query: query.q.unwrap_or_default(),
            stamps_for_reward: state.config().stamps_for_reward,
            error: query.error.as_deref().map(flash::error_message),
            success: query.success.as_deref().map(flash::success_message),
        }
        .into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

/// Redirect back to the dashboard filtered to the acted-on customer.
fn dashboard_redirect(username: &str, kind: &str, code: &str) -> Response {
    let q = urlencoding::encode(username);
    Redirect::to(&format!("/admin/dashboard?q={q}&{kind}={code}")).into_response()
}

fn action_response(
    username: &str,
    result: Result<Account, LedgerError>,
    success_code: &str,
) -> Response {
    match result {
        Ok(account) => dashboard_redirect(account.username.as_ref(), "success", success_code),
        Err(LedgerError::NotFound) => dashboard_redirect(username, "error", "not_found"),
        Err(LedgerError::InsufficientStamps) => dashboard_redirect(username, "error", "stamps"),
        Err(LedgerError::WeakPasscode(_)) => {
            dashboard_redirect(username, "error", "passcode_short")
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

fn parse_target(username: &str) -> Result<Username, Response> {
    Username::parse(username).map_err(|_| dashboard_redirect(username, "error", "not_found"))
}

/// Grant one stamp to the named customer.
pub async fn add_stamp(
    State(state): State<AppState>,
    _: RequireAdmin,
    Form(form): Form<CustomerForm>,
) -> Response {
    let username = match parse_target(&form.username) {
        Ok(username) => username,
        Err(response) => return response,
    };
    action_response(
        &form.username,
        state.ledger().add_stamp(&username).await,
        "stamped",
    )
}

/// Redeem one reward for the named customer.
pub async fn redeem(
    State(state): State<AppState>,
    _: RequireAdmin,
    Form(form): Form<CustomerForm>,
) -> Response {
    let username = match parse_target(&form.username) {
        Ok(username) => username,
        Err(response) => return response,
    };
    action_response(
        &form.username,
        state.ledger().redeem(&username).await,
        "redeemed",
    )
}

/// Reset the named customer's passcode.
pub async fn reset_passcode(
    State(state): State<AppState>,
    _: RequireAdmin,
    Form(form): Form<ResetForm>,
) -> Response {
    let username = match parse_target(&form.username) {
        Ok(username) => username,
        Err(response) => return response,
    };
    action_response(
        &form.username,
        state
            .ledger()
            .reset_passcode(&username, &form.new_passcode)
            .await,
        "reset",
    )
}
