//! Loyalty card page and shared-PIN self-service actions.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use punchcard_core::{AccountId, Username};

use crate::config::AdminAuthMode;
use crate::error::AppError;
use crate::middleware::auth::RequireCustomer;
use crate::models::account::Account;
use crate::models::session::clear_principal;
use crate::services::ledger::LedgerError;
use crate::state::AppState;

use super::flash;
use super::home::MessageQuery;

/// Form for shared-PIN stamp/redeem actions.
#[derive(Debug, Deserialize)]
pub struct PinForm {
    pub pin: String,
}

/// Form for the shared-PIN passcode reset.
#[derive(Debug, Deserialize)]
pub struct PinResetForm {
    pub pin: String,
    pub new_passcode: String,
}

/// Loyalty card page template.
#[derive(Template, WebTemplate)]
#[template(path = "card.html")]
pub struct CardTemplate {
    pub username: String,
    /// One cell per stamp slot, `true` when earned.
    pub cells: Vec<bool>,
    pub stamps: i64,
    pub rewards: i64,
    pub stamps_to_next: u32,
    pub unlocked: bool,
    pub pin_mode: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

fn stamp_cells(stamps: i64, goal: u32) -> Vec<bool> {
    let filled = usize::try_from(stamps.max(0)).unwrap_or(0);
    (0..goal as usize).map(|i| i < filled).collect()
}

/// Display the customer's loyalty card.
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(account_id): RequireCustomer,
    Query(query): Query<MessageQuery>,
) -> Response {
    match state.ledger().progress(account_id).await {
        Ok((account, progress)) => CardTemplate {
            username: account.username.to_string(),
            cells: stamp_cells(account.stamps, state.config().stamps_for_reward),
            stamps: account.stamps,
            rewards: account.rewards,
            stamps_to_next: progress.stamps_to_next,
            unlocked: progress.unlocked,
            pin_mode: state.config().admin.auth_mode == AdminAuthMode::SharedPin,
            error: query.error.as_deref().map(flash::error_message),
            success: query.success.as_deref().map(flash::success_message),
        }
        .into_response(),
        // The account behind this session no longer exists; drop the session.
        Err(LedgerError::NotFound) => {
            if let Err(e) = clear_principal(&session).await {
                tracing::error!("Failed to clear session: {e}");
            }
            Redirect::to("/").into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

/// Resolve the logged-in customer's username, or fail the self-service
/// action the same way the card page would.
async fn self_service_username(
    state: &AppState,
    session: &Session,
    account_id: AccountId,
    pin: &str,
) -> Result<Username, Response> {
    if state.config().admin.auth_mode != AdminAuthMode::SharedPin {
        return Err(
            AppError::Forbidden("self-service actions are not enabled".to_string())
                .into_response(),
        );
    }
    if !state.auth().verify_admin_pin(pin) {
        return Err(Redirect::to("/card?error=pin").into_response());
    }

    match state.store().get_by_id(account_id).await {
        Ok(Some(Account { username, .. })) => Ok(username),
        Ok(None) => {
            if let Err(e) = clear_principal(session).await {
                tracing::error!("Failed to clear session: {e}");
            }
            Err(Redirect::to("/").into_response())
        }
        Err(err) => Err(AppError::from(err).into_response()),
    }
}

fn ledger_redirect(result: Result<Account, LedgerError>, success_code: &str) -> Response {
    match result {
        Ok(_) => Redirect::to(&format!("/card?success={success_code}")).into_response(),
        Err(LedgerError::InsufficientStamps) => {
            Redirect::to("/card?error=stamps").into_response()
        }
        Err(LedgerError::WeakPasscode(_)) => {
            Redirect::to("/card?error=passcode_short").into_response()
        }
        Err(LedgerError::NotFound) => Redirect::to("/").into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

/// Self-apply one stamp after staff enters the shared PIN.
pub async fn stamp(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(account_id): RequireCustomer,
    Form(form): Form<PinForm>,
) -> Response {
    let username = match self_service_username(&state, &session, account_id, &form.pin).await {
        Ok(username) => username,
        Err(response) => return response,
    };
    ledger_redirect(state.ledger().add_stamp(&username).await, "stamped")
}

/// Self-redeem a reward after staff enters the shared PIN.
pub async fn redeem(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(account_id): RequireCustomer,
    Form(form): Form<PinForm>,
) -> Response {
    let username = match self_service_username(&state, &session, account_id, &form.pin).await {
        Ok(username) => username,
        Err(response) => return response,
    };
    ledger_redirect(state.ledger().redeem(&username).await, "redeemed")
}

/// Reset the customer's own passcode after staff enters the shared PIN.
pub async fn reset_passcode(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(account_id): RequireCustomer,
    Form(form): Form<PinResetForm>,
) -> Response {
    let username = match self_service_username(&state, &session, account_id, &form.pin).await {
        Ok(username) => username,
        Err(response) => return response,
    };
    ledger_redirect(
        state
            .ledger()
            .reset_passcode(&username, &form.new_passcode)
            .await,
        "reset",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_cells_fill_up_to_goal() {
        assert_eq!(stamp_cells(0, 6), vec![false; 6]);
        assert_eq!(
            stamp_cells(4, 6),
            vec![true, true, true, true, false, false]
        );
        assert_eq!(stamp_cells(6, 6), vec![true; 6]);
        // Overshoot past the goal still renders a full grid.
        assert_eq!(stamp_cells(9, 6), vec![true; 6]);
    }
}
