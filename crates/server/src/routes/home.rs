//! Home page: customer login/register tabs plus the staff login form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::config::AdminAuthMode;
use crate::middleware::auth::CurrentPrincipal;
use crate::models::session::Principal;
use crate::state::AppState;

use super::flash;

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
    /// Which tab to open: "login" (default), "register" or "staff".
    pub tab: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
    pub active_tab: String,
    pub staff_login_enabled: bool,
}

/// Display the login/register page.
///
/// Already-authenticated sessions skip straight to their landing page.
pub async fn home(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(query): Query<MessageQuery>,
) -> Response {
    match principal {
        Principal::Customer { .. } => Redirect::to("/card").into_response(),
        Principal::Admin => Redirect::to("/admin/dashboard").into_response(),
        Principal::Anonymous => HomeTemplate {
            error: query.error.as_deref().map(flash::error_message),
            success: query.success.as_deref().map(flash::success_message),
            active_tab: query.tab.unwrap_or_else(|| "login".to_string()),
            staff_login_enabled: state.config().admin.auth_mode == AdminAuthMode::Dashboard,
        }
        .into_response(),
    }
}
