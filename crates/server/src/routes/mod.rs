//! HTTP route handlers for the Punchcard server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Login/register page (with staff login)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Customer auth
//! POST /register               - Create account and log in
//! POST /login                  - Customer login
//! POST /logout                 - Customer logout
//!
//! # Loyalty card (requires customer)
//! GET  /card                   - Stamp grid and progress
//! POST /card/stamp             - Self-service stamp (shared-PIN mode only)
//! POST /card/redeem            - Self-service redeem (shared-PIN mode only)
//! POST /card/reset-passcode    - Self-service passcode reset (shared-PIN mode only)
//!
//! # Admin
//! POST /admin/login            - Staff login (dashboard mode only)
//! POST /admin/logout           - Staff logout
//! GET  /admin/dashboard        - Customer table with search (requires admin)
//! POST /admin/stamps           - Grant a stamp by username (requires admin)
//! POST /admin/redeem           - Redeem a reward by username (requires admin)
//! POST /admin/reset-passcode   - Reset a passcode by username (requires admin)
//!
//! # App shell
//! GET  /manifest.webmanifest   - Installable web app manifest
//! ```

pub mod admin;
pub mod auth;
pub mod card;
pub mod flash;
pub mod home;
pub mod manifest;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the customer auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the card routes router.
pub fn card_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(card::show))
        .route("/stamp", post(card::stamp))
        .route("/redeem", post(card::redeem))
        .route("/reset-passcode", post(card::reset_passcode))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin::login))
        .route("/logout", post(admin::logout))
        .route("/dashboard", get(admin::dashboard))
        .route("/stamps", post(admin::add_stamp))
        .route("/redeem", post(admin::redeem))
        .route("/reset-passcode", post(admin::reset_passcode))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page (login/register)
        .route("/", get(home::home))
        // Customer auth
        .merge(auth_routes())
        // Loyalty card
        .nest("/card", card_routes())
        // Admin
        .nest("/admin", admin_routes())
        // Web app manifest
        .route("/manifest.webmanifest", get(manifest::webmanifest))
}
