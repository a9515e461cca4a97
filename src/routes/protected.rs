use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Protected Router Module
///
/// Routes that require a session. The guard's gating is binary: any
/// authenticated role gets past it. Role-specific content is the dashboard's
/// business, and the onboarding handlers refuse roles other than Hiring Group
/// operators and administrators themselves.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        // GET /dashboard
        // Page descriptor naming the dashboard for the session's role.
        .route("/dashboard", get(handlers::dashboard))
        // GET /ofertas
        // Job offer browser.
        .route("/ofertas", get(handlers::offers))
        // POST /logout
        // Local only; clears the session and any onboarding in progress, then
        // redirects to /login.
        .route("/logout", post(handlers::logout))
        // --- Company Onboarding Wizard ---
        .route("/onboarding/company", get(handlers::onboarding_status))
        .route("/onboarding/company/account", post(handlers::onboarding_account))
        .route("/onboarding/company/details", post(handlers::onboarding_details))
        .route("/onboarding/company/back", post(handlers::onboarding_back))
        .route("/onboarding/company/reset", post(handlers::onboarding_reset))
}
