use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Guest Router Module
///
/// The forms an anonymous visitor uses to get a session. Each path serves the
/// form on GET and submits it on POST.
pub fn guest_routes() -> Router<AppState> {
    Router::new()
        // POST /login authenticates through the session store and redirects to
        // /dashboard; a failure stays here with a notification.
        .route("/login", get(handlers::login_page).post(handlers::login))
        // POST /register creates the account and logs it in directly.
        .route("/register", get(handlers::register_page).post(handlers::register))
        .route(
            "/forgot-password",
            get(handlers::forgot_password_page).post(handlers::forgot_password),
        )
}
