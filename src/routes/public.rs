use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Routes that answer the same whether or not anyone is logged in.
///
/// `/` has no handler: the navigation guard always answers it with a 303 to
/// `/dashboard` or `/login` before routing.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the process; reports the environment, does not
        // touch the REST API.
        .route("/health", get(handlers::health))
        // GET /unauthorized
        // Target of role-scoped denials; also reachable directly.
        .route("/unauthorized", get(handlers::unauthorized))
}
