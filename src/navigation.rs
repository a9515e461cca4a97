use crate::{
    guard::{self, GuardDecision, Target},
    session::SessionStore,
};

/// Navigation
///
/// The outcome of routing a request path against the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Render the requested target.
    Render(Target),
    /// Send the client somewhere else instead.
    Redirect(Target),
}

/// navigate
///
/// Reads the session once and applies the route guard to `path`. Called for
/// every request before any handler runs.
pub async fn navigate(session: &SessionStore, path: &str) -> Navigation {
    let target = Target::from_path(path);
    let authenticated = session.is_authenticated().await;

    match guard::check(target, authenticated) {
        GuardDecision::Allow => Navigation::Render(target),
        GuardDecision::RedirectTo(to) => {
            tracing::debug!(path, ?target, redirect = to.path(), authenticated, "navigation redirected");
            Navigation::Redirect(to)
        }
    }
}
