/// Target
///
/// A navigation destination of the portal. Anything the shell does not know
/// about is `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Root,
    Login,
    Register,
    ForgotPassword,
    Dashboard,
    Offers,
    Logout,
    CompanyOnboarding,
    Unauthorized,
    NotFound,
}

/// Access
///
/// How a target relates to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reachable only with an authenticated session.
    Protected,
    /// Reachable only without one (login, registration, password recovery).
    GuestOnly,
    /// Always reachable.
    Open,
    /// The root path, which only ever redirects.
    Landing,
}

impl Target {
    /// from_path
    ///
    /// Classifies a request path. Trailing slashes are ignored; every path under
    /// `/onboarding/company` belongs to the onboarding wizard.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Target::Root,
            "/login" => Target::Login,
            "/register" => Target::Register,
            "/forgot-password" => Target::ForgotPassword,
            "/dashboard" => Target::Dashboard,
            "/ofertas" => Target::Offers,
            "/logout" => Target::Logout,
            "/unauthorized" => Target::Unauthorized,
            "/onboarding/company" => Target::CompanyOnboarding,
            other if other.starts_with("/onboarding/company/") => Target::CompanyOnboarding,
            _ => Target::NotFound,
        }
    }

    /// The canonical path used when redirecting to this target.
    pub fn path(&self) -> &'static str {
        match self {
            Target::Root => "/",
            Target::Login => "/login",
            Target::Register => "/register",
            Target::ForgotPassword => "/forgot-password",
            Target::Dashboard => "/dashboard",
            Target::Offers => "/ofertas",
            Target::Logout => "/logout",
            Target::CompanyOnboarding => "/onboarding/company",
            Target::Unauthorized => "/unauthorized",
            Target::NotFound => "/not-found",
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Target::Dashboard | Target::Offers | Target::Logout | Target::CompanyOnboarding => {
                Access::Protected
            }
            Target::Login | Target::Register | Target::ForgotPassword => Access::GuestOnly,
            Target::Unauthorized | Target::NotFound => Access::Open,
            Target::Root => Access::Landing,
        }
    }
}

/// GuardDecision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectTo(Target),
}

/// check
///
/// Decides whether a navigation to `target` may proceed given the current
/// authentication state. The decision is binary on authentication: any
/// authenticated identity may reach any protected target, whatever its role.
/// The originally requested target is not remembered across a redirect to login.
pub fn check(target: Target, is_authenticated: bool) -> GuardDecision {
    match (target.access(), is_authenticated) {
        (Access::Protected, false) => GuardDecision::RedirectTo(Target::Login),
        (Access::Protected, true) => GuardDecision::Allow,
        (Access::GuestOnly, true) => GuardDecision::RedirectTo(Target::Dashboard),
        (Access::GuestOnly, false) => GuardDecision::Allow,
        (Access::Landing, true) => GuardDecision::RedirectTo(Target::Dashboard),
        (Access::Landing, false) => GuardDecision::RedirectTo(Target::Login),
        (Access::Open, _) => GuardDecision::Allow,
    }
}
