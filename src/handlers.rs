use crate::{
    AppConfig, AppState,
    backend::BackendError,
    forms::{CompanyAccountForm, CompanyDetailsForm, FieldError, ForgotPasswordForm, RegisterForm},
    guard::Target,
    models::{Credentials, Notification, Page, PageView, SessionSummary},
    onboarding::{self, OnboardingError, OnboardingSnapshot},
    resolver,
    session::{AuthFailure, Session, SessionStore},
};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::{Value, json};

// --- Response Helpers ---

/// Answers with a `303 See Other` to the target's canonical path.
fn redirect(target: Target) -> Response {
    Redirect::to(target.path()).into_response()
}

fn page(status: StatusCode, page: Page) -> Response {
    (status, Json(page)).into_response()
}

fn invalid_form(view: PageView, errors: Vec<FieldError>) -> Response {
    page(
        StatusCode::UNPROCESSABLE_ENTITY,
        Page::new(view).with_field_errors(errors),
    )
}

/// Status for a failed login or registration. `rejected` is what a 4xx from the
/// API turns into; anything else the API did wrong is a bad gateway.
fn failure_status(failure: &AuthFailure, rejected: StatusCode) -> StatusCode {
    match failure {
        AuthFailure::Backend(e) if e.is_client_rejection() => rejected,
        AuthFailure::Backend(BackendError::Network(_)) => StatusCode::SERVICE_UNAVAILABLE,
        AuthFailure::Backend(_) => StatusCode::BAD_GATEWAY,
        AuthFailure::AttemptInProgress | AuthFailure::Superseded => StatusCode::CONFLICT,
    }
}

async fn summary(session: &SessionStore) -> Option<SessionSummary> {
    session.current().await.map(|s| s.summary())
}

// --- Public & Guest Pages ---

/// health
///
/// Liveness probe. Reports the runtime environment and never calls the REST API.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Process is up"))
)]
pub async fn health(State(config): State<AppConfig>) -> Json<Value> {
    Json(json!({ "status": "ok", "env": config.env }))
}

#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login form", body = Page))
)]
pub async fn login_page() -> Json<Page> {
    Json(Page::new(PageView::Login))
}

/// login
///
/// [Guest Route] Validates the form, then authenticates through the session store.
/// Success redirects to the dashboard. A failure stays on the login page with
/// a single notification; the session is left as it was.
#[utoipa::path(
    post,
    path = "/login",
    request_body = Credentials,
    responses(
        (status = 303, description = "Logged in, redirect to /dashboard"),
        (status = 401, description = "Rejected credentials", body = Page),
        (status = 422, description = "Invalid form", body = Page),
        (status = 503, description = "API unreachable", body = Page)
    )
)]
pub async fn login(
    State(session): State<SessionStore>,
    Json(credentials): Json<Credentials>,
) -> Response {
    if let Err(errors) = credentials.validate() {
        return invalid_form(PageView::Login, errors);
    }

    match session.authenticate(&credentials).await {
        Ok(established) => {
            tracing::info!(session_id = %established.id, "login succeeded");
            redirect(Target::Dashboard)
        }
        Err(failure) => page(
            failure_status(&failure, StatusCode::UNAUTHORIZED),
            Page::new(PageView::Login).with_notification(failure.login_notification()),
        ),
    }
}

#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Registration form", body = Page))
)]
pub async fn register_page() -> Json<Page> {
    Json(Page::new(PageView::Register))
}

/// register
///
/// [Guest Route] Creates the account and establishes the session from the
/// created record; the user lands on the dashboard without logging in again.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterForm,
    responses(
        (status = 303, description = "Registered, redirect to /dashboard"),
        (status = 400, description = "Rejected by the API", body = Page),
        (status = 422, description = "Invalid form", body = Page)
    )
)]
pub async fn register(
    State(session): State<SessionStore>,
    Json(form): Json<RegisterForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        return invalid_form(PageView::Register, errors);
    }

    match session.register(&form.to_request()).await {
        Ok(established) => {
            tracing::info!(session_id = %established.id, role = %form.role, "registration succeeded");
            redirect(Target::Dashboard)
        }
        Err(failure) => page(
            failure_status(&failure, StatusCode::BAD_REQUEST),
            Page::new(PageView::Register).with_notification(failure.registration_notification()),
        ),
    }
}

#[utoipa::path(
    get,
    path = "/forgot-password",
    responses((status = 200, description = "Password recovery form", body = Page))
)]
pub async fn forgot_password_page() -> Json<Page> {
    Json(Page::new(PageView::ForgotPassword))
}

/// forgot_password
///
/// [Guest Route] The API has no recovery endpoint; the request is validated,
/// logged and acknowledged.
#[utoipa::path(
    post,
    path = "/forgot-password",
    request_body = ForgotPasswordForm,
    responses(
        (status = 200, description = "Recovery acknowledged", body = Page),
        (status = 422, description = "Invalid form", body = Page)
    )
)]
pub async fn forgot_password(Json(form): Json<ForgotPasswordForm>) -> Response {
    if let Err(errors) = form.validate() {
        return invalid_form(PageView::ForgotPassword, errors);
    }

    tracing::info!(email = %form.email.trim(), "password recovery requested");
    page(
        StatusCode::OK,
        Page::new(PageView::ForgotPasswordSent).with_notification(Notification::success(
            "Email sent",
            "A recovery link has been sent to your email address.",
        )),
    )
}

// --- Protected Pages ---

/// dashboard
///
/// [Protected Route] Resolves the dashboard for the session's role. An
/// unrecognised role renders the invalid-role dashboard rather than failing.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard for the current role", body = Page),
        (status = 303, description = "No session, redirect to /login")
    )
)]
pub async fn dashboard(State(session): State<SessionStore>) -> Response {
    let Some(current) = session.current().await else {
        // Logged out between the guard and here.
        return redirect(Target::Login);
    };
    let view = resolver::resolve_claim(&current.identity.role);

    page(
        StatusCode::OK,
        Page::new(PageView::Dashboard)
            .with_dashboard(view)
            .with_session(Some(current.summary())),
    )
}

/// offers
///
/// [Protected Route] Job offers browser. Reachable by any authenticated role.
#[utoipa::path(
    get,
    path = "/ofertas",
    responses((status = 200, description = "Job offers page", body = Page))
)]
pub async fn offers(State(session): State<SessionStore>) -> Json<Page> {
    Json(Page::new(PageView::Offers).with_session(summary(&session).await))
}

/// logout
///
/// [Protected Route] Purely local: the session and any onboarding in progress
/// are dropped, nothing is sent to the API.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Logged out, redirect to /login"))
)]
pub async fn logout(State(state): State<AppState>) -> Response {
    state.session.clear().await;
    // A half-finished company onboarding must not outlive the operator's session.
    state.onboarding.lock().await.discard();
    redirect(Target::Login)
}

// --- Company Onboarding ---

fn onboarding_failure(error: &OnboardingError) -> (StatusCode, Notification) {
    match error {
        OnboardingError::AccountMissing => (
            StatusCode::CONFLICT,
            Notification::error("Missing account", "Create the company account first."),
        ),
        OnboardingError::AlreadyCompleted => (
            StatusCode::CONFLICT,
            Notification::error("Already completed", "Start a new onboarding to add another company."),
        ),
        OnboardingError::Backend(e) if e.is_client_rejection() => (
            StatusCode::BAD_REQUEST,
            Notification::error("Rejected", "The API rejected the submitted data."),
        ),
        OnboardingError::Backend(BackendError::Network(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Notification::error("Connection error", "The server could not be reached."),
        ),
        OnboardingError::Backend(_) => (
            StatusCode::BAD_GATEWAY,
            Notification::error("Error", "An unexpected error occurred. Please try again."),
        ),
    }
}

/// The session allowed to drive the wizard, or the response to send instead.
/// The route guard only knows "logged in"; the role check lives here.
async fn onboarding_session(state: &AppState) -> Result<Session, Response> {
    let Some(current) = state.session.current().await else {
        return Err(redirect(Target::Login));
    };
    if !onboarding::may_onboard(&current.identity.role) {
        tracing::warn!(
            session_id = %current.id,
            role = %current.identity.role,
            "company onboarding refused for role"
        );
        return Err(page(
            StatusCode::FORBIDDEN,
            Page::new(PageView::Unauthorized).with_session(Some(current.summary())),
        ));
    }
    Ok(current)
}

fn onboarding_page(
    session: &Session,
    snapshot: OnboardingSnapshot,
    notification: Option<Notification>,
) -> Page {
    let page = Page::new(PageView::CompanyOnboarding)
        .with_session(Some(session.summary()))
        .with_onboarding(snapshot);
    match notification {
        Some(n) => page.with_notification(n),
        None => page,
    }
}

/// onboarding_status
///
/// [Protected Route] Current wizard state for the operator's session. Progress
/// left by an earlier session is discarded, not shown.
#[utoipa::path(
    get,
    path = "/onboarding/company",
    responses(
        (status = 200, description = "Onboarding wizard state", body = Page),
        (status = 403, description = "Role may not onboard companies", body = Page)
    )
)]
pub async fn onboarding_status(State(state): State<AppState>) -> Response {
    let session = match onboarding_session(&state).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let snapshot = state.onboarding.lock().await.claim(session.id).snapshot();
    page(StatusCode::OK, onboarding_page(&session, snapshot, None))
}

/// onboarding_account
///
/// [Protected Route] Step one of company onboarding.
#[utoipa::path(
    post,
    path = "/onboarding/company/account",
    request_body = CompanyAccountForm,
    responses(
        (status = 200, description = "Account created, wizard on the details step", body = Page),
        (status = 403, description = "Role may not onboard companies", body = Page),
        (status = 422, description = "Invalid form", body = Page)
    )
)]
pub async fn onboarding_account(
    State(state): State<AppState>,
    Json(form): Json<CompanyAccountForm>,
) -> Response {
    let session = match onboarding_session(&state).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    if let Err(errors) = form.validate() {
        return invalid_form(PageView::CompanyOnboarding, errors);
    }

    let (result, snapshot) = {
        let mut guard = state.onboarding.lock().await;
        let wizard = guard.claim(session.id);
        let result = wizard.submit_account(state.backend.as_ref(), &form).await;
        (result, wizard.snapshot())
    };

    match result {
        Ok(_) => page(StatusCode::OK, onboarding_page(&session, snapshot, None)),
        Err(e) => {
            tracing::warn!(error = %e, "company account step failed");
            let (status, notification) = onboarding_failure(&e);
            page(status, onboarding_page(&session, snapshot, Some(notification)))
        }
    }
}

/// onboarding_details
///
/// [Protected Route] Step two of company onboarding.
#[utoipa::path(
    post,
    path = "/onboarding/company/details",
    request_body = CompanyDetailsForm,
    responses(
        (status = 200, description = "Company completed", body = Page),
        (status = 403, description = "Role may not onboard companies", body = Page),
        (status = 409, description = "No account yet, or already completed", body = Page),
        (status = 422, description = "Invalid form", body = Page)
    )
)]
pub async fn onboarding_details(
    State(state): State<AppState>,
    Json(form): Json<CompanyDetailsForm>,
) -> Response {
    let session = match onboarding_session(&state).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    if let Err(errors) = form.validate() {
        return invalid_form(PageView::CompanyOnboarding, errors);
    }

    let (result, snapshot) = {
        let mut guard = state.onboarding.lock().await;
        let wizard = guard.claim(session.id);
        let result = wizard.submit_company(state.backend.as_ref(), &form).await;
        (result, wizard.snapshot())
    };

    match result {
        Ok(completed) => {
            let notification = Notification::success(
                "Company registered",
                format!(
                    "{} has been onboarded.",
                    completed.company.map(|c| c.nombre).unwrap_or_default()
                ),
            );
            page(StatusCode::OK, onboarding_page(&session, snapshot, Some(notification)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "company details step failed");
            let (status, notification) = onboarding_failure(&e);
            page(status, onboarding_page(&session, snapshot, Some(notification)))
        }
    }
}

#[utoipa::path(
    post,
    path = "/onboarding/company/back",
    responses(
        (status = 200, description = "Wizard moved back to the account step", body = Page),
        (status = 403, description = "Role may not onboard companies", body = Page)
    )
)]
pub async fn onboarding_back(State(state): State<AppState>) -> Response {
    let session = match onboarding_session(&state).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let snapshot = state.onboarding.lock().await.claim(session.id).back();
    page(StatusCode::OK, onboarding_page(&session, snapshot, None))
}

#[utoipa::path(
    post,
    path = "/onboarding/company/reset",
    responses(
        (status = 200, description = "Wizard restarted", body = Page),
        (status = 403, description = "Role may not onboard companies", body = Page)
    )
)]
pub async fn onboarding_reset(State(state): State<AppState>) -> Response {
    let session = match onboarding_session(&state).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let snapshot = state.onboarding.lock().await.claim(session.id).reset();
    page(StatusCode::OK, onboarding_page(&session, snapshot, None))
}

// --- Open Pages ---

/// unauthorized
///
/// The page of role-scoped denials, which company onboarding answers with
/// directly. Nothing redirects here; it is also reachable by navigating to it.
#[utoipa::path(
    get,
    path = "/unauthorized",
    responses((status = 403, description = "Unauthorized page", body = Page))
)]
pub async fn unauthorized(State(session): State<SessionStore>) -> Response {
    page(
        StatusCode::FORBIDDEN,
        Page::new(PageView::Unauthorized).with_session(summary(&session).await),
    )
}

/// not_found
///
/// Catch-all for unknown paths.
pub async fn not_found(uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "no such page");
    page(StatusCode::NOT_FOUND, Page::new(PageView::NotFound))
}
