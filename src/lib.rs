use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session model and navigation.
pub mod guard;
pub mod navigation;
pub mod resolver;
pub mod role;
pub mod session;

// Collaborators and payloads.
pub mod backend;
pub mod config;
pub mod forms;
pub mod models;
pub mod onboarding;

// HTTP surface.
pub mod handlers;
pub mod routes;
use routes::{guest, protected, public};

// --- Public Re-exports ---

pub use backend::{BackendService, BackendState, HttpBackendClient, MockBackendService};
pub use config::AppConfig;
pub use navigation::Navigation;
pub use onboarding::{CompanyOnboarding, OnboardingState};
pub use session::{SessionState, SessionStore};

/// ApiDoc
///
/// OpenAPI document for the portal's navigation surface, served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::login_page, handlers::login, handlers::register_page,
        handlers::register, handlers::forgot_password_page, handlers::forgot_password,
        handlers::dashboard, handlers::offers, handlers::logout, handlers::onboarding_status,
        handlers::onboarding_account, handlers::onboarding_details, handlers::onboarding_back,
        handlers::onboarding_reset, handlers::unauthorized
    ),
    components(
        schemas(
            models::Page, models::PageView, models::Notification, models::NotificationLevel,
            models::SessionSummary, models::Credentials, models::CompanyProfile,
            forms::RegisterForm, forms::ForgotPasswordForm, forms::CompanyAccountForm,
            forms::CompanyDetailsForm, forms::FieldError, onboarding::OnboardingSnapshot,
            onboarding::OnboardingStep, resolver::DashboardView, role::Role,
        )
    ),
    tags(
        (name = "hiring-portal", description = "Hiring Group portal navigation API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a handler may need, created once at start-up. The session store
/// and the onboarding wizard are process-wide: one running portal is one UI.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionStore,
    /// REST API client, also used directly by the onboarding wizard.
    pub backend: BackendState,
    pub onboarding: OnboardingState,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state around a backend; the session starts anonymous.
    pub fn new(backend: BackendState, config: AppConfig) -> Self {
        Self {
            session: SessionStore::new(backend.clone()),
            backend,
            onboarding: Arc::new(Mutex::new(CompanyOnboarding::new())),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionStore {
    fn from_ref(app_state: &AppState) -> SessionStore {
        app_state.session.clone()
    }
}

impl FromRef<AppState> for OnboardingState {
    fn from_ref(app_state: &AppState) -> OnboardingState {
        app_state.onboarding.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// navigation_guard
///
/// Runs the route guard before every handler. Redirects are normal navigation,
/// not errors: the client just follows the `303`.
async fn navigation_guard(
    State(session): State<SessionStore>,
    request: Request,
    next: Next,
) -> Response {
    match navigation::navigate(&session, request.uri().path()).await {
        Navigation::Render(_) => next.run(request).await,
        Navigation::Redirect(target) => Redirect::to(target.path()).into_response(),
    }
}

/// create_router
///
/// Assembles the routing table, the navigation guard and the observability
/// layers around the given state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(guest::guest_routes())
        .merge(protected::protected_routes())
        .fallback(handlers::not_found)
        // The guard must wrap every route above, fallback included.
        .layer(middleware::from_fn_with_state(state.clone(), navigation_guard))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, tagged with the `x-request-id` so every log line
/// of the request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
