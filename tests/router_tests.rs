use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use hiring_portal::{
    AppConfig, AppState, MockBackendService, create_router,
    backend::{BackendError, BackendState},
    models::{ApiUser, NotificationLevel, Page, PageView},
    onboarding::OnboardingStep,
    resolver::DashboardView,
    role::Role,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

// --- Test Harness ---

struct TestApp {
    router: Router,
    state: AppState,
    backend: Arc<MockBackendService>,
}

fn account(id: i64, email: &str, role: &str) -> ApiUser {
    ApiUser {
        id,
        email: email.to_string(),
        username: Some("tester".to_string()),
        role: role.to_string(),
        ..ApiUser::default()
    }
}

fn app(mock: MockBackendService) -> TestApp {
    let backend = Arc::new(mock);
    let state = AppState::new(backend.clone() as BackendState, AppConfig::default());
    TestApp {
        router: create_router(state.clone()),
        state,
        backend,
    }
}

fn default_app() -> TestApp {
    app(MockBackendService::new()
        .with_account("a@x.com", "secret", account(1, "a@x.com", "EMPRESA"))
        .with_account("root@x.com", "secret", account(2, "root@x.com", "ADMIN"))
        .with_account("hg@x.com", "secret", account(4, "hg@x.com", "HIRING_GROUP"))
        .with_account("odd@x.com", "secret", account(3, "odd@x.com", "SUPERVISOR")))
}

impl TestApp {
    async fn get(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post(&self, uri: &str, body: Value) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> Response {
        self.post("/login", json!({ "email": email, "password": password }))
            .await
    }
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn assert_redirect(response: &Response, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), to);
}

async fn page(response: Response) -> Page {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

fn register_body(email: &str) -> Value {
    json!({
        "email": email,
        "username": "nuevo_user",
        "lastname": "perez",
        "telefono": "04141234567",
        "password": "secret1",
        "confirmPassword": "secret1"
    })
}

fn company_account_body() -> Value {
    json!({
        "email": "empresa@x.com",
        "password": "secret1",
        "password2": "secret1",
        "nombre": "Ana",
        "apellido": "Diaz",
        "telefono": "0212555"
    })
}

fn company_details_body() -> Value {
    json!({ "sector": "Tecnologia", "nombre": "Acme", "direccion": "Caracas" })
}

// --- Landing & Guard ---

#[tokio::test]
async fn test_health_check_reports_environment() {
    let app = default_app();
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok", "env": "local" }));
}

#[tokio::test]
async fn test_root_redirects_anonymous_to_login() {
    let app = default_app();
    assert_redirect(&app.get("/").await, "/login");
}

#[tokio::test]
async fn test_root_redirects_authenticated_to_dashboard() {
    let app = default_app();
    app.login("a@x.com", "secret").await;
    assert_redirect(&app.get("/").await, "/dashboard");
}

#[tokio::test]
async fn test_protected_targets_redirect_anonymous_to_login() {
    let app = default_app();
    for path in ["/dashboard", "/ofertas", "/onboarding/company", "/dashboard/"] {
        assert_redirect(&app.get(path).await, "/login");
    }
    assert_redirect(&app.post("/logout", json!({})).await, "/login");
    assert_redirect(
        &app.post("/onboarding/company/account", company_account_body()).await,
        "/login",
    );
    // Refused before the handler, so the API never saw it.
    assert_eq!(app.backend.register_calls(), 0);
}

#[tokio::test]
async fn test_guest_pages_render_for_anonymous() {
    let app = default_app();
    for (path, view) in [
        ("/login", PageView::Login),
        ("/register", PageView::Register),
        ("/forgot-password", PageView::ForgotPassword),
    ] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(page(response).await.view, view);
    }
}

#[tokio::test]
async fn test_guest_pages_redirect_authenticated_to_dashboard() {
    let app = default_app();
    app.login("a@x.com", "secret").await;

    for path in ["/login", "/register", "/forgot-password"] {
        assert_redirect(&app.get(path).await, "/dashboard");
    }
    // A second login submit is a navigation too.
    assert_redirect(&app.login("root@x.com", "secret").await, "/dashboard");
    assert_eq!(app.backend.login_calls(), 1);
}

// --- Login ---

#[tokio::test]
async fn test_login_success_redirects_to_company_dashboard() {
    let app = default_app();

    let response = app.login("a@x.com", "secret").await;
    assert_redirect(&response, "/dashboard");

    let response = app.get("/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = page(response).await;
    assert_eq!(body.view, PageView::Dashboard);
    assert_eq!(body.dashboard, Some(DashboardView::CompanyView));
    let session = body.session.expect("session summary");
    assert_eq!(session.role, Some(Role::Company));
    assert_eq!(session.email, "a@x.com");
}

#[tokio::test]
async fn test_login_rejected_stays_on_login_with_one_notification() {
    let app = default_app();

    let response = app.login("a@x.com", "wrong-secret").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::LOCATION).is_none());

    let body = page(response).await;
    assert_eq!(body.view, PageView::Login);
    let notification = body.notification.expect("notification");
    assert_eq!(notification.level, NotificationLevel::Error);
    assert_eq!(notification.title, "Authentication error");

    assert!(!app.state.session.is_authenticated().await);
    assert_redirect(&app.get("/dashboard").await, "/login");
}

#[tokio::test]
async fn test_login_invalid_form_never_reaches_backend() {
    let app = default_app();

    let response = app.login("not-an-email", "123").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = page(response).await;
    let fields: Vec<_> = body.field_errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["email", "password"]);
    assert_eq!(app.backend.login_calls(), 0);
}

#[tokio::test]
async fn test_login_with_api_down_is_service_unavailable() {
    let app = app(MockBackendService::new_unreachable());

    let response = app.login("a@x.com", "secret").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = page(response).await;
    assert_eq!(body.notification.map(|n| n.title).as_deref(), Some("Connection error"));
}

// --- Dashboards ---

#[tokio::test]
async fn test_admin_dashboard() {
    let app = default_app();
    app.login("root@x.com", "secret").await;

    let body = page(app.get("/dashboard").await).await;
    assert_eq!(body.dashboard, Some(DashboardView::AdminView));
}

#[tokio::test]
async fn test_unknown_role_renders_invalid_role_dashboard() {
    let app = default_app();
    assert_redirect(&app.login("odd@x.com", "secret").await, "/dashboard");

    let response = app.get("/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = page(response).await;
    assert_eq!(body.dashboard, Some(DashboardView::InvalidRoleView));
    assert_eq!(body.session.and_then(|s| s.role), None);
}

#[tokio::test]
async fn test_offers_page_for_any_role() {
    let app = default_app();
    app.login("odd@x.com", "secret").await;

    let response = app.get("/ofertas").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(page(response).await.view, PageView::Offers);
}

// --- Registration ---

#[tokio::test]
async fn test_register_logs_in_without_login_call() {
    let app = default_app();

    let response = app.post("/register", register_body("nuevo@x.com")).await;
    assert_redirect(&response, "/dashboard");
    assert_eq!(app.backend.register_calls(), 1);
    assert_eq!(app.backend.login_calls(), 0);

    let body = page(app.get("/dashboard").await).await;
    assert_eq!(body.dashboard, Some(DashboardView::ApplicantView));
}

#[tokio::test]
async fn test_register_with_submitted_role() {
    let app = default_app();
    let mut body = register_body("empleado@x.com");
    body["role"] = json!("HiredEmployee");

    assert_redirect(&app.post("/register", body).await, "/dashboard");

    let body = page(app.get("/dashboard").await).await;
    assert_eq!(body.dashboard, Some(DashboardView::EmployeeView));
}

#[tokio::test]
async fn test_register_invalid_form() {
    let app = default_app();
    let mut body = register_body("nuevo@x.com");
    body["confirmPassword"] = json!("different");
    body["username"] = json!("no spaces allowed");

    let response = app.post("/register", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = page(response).await.field_errors;
    assert!(errors.iter().any(|e| e.field == "confirmPassword"));
    assert!(errors.iter().any(|e| e.field == "username"));
    assert_eq!(app.backend.register_calls(), 0);
}

#[tokio::test]
async fn test_register_rejected_by_api() {
    let app = app(MockBackendService::new().with_failure(BackendError::Rejected {
        status: 400,
        detail: Some("usuario with this email already exists.".to_string()),
    }));

    let response = app.post("/register", register_body("dup@x.com")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = page(response).await;
    assert_eq!(body.view, PageView::Register);
    assert_eq!(
        body.notification.map(|n| n.description).as_deref(),
        Some("usuario with this email already exists.")
    );
    assert!(!app.state.session.is_authenticated().await);
}

#[tokio::test]
async fn test_register_server_error_is_bad_gateway() {
    let app = app(MockBackendService::new().with_failure(BackendError::Rejected {
        status: 500,
        detail: None,
    }));

    let response = app.post("/register", register_body("nuevo@x.com")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// --- Password Recovery ---

#[tokio::test]
async fn test_forgot_password_acknowledges_locally() {
    let app = default_app();

    let response = app
        .post("/forgot-password", json!({ "email": "a@x.com" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = page(response).await;
    assert_eq!(body.view, PageView::ForgotPasswordSent);
    assert_eq!(
        body.notification.map(|n| n.level),
        Some(NotificationLevel::Success)
    );
    assert_eq!(app.backend.login_calls(), 0);
}

#[tokio::test]
async fn test_forgot_password_requires_email() {
    let app = default_app();
    let response = app.post("/forgot-password", json!({ "email": "" })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- Logout ---

#[tokio::test]
async fn test_logout_clears_session() {
    let app = default_app();
    app.login("root@x.com", "secret").await;

    assert_redirect(&app.post("/logout", json!({})).await, "/login");

    assert!(!app.state.session.is_authenticated().await);
    assert_redirect(&app.get("/dashboard").await, "/login");
    assert_eq!(page(app.get("/login").await).await.view, PageView::Login);
}

// --- Open Pages ---

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = default_app();

    let response = app.get("/no/such/page").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(page(response).await.view, PageView::NotFound);

    // Same with a session.
    app.login("a@x.com", "secret").await;
    assert_eq!(app.get("/nope").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unauthorized_page_is_directly_reachable() {
    let app = default_app();

    let response = app.get("/unauthorized").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(page(response).await.view, PageView::Unauthorized);

    app.login("a@x.com", "secret").await;
    let response = app.get("/unauthorized").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = default_app();
    let response = app.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

// --- Company Onboarding ---

#[tokio::test]
async fn test_company_onboarding_flow() {
    let app = default_app();
    app.login("root@x.com", "secret").await;
    let operator = app.state.session.current().await.expect("operator session");

    let body = page(app.get("/onboarding/company").await).await;
    assert_eq!(body.onboarding.map(|o| o.step), Some(OnboardingStep::Account));

    let response = app
        .post("/onboarding/company/account", company_account_body())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = page(response).await.onboarding.expect("snapshot");
    assert_eq!(snapshot.step, OnboardingStep::CompanyDetails);
    assert_eq!(snapshot.account_email.as_deref(), Some("empresa@x.com"));

    let response = app
        .post("/onboarding/company/details", company_details_body())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = page(response).await;
    let snapshot = body.onboarding.expect("snapshot");
    assert_eq!(snapshot.step, OnboardingStep::Completed);
    assert_eq!(snapshot.company.map(|c| c.nombre).as_deref(), Some("Acme"));
    assert_eq!(
        body.notification.map(|n| n.level),
        Some(NotificationLevel::Success)
    );

    // Onboarding a company does not touch the operator's session.
    assert_eq!(app.state.session.current().await, Some(operator));
    assert_eq!(app.backend.register_calls(), 1);
    assert_eq!(app.backend.company_calls(), 1);
}

#[tokio::test]
async fn test_company_onboarding_back_does_not_recreate_account() {
    let app = default_app();
    app.login("root@x.com", "secret").await;

    app.post("/onboarding/company/account", company_account_body())
        .await;
    let snapshot = page(app.post("/onboarding/company/back", json!({})).await)
        .await
        .onboarding
        .expect("snapshot");
    assert_eq!(snapshot.step, OnboardingStep::Account);

    let mut edited = company_account_body();
    edited["telefono"] = json!("0212999");
    let response = app.post("/onboarding/company/account", edited).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.backend.register_calls(), 1);
}

#[tokio::test]
async fn test_company_details_before_account_is_conflict() {
    let app = default_app();
    app.login("root@x.com", "secret").await;

    let response = app
        .post("/onboarding/company/details", company_details_body())
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(app.backend.company_calls(), 0);
}

#[tokio::test]
async fn test_company_onboarding_reset() {
    let app = default_app();
    app.login("root@x.com", "secret").await;
    app.post("/onboarding/company/account", company_account_body())
        .await;

    let snapshot = page(app.post("/onboarding/company/reset", json!({})).await)
        .await
        .onboarding
        .expect("snapshot");
    assert_eq!(snapshot.step, OnboardingStep::Account);
    assert_eq!(snapshot.account_id, None);
}

#[tokio::test]
async fn test_company_account_invalid_form() {
    let app = default_app();
    app.login("root@x.com", "secret").await;

    let mut body = company_account_body();
    body["password2"] = json!("other-password");
    let response = app.post("/onboarding/company/account", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.backend.register_calls(), 0);
}

#[tokio::test]
async fn test_logout_discards_onboarding_in_progress() {
    let app = default_app();
    app.login("root@x.com", "secret").await;
    let response = app
        .post("/onboarding/company/account", company_account_body())
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_redirect(&app.post("/logout", json!({})).await, "/login");
    app.login("hg@x.com", "secret").await;

    let snapshot = page(app.get("/onboarding/company").await)
        .await
        .onboarding
        .expect("snapshot");
    assert_eq!(snapshot.step, OnboardingStep::Account);
    assert_eq!(snapshot.account_email, None);
    assert_eq!(snapshot.account_id, None);

    // The previous operator's company can no longer be completed.
    let response = app
        .post("/onboarding/company/details", company_details_body())
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(app.backend.company_calls(), 0);
}

#[tokio::test]
async fn test_hiring_group_operator_can_onboard() {
    let app = default_app();
    app.login("hg@x.com", "secret").await;

    let response = app
        .post("/onboarding/company/account", company_account_body())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.backend.register_calls(), 1);
}

#[tokio::test]
async fn test_company_onboarding_refused_for_other_roles() {
    for email in ["a@x.com", "odd@x.com"] {
        let app = default_app();
        app.login(email, "secret").await;

        let response = app.get("/onboarding/company").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = page(response).await;
        assert_eq!(body.view, PageView::Unauthorized);
        assert!(body.onboarding.is_none());

        let response = app
            .post("/onboarding/company/account", company_account_body())
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let response = app
            .post("/onboarding/company/details", company_details_body())
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        assert_eq!(app.backend.register_calls(), 0);
        assert_eq!(app.backend.company_calls(), 0);
        // Still logged in: a denial is not a logout.
        assert!(app.state.session.is_authenticated().await);
    }
}
