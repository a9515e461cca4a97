use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::forms::FieldError;
use crate::onboarding::OnboardingSnapshot;
use crate::resolver::DashboardView;
use crate::role::Role;

// --- REST API Schemas (wire format) ---

/// Credentials
///
/// Body of `POST api/login/`. Also accepted as-is by the shell's own login form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// Keeps passwords out of `{:?}` output and therefore out of the logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// ApiUser
///
/// A user record as returned by the API, either nested in a login response or
/// as the body of a registration response. The login view calls the first name
/// `username`, the registration serializer calls it `nombre`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ApiUser {
    pub id: i64,
    pub email: String,
    #[serde(default, alias = "nombre")]
    pub username: Option<String>,
    /// Wire vocabulary: `ADMIN`, `HIRING_GROUP`, `EMPRESA`, `POSTULANTE`, `CONTRATADO`.
    pub role: String,
    #[serde(default)]
    pub apellido: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub empresa: Option<String>,
}

/// LoginResponse
///
/// Only the `user` record is read. The greeting and the `access`/`refresh`
/// tokens that come with it are dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: ApiUser,
}

/// RegisterUserRequest
///
/// Body of `POST api/usuarios/`. `role` is in wire vocabulary.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub password: String,
    pub telefono: String,
    pub role: String,
}

impl std::fmt::Debug for RegisterUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUserRequest")
            .field("nombre", &self.nombre)
            .field("apellido", &self.apellido)
            .field("email", &self.email)
            .field("telefono", &self.telefono)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// CompanyDetailsRequest
///
/// Body of `PATCH api/empresas/{id}/actualizar/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyDetailsRequest {
    pub nombre: String,
    pub sector: String,
    pub direccion: String,
}

/// CompanyProfile
///
/// The company record echoed back by the API after an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS, ToSchema, Default)]
#[ts(export)]
pub struct CompanyProfile {
    #[serde(default)]
    pub usuario: Option<i64>,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub direccion: String,
}

// --- Page Descriptors (shell output) ---

/// PageView
///
/// The page the client should render for a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum PageView {
    Login,
    Register,
    ForgotPassword,
    ForgotPasswordSent,
    Dashboard,
    Offers,
    CompanyOnboarding,
    Unauthorized,
    NotFound,
}

/// NotificationLevel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Notification
///
/// A single user-visible message (the client shows it as a toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// SessionSummary
///
/// What the client is told about the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub user_id: i64,
    pub email: String,
    pub display_name: String,
    /// `None` when the backend assigned a role outside the known vocabulary.
    pub role: Option<Role>,
    #[ts(type = "string")]
    pub established_at: DateTime<Utc>,
}

/// Page
///
/// Response body of every page-rendering route.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Page {
    pub view: PageView,
    /// Set on the dashboard page: which role dashboard to mount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding: Option<OnboardingSnapshot>,
}

impl Page {
    pub fn new(view: PageView) -> Self {
        Self {
            view,
            dashboard: None,
            session: None,
            notification: None,
            field_errors: Vec::new(),
            onboarding: None,
        }
    }

    pub fn with_dashboard(mut self, dashboard: DashboardView) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    pub fn with_session(mut self, session: Option<SessionSummary>) -> Self {
        self.session = session;
        self
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn with_field_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.field_errors = errors;
        self
    }

    pub fn with_onboarding(mut self, snapshot: OnboardingSnapshot) -> Self {
        self.onboarding = Some(snapshot);
        self
    }
}
