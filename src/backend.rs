use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::models::{ApiUser, CompanyDetailsRequest, CompanyProfile, Credentials, LoginResponse, RegisterUserRequest};

// Paths are relative to the configured API base URL.
const LOGIN_PATH: &str = "api/login/";
const REGISTER_PATH: &str = "api/usuarios/";

fn company_update_path(user_id: i64) -> String {
    format!("api/empresas/{}/actualizar/", user_id)
}

/// BackendError
///
/// Failures of the REST API collaborator. The session store collapses these
/// into a single authentication failure; the kind is only kept so the shell can
/// word its notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The API answered with a non-2xx status.
    #[error("backend rejected the request with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    /// The request never completed (connection refused, timeout, DNS...).
    #[error("backend unreachable: {0}")]
    Network(String),
    /// A 2xx answer whose body could not be understood.
    #[error("unexpected backend response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, BackendError::Rejected { status, .. } if (400..500).contains(status))
    }
}

// 1. BackendService Contract
/// BackendService
///
/// The calls the portal itself makes against the REST API. Dashboards talk to
/// the API on their own and are not represented here.
#[async_trait]
pub trait BackendService: Send + Sync {
    /// `POST api/login/`. Returns the `user` record of a successful login.
    async fn login(&self, credentials: &Credentials) -> Result<ApiUser, BackendError>;

    /// `POST api/usuarios/`. Returns the created user record.
    async fn register_user(&self, request: &RegisterUserRequest) -> Result<ApiUser, BackendError>;

    /// `PATCH api/empresas/{user_id}/actualizar/`. Completes the company profile
    /// attached to a freshly created company account.
    async fn complete_company(
        &self,
        user_id: i64,
        request: &CompanyDetailsRequest,
    ) -> Result<CompanyProfile, BackendError>;
}

/// BackendState
///
/// Shared handle to whichever backend implementation the application runs with.
pub type BackendState = Arc<dyn BackendService>;

// 2. The Real Implementation (reqwest)
/// HttpBackendClient
#[derive(Clone)]
pub struct HttpBackendClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

impl HttpBackendClient {
    /// new
    ///
    /// Builds a client for the API rooted at `base_url`. A trailing slash on the
    /// base URL is optional.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turns a reqwest response into the decoded body or a `BackendError`.
    async fn read<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::rejection(status, response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn rejection(status: StatusCode, response: reqwest::Response) -> BackendError {
        // Django REST answers `{"error": ...}` from hand-written views and
        // `{"detail": ...}` from the framework itself; field errors are left raw.
        let body = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.error.or(parsed.detail),
            Err(_) => None,
        }
        .or_else(|| (!body.is_empty()).then_some(body));

        BackendError::Rejected {
            status: status.as_u16(),
            detail,
        }
    }
}

fn network_error(e: reqwest::Error) -> BackendError {
    BackendError::Network(e.to_string())
}

#[async_trait]
impl BackendService for HttpBackendClient {
    async fn login(&self, credentials: &Credentials) -> Result<ApiUser, BackendError> {
        tracing::debug!(email = %credentials.email, "calling backend login");
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(credentials)
            .send()
            .await
            .map_err(network_error)?;

        let body: LoginResponse = Self::read(response).await?;
        Ok(body.user)
    }

    async fn register_user(&self, request: &RegisterUserRequest) -> Result<ApiUser, BackendError> {
        tracing::debug!(email = %request.email, role = %request.role, "calling backend registration");
        let response = self
            .client
            .post(self.url(REGISTER_PATH))
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        Self::read(response).await
    }

    async fn complete_company(
        &self,
        user_id: i64,
        request: &CompanyDetailsRequest,
    ) -> Result<CompanyProfile, BackendError> {
        tracing::debug!(user_id, "completing company profile");
        let response = self
            .client
            .patch(self.url(&company_update_path(user_id)))
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        Self::read(response).await
    }
}

// 3. The Mock Implementation (For Tests)
/// MockBackendService
///
/// In-memory stand-in for the REST API. Logins succeed for the accounts added
/// with [`MockBackendService::with_account`]; registrations echo the request
/// back with a fresh id. Call counters let tests assert that a flow did (or did
/// not) reach the API.
pub struct MockBackendService {
    accounts: Mutex<Vec<(Credentials, ApiUser)>>,
    /// When true, every call fails as if the API were unreachable.
    pub network_down: bool,
    /// When set, registrations and company updates fail with this error.
    pub failure: Option<BackendError>,
    /// Artificial latency applied to every call.
    pub latency: Option<Duration>,
    next_id: AtomicI64,
    login_calls: AtomicUsize,
    register_calls: AtomicUsize,
    company_calls: AtomicUsize,
}

impl Default for MockBackendService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackendService {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            network_down: false,
            failure: None,
            latency: None,
            next_id: AtomicI64::new(100),
            login_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            company_calls: AtomicUsize::new(0),
        }
    }

    pub fn new_unreachable() -> Self {
        Self {
            network_down: true,
            ..Self::new()
        }
    }

    /// Registers an account that `login` will accept.
    pub fn with_account(self, email: &str, password: &str, user: ApiUser) -> Self {
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.push((
                Credentials {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                user,
            ));
        }
        self
    }

    pub fn with_failure(mut self, failure: BackendError) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn company_calls(&self) -> usize {
        self.company_calls.load(Ordering::SeqCst)
    }

    async fn simulate(&self) -> Result<(), BackendError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.network_down {
            return Err(BackendError::Network("mock backend is unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BackendService for MockBackendService {
    async fn login(&self, credentials: &Credentials) -> Result<ApiUser, BackendError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        let accounts = self
            .accounts
            .lock()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        accounts
            .iter()
            .find(|(known, _)| known == credentials)
            .map(|(_, user)| user.clone())
            .ok_or(BackendError::Rejected {
                status: 401,
                detail: Some("Invalid credentials".to_string()),
            })
    }

    async fn register_user(&self, request: &RegisterUserRequest) -> Result<ApiUser, BackendError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        Ok(ApiUser {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: request.email.clone(),
            username: Some(request.nombre.clone()),
            role: request.role.clone(),
            apellido: Some(request.apellido.clone()),
            telefono: Some(request.telefono.clone()),
            empresa: None,
        })
    }

    async fn complete_company(
        &self,
        user_id: i64,
        request: &CompanyDetailsRequest,
    ) -> Result<CompanyProfile, BackendError> {
        self.company_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        Ok(CompanyProfile {
            usuario: Some(user_id),
            nombre: request.nombre.clone(),
            sector: request.sector.clone(),
            direccion: request.direccion.clone(),
        })
    }
}
