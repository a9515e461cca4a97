use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    backend::{BackendError, BackendState},
    models::{ApiUser, Credentials, Notification, RegisterUserRequest, SessionSummary},
    role::RoleClaim,
};

/// Identity
///
/// Who is logged in. Built from the user record the API hands back on login or
/// registration; the role is translated from wire vocabulary exactly once, here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: RoleClaim,
}

impl From<ApiUser> for Identity {
    fn from(user: ApiUser) -> Self {
        // Fall back to the local part of the email when the API has no name.
        let display_name = user
            .username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user.email.split('@').next().unwrap_or_default().to_string());

        Identity {
            id: user.id,
            role: RoleClaim::from_wire(&user.role),
            email: user.email,
            display_name,
        }
    }
}

/// Session
///
/// An established session. The session id exists only to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub identity: Identity,
    pub established_at: DateTime<Utc>,
}

impl Session {
    fn new(identity: Identity) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            established_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            user_id: self.identity.id,
            email: self.identity.email.clone(),
            display_name: self.identity.display_name.clone(),
            role: self.identity.role.role(),
            established_at: self.established_at,
        }
    }
}

/// SessionState
///
/// The two states of the portal's session machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(RoleClaim),
}

/// AuthFailure
///
/// The one failure type of `authenticate`/`register`. Whatever went wrong with
/// the backend is kept as the source so the notification can be worded, but
/// callers are not expected to branch on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("authentication failed: {0}")]
    Backend(#[from] BackendError),
    #[error("another authentication attempt is already in progress")]
    AttemptInProgress,
    /// The session was cleared while the attempt was in flight; its result is dropped.
    #[error("the session was cleared before the attempt completed")]
    Superseded,
}

impl AuthFailure {
    /// The toast shown for a failed login.
    pub fn login_notification(&self) -> Notification {
        match self {
            AuthFailure::Backend(e) if e.is_client_rejection() => Notification::error(
                "Authentication error",
                "Incorrect credentials. Please try again.",
            ),
            AuthFailure::Backend(BackendError::Network(_)) => Notification::error(
                "Connection error",
                "The server could not be reached. Please try again.",
            ),
            AuthFailure::Backend(_) => Notification::error(
                "Error",
                "An unexpected error occurred. Please try again.",
            ),
            AuthFailure::AttemptInProgress => Notification::error(
                "Please wait",
                "A sign-in attempt is already in progress.",
            ),
            AuthFailure::Superseded => Notification::error(
                "Signed out",
                "You signed out before the sign-in completed.",
            ),
        }
    }

    /// The toast shown for a failed registration.
    pub fn registration_notification(&self) -> Notification {
        match self {
            AuthFailure::Backend(BackendError::Rejected { detail, status, .. })
                if (400..500).contains(status) =>
            {
                Notification::error(
                    "Registration error",
                    detail
                        .clone()
                        .unwrap_or_else(|| "The account could not be created. Please try again.".to_string()),
                )
            }
            AuthFailure::AttemptInProgress => Notification::error(
                "Please wait",
                "A registration is already in progress.",
            ),
            other => other.login_notification(),
        }
    }
}

/// Resets the pending flag when an attempt finishes, however it finishes.
struct PendingAttempt<'a>(&'a AtomicBool);

impl Drop for PendingAttempt<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct SessionInner {
    backend: BackendState,
    current: RwLock<Option<Session>>,
    pending: AtomicBool,
    // Bumped by every `clear`, under the write lock.
    generation: AtomicU64,
}

/// SessionStore
///
/// Single source of truth for "who is logged in and as what". One store is
/// created at start-up and handed to the router state; clones share it.
///
/// Only `authenticate`, `register`, `establish` and `clear` write to it. The
/// lock is never held across a backend call, so readers (the navigation guard
/// on every request) are not blocked by a slow login.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    pub fn new(backend: BackendState) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                backend,
                current: RwLock::new(None),
                pending: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    fn begin_attempt(&self) -> Result<PendingAttempt<'_>, AuthFailure> {
        self.inner
            .pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| PendingAttempt(&self.inner.pending))
            .map_err(|_| AuthFailure::AttemptInProgress)
    }

    /// authenticate
    ///
    /// Logs in through the backend. On success the held session is replaced,
    /// unless `clear` ran while the call was in flight. On failure it is left
    /// exactly as it was. Never retried.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthFailure> {
        let _attempt = self.begin_attempt()?;
        let generation = self.generation();

        match self.inner.backend.login(credentials).await {
            Ok(user) => self.establish_unless_cleared(generation, Identity::from(user)).await,
            Err(e) => {
                tracing::warn!(email = %credentials.email, error = %e, "login failed");
                Err(AuthFailure::Backend(e))
            }
        }
    }

    /// register
    ///
    /// Creates the account through the backend and establishes a session from
    /// the returned record, without a second login round-trip.
    pub async fn register(&self, request: &RegisterUserRequest) -> Result<Session, AuthFailure> {
        let _attempt = self.begin_attempt()?;
        let generation = self.generation();

        match self.inner.backend.register_user(request).await {
            Ok(user) => self.establish_unless_cleared(generation, Identity::from(user)).await,
            Err(e) => {
                tracing::warn!(email = %request.email, error = %e, "registration failed");
                Err(AuthFailure::Backend(e))
            }
        }
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Establishes the session only if no `clear` happened since `generation`
    /// was read. A logout during a pending login must stay a logout.
    async fn establish_unless_cleared(
        &self,
        generation: u64,
        identity: Identity,
    ) -> Result<Session, AuthFailure> {
        let mut current = self.inner.current.write().await;
        if self.generation() != generation {
            tracing::info!(user_id = identity.id, "session cleared during the attempt, result dropped");
            return Err(AuthFailure::Superseded);
        }
        let session = Session::new(identity);
        let previous = current.replace(session.clone());
        drop(current);

        Self::log_established(&session, previous);
        Ok(session)
    }

    /// establish
    ///
    /// Sets the session directly from a freshly obtained identity.
    pub async fn establish(&self, identity: Identity) -> Session {
        let session = Session::new(identity);
        let previous = self.inner.current.write().await.replace(session.clone());

        Self::log_established(&session, previous);
        session
    }

    fn log_established(session: &Session, previous: Option<Session>) {
        if let Some(previous) = previous {
            tracing::info!(replaced = %previous.id, "replacing existing session");
        }
        tracing::info!(
            session_id = %session.id,
            user_id = session.identity.id,
            role = %session.identity.role,
            "session established"
        );
    }

    /// clear
    ///
    /// Drops the session unconditionally and returns what was held, if anything.
    pub async fn clear(&self) -> Option<Session> {
        let mut current = self.inner.current.write().await;
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        let previous = current.take();
        drop(current);

        if let Some(session) = &previous {
            tracing::info!(session_id = %session.id, "session cleared");
        }
        previous
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.current.read().await.is_some()
    }

    pub async fn current_role(&self) -> Option<RoleClaim> {
        self.inner
            .current
            .read()
            .await
            .as_ref()
            .map(|session| session.identity.role.clone())
    }

    pub async fn current(&self) -> Option<Session> {
        self.inner.current.read().await.clone()
    }

    pub async fn state(&self) -> SessionState {
        match self.current_role().await {
            Some(role) => SessionState::Authenticated(role),
            None => SessionState::Anonymous,
        }
    }

    /// True while a login or registration call is in flight.
    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::SeqCst)
    }
}
