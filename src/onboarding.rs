use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    backend::{BackendError, BackendService},
    forms::{CompanyAccountForm, CompanyDetailsForm},
    models::{ApiUser, CompanyProfile},
    role::{Role, RoleClaim},
};

/// may_onboard
///
/// Company onboarding is a Hiring Group tool. Administrators may use it too;
/// every other role, and an unrecognised one, is refused.
pub fn may_onboard(role: &RoleClaim) -> bool {
    match role {
        RoleClaim::Known(Role::HiringGroupOperator | Role::Administrator) => true,
        RoleClaim::Known(Role::Company | Role::Applicant | Role::HiredEmployee) => false,
        RoleClaim::Invalid(_) => false,
    }
}

/// OnboardingStep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum OnboardingStep {
    Account,
    CompanyDetails,
    Completed,
}

/// OnboardingSnapshot
///
/// What the client needs to redraw the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OnboardingSnapshot {
    pub step: OnboardingStep,
    /// Id of the company account created in step one, once it exists.
    pub account_id: Option<i64>,
    pub account_email: Option<String>,
    pub company: Option<CompanyProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OnboardingError {
    #[error("company details require an account created in the first step")]
    AccountMissing,
    #[error("onboarding already completed; reset it to onboard another company")]
    AlreadyCompleted,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// CompanyOnboarding
///
/// Two-step wizard used by Hiring Group operators: create the company's login
/// account, then fill in the company profile attached to it.
///
/// The account is created at most once per wizard run. Going back to the first
/// step and resubmitting only updates the locally held form data. The wizard
/// never touches the operator's own session, but it belongs to one: a run is
/// discarded as soon as it is used from a different session.
pub struct CompanyOnboarding {
    owner: Option<Uuid>,
    step: OnboardingStep,
    account: Option<ApiUser>,
    company: Option<CompanyProfile>,
}

/// OnboardingState
///
/// One wizard per running portal. The mutex also serialises concurrent
/// submissions of the same step.
pub type OnboardingState = Arc<Mutex<CompanyOnboarding>>;

impl Default for CompanyOnboarding {
    fn default() -> Self {
        Self {
            owner: None,
            step: OnboardingStep::Account,
            account: None,
            company: None,
        }
    }
}

impl CompanyOnboarding {
    pub fn new() -> Self {
        Self::default()
    }

    /// claim
    ///
    /// Binds the wizard to `session_id`. Progress left by any other session is
    /// thrown away first.
    pub fn claim(&mut self, session_id: Uuid) -> &mut Self {
        if self.owner != Some(session_id) {
            if self.owner.is_some() {
                tracing::info!(session_id = %session_id, "discarding onboarding left by another session");
            }
            *self = Self::default();
            self.owner = Some(session_id);
        }
        self
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn snapshot(&self) -> OnboardingSnapshot {
        OnboardingSnapshot {
            step: self.step(),
            account_id: self.account.as_ref().map(|a| a.id),
            account_email: self.account.as_ref().map(|a| a.email.clone()),
            company: self.company.clone(),
        }
    }

    /// submit_account
    ///
    /// Step one. The first successful submission creates the account through
    /// the backend; on failure the wizard stays on this step.
    pub async fn submit_account(
        &mut self,
        backend: &dyn BackendService,
        form: &CompanyAccountForm,
    ) -> Result<OnboardingSnapshot, OnboardingError> {
        if self.step() == OnboardingStep::Completed {
            return Err(OnboardingError::AlreadyCompleted);
        }

        match &mut self.account {
            Some(account) => {
                // Already created; keep the edits locally for display only.
                account.email = form.email.trim().to_string();
                account.username = Some(form.nombre.trim().to_string());
                account.apellido = Some(form.apellido.trim().to_string());
                account.telefono = Some(form.telefono.trim().to_string());
            }
            None => {
                let created = backend.register_user(&form.to_request()).await?;
                tracing::info!(account_id = created.id, "company account created");
                self.account = Some(created);
            }
        }

        self.step = OnboardingStep::CompanyDetails;
        Ok(self.snapshot())
    }

    /// submit_company
    ///
    /// Step two. Sends the company profile for the account created in step one.
    pub async fn submit_company(
        &mut self,
        backend: &dyn BackendService,
        form: &CompanyDetailsForm,
    ) -> Result<OnboardingSnapshot, OnboardingError> {
        if self.step() == OnboardingStep::Completed {
            return Err(OnboardingError::AlreadyCompleted);
        }
        let account_id = self
            .account
            .as_ref()
            .map(|a| a.id)
            .ok_or(OnboardingError::AccountMissing)?;

        let company = backend.complete_company(account_id, &form.to_request()).await?;
        tracing::info!(account_id, company = %company.nombre, "company onboarding completed");

        self.company = Some(company);
        self.step = OnboardingStep::Completed;
        Ok(self.snapshot())
    }

    /// Returns from the details step to the account step.
    pub fn back(&mut self) -> OnboardingSnapshot {
        if self.step() == OnboardingStep::CompanyDetails {
            self.step = OnboardingStep::Account;
        }
        self.snapshot()
    }

    /// Forgets everything, owner included. Used on logout.
    pub fn discard(&mut self) {
        *self = Self::default();
    }

    /// Starts over. The wizard stays bound to its session.
    pub fn reset(&mut self) -> OnboardingSnapshot {
        let owner = self.owner;
        *self = Self::default();
        self.owner = owner;
        self.snapshot()
    }
}
