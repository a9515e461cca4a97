use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::role::{Role, RoleClaim};

/// DashboardView
///
/// Identifies the dashboard responsible for a role's experience. The dashboards
/// themselves live in the client and fetch their own data from the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum DashboardView {
    AdminView,
    HiringGroupView,
    CompanyView,
    ApplicantView,
    EmployeeView,
    /// Rendered when the session's role claim is outside the known vocabulary.
    InvalidRoleView,
}

/// resolve
///
/// Fixed, total mapping from a role to its dashboard.
pub fn resolve(role: Role) -> DashboardView {
    match role {
        Role::Administrator => DashboardView::AdminView,
        Role::HiringGroupOperator => DashboardView::HiringGroupView,
        Role::Company => DashboardView::CompanyView,
        Role::Applicant => DashboardView::ApplicantView,
        Role::HiredEmployee => DashboardView::EmployeeView,
    }
}

/// resolve_claim
///
/// Same as [`resolve`] for the role claim actually held by a session. An invalid
/// claim degrades to [`DashboardView::InvalidRoleView`].
pub fn resolve_claim(claim: &RoleClaim) -> DashboardView {
    match claim {
        RoleClaim::Known(role) => resolve(*role),
        RoleClaim::Invalid(raw) => {
            tracing::warn!(role = %raw, "session holds an unrecognised role, rendering fallback view");
            DashboardView::InvalidRoleView
        }
    }
}
