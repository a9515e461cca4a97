use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;

/// Role
///
/// The closed set of principal kinds known to the portal. Every authenticated
/// identity carries exactly one of these for the lifetime of its session.
///
/// Matches over `Role` are kept exhaustive (no `_` arms) so that adding a
/// variant breaks the build at every dispatch site until it is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Role {
    Administrator,
    HiringGroupOperator,
    Company,
    Applicant,
    HiredEmployee,
}

impl Role {
    /// Every role, in a stable order.
    pub const ALL: [Role; 5] = [
        Role::Administrator,
        Role::HiringGroupOperator,
        Role::Company,
        Role::Applicant,
        Role::HiredEmployee,
    ];

    /// from_wire
    ///
    /// Translates a role string as sent by the REST API (`ADMIN`, `HIRING_GROUP`,
    /// `EMPRESA`, `POSTULANTE`, `CONTRATADO`) into the UI enumeration.
    /// Surrounding whitespace and letter case are ignored.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Administrator),
            "HIRING_GROUP" => Some(Role::HiringGroupOperator),
            "EMPRESA" => Some(Role::Company),
            "POSTULANTE" => Some(Role::Applicant),
            "CONTRATADO" => Some(Role::HiredEmployee),
            _ => None,
        }
    }

    /// The API vocabulary for this role. Only needed when submitting a registration.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::Administrator => "ADMIN",
            Role::HiringGroupOperator => "HIRING_GROUP",
            Role::Company => "EMPRESA",
            Role::Applicant => "POSTULANTE",
            Role::HiredEmployee => "CONTRATADO",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Administrator => "administrator",
            Role::HiringGroupOperator => "hiring_group_operator",
            Role::Company => "company",
            Role::Applicant => "applicant",
            Role::HiredEmployee => "hired_employee",
        };
        f.write_str(label)
    }
}

/// RoleClaim
///
/// The role an identity was admitted with. A backend that hands out a role
/// string outside the wire vocabulary still yields a session, but with an
/// `Invalid` claim holding the raw value. The role resolver turns that into the
/// invalid-role view instead of failing the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "value")]
#[ts(export)]
pub enum RoleClaim {
    Known(Role),
    Invalid(String),
}

impl RoleClaim {
    pub fn from_wire(value: &str) -> Self {
        match Role::from_wire(value) {
            Some(role) => RoleClaim::Known(role),
            None => RoleClaim::Invalid(value.to_string()),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            RoleClaim::Known(role) => Some(*role),
            RoleClaim::Invalid(_) => None,
        }
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        RoleClaim::Known(role)
    }
}

impl fmt::Display for RoleClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleClaim::Known(role) => role.fmt(f),
            RoleClaim::Invalid(raw) => write!(f, "invalid({raw})"),
        }
    }
}
