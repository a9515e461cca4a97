//! Form payloads accepted by the shell and their existence-level validation.
//!
//! Invalid forms are answered with the list of field errors and never reach
//! the backend.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::{CompanyDetailsRequest, Credentials, RegisterUserRequest};
use crate::role::Role;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));
static HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("handle pattern is valid"));
static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("digits pattern is valid"));

const MIN_PASSWORD: usize = 6;

/// FieldError
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Default)]
struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    fn fail(&mut self, field: &str, message: &str) {
        // First failure per field wins.
        if !self.errors.iter().any(|e| e.field == field) {
            self.errors.push(FieldError {
                field: field.to_string(),
                message: message.to_string(),
            });
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.fail(field, "Email is required");
        } else if !EMAIL.is_match(value.trim()) {
            self.fail(field, "Must be a valid email address");
        }
    }

    fn length(&mut self, field: &str, value: &str, min: usize, max: Option<usize>, message: &str) {
        let len = value.chars().count();
        if len < min || max.is_some_and(|max| len > max) {
            self.fail(field, message);
        }
    }

    fn pattern(&mut self, field: &str, value: &str, pattern: &Regex, message: &str) {
        if !pattern.is_match(value) {
            self.fail(field, message);
        }
    }

    fn password(&mut self, field: &str, value: &str) {
        self.length(
            field,
            value,
            MIN_PASSWORD,
            None,
            "Password must be at least 6 characters",
        );
    }

    fn matches(&mut self, field: &str, value: &str, expected: &str) {
        if value != expected {
            self.fail(field, "Passwords do not match");
        }
    }

    fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Validation for the login form.
impl Credentials {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut checks = Checks::default();
        checks.email("email", &self.email);
        checks.password("password", &self.password);
        checks.finish()
    }
}

/// RegisterForm
///
/// Self-service sign-up. New accounts default to the applicant role.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub lastname: String,
    pub telefono: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default = "default_registration_role")]
    pub role: Role,
}

fn default_registration_role() -> Role {
    Role::Applicant
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut checks = Checks::default();
        checks.email("email", &self.email);

        checks.length("username", &self.username, 3, Some(20), "Username must be 3 to 20 characters");
        checks.pattern(
            "username",
            &self.username,
            &HANDLE,
            "Username may only contain letters, numbers and underscores",
        );

        checks.length("lastname", &self.lastname, 2, Some(20), "Last name must be 2 to 20 characters");
        checks.pattern(
            "lastname",
            &self.lastname,
            &HANDLE,
            "Last name may only contain letters, numbers and underscores",
        );

        checks.length("telefono", &self.telefono, 7, Some(15), "Phone must be 7 to 15 digits");
        checks.pattern("telefono", &self.telefono, &DIGITS, "Phone may only contain digits");

        checks.password("password", &self.password);
        checks.matches("confirmPassword", &self.confirm_password, &self.password);
        checks.finish()
    }

    pub fn to_request(&self) -> RegisterUserRequest {
        RegisterUserRequest {
            nombre: self.username.trim().to_string(),
            apellido: self.lastname.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            telefono: self.telefono.trim().to_string(),
            role: self.role.as_wire().to_string(),
        }
    }
}

/// ForgotPasswordForm
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl ForgotPasswordForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut checks = Checks::default();
        checks.email("email", &self.email);
        checks.finish()
    }
}

/// CompanyAccountForm
///
/// First step of company onboarding: the login account of the company.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CompanyAccountForm {
    pub email: String,
    pub password: String,
    pub password2: String,
    pub nombre: String,
    pub apellido: String,
    pub telefono: String,
    #[serde(default = "default_company_role")]
    pub role: Role,
}

fn default_company_role() -> Role {
    Role::Company
}

impl CompanyAccountForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut checks = Checks::default();
        checks.email("email", &self.email);
        checks.password("password", &self.password);
        checks.length("password2", &self.password2, MIN_PASSWORD, None, "Repeat the password");
        checks.matches("password2", &self.password2, &self.password);
        checks.length("nombre", self.nombre.trim(), 2, None, "Name is required");
        checks.length("apellido", self.apellido.trim(), 2, None, "Last name is required");
        checks.length("telefono", self.telefono.trim(), 6, None, "Phone is required");
        checks.finish()
    }

    pub fn to_request(&self) -> RegisterUserRequest {
        RegisterUserRequest {
            nombre: self.nombre.trim().to_string(),
            apellido: self.apellido.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            telefono: self.telefono.trim().to_string(),
            role: self.role.as_wire().to_string(),
        }
    }
}

/// CompanyDetailsForm
///
/// Second step of company onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CompanyDetailsForm {
    pub sector: String,
    pub nombre: String,
    pub direccion: String,
}

impl CompanyDetailsForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut checks = Checks::default();
        checks.length("sector", self.sector.trim(), 2, None, "Sector is required");
        checks.length("nombre", self.nombre.trim(), 2, None, "Name is required");
        checks.length("direccion", self.direccion.trim(), 2, None, "Address is required");
        checks.finish()
    }

    pub fn to_request(&self) -> CompanyDetailsRequest {
        CompanyDetailsRequest {
            nombre: self.nombre.trim().to_string(),
            sector: self.sector.trim().to_string(),
            direccion: self.direccion.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            email: "ana@example.com".into(),
            username: "ana_p".into(),
            lastname: "perez".into(),
            telefono: "04141234567".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            role: Role::Applicant,
        }
    }

    fn fields(errors: Vec<FieldError>) -> Vec<String> {
        errors.into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn login_requires_email_and_password() {
        let empty = Credentials::default();
        assert_eq!(fields(empty.validate().unwrap_err()), vec!["email", "password"]);

        let ok = Credentials {
            email: "a@x.com".into(),
            password: "secret".into(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let form = ForgotPasswordForm {
            email: "not-an-email".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors[0].message, "Must be a valid email address");
    }

    #[test]
    fn valid_registration_passes() {
        assert!(register_form().validate().is_ok());
    }

    #[test]
    fn registration_reports_one_error_per_field() {
        let mut form = register_form();
        form.username = "a!".into();
        form.telefono = "12ab".into();
        form.confirm_password = "other".into();

        let errors = form.validate().unwrap_err();
        assert_eq!(fields(errors), vec!["username", "telefono", "confirmPassword"]);
    }

    #[test]
    fn registration_request_uses_wire_role() {
        let mut form = register_form();
        form.role = Role::HiringGroupOperator;
        let request = form.to_request();
        assert_eq!(request.role, "HIRING_GROUP");
        assert_eq!(request.nombre, "ana_p");
        assert_eq!(request.apellido, "perez");
    }

    #[test]
    fn registration_role_defaults_to_applicant() {
        let form: RegisterForm = serde_json::from_value(serde_json::json!({
            "email": "ana@example.com",
            "username": "ana_p",
            "lastname": "perez",
            "telefono": "04141234567",
            "password": "secret1",
            "confirmPassword": "secret1"
        }))
        .unwrap();
        assert_eq!(form.role, Role::Applicant);
    }

    #[test]
    fn company_steps_validate() {
        let details = CompanyDetailsForm {
            sector: "IT".into(),
            nombre: "A".into(),
            direccion: "Main St 1".into(),
        };
        assert_eq!(fields(details.validate().unwrap_err()), vec!["nombre"]);

        let account = CompanyAccountForm {
            email: "corp@example.com".into(),
            password: "secret1".into(),
            password2: "secret2".into(),
            nombre: "Corp".into(),
            apellido: "Inc".into(),
            telefono: "123456".into(),
            role: Role::Company,
        };
        assert_eq!(fields(account.validate().unwrap_err()), vec!["password2"]);
        assert_eq!(account.to_request().role, "EMPRESA");
    }
}
