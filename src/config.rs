use serde::Serialize;
use std::env;
use std::time::Duration;

const LOCAL_API_BASE_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// AppConfig
///
/// Immutable runtime configuration, loaded once at start-up and shared with the
/// handlers through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and which settings are mandatory.
    pub env: Env,
    // Root of the Hiring Group REST API (login, registration, company profiles).
    pub api_base_url: String,
    // Per-request timeout for calls to the REST API.
    pub api_timeout: Duration,
    // Address the portal listens on.
    pub bind_addr: String,
}

/// Env
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking values for tests; nothing here is read from the environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base_url: LOCAL_API_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// In production, when `HIRING_API_BASE_URL` is missing. Also when
    /// `HIRING_API_TIMEOUT_SECS` is set but is not a positive integer.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = match env {
            Env::Production => env::var("HIRING_API_BASE_URL")
                .expect("FATAL: HIRING_API_BASE_URL must be set in production."),
            Env::Local => {
                env::var("HIRING_API_BASE_URL").unwrap_or_else(|_| LOCAL_API_BASE_URL.to_string())
            }
        };

        let api_timeout = match env::var("HIRING_API_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .expect("FATAL: HIRING_API_TIMEOUT_SECS must be a positive integer.");
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Self {
            env,
            api_base_url,
            api_timeout,
            bind_addr,
        }
    }
}
