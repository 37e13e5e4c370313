use crate::domain::Domain;
use crate::session::is_session_cookie_name;
use secrecy::Secret;
use serde::Deserialize;
use service_core::error::AppError;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub domains: DomainUrls,
    pub auth: AuthProviderSettings,
    #[serde(default)]
    pub session: SessionSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_static_dir() -> String {
    "portal/static".to_string()
}

/// Externally reachable base URL of each front-end. Only used to build
/// redirect targets, so local and deployed hostnames can differ freely.
#[derive(Deserialize, Clone, Debug)]
pub struct DomainUrls {
    pub www: String,
    pub app: String,
    pub admin: String,
    pub ops: String,
}

impl DomainUrls {
    /// Base URL without a trailing slash.
    pub fn base_url(&self, domain: Domain) -> &str {
        let url = match domain {
            Domain::Www => &self.www,
            Domain::App => &self.app,
            Domain::Admin => &self.admin,
            Domain::Ops => &self.ops,
        };
        url.trim_end_matches('/')
    }

    /// Login lives on the www front-end for every domain.
    pub fn login_url(&self, next: &str) -> String {
        format!(
            "{}/login?next={}",
            self.base_url(Domain::Www),
            urlencoding::encode(next)
        )
    }

    /// `true` when `target` points at one of the configured front-ends.
    pub fn is_known_target(&self, target: &str) -> bool {
        Domain::ALL.iter().any(|domain| {
            let base = self.base_url(*domain);
            target == base
                || target
                    .strip_prefix(base)
                    .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
        })
    }
}

#[derive(Deserialize, Clone)]
pub struct AuthProviderSettings {
    /// Base URL of the GoTrue-compatible auth API (without `/auth/v1`).
    pub url: String,
    pub anon_key: Secret<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionSettings {
    /// Cookie the server layer reads the session from. Must satisfy the
    /// edge presence pattern.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Parent domain shared by all front-ends, e.g. `.example.com`.
    #[serde(default)]
    pub cookie_domain: Option<String>,
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_domain: None,
            secure_cookies: false,
            max_age_days: default_max_age_days(),
        }
    }
}

fn default_cookie_name() -> String {
    "sb-localhost-auth-token".to_string()
}

fn default_max_age_days() -> i64 {
    400
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

#[derive(Deserialize, Clone, Debug)]
pub struct ObservabilitySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Reject settings that would silently break the session contract.
    pub fn validate(&self) -> Result<(), AppError> {
        if !is_session_cookie_name(&self.session.cookie_name) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "session.cookie_name '{}' must start with 'sb-' and contain 'auth-token'",
                self.session.cookie_name
            )));
        }

        for domain in Domain::ALL {
            let url = self.domains.base_url(domain);
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "domains.{} must be an absolute http(s) URL, got '{}'",
                    domain,
                    url
                )));
            }
        }

        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let settings: Settings = service_core::config::load("portal")?;
    settings.validate()?;
    Ok(settings)
}
