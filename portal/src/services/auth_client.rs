use crate::config::AuthProviderSettings;
use crate::session::StoredSession;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::error::AppError;
use service_core::observability::TraceContextExt;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use uuid::Uuid;

/// User as verified by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// The managed authentication backend. Only the server layer talks to it;
/// the edge gate never does.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify an access token. `Ok(None)` when the provider rejects it.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AppError>;

    /// Password grant. `Ok(None)` on bad credentials.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<StoredSession>, AppError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
}

/// HTTP client for a GoTrue-compatible auth API.
pub struct AuthClient {
    client: Client,
    settings: AuthProviderSettings,
}

impl AuthClient {
    pub fn new(settings: AuthProviderSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    pub fn base_url(&self) -> &str {
        self.settings.url.trim_end_matches('/')
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url(), path)
    }

    fn provider_error(url: &str, status: StatusCode) -> AppError {
        tracing::error!(url = %url, status = %status, "Auth provider returned an unexpected status");
        AppError::BadGateway(format!("auth provider returned {}", status))
    }
}

#[async_trait]
impl AuthProvider for AuthClient {
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AppError> {
        let url = self.endpoint("/user");

        let response = self
            .client
            .get(&url)
            .header("apikey", self.settings.anon_key.expose_secret())
            .bearer_auth(access_token)
            .with_trace_context()
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send GET request to {}: {}", url, e);
                AppError::from(e)
            })?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<AuthUser>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::debug!("Auth provider rejected session token");
                Ok(None)
            }
            status => Err(Self::provider_error(&url, status)),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<StoredSession>, AppError> {
        let url = self.endpoint("/token?grant_type=password");

        let response = self
            .client
            .post(&url)
            .header("apikey", self.settings.anon_key.expose_secret())
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .with_trace_context()
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", url, e);
                AppError::from(e)
            })?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<StoredSession>().await?)),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
                Ok(None)
            }
            status => Err(Self::provider_error(&url, status)),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let url = self.endpoint("/logout");

        let response = self
            .client
            .post(&url)
            .header("apikey", self.settings.anon_key.expose_secret())
            .bearer_auth(access_token)
            .with_trace_context()
            .send()
            .await?;

        match response.status() {
            // An already-invalid token is as good as revoked.
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            status => Err(Self::provider_error(&url, status)),
        }
    }
}

/// In-process provider for tests and local demos.
#[derive(Default)]
pub struct MockAuthProvider {
    tokens: RwLock<HashMap<String, AuthUser>>,
    passwords: RwLock<HashMap<String, (String, AuthUser)>>,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `access_token` as a session for `user`.
    pub fn with_token(self, access_token: &str, user: AuthUser) -> Result<Self, AppError> {
        self.tokens
            .write()
            .map_err(|_| poisoned())?
            .insert(access_token.to_string(), user);
        Ok(self)
    }

    /// Accept `email`/`password`; signing in mints `token-<user id>`.
    pub fn with_password(
        self,
        email: &str,
        password: &str,
        user: AuthUser,
    ) -> Result<Self, AppError> {
        self.passwords
            .write()
            .map_err(|_| poisoned())?
            .insert(email.to_ascii_lowercase(), (password.to_string(), user));
        Ok(self)
    }

    pub fn is_active(&self, access_token: &str) -> bool {
        self.tokens
            .read()
            .map(|tokens| tokens.contains_key(access_token))
            .unwrap_or(false)
    }
}

fn poisoned() -> AppError {
    AppError::InternalError(anyhow::anyhow!("mock auth provider lock poisoned"))
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AppError> {
        let tokens = self.tokens.read().map_err(|_| poisoned())?;
        Ok(tokens.get(access_token).cloned())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<StoredSession>, AppError> {
        let user = {
            let passwords = self.passwords.read().map_err(|_| poisoned())?;
            match passwords.get(&email.to_ascii_lowercase()) {
                Some((expected, user)) if expected == password => user.clone(),
                _ => return Ok(None),
            }
        };

        let access_token = format!("token-{}", user.id);
        self.tokens
            .write()
            .map_err(|_| poisoned())?
            .insert(access_token.clone(), user);

        Ok(Some(StoredSession {
            access_token,
            refresh_token: Some(format!("refresh-{}", Uuid::new_v4())),
            token_type: Some("bearer".to_string()),
            expires_in: Some(3600),
            expires_at: None,
        }))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        self.tokens
            .write()
            .map_err(|_| poisoned())?
            .remove(access_token);
        Ok(())
    }
}
