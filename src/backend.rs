use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    config::AppConfig,
    models::{BackendUser, Envelope, LoginRequest},
};

/// BackendError
///
/// Failures talking to the backend REST service. `Rejected` is the
/// application-level `success = false` case and is recoverable; the others are
/// transport or protocol failures. Nothing here is retried.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend rejected the request: {0}")]
    Rejected(String),

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("backend response carried no data")]
    MissingData,

    #[error("backend response was not a valid envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

impl<T> Envelope<T> {
    /// Unwraps the payload of a successful envelope.
    pub fn into_result(self) -> Result<T, BackendError> {
        if !self.success {
            return Err(BackendError::Rejected(self.message));
        }
        self.data.ok_or(BackendError::MissingData)
    }
}

/// AuthBackend
///
/// The slice of the backend REST API the gate depends on: credential exchange
/// and profile lookup. Shared as a trait object so tests can swap in a mock.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Verifies credentials and returns the authenticated principal.
    async fn authenticate(&self, credentials: &LoginRequest) -> Result<BackendUser, BackendError>;

    /// Re-reads the principal behind a backend access token.
    async fn current_user(&self, access_token: &str) -> Result<BackendUser, BackendError>;
}

pub type BackendState = Arc<dyn AuthBackend>;

/// HttpAuthBackend
///
/// `AuthBackend` over reqwest against `BACKEND_URL`.
#[derive(Clone)]
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(config: &AppConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn authenticate(&self, credentials: &LoginRequest) -> Result<BackendUser, BackendError> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await?;

        decode_envelope(response).await
    }

    async fn current_user(&self, access_token: &str) -> Result<BackendUser, BackendError> {
        let response = self
            .client
            .get(self.url("/auth/me"))
            .bearer_auth(access_token)
            .send()
            .await?;

        let mut user: BackendUser = decode_envelope(response).await?;
        // The profile endpoint does not echo the caller's token back.
        if user.access_token.is_none() {
            user.access_token = Some(access_token.to_string());
        }
        Ok(user)
    }
}

/// Reads an `{success, message, data}` body. A non-2xx response without a
/// decodable envelope is reported by status code.
async fn decode_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.bytes().await?;

    let envelope: Envelope<T> = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => return Err(BackendError::Status(status.as_u16())),
        Err(e) => return Err(BackendError::Malformed(e)),
    };

    if !status.is_success() && envelope.success {
        return Err(BackendError::Status(status.as_u16()));
    }

    envelope.into_result()
}
