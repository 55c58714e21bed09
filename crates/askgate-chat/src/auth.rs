use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;

use askgate_core::config::GatewayConfig;
use askgate_core::credentials::Credential;
use askgate_core::errors::GatewayError;

/// Seconds subtracted from the provider's stated token lifetime, so a
/// token is treated as expired before the provider would reject it.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Exchanges client credentials for bearer tokens at the realm's token
/// endpoint.
pub struct Authenticator {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
}

impl Authenticator {
    pub fn new(client: reqwest::Client, config: &GatewayConfig) -> Self {
        Self {
            client,
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    /// Perform one client-credentials token request. Any non-success
    /// status is fatal for this call; no partial state escapes.
    pub async fn authenticate(&self) -> Result<Credential, GatewayError> {
        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::auth_failure(status, body));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        tracing::debug!(expires_in = body.expires_in, "token endpoint issued credential");
        Ok(credential_from_response(body, Utc::now().timestamp_millis()))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

fn credential_from_response(body: TokenResponse, now_ms: i64) -> Credential {
    let usable_secs = body.expires_in as i64 - TOKEN_EXPIRY_MARGIN_SECS;
    Credential::new(
        SecretString::from(body.access_token),
        now_ms + usable_secs * 1000,
    )
}

/// Holds the process's single chat credential. Explicitly owned and
/// passed by handle, so tests (and an eventual per-tenant split) can
/// run isolated instances.
#[derive(Default)]
pub struct CredentialStore {
    inner: RwLock<Option<Credential>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Snapshot of the stored credential.
    pub async fn current(&self) -> Option<Credential> {
        self.inner.read().await.clone()
    }

    /// Token guard consulted before every outbound authenticated call.
    ///
    /// Fast path: a stored credential that is still ahead of its expiry
    /// mark is returned without any network traffic. Otherwise the
    /// write lock is taken and, after a double-check, one
    /// authentication replaces the credential atomically — concurrent
    /// staleness discoveries share that single flight. On failure the
    /// previous (stale or absent) credential is left untouched.
    pub async fn ensure_valid(
        &self,
        authenticator: &Authenticator,
    ) -> Result<SecretString, GatewayError> {
        {
            let guard = self.inner.read().await;
            if let Some(cred) = guard.as_ref() {
                if !cred.is_expired() {
                    return Ok(cred.access_token.clone());
                }
            }
        }

        let mut guard = self.inner.write().await;
        // Double-check after acquiring the write lock
        if let Some(cred) = guard.as_ref() {
            if !cred.is_expired() {
                return Ok(cred.access_token.clone());
            }
        }

        let fresh = authenticator.authenticate().await?;
        let token = fresh.access_token.clone();
        *guard = Some(fresh);
        Ok(token)
    }
}
