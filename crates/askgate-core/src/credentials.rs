use chrono::Utc;
use secrecy::SecretString;

/// A bearer token for the chat service, paired with the instant it
/// stops being usable. The pair is always replaced as one value.
#[derive(Clone)]
pub struct Credential {
    pub access_token: SecretString,
    /// Unix timestamp in milliseconds. Already includes the refresh
    /// safety margin, so "past this instant" means "re-authenticate".
    pub expires_at: i64,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    pub fn new(access_token: SecretString, expires_at: i64) -> Self {
        Self {
            access_token,
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp_millis())
    }
}
