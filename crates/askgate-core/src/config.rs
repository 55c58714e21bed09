use secrecy::SecretString;

/// Environment variable names consumed at startup.
pub mod env_vars {
    pub const AUTH_BASE_URL: &str = "ASKGATE_AUTH_BASE_URL";
    pub const REALM: &str = "ASKGATE_REALM";
    pub const CLIENT_ID: &str = "ASKGATE_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "ASKGATE_CLIENT_SECRET";
    pub const CHAT_BASE_URL: &str = "ASKGATE_CHAT_BASE_URL";
    pub const CONVERSATION_ID: &str = "ASKGATE_CONVERSATION_ID";
    pub const PARTICIPANT_ID: &str = "ASKGATE_PARTICIPANT_ID";
    pub const SEARCH_API_KEY: &str = "ASKGATE_SEARCH_API_KEY";
}

const DEFAULT_PARTICIPANT_ID: &str = "askgate";

/// Process-wide gateway configuration, resolved once at startup and
/// passed by handle to everything that needs it.
#[derive(Clone)]
pub struct GatewayConfig {
    pub auth_base_url: String,
    /// Tenant realm, templated into the token endpoint path.
    pub realm: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub chat_base_url: String,
    /// Fixed for the process lifetime, never derived from a prompt.
    pub conversation_id: String,
    pub participant_id: String,
    pub search_api_key: Option<SecretString>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("auth_base_url", &self.auth_base_url)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("chat_base_url", &self.chat_base_url)
            .field("conversation_id", &self.conversation_id)
            .field("participant_id", &self.participant_id)
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

impl GatewayConfig {
    /// Read configuration from the environment. Realm, client
    /// credentials, and both base URLs are required; absence is fatal
    /// at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            auth_base_url: require(env_vars::AUTH_BASE_URL)?,
            realm: require(env_vars::REALM)?,
            client_id: require(env_vars::CLIENT_ID)?,
            client_secret: SecretString::from(require(env_vars::CLIENT_SECRET)?),
            chat_base_url: require(env_vars::CHAT_BASE_URL)?,
            conversation_id: optional(env_vars::CONVERSATION_ID)
                .unwrap_or_else(|| uuid::Uuid::now_v7().to_string()),
            participant_id: optional(env_vars::PARTICIPANT_ID)
                .unwrap_or_else(|| DEFAULT_PARTICIPANT_ID.to_string()),
            search_api_key: optional(env_vars::SEARCH_API_KEY).map(SecretString::from),
        })
    }

    /// OAuth2 token endpoint, templated by realm.
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oidc/oauth/token",
            self.auth_base_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Chat completion endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}/v3/chat", self.chat_base_url.trim_end_matches('/'))
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
