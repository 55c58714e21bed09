use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::instrument;

use askgate_core::config::GatewayConfig;
use askgate_core::errors::GatewayError;

use crate::auth::{Authenticator, CredentialStore};
use crate::sse;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Composition root for the chat path: token guard, request issue,
/// stream aggregation.
pub struct ChatProxy {
    client: reqwest::Client,
    chat_url: String,
    context: ChatContext,
    store: CredentialStore,
    authenticator: Authenticator,
}

/// Fixed per-process identifiers sent with every chat request. Never
/// derived from the prompt.
#[derive(Clone, Debug, Serialize)]
pub struct ChatContext {
    pub conversation_id: String,
    pub participant_id: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    context: &'a ChatContext,
    user_prompt: &'a str,
}

impl ChatProxy {
    pub fn new(config: &GatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client: client.clone(),
            chat_url: config.chat_url(),
            context: ChatContext {
                conversation_id: config.conversation_id.clone(),
                participant_id: config.participant_id.clone(),
            },
            store: CredentialStore::new(),
            authenticator: Authenticator::new(client, config),
        }
    }

    /// Proxy one prompt to the chat service and resolve the streamed
    /// answer. May trigger a token refresh first; the call that finds
    /// the credential stale pays the authentication round trip.
    #[instrument(skip(self, prompt))]
    pub async fn ask(&self, prompt: &str) -> Result<String, GatewayError> {
        let token = self.store.ensure_valid(&self.authenticator).await?;

        let body = ChatRequest {
            context: &self.context,
            user_prompt: prompt,
        };
        let resp = self
            .client
            .post(&self.chat_url)
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::remote_failure(status, body));
        }

        sse::aggregate(resp.bytes_stream()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use secrecy::SecretString;

    const TOKEN_PATH: &str = "/acme/oidc/oauth/token";
    const CHAT_PATH: &str = "/v3/chat";

    fn test_config(base_url: &str) -> GatewayConfig {
        GatewayConfig {
            auth_base_url: base_url.to_string(),
            realm: "acme".into(),
            client_id: "cid".into(),
            client_secret: SecretString::from("cs"),
            chat_base_url: base_url.to_string(),
            conversation_id: "conv-1".into(),
            participant_id: "askgate".into(),
            search_api_key: None,
        }
    }

    fn token_mock(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("POST", TOKEN_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok-1","expires_in":3600}"#)
    }

    #[tokio::test]
    async fn ask_assembles_streamed_answer() {
        let mut server = mockito::Server::new_async().await;
        let token = token_mock(&mut server).expect(1).create_async().await;
        let chat = server
            .mock("POST", CHAT_PATH)
            .match_header("authorization", "Bearer tok-1")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "context": { "conversation_id": "conv-1", "participant_id": "askgate" },
                "user_prompt": "how fast does PET degrade?",
            })))
            .with_status(200)
            .with_body(
                "event: message\n\
                 data: {\"answer\":\"PET degrades \"}\n\
                 data: {\"answer\":\"very slowly.\"}\n\n",
            )
            .create_async()
            .await;

        let config = test_config(&server.url());
        let proxy = ChatProxy::new(&config);

        let answer = proxy.ask("how fast does PET degrade?").await.unwrap();
        assert_eq!(answer, "PET degrades very slowly.");
        token.assert_async().await;
        chat.assert_async().await;
    }

    #[tokio::test]
    async fn ask_tolerates_malformed_frames_in_stream() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server).create_async().await;
        let _chat = server
            .mock("POST", CHAT_PATH)
            .with_status(200)
            .with_body("data: {\"answer\":\"ok\"}\ndata: {broken\ndata: {\"answer\":\"!\"}\n")
            .create_async()
            .await;

        let config = test_config(&server.url());
        let proxy = ChatProxy::new(&config);
        assert_eq!(proxy.ask("q").await.unwrap(), "ok!");
    }

    #[tokio::test]
    async fn ask_remote_non_success_is_remote_service_error() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server).create_async().await;
        let _chat = server
            .mock("POST", CHAT_PATH)
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let config = test_config(&server.url());
        let proxy = ChatProxy::new(&config);

        match proxy.ask("q").await {
            Err(GatewayError::RemoteService { status, body }) => {
                assert_eq!(status, 503);
                assert!(body.contains("overloaded"));
            }
            other => panic!("expected RemoteService, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ask_propagates_authentication_failure_without_calling_chat() {
        let mut server = mockito::Server::new_async().await;
        let _token = server
            .mock("POST", TOKEN_PATH)
            .with_status(403)
            .with_body("denied")
            .create_async()
            .await;
        let chat = server
            .mock("POST", CHAT_PATH)
            .expect(0)
            .create_async()
            .await;

        let config = test_config(&server.url());
        let proxy = ChatProxy::new(&config);

        match proxy.ask("q").await {
            Err(GatewayError::AuthenticationFailed { status, .. }) => assert_eq!(status, 403),
            other => panic!("expected AuthenticationFailed, got {other:?}"),
        }
        chat.assert_async().await;
    }

    #[tokio::test]
    async fn token_is_reused_across_requests() {
        let mut server = mockito::Server::new_async().await;
        let token = token_mock(&mut server).expect(1).create_async().await;
        let chat = server
            .mock("POST", CHAT_PATH)
            .match_header("authorization", "Bearer tok-1")
            .with_status(200)
            .with_body("data: {\"answer\":\"hi\"}\n")
            .expect(2)
            .create_async()
            .await;

        let config = test_config(&server.url());
        let proxy = ChatProxy::new(&config);

        assert_eq!(proxy.ask("one").await.unwrap(), "hi");
        assert_eq!(proxy.ask("two").await.unwrap(), "hi");
        token.assert_async().await;
        chat.assert_async().await;
    }
}
