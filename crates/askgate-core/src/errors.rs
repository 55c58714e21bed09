/// Typed error hierarchy for gateway operations.
///
/// Every variant is fatal for the request that hit it; malformed single
/// stream frames are deliberately NOT represented here — they are a
/// non-fatal per-line outcome absorbed inside the aggregator.
#[derive(Clone, Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication failed: token endpoint returned {status}: {body}")]
    AuthenticationFailed { status: u16, body: String },
    #[error("chat service returned {status}: {body}")]
    RemoteService { status: u16, body: String },
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Short classification string for logging and HTTP error bodies.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::RemoteService { .. } => "remote_service",
            Self::StreamInterrupted(_) => "stream_interrupted",
            Self::NetworkError(_) => "network_error",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Non-success status from the token endpoint.
    pub fn auth_failure(status: u16, body: String) -> Self {
        Self::AuthenticationFailed { status, body }
    }

    /// Non-success status from the chat endpoint.
    pub fn remote_failure(status: u16, body: String) -> Self {
        Self::RemoteService { status, body }
    }

    /// True when the failure originated upstream of the gateway, as
    /// opposed to bad caller input.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_strings() {
        assert_eq!(
            GatewayError::auth_failure(401, "no".into()).error_kind(),
            "authentication_failed"
        );
        assert_eq!(
            GatewayError::remote_failure(503, "down".into()).error_kind(),
            "remote_service"
        );
        assert_eq!(
            GatewayError::StreamInterrupted("eof".into()).error_kind(),
            "stream_interrupted"
        );
        assert_eq!(
            GatewayError::NetworkError("tcp".into()).error_kind(),
            "network_error"
        );
        assert_eq!(
            GatewayError::InvalidRequest("empty".into()).error_kind(),
            "invalid_request"
        );
    }

    #[test]
    fn upstream_classification() {
        assert!(GatewayError::auth_failure(401, "no".into()).is_upstream());
        assert!(GatewayError::remote_failure(500, "err".into()).is_upstream());
        assert!(GatewayError::StreamInterrupted("eof".into()).is_upstream());
        assert!(!GatewayError::InvalidRequest("empty".into()).is_upstream());
    }

    #[test]
    fn display_carries_status_and_body() {
        let err = GatewayError::auth_failure(403, "forbidden".into());
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("forbidden"));
    }
}
