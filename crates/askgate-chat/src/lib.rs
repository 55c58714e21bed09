pub mod auth;
pub mod proxy;
pub mod sse;

pub use auth::{Authenticator, CredentialStore, TOKEN_EXPIRY_MARGIN_SECS};
pub use proxy::ChatProxy;
pub use sse::{aggregate, AnswerAggregator, FrameOutcome};
