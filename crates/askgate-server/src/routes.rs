use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use askgate_core::errors::GatewayError;
use askgate_search::SearchHit;

use crate::server::AppState;

#[derive(Deserialize)]
pub struct ChatQuery {
    pub prompt: String,
}

#[derive(Serialize)]
pub struct ChatAnswer {
    pub answer: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

/// `POST /chat` — proxy one prompt and return the reassembled answer.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(query): Json<ChatQuery>,
) -> Response {
    if query.prompt.trim().is_empty() {
        let err = GatewayError::InvalidRequest("prompt must not be empty".into());
        return error_response(&err);
    }

    match state.proxy.ask(&query.prompt).await {
        Ok(answer) => (StatusCode::OK, Json(ChatAnswer { answer })).into_response(),
        Err(err) => {
            tracing::error!(kind = err.error_kind(), "chat request failed: {err}");
            error_response(&err)
        }
    }
}

fn error_response(err: &GatewayError) -> Response {
    let status = if err.is_upstream() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::BAD_REQUEST
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
            kind: err.error_kind(),
        }),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "default_count")]
    pub count: u64,
}

fn default_count() -> u64 {
    5
}

#[derive(Serialize)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
    pub page_text: Option<String>,
}

/// `POST /search` — best-effort web search plus page text for the top
/// hit. Upstream failures degrade to an empty result set.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(query): Json<SearchQuery>,
) -> Response {
    let results = match state.search.search(&query.query, query.count).await {
        Ok(results) => results,
        Err(err) => {
            tracing::warn!("search degraded to empty results: {err}");
            return (
                StatusCode::OK,
                Json(SearchResults {
                    results: Vec::new(),
                    page_text: None,
                }),
            )
                .into_response();
        }
    };

    let page_text = match results.first() {
        Some(top) => match state.search.page_text(&top.url).await {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::warn!(url = %top.url, "page extraction failed: {err}");
                None
            }
        },
        None => None,
    };

    (StatusCode::OK, Json(SearchResults { results, page_text })).into_response()
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

/// `GET /health` — liveness probe.
pub async fn health_handler() -> Response {
    (
        StatusCode::OK,
        Json(Health {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
        .into_response()
}
