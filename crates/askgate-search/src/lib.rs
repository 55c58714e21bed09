use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

const SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_RESULTS: u64 = 20;
/// Cap on extracted page text, in bytes.
const MAX_PAGE_TEXT: usize = 32_000;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search API key not configured")]
    MissingApiKey,
    #[error("search request failed: {0}")]
    RequestFailed(String),
    #[error("search backend returned {status}: {body}")]
    BackendStatus { status: u16, body: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Best-effort web search and page-text extraction. Independent of the
/// chat credential — no token guard involvement.
pub struct SearchClient {
    client: reqwest::Client,
    api_key: Option<SecretString>,
}

impl SearchClient {
    pub fn new(api_key: Option<SecretString>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("askgate/0.1")
            .build()
            .unwrap_or_default();
        Self { client, api_key }
    }

    pub async fn search(&self, query: &str, count: u64) -> Result<Vec<SearchHit>, SearchError> {
        let api_key = self.api_key.as_ref().ok_or(SearchError::MissingApiKey)?;
        let count = count.clamp(1, MAX_RESULTS);

        let resp = self
            .client
            .get(SEARCH_URL)
            .header("X-Subscription-Token", api_key.expose_secret())
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", &count.to_string())])
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::BackendStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let hits = parse_hits(&body);
        tracing::debug!(hits = hits.len(), "search completed");
        Ok(hits)
    }

    /// Fetch a page and reduce it to readable text.
    pub async fn page_text(&self, url: &str) -> Result<String, SearchError> {
        // Upgrade http to https
        let url = if url.starts_with("http://") {
            url.replacen("http://", "https://", 1)
        } else {
            url.to_string()
        };

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::BackendStatus {
                status: status.as_u16(),
                body: format!("fetching {url}"),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        Ok(extract_text(&body))
    }
}

fn parse_hits(body: &serde_json::Value) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    if let Some(results) = body["web"]["results"].as_array() {
        for result in results {
            hits.push(SearchHit {
                title: result["title"].as_str().unwrap_or("(untitled)").to_string(),
                url: result["url"].as_str().unwrap_or("").to_string(),
                snippet: result["description"].as_str().unwrap_or("").to_string(),
            });
        }
    }
    hits
}

/// Reduce an HTML document to whitespace-normalized visible text:
/// script/style subtrees dropped, tags stripped, common entities
/// decoded, length capped.
pub fn extract_text(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut visible = String::new();
    let mut i = 0;

    while i < html.len() {
        match lower[i..].find('<') {
            None => {
                visible.push_str(&html[i..]);
                break;
            }
            Some(off) => {
                let start = i + off;
                visible.push_str(&html[i..start]);
                visible.push(' ');

                if let Some(end) = dropped_container_end(&lower, start) {
                    i = end;
                    continue;
                }
                match lower[start..].find('>') {
                    Some(off) => i = start + off + 1,
                    None => i = html.len(), // truncated tag at EOF
                }
            }
        }
    }

    let decoded = decode_entities(&visible);
    let mut text = String::with_capacity(decoded.len().min(MAX_PAGE_TEXT));
    for word in decoded.split_whitespace() {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(word);
        if text.len() >= MAX_PAGE_TEXT {
            break;
        }
    }
    if text.len() > MAX_PAGE_TEXT {
        let mut cut = MAX_PAGE_TEXT;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

/// If `start` opens a script/style element, return the index just past
/// its close tag (or end of input when unclosed).
fn dropped_container_end(lower: &str, start: usize) -> Option<usize> {
    for name in ["script", "style"] {
        if lower[start + 1..].starts_with(name) {
            let close = format!("</{name}");
            return match lower[start..].find(&close) {
                Some(off) => {
                    let close_start = start + off;
                    match lower[close_start..].find('>') {
                        Some(gt) => Some(close_start + gt + 1),
                        None => Some(lower.len()),
                    }
                }
                None => Some(lower.len()),
            };
        }
    }
    None
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
