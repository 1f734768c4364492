//! Remote advisory client for a `generateContent`-style JSON API.
//!
//! Request body:
//!
//! ```json
//! {"contents":[{"parts":[{"text":"<prompt>"}]}]}
//! ```
//!
//! The answer is the text of the first part of the first candidate. A
//! non-2xx status is passed through untouched so the network task can tell
//! quota exhaustion (429) from other failures.

use serde::{Deserialize, Serialize};

use crate::advisory::advice_text;
use crate::app::ports::{AdvisoryClient, AdvisoryResponse};
use crate::error::TransportError;

/// Response bodies larger than this are truncated before parsing.
pub const MAX_RESPONSE_BYTES: usize = 8 * 1024;

const DEFAULT_TIMEOUT_MS: u32 = 10_000;

// ── Wire types ────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Serialize the request body for `prompt`.
pub fn request_body(prompt: &str) -> Result<Vec<u8>, TransportError> {
    let req = GenerateRequest {
        contents: [Content {
            parts: [Part { text: prompt }],
        }],
    };
    serde_json::to_vec(&req).map_err(|_| TransportError::MalformedResponse)
}

/// Turn a status and raw body into an [`AdvisoryResponse`].
///
/// Non-2xx bodies are not inspected. A 2xx body without candidate text
/// yields an empty `text`.
pub fn parse_response(status: u16, body: &[u8]) -> Result<AdvisoryResponse, TransportError> {
    let mut response = AdvisoryResponse {
        status,
        text: advice_text(""),
    };
    if !(200..300).contains(&status) {
        return Ok(response);
    }

    let parsed: GenerateResponse =
        serde_json::from_slice(body).map_err(|_| TransportError::MalformedResponse)?;
    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text);
    if let Some(text) = text {
        response.text = advice_text(text.trim());
    }
    Ok(response)
}

// ── Client ────────────────────────────────────────────────────

pub struct HttpAdvisoryClient {
    url: String,
    timeout_ms: u32,
}

impl HttpAdvisoryClient {
    /// `endpoint` is the full model URL; the key is appended as a query
    /// parameter.
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            url: format!("{endpoint}?key={api_key}"),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

impl AdvisoryClient for HttpAdvisoryClient {
    #[cfg(target_os = "espidf")]
    fn query(&mut self, prompt: &str) -> Result<AdvisoryResponse, TransportError> {
        use super::http::{Method, request};

        let body = request_body(prompt)?;
        let response = request(
            Method::Post,
            &self.url,
            Some(&body),
            self.timeout_ms,
            MAX_RESPONSE_BYTES,
        )?;
        parse_response(response.status, &response.body)
    }

    #[cfg(not(target_os = "espidf"))]
    fn query(&mut self, _prompt: &str) -> Result<AdvisoryResponse, TransportError> {
        log::debug!("ADVISORY: no HTTP transport on this target ({} ms)", self.timeout_ms);
        Err(TransportError::Unavailable)
    }
}
