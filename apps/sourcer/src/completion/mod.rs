//! Completion client, the single entry point for AI completion calls.
//! Every call is gated by admission control before it is issued; no other
//! module talks to the completion API directly.

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";
/// Upper bound on any completion call. Expiry is treated identically to a
/// service error: the caller falls back to the rule-based path.
pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("response contained no text content")]
    EmptyContent,

    #[error("no JSON object found in response text")]
    NoJsonObject,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Minimal request contract: prompt text plus generation knobs.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt_text: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    contents: Vec<WireContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
struct WirePart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct WireGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: Option<WireCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Debug, Deserialize)]
struct WireResponsePart {
    text: Option<String>,
}

/// Thin HTTP client for the external completion service.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl CompletionClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            endpoint: API_URL.to_string(),
        }
    }

    /// Issues one completion call and returns the raw response text.
    /// No internal retries: pacing belongs to admission control and the
    /// outreach guard, and scoring recovers via the rule-based fallback.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = WireRequest {
            contents: vec![WireContent {
                parts: vec![WirePart {
                    text: &request.prompt_text,
                }],
            }],
            generation_config: WireGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let wire: WireResponse = response.json().await?;
        let text = wire
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .ok_or(CompletionError::EmptyContent)?;

        debug!("Completion call succeeded ({} chars)", text.len());
        Ok(text)
    }

    /// Calls the service and deserializes the first JSON object embedded in
    /// the response text. Surrounding prose and markdown fences are ignored.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        request: &CompletionRequest,
    ) -> Result<T, CompletionError> {
        let text = self.complete(request).await?;
        let json = extract_json_object(&text).ok_or(CompletionError::NoJsonObject)?;
        serde_json::from_str(json).map_err(CompletionError::Parse)
    }
}

/// Extracts the first balanced `{...}` substring, respecting string literals
/// and escapes. Model output routinely wraps JSON in prose or code fences.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
