//! HTTP client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{
    ClientError, GenerateRequest, GenerateResponse, GenerativeClient, GroundingMetadata,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Like `https://generativelanguage.googleapis.com` (no trailing slash).
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Gemini REST client. Holds the credential; construct one only when a key
/// is configured.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

// ── Wire types ──

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

fn build_body(request: &GenerateRequest) -> GenerateContentBody<'_> {
    GenerateContentBody {
        contents: vec![Content {
            role: "user",
            parts: vec![Part {
                text: &request.prompt,
            }],
        }],
        tools: if request.google_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        },
        generation_config: request.response_schema.as_ref().map(|schema| GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        }),
    }
}

/// Extract the first candidate's text and grounding from a raw response body.
fn parse_response(body: &str) -> Result<GenerateResponse, ClientError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)?;

    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ClientError::EmptyResponse(format!("prompt blocked: {reason}")));
    }

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::EmptyResponse("no candidates".into()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
        return Err(ClientError::EmptyResponse(format!(
            "no text in candidate (finish reason: {reason})"
        )));
    }

    Ok(GenerateResponse {
        text,
        grounding: candidate.grounding_metadata,
    })
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ClientError> {
        let url = self.endpoint(&request.model);
        let body = build_body(&request);

        info!(
            model = %request.model,
            grounded = request.google_search,
            "sending generateContent request"
        );
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let raw = resp.text().await?;
        debug!(bytes = raw.len(), "generateContent response received");
        parse_response(&raw)
    }
}
