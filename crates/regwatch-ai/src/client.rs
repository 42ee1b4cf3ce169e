//! Provider-neutral seam for structured generation.
//!
//! The rest of the crate depends only on "given a prompt and a JSON schema,
//! return JSON text, optionally with citation metadata".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[cfg(feature = "gemini")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response: {0}")]
    EmptyResponse(String),
    #[error("{0}")]
    Other(String),
}

/// One structured-generation call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    /// Strict output schema; the response is requested as `application/json`.
    pub response_schema: Option<Value>,
    /// Enable the provider's web-search grounding tool.
    pub google_search: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    pub text: String,
    pub grounding: Option<GroundingMetadata>,
}

/// Citation information returned alongside a search-grounded response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub web_search_queries: Vec<String>,
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GroundingMetadata {
    /// Link of the citation at `index`, if it exists and is non-blank.
    pub fn citation_uri(&self, index: usize) -> Option<&str> {
        self.grounding_chunks
            .get(index)
            .and_then(|c| c.web.as_ref())
            .and_then(|w| w.uri.as_deref())
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
    }

    /// All web citations, in provider order.
    pub fn citations(&self) -> impl Iterator<Item = &WebSource> {
        self.grounding_chunks.iter().filter_map(|c| c.web.as_ref())
    }
}

#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ClientError>;
}
