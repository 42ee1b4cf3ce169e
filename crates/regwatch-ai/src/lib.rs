//! Generative-AI layer: the provider client seam, regulatory update retrieval
//! with search grounding, and aggregated impact analysis.

mod analysis;
mod client;
mod fetcher;
#[cfg(feature = "gemini")]
mod gemini;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use analysis::{AnalysisConfig, AnalysisError, AnalysisGenerator, parse_analysis};
pub use client::{
    ClientError, GenerateRequest, GenerateResponse, GenerativeClient, GroundingChunk,
    GroundingMetadata, WebSource,
};
pub use fetcher::{
    FailurePolicy, FetchError, FetchOutcome, FetcherConfig, UpdateFetcher, UpdateOrigin,
    parse_updates,
};
#[cfg(feature = "gemini")]
pub use gemini::{DEFAULT_BASE_URL, GeminiClient, GeminiConfig};
