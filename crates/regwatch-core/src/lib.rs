pub mod fallback;
pub mod json;
pub mod schema;
pub mod update;

pub use fallback::FALLBACK_VERSION;
pub use json::strip_code_fences;
pub use schema::genai;
pub use update::{ImpactAnalysis, ParseSourceError, RegulatoryUpdate, Sentiment, Source};
