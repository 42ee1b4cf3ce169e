//! Aggregated sentiment and risk analysis over a batch of updates.

use std::sync::Arc;

use regwatch_core::{ImpactAnalysis, RegulatoryUpdate, fallback, genai, strip_code_fences};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{ClientError, GenerateRequest, GenerativeClient};
use crate::fetcher::FailurePolicy;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no API credential configured")]
    MissingCredential,
    #[error("no updates to analyse")]
    EmptyInput,
    #[error("analysis request failed: {0}")]
    Client(#[from] ClientError),
    #[error("could not encode updates: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("malformed analysis response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub model: String,
    pub policy: FailurePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: "gemini-3-pro-preview".into(),
            policy: FailurePolicy::Lenient,
        }
    }
}

pub struct AnalysisGenerator {
    client: Option<Arc<dyn GenerativeClient>>,
    config: AnalysisConfig,
}

impl AnalysisGenerator {
    /// `client` is `None` when no credential is configured.
    pub fn new(client: Option<Arc<dyn GenerativeClient>>, config: AnalysisConfig) -> Self {
        Self { client, config }
    }

    /// Analyse `updates`, swallowing every failure.
    ///
    /// Returns `None` for an empty batch. Without a credential, the lenient
    /// policy returns the fallback placeholder analysis.
    pub async fn analyze(&self, updates: &[RegulatoryUpdate]) -> Option<ImpactAnalysis> {
        match self.try_analyze(updates).await {
            Ok(analysis) => Some(analysis),
            Err(AnalysisError::EmptyInput) => {
                debug!("no updates, skipping analysis");
                None
            }
            Err(AnalysisError::MissingCredential) => match self.config.policy {
                FailurePolicy::Lenient => Some(fallback::analysis()),
                FailurePolicy::Strict => None,
            },
            Err(e) => {
                warn!(error = %e, "impact analysis unavailable");
                None
            }
        }
    }

    pub async fn try_analyze(
        &self,
        updates: &[RegulatoryUpdate],
    ) -> Result<ImpactAnalysis, AnalysisError> {
        if updates.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        let client = self
            .client
            .as_ref()
            .ok_or(AnalysisError::MissingCredential)?;

        let batch = serde_json::to_string(updates).map_err(AnalysisError::Encode)?;
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: build_prompt(&batch),
            response_schema: Some(genai::analysis_schema()),
            google_search: false,
        };

        info!(model = %request.model, count = updates.len(), "requesting impact analysis");
        let response = client.generate(request).await?;
        let analysis = parse_analysis(&response.text)?;
        info!(sentiment = %analysis.overall_sentiment, risks = analysis.key_risks.len(), "impact analysis ready");
        Ok(analysis)
    }
}

fn build_prompt(batch: &str) -> String {
    format!(
        "You are a compliance analyst for Irish insurers and occupational pension schemes.\n\
         Analyse the following regulatory updates for the Irish market and give:\n\
         - overallSentiment: one of \"Neutral\", \"Positive\", \"Critical\"\n\
         - keyRisks: the main risks, most severe first\n\
         - recommendedActions: concrete next steps for regulated firms, most urgent first\n\
         - summary: a short narrative for senior management\n\
         \n\
         Respond with JSON only.\n\
         \n\
         Updates:\n\
         {batch}"
    )
}

/// Parse an impact analysis from (possibly fenced) model output.
pub fn parse_analysis(text: &str) -> Result<ImpactAnalysis, AnalysisError> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return Err(AnalysisError::Malformed("empty body".into()));
    }
    serde_json::from_str(cleaned).map_err(|e| AnalysisError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedClient;
    use regwatch_core::Sentiment;

    const ANALYSIS: &str = r#"{
        "overallSentiment": "Critical",
        "keyRisks": ["Conduct risk", "Capital strain"],
        "recommendedActions": ["Gap analysis", "Board briefing"],
        "summary": "Significant change ahead."
    }"#;

    fn generator(client: Option<Arc<ScriptedClient>>, policy: FailurePolicy) -> AnalysisGenerator {
        AnalysisGenerator::new(
            client.map(|c| c as Arc<dyn GenerativeClient>),
            AnalysisConfig {
                policy,
                ..AnalysisConfig::default()
            },
        )
    }

    #[test]
    fn parses_fenced_analysis() {
        let parsed = parse_analysis(&format!("```json\n{ANALYSIS}\n```")).unwrap();
        assert_eq!(parsed.overall_sentiment, Sentiment::Critical);
        assert_eq!(parsed.recommended_actions[0], "Gap analysis");
    }

    #[test]
    fn empty_body_is_malformed() {
        assert!(matches!(parse_analysis("  "), Err(AnalysisError::Malformed(_))));
        assert!(matches!(parse_analysis("{}"), Err(AnalysisError::Malformed(_))));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_call() {
        let client = Arc::new(ScriptedClient::new().reply_text(ANALYSIS));
        let result = generator(Some(client.clone()), FailurePolicy::Lenient)
            .analyze(&[])
            .await;
        assert!(result.is_none());
        assert_eq!(client.call_count().await, 0);
    }

    #[tokio::test]
    async fn no_credential_lenient_returns_placeholder() {
        let analysis = generator(None, FailurePolicy::Lenient)
            .analyze(&fallback::updates())
            .await
            .unwrap();
        assert_eq!(analysis.overall_sentiment, Sentiment::Neutral);
        assert_eq!(analysis, fallback::analysis());
    }

    #[tokio::test]
    async fn no_credential_strict_returns_none() {
        let result = generator(None, FailurePolicy::Strict)
            .analyze(&fallback::updates())
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn prompt_embeds_serialised_batch() {
        let client = Arc::new(ScriptedClient::new().reply_text(ANALYSIS));
        let updates = fallback::updates();
        let analysis = generator(Some(client.clone()), FailurePolicy::Lenient)
            .analyze(&updates)
            .await
            .unwrap();
        assert_eq!(analysis.key_risks.len(), 2);

        let requests = client.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].google_search);
        assert_eq!(requests[0].model, "gemini-3-pro-preview");
        assert!(requests[0].prompt.contains(&updates[0].id));
        assert!(requests[0].prompt.contains("\"impactScore\""));
    }

    #[tokio::test]
    async fn provider_failure_is_none() {
        let client = Arc::new(ScriptedClient::new().fail("503 unavailable"));
        let analyzer = generator(Some(client), FailurePolicy::Strict);
        assert!(analyzer.analyze(&fallback::updates()).await.is_none());
    }

    #[tokio::test]
    async fn try_analyze_surfaces_malformed_response() {
        let client = Arc::new(ScriptedClient::new().reply_text("I cannot help with that."));
        let err = generator(Some(client), FailurePolicy::Lenient)
            .try_analyze(&fallback::updates())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Malformed(_)));
    }
}
