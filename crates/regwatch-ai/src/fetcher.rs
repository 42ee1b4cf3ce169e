//! Retrieval of recent regulatory updates via a search-grounded prompt.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use regwatch_core::{RegulatoryUpdate, Source, fallback, genai, strip_code_fences};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{ClientError, GenerateRequest, GenerativeClient, GroundingMetadata};

/// How the service boundary treats a missing credential and provider failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Missing credential serves the fallback dataset; provider failures
    /// degrade to an empty result.
    #[default]
    Lenient,
    /// Missing credential and provider failures are returned to the caller.
    Strict,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("no API credential configured")]
    MissingCredential,
    #[error("update retrieval failed: {0}")]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub model: String,
    /// Length of the "recent" window named in the prompt.
    pub window_days: u32,
    pub policy: FailurePolicy,
    /// Serve the fallback dataset when a live call parses to zero updates.
    pub fallback_on_empty: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            model: "gemini-3-flash-preview".into(),
            window_days: 30,
            policy: FailurePolicy::Lenient,
            fallback_on_empty: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOrigin {
    Live,
    Fallback,
}

/// Result of one fetch cycle.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub updates: Vec<RegulatoryUpdate>,
    pub grounding: Option<GroundingMetadata>,
    /// Diagnostic note for the caller (fallback reason, swallowed error).
    pub log: Option<String>,
    pub origin: UpdateOrigin,
}

impl FetchOutcome {
    fn fallback(reason: &str) -> Self {
        Self {
            updates: fallback::updates(),
            grounding: None,
            log: Some(format!(
                "{reason}; serving fallback dataset v{}",
                fallback::FALLBACK_VERSION
            )),
            origin: UpdateOrigin::Fallback,
        }
    }

    fn empty(log: String) -> Self {
        Self {
            updates: Vec::new(),
            grounding: None,
            log: Some(log),
            origin: UpdateOrigin::Live,
        }
    }
}

/// Issues the search-grounded update request and normalises the reply.
pub struct UpdateFetcher {
    client: Option<Arc<dyn GenerativeClient>>,
    config: FetcherConfig,
}

impl UpdateFetcher {
    /// `client` is `None` when no credential is configured.
    pub fn new(client: Option<Arc<dyn GenerativeClient>>, config: FetcherConfig) -> Self {
        Self { client, config }
    }

    pub fn has_credential(&self) -> bool {
        self.client.is_some()
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch updates, applying the configured [`FailurePolicy`].
    ///
    /// Under [`FailurePolicy::Lenient`] this never returns `Err`.
    pub async fn fetch(&self) -> Result<FetchOutcome, FetchError> {
        match self.try_fetch().await {
            Ok(outcome) => Ok(outcome),
            Err(FetchError::MissingCredential) if self.config.policy == FailurePolicy::Lenient => {
                info!("no API credential configured, using fallback updates");
                Ok(FetchOutcome::fallback("no API credential configured"))
            }
            Err(FetchError::Client(e)) if self.config.policy == FailurePolicy::Lenient => {
                warn!(error = %e, "update retrieval failed, returning no updates");
                Ok(FetchOutcome::empty(format!("update retrieval failed: {e}")))
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch updates without any policy applied.
    pub async fn try_fetch(&self) -> Result<FetchOutcome, FetchError> {
        let client = self.client.as_ref().ok_or(FetchError::MissingCredential)?;

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: build_prompt(Utc::now().date_naive(), self.config.window_days),
            response_schema: Some(genai::updates_schema()),
            google_search: true,
        };

        info!(model = %request.model, window_days = self.config.window_days, "fetching regulatory updates");
        let response = client.generate(request).await?;
        let updates = parse_updates(&response.text, response.grounding.as_ref());
        info!(count = updates.len(), "received regulatory updates");

        if updates.is_empty() && self.config.fallback_on_empty {
            return Ok(FetchOutcome::fallback("provider returned no updates"));
        }

        Ok(FetchOutcome {
            updates,
            grounding: response.grounding,
            log: None,
            origin: UpdateOrigin::Live,
        })
    }
}

fn build_prompt(today: NaiveDate, window_days: u32) -> String {
    let start = today
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(today);
    format!(
        "Find regulatory updates for the Irish insurance and pensions sector published \
         between {start} and {end} (the last {window_days} days).\n\
         Only include items issued by the Central Bank of Ireland (CBI), the European \
         Insurance and Occupational Pensions Authority (EIOPA), or the Pensions Authority.\n\
         \n\
         For each update provide:\n\
         - id: a short unique identifier\n\
         - source: exactly one of \"CBI\", \"EIOPA\", \"Pensions Authority\"\n\
         - title and a two-sentence summary\n\
         - date: the publication date as shown by the regulator\n\
         - impactScore: 0 (negligible) to 10 (critical) for Irish insurers and pension schemes\n\
         - category: e.g. Solvency II, Consumer Protection, Pensions Governance\n\
         - url: the link to the original publication\n\
         - analysis: one sentence on what regulated firms should do\n\
         \n\
         Respond with JSON only.",
        start = start.format("%-d %B %Y"),
        end = today.format("%-d %B %Y"),
    )
}

/// Loosely-typed update as the provider returns it, before normalisation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUpdate {
    id: Option<Value>,
    source: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    date: Option<String>,
    impact_score: Option<Value>,
    category: Option<String>,
    url: Option<String>,
    analysis: Option<String>,
}

/// Parse and normalise provider output into updates.
///
/// Malformed JSON yields no updates. Items with an unknown source or a blank
/// title are dropped. Missing ids are assigned from the item position; missing
/// urls take the grounding citation at the same position, else the source's
/// landing page.
pub fn parse_updates(text: &str, grounding: Option<&GroundingMetadata>) -> Vec<RegulatoryUpdate> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        debug!("empty update response body");
        return Vec::new();
    }

    let items = match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(mut obj)) => match obj.remove("updates") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Ok(_) => Vec::new(),
        Err(e) => {
            let preview: String = cleaned.chars().take(200).collect();
            warn!(error = %e, raw = %preview, "update response is not valid JSON");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<RawUpdate>(item) {
            Ok(raw) => normalise(index, raw, grounding),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed update");
                None
            }
        })
        .collect()
}

fn normalise(
    index: usize,
    raw: RawUpdate,
    grounding: Option<&GroundingMetadata>,
) -> Option<RegulatoryUpdate> {
    let source = match raw.source.as_deref().map(str::parse::<Source>) {
        Some(Ok(source)) => source,
        Some(Err(e)) => {
            warn!(index, error = %e, "skipping update from unsupported regulator");
            return None;
        }
        None => {
            warn!(index, "skipping update without a source");
            return None;
        }
    };

    let title = non_blank(raw.title)?;

    let id = match raw.id {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("update-{}", index + 1),
    };

    let impact_score = match raw.impact_score {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    };

    let url = non_blank(raw.url)
        .or_else(|| grounding.and_then(|g| g.citation_uri(index)).map(str::to_string))
        .unwrap_or_else(|| source.default_url().to_string());

    Some(RegulatoryUpdate {
        id,
        source,
        title,
        summary: raw.summary.unwrap_or_default(),
        date: raw.date.unwrap_or_default(),
        impact_score,
        category: raw.category.unwrap_or_default(),
        url,
        analysis: non_blank(raw.analysis),
    })
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{GenerateResponse, GroundingChunk, WebSource};
    use crate::testing::ScriptedClient;

    const THREE_UPDATES: &str = r#"{
        "updates": [
            {
                "id": "cbi-1", "source": "CBI", "title": "Consumer Protection Code",
                "summary": "Revised code.", "date": "3 March 2025", "impactScore": 9,
                "category": "Consumer Protection", "url": "https://www.centralbank.ie/cpc",
                "analysis": "Review sales processes."
            },
            {
                "id": "eiopa-1", "source": "EIOPA", "title": "Solvency II ITS",
                "summary": "Consultation.", "date": "10 March 2025", "impactScore": 7.5,
                "category": "Solvency II", "url": "https://www.eiopa.europa.eu/its",
                "analysis": ""
            },
            {
                "id": "pa-1", "source": "Pensions Authority", "title": "IORP II reminder",
                "summary": "Trustee obligations.", "date": "12 March 2025", "impactScore": 6,
                "category": "Pensions Governance", "url": "https://www.pensionsauthority.ie/x",
                "analysis": "Schedule own-risk assessments."
            }
        ]
    }"#;

    fn grounding(uris: &[&str]) -> GroundingMetadata {
        GroundingMetadata {
            web_search_queries: vec![],
            grounding_chunks: uris
                .iter()
                .map(|u| GroundingChunk {
                    web: Some(WebSource {
                        uri: Some(u.to_string()),
                        title: None,
                    }),
                })
                .collect(),
        }
    }

    fn fetcher(client: Option<Arc<ScriptedClient>>, policy: FailurePolicy) -> UpdateFetcher {
        UpdateFetcher::new(
            client.map(|c| c as Arc<dyn GenerativeClient>),
            FetcherConfig {
                policy,
                ..FetcherConfig::default()
            },
        )
    }

    #[test]
    fn parses_three_updates() {
        let updates = parse_updates(THREE_UPDATES, None);
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].source, Source::Cbi);
        assert_eq!(updates[1].impact_score, 7.5);
        assert_eq!(updates[2].source, Source::PensionsAuthority);
        assert!(updates[1].analysis.is_none(), "blank analysis dropped");
    }

    #[test]
    fn fenced_response_parses() {
        let fenced = format!("```json\n{THREE_UPDATES}\n```");
        assert_eq!(parse_updates(&fenced, None).len(), 3);
    }

    #[test]
    fn malformed_json_is_zero_updates() {
        assert!(parse_updates("{\"updates\": [", None).is_empty());
        assert!(parse_updates("", None).is_empty());
        assert!(parse_updates("\"just a string\"", None).is_empty());
    }

    #[test]
    fn bare_array_accepted() {
        let json = r#"[{"source": "EIOPA", "title": "Stress test", "url": "https://e"}]"#;
        let updates = parse_updates(json, None);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id, "update-1");
    }

    #[test]
    fn missing_url_takes_positional_citation() {
        let json = r#"{"updates": [
            {"id": "a", "source": "CBI", "title": "First", "url": "https://www.centralbank.ie/a"},
            {"id": "b", "source": "CBI", "title": "Second"}
        ]}"#;
        let meta = grounding(&["https://cite/0", "https://cite/1"]);
        let updates = parse_updates(json, Some(&meta));
        assert_eq!(updates[0].url, "https://www.centralbank.ie/a");
        assert_eq!(updates[1].url, "https://cite/1");
    }

    #[test]
    fn missing_url_without_citation_uses_source_domain() {
        let json = r#"{"updates": [
            {"id": "a", "source": "Pensions Authority", "title": "First", "url": "  "}
        ]}"#;
        let updates = parse_updates(json, Some(&grounding(&[])));
        assert_eq!(updates[0].url, "https://www.pensionsauthority.ie");
    }

    #[test]
    fn unknown_source_and_blank_title_dropped() {
        let json = r#"{"updates": [
            {"id": "a", "source": "FCA", "title": "UK item"},
            {"id": "b", "source": "CBI", "title": "  "},
            {"id": "c", "source": "central bank of ireland", "title": "Kept", "impactScore": "4.5"}
        ]}"#;
        let updates = parse_updates(json, None);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id, "c");
        assert_eq!(updates[0].source, Source::Cbi);
        assert_eq!(updates[0].impact_score, 4.5);
    }

    #[test]
    fn non_finite_string_scores_become_zero() {
        let json = r#"{"updates": [
            {"id": "a", "source": "CBI", "title": "One", "impactScore": "NaN"},
            {"id": "b", "source": "CBI", "title": "Two", "impactScore": "inf"},
            {"id": "c", "source": "CBI", "title": "Three", "impactScore": "-Infinity"}
        ]}"#;
        let updates = parse_updates(json, None);
        assert_eq!(updates.len(), 3);
        for update in &updates {
            assert_eq!(update.impact_score, 0.0, "{}", update.id);
        }

        let encoded = serde_json::to_string(&updates).unwrap();
        let decoded: Vec<RegulatoryUpdate> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, updates);
    }

    #[test]
    fn every_update_is_well_formed() {
        let json = r#"{"updates": [
            {"source": "CBI", "title": "No id or url"},
            {"id": 42, "source": "EIOPA", "title": "Numeric id"}
        ]}"#;
        for u in parse_updates(json, None) {
            assert!(!u.id.is_empty());
            assert!(!u.url.is_empty());
            assert!(Source::ALL.contains(&u.source));
        }
    }

    #[test]
    fn prompt_names_regulators_and_window() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let prompt = build_prompt(today, 30);
        assert!(prompt.contains("1 March 2025"));
        assert!(prompt.contains("31 March 2025"));
        for name in ["CBI", "EIOPA", "Pensions Authority"] {
            assert!(prompt.contains(name));
        }
    }

    #[tokio::test]
    async fn no_credential_serves_fallback() {
        let outcome = fetcher(None, FailurePolicy::Lenient).fetch().await.unwrap();
        assert_eq!(outcome.origin, UpdateOrigin::Fallback);
        assert_eq!(outcome.updates, fallback::updates());
        assert_eq!(outcome.updates[0].source, Source::Cbi);
        assert!(outcome.log.unwrap().contains(fallback::FALLBACK_VERSION));
    }

    #[tokio::test]
    async fn no_credential_strict_is_an_error() {
        let err = fetcher(None, FailurePolicy::Strict).fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::MissingCredential));
    }

    #[tokio::test]
    async fn request_is_grounded_with_schema() {
        let client = Arc::new(ScriptedClient::new().reply_text(THREE_UPDATES));
        let outcome = fetcher(Some(client.clone()), FailurePolicy::Lenient)
            .fetch()
            .await
            .unwrap();
        assert_eq!(outcome.updates.len(), 3);
        assert_eq!(outcome.origin, UpdateOrigin::Live);

        let requests = client.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].google_search);
        assert!(requests[0].response_schema.is_some());
        assert_eq!(requests[0].model, "gemini-3-flash-preview");
    }

    #[tokio::test]
    async fn grounding_is_returned() {
        let meta = grounding(&["https://cite/0"]);
        let client = Arc::new(ScriptedClient::new().reply(GenerateResponse {
            text: r#"{"updates": [{"id": "a", "source": "CBI", "title": "T"}]}"#.into(),
            grounding: Some(meta.clone()),
        }));
        let outcome = fetcher(Some(client), FailurePolicy::Lenient)
            .fetch()
            .await
            .unwrap();
        assert_eq!(outcome.updates[0].url, "https://cite/0");
        assert_eq!(outcome.grounding, Some(meta));
    }

    #[tokio::test]
    async fn provider_failure_lenient_is_empty() {
        let client = Arc::new(ScriptedClient::new().fail("quota exceeded"));
        let outcome = fetcher(Some(client), FailurePolicy::Lenient)
            .fetch()
            .await
            .unwrap();
        assert!(outcome.updates.is_empty());
        assert!(outcome.grounding.is_none());
        assert!(outcome.log.unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn provider_failure_strict_propagates() {
        let client = Arc::new(ScriptedClient::new().fail("quota exceeded"));
        let err = fetcher(Some(client), FailurePolicy::Strict)
            .fetch()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn empty_live_result_is_legitimate() {
        let client = Arc::new(ScriptedClient::new().reply_text(r#"{"updates": []}"#));
        let outcome = fetcher(Some(client), FailurePolicy::Strict)
            .fetch()
            .await
            .unwrap();
        assert!(outcome.updates.is_empty());
        assert_eq!(outcome.origin, UpdateOrigin::Live);
    }

    #[tokio::test]
    async fn empty_live_result_can_fall_back() {
        let client: Arc<dyn GenerativeClient> =
            Arc::new(ScriptedClient::new().reply_text("not json"));
        let fetcher = UpdateFetcher::new(
            Some(client),
            FetcherConfig {
                fallback_on_empty: true,
                ..FetcherConfig::default()
            },
        );
        let outcome = fetcher.fetch().await.unwrap();
        assert_eq!(outcome.origin, UpdateOrigin::Fallback);
        assert_eq!(outcome.updates, fallback::updates());
    }
}
