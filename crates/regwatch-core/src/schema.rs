/// Structured-output schemas sent with each generation request.
///
/// Uses the OpenAPI subset the Gemini API accepts (`OBJECT`, `ARRAY`,
/// `STRING`, `NUMBER`).
pub mod genai {
    use serde_json::{Value, json};

    /// Field names of a regulatory update, all required in the response.
    pub const UPDATE_FIELDS: &[&str] = &[
        "id",
        "source",
        "title",
        "summary",
        "date",
        "impactScore",
        "category",
        "url",
        "analysis",
    ];

    /// Field names of an impact analysis, all required in the response.
    pub const ANALYSIS_FIELDS: &[&str] = &[
        "overallSentiment",
        "keyRisks",
        "recommendedActions",
        "summary",
    ];

    /// Schema for the fetch call: an object holding an `updates` array.
    pub fn updates_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "updates": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "id": { "type": "STRING" },
                            "source": {
                                "type": "STRING",
                                "enum": ["CBI", "EIOPA", "Pensions Authority"]
                            },
                            "title": { "type": "STRING" },
                            "summary": { "type": "STRING" },
                            "date": { "type": "STRING" },
                            "impactScore": { "type": "NUMBER" },
                            "category": { "type": "STRING" },
                            "url": { "type": "STRING" },
                            "analysis": { "type": "STRING" }
                        },
                        "required": UPDATE_FIELDS
                    }
                }
            },
            "required": ["updates"]
        })
    }

    /// Schema for the aggregated impact analysis.
    pub fn analysis_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "overallSentiment": {
                    "type": "STRING",
                    "enum": ["Neutral", "Positive", "Critical"]
                },
                "keyRisks": { "type": "ARRAY", "items": { "type": "STRING" } },
                "recommendedActions": { "type": "ARRAY", "items": { "type": "STRING" } },
                "summary": { "type": "STRING" }
            },
            "required": ANALYSIS_FIELDS
        })
    }
}
