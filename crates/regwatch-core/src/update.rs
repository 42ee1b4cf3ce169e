//! Regulatory update and impact analysis types shared by the fetcher,
//! the analysis generator, and the dashboard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Regulator that published an update.
///
/// Serialised with the exact display names the provider schema uses.
/// Parsing is lenient: case-insensitive, and accepts the long-form names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Source {
    #[serde(rename = "CBI")]
    Cbi,
    #[serde(rename = "EIOPA")]
    Eiopa,
    #[serde(rename = "Pensions Authority")]
    PensionsAuthority,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown regulator: {0:?}")]
pub struct ParseSourceError(pub String);

impl Source {
    pub const ALL: [Source; 3] = [Source::Cbi, Source::Eiopa, Source::PensionsAuthority];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cbi => "CBI",
            Self::Eiopa => "EIOPA",
            Self::PensionsAuthority => "Pensions Authority",
        }
    }

    /// Landing page used when neither the provider nor a citation supplies a link.
    pub fn default_url(&self) -> &'static str {
        match self {
            Self::Cbi => "https://www.centralbank.ie",
            Self::Eiopa => "https://www.eiopa.europa.eu",
            Self::PensionsAuthority => "https://www.pensionsauthority.ie",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ParseSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "cbi" | "central bank of ireland" | "central bank" => Ok(Self::Cbi),
            "eiopa" | "european insurance and occupational pensions authority" => Ok(Self::Eiopa),
            "pensions authority" | "the pensions authority" => Ok(Self::PensionsAuthority),
            _ => Err(ParseSourceError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Source {
    type Error = ParseSourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One reported regulatory item.
///
/// Created fresh on every fetch cycle and replaced wholesale on the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryUpdate {
    pub id: String,
    pub source: Source,
    pub title: String,
    pub summary: String,
    /// Free-text date label as reported; not guaranteed parseable.
    pub date: String,
    /// Intended 0-10, not enforced.
    pub impact_score: f64,
    pub category: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

/// Overall tone of an analysed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Sentiment {
    Neutral,
    Positive,
    Critical,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "Neutral",
            Self::Positive => "Positive",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Sentiment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "positive" => Ok(Self::Positive),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("unknown sentiment: {value:?}")),
        }
    }
}

/// Aggregated assessment over exactly one batch of updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysis {
    pub overall_sentiment: Sentiment,
    pub key_risks: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub summary: String,
}
