//! The fallback dataset served when live retrieval is unavailable.
//!
//! Bump [`FALLBACK_VERSION`] whenever the contents change so that logs and
//! rendered output identify which snapshot a user was shown.

use crate::update::{ImpactAnalysis, RegulatoryUpdate, Sentiment, Source};

pub const FALLBACK_VERSION: &str = "2025.1";

/// Fixed update list, ordered CBI, EIOPA, Pensions Authority.
pub fn updates() -> Vec<RegulatoryUpdate> {
    vec![
        RegulatoryUpdate {
            id: "fallback-cbi-cpc".into(),
            source: Source::Cbi,
            title: "Revised Consumer Protection Code published".into(),
            summary: "The Central Bank has published the revised Consumer Protection Code, \
                      introducing new requirements on digitalisation, unregulated activities \
                      and the treatment of consumers in vulnerable circumstances."
                .into(),
            date: "March 2025".into(),
            impact_score: 9.0,
            category: "Consumer Protection".into(),
            url: "https://www.centralbank.ie/regulation/consumer-protection".into(),
            analysis: Some(
                "Insurers must review sales journeys and vulnerability policies ahead of the \
                 March 2026 commencement date."
                    .into(),
            ),
        },
        RegulatoryUpdate {
            id: "fallback-eiopa-solvency".into(),
            source: Source::Eiopa,
            title: "Technical advice on the Solvency II review amendments".into(),
            summary: "EIOPA consultation on implementing technical standards following the \
                      amending directive, covering proportionality measures and the \
                      macroprudential toolkit."
                .into(),
            date: "February 2025".into(),
            impact_score: 7.5,
            category: "Solvency II".into(),
            url: "https://www.eiopa.europa.eu/consultations".into(),
            analysis: Some(
                "Irish (re)insurers should assess eligibility for the proportionality \
                 regime and prepare for revised reporting templates."
                    .into(),
            ),
        },
        RegulatoryUpdate {
            id: "fallback-pa-iorp".into(),
            source: Source::PensionsAuthority,
            title: "Code of Practice on IORP II governance requirements".into(),
            summary: "The Pensions Authority reminds trustees of occupational pension \
                      schemes of their obligations on own-risk assessments and key function \
                      holders under the Code of Practice."
                .into(),
            date: "January 2025".into(),
            impact_score: 6.0,
            category: "Pensions Governance".into(),
            url: "https://www.pensionsauthority.ie/en/trustees_registered_administrators/".into(),
            analysis: None,
        },
    ]
}

/// Placeholder analysis paired with [`updates`].
pub fn analysis() -> ImpactAnalysis {
    ImpactAnalysis {
        overall_sentiment: Sentiment::Neutral,
        key_risks: vec![
            "Conduct risk from the revised Consumer Protection Code commencement".into(),
            "Capital and reporting changes from the Solvency II review".into(),
            "Trustee governance gaps under IORP II".into(),
        ],
        recommended_actions: vec![
            "Run a gap analysis against the revised Consumer Protection Code".into(),
            "Model the impact of Solvency II proportionality measures".into(),
            "Confirm own-risk assessments are scheduled for all schemes".into(),
        ],
        summary: format!(
            "Live analysis unavailable; showing the built-in regulatory snapshot \
             (fallback dataset v{FALLBACK_VERSION})."
        ),
    }
}
