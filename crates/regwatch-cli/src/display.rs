//! Terminal rendering of the dashboard.
//!
//! Lays out an update list, the AI risk analysis panel, and the grounding
//! sources, with loading, error and empty states.

use std::fmt::{self, Write};

use regwatch_ai::{GroundingMetadata, UpdateOrigin};
use regwatch_core::{ImpactAnalysis, RegulatoryUpdate, fallback};
use regwatch_dashboard::DashboardSnapshot;

const RULE_WIDTH: usize = 72;
const MAX_SUMMARY_CHARS: usize = 320;
const MAX_SOURCES: usize = 10;

// ── Public API ──

/// Render a full dashboard snapshot.
pub fn render_dashboard(snapshot: &DashboardSnapshot) -> Result<String, fmt::Error> {
    let mut out = String::new();
    render_header(&mut out, snapshot)?;

    if let Some(error) = &snapshot.error {
        render_banner(&mut out, error)?;
    }

    if snapshot.loading && snapshot.updates.is_empty() {
        writeln!(out, "Scanning regulatory portals...")?;
        return Ok(out);
    }

    render_updates(&mut out, &snapshot.updates)?;
    render_analysis(&mut out, snapshot.analysis.as_ref())?;
    if let Some(grounding) = &snapshot.grounding {
        render_sources(&mut out, grounding)?;
    }
    Ok(out)
}

/// Render the built-in fallback dataset.
pub fn render_fallback() -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "=== Fallback dataset v{} ===", fallback::FALLBACK_VERSION)?;
    writeln!(out)?;
    render_updates(&mut out, &fallback::updates())?;
    render_analysis(&mut out, Some(&fallback::analysis()))?;
    Ok(out)
}

// ── Sections ──

fn render_header(out: &mut String, snapshot: &DashboardSnapshot) -> fmt::Result {
    writeln!(out, "=== Regulatory Monitor ===")?;
    writeln!(out, "Ireland Insurance & Pensions Intelligence")?;

    let mut status = Vec::new();
    if snapshot.loading {
        status.push("refreshing".to_string());
    }
    if snapshot.origin == Some(UpdateOrigin::Fallback) {
        status.push(format!(
            "offline data (fallback v{})",
            fallback::FALLBACK_VERSION
        ));
    }
    if let Some(at) = snapshot.last_refreshed {
        status.push(format!("updated {}", at.format("%Y-%m-%d %H:%M UTC")));
    }
    if !status.is_empty() {
        writeln!(out, "[{}]", status.join(" | "))?;
    }
    writeln!(out)
}

fn render_banner(out: &mut String, error: &str) -> fmt::Result {
    writeln!(out, "{}", "!".repeat(RULE_WIDTH))?;
    writeln!(out, "! Retrieval failed: {error}")?;
    writeln!(out, "! Run the command again to retry.")?;
    writeln!(out, "{}", "!".repeat(RULE_WIDTH))?;
    writeln!(out)
}

fn render_updates(out: &mut String, updates: &[RegulatoryUpdate]) -> fmt::Result {
    writeln!(out, "Regulatory Updates ({})", updates.len())?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    if updates.is_empty() {
        writeln!(out, "No regulatory updates found for the selected period.")?;
        return writeln!(out);
    }
    for update in updates {
        render_update_card(out, update)?;
    }
    Ok(())
}

fn render_update_card(out: &mut String, update: &RegulatoryUpdate) -> fmt::Result {
    writeln!(
        out,
        "[{}] {}  impact {:.1}/10 ({})",
        update.source,
        update.date,
        update.impact_score,
        impact_label(update.impact_score)
    )?;
    writeln!(out, "  {}", update.title)?;
    if !update.category.is_empty() {
        writeln!(out, "  {:<10} {}", "category", update.category)?;
    }
    if !update.summary.is_empty() {
        writeln!(out, "  {}", truncate(&update.summary, MAX_SUMMARY_CHARS))?;
    }
    if let Some(analysis) = &update.analysis {
        writeln!(out, "  {:<10} {}", "analysis", analysis)?;
    }
    writeln!(out, "  {:<10} {}", "link", update.url)?;
    writeln!(out)
}

fn render_analysis(out: &mut String, analysis: Option<&ImpactAnalysis>) -> fmt::Result {
    writeln!(out, "AI Risk Analysis")?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    let Some(analysis) = analysis else {
        writeln!(out, "No analysis available.")?;
        return writeln!(out);
    };

    writeln!(out, "  {:<10} {}", "sentiment", analysis.overall_sentiment)?;
    render_list(out, "Key risks", &analysis.key_risks)?;
    render_list(out, "Recommended actions", &analysis.recommended_actions)?;
    if !analysis.summary.is_empty() {
        writeln!(out, "  {}", analysis.summary)?;
    }
    writeln!(out)
}

fn render_list(out: &mut String, header: &str, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {header}:")?;
    for item in items {
        writeln!(out, "    - {item}")?;
    }
    Ok(())
}

fn render_sources(out: &mut String, grounding: &GroundingMetadata) -> fmt::Result {
    let citations: Vec<_> = grounding
        .citations()
        .filter_map(|c| c.uri.as_deref().map(|uri| (c.title.as_deref(), uri)))
        .collect();
    if citations.is_empty() {
        return Ok(());
    }

    writeln!(out, "Sources ({})", citations.len())?;
    for (title, uri) in citations.iter().take(MAX_SOURCES) {
        match title {
            Some(t) => writeln!(out, "  {t:<24} {uri}")?,
            None => writeln!(out, "  {uri}")?,
        }
    }
    if citations.len() > MAX_SOURCES {
        writeln!(out, "  ... and {} more", citations.len() - MAX_SOURCES)?;
    }
    Ok(())
}

// ── Helpers ──

fn impact_label(score: f64) -> &'static str {
    if score >= 8.0 {
        "high"
    } else if score >= 5.0 {
        "medium"
    } else {
        "low"
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
