//! Refresh state machine: `Idle → Loading → {Ready, Failed}`, re-entered
//! through [`DashboardState::begin_refresh`].
//!
//! Transitions are pure: each takes the current state by reference and
//! returns the next one, leaving the input untouched.
//!
//! Policies:
//! - stale data stays visible while loading and beneath an error;
//! - a refresh requested while loading is rejected.

use chrono::{DateTime, Utc};
use regwatch_ai::{FetchOutcome, GroundingMetadata, UpdateOrigin};
use regwatch_core::{ImpactAnalysis, RegulatoryUpdate};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("a refresh is already in progress")]
    AlreadyLoading,
    #[error("no refresh in progress (phase {0:?})")]
    NotLoading(Phase),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub phase: Phase,
    pub updates: Vec<RegulatoryUpdate>,
    pub analysis: Option<ImpactAnalysis>,
    pub grounding: Option<GroundingMetadata>,
    pub origin: Option<UpdateOrigin>,
    pub error: Option<String>,
    pub log: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// Idle/Ready/Failed → Loading. Clears the error, keeps data.
    pub fn begin_refresh(&self) -> Result<Self, TransitionError> {
        if self.phase == Phase::Loading {
            return Err(TransitionError::AlreadyLoading);
        }
        Ok(Self {
            phase: Phase::Loading,
            error: None,
            ..self.clone()
        })
    }

    /// Loading → Ready. Replaces the data wholesale with this cycle's results.
    pub fn complete(
        &self,
        outcome: FetchOutcome,
        analysis: Option<ImpactAnalysis>,
        at: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        self.expect_loading()?;
        Ok(Self {
            phase: Phase::Ready,
            updates: outcome.updates,
            analysis,
            grounding: outcome.grounding,
            origin: Some(outcome.origin),
            error: None,
            log: outcome.log,
            last_refreshed: Some(at),
        })
    }

    /// Loading → Failed. Previous data stays visible.
    pub fn fail(&self, message: impl Into<String>) -> Result<Self, TransitionError> {
        self.expect_loading()?;
        Ok(Self {
            phase: Phase::Failed,
            error: Some(message.into()),
            ..self.clone()
        })
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    fn expect_loading(&self) -> Result<(), TransitionError> {
        if self.phase == Phase::Loading {
            Ok(())
        } else {
            Err(TransitionError::NotLoading(self.phase))
        }
    }
}

/// Read-only view handed to the rendering layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub phase: Phase,
    pub loading: bool,
    pub error: Option<String>,
    pub updates: Vec<RegulatoryUpdate>,
    pub analysis: Option<ImpactAnalysis>,
    pub grounding: Option<GroundingMetadata>,
    pub origin: Option<UpdateOrigin>,
    pub log: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl From<&DashboardState> for DashboardSnapshot {
    fn from(state: &DashboardState) -> Self {
        Self {
            phase: state.phase,
            loading: state.is_loading(),
            error: state.error.clone(),
            updates: state.updates.clone(),
            analysis: state.analysis.clone(),
            grounding: state.grounding.clone(),
            origin: state.origin,
            log: state.log.clone(),
            last_refreshed: state.last_refreshed,
        }
    }
}
