use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use regwatch_ai::{AnalysisGenerator, UpdateFetcher};
use tracing::{debug, info, warn};

use crate::state::{DashboardSnapshot, DashboardState, TransitionError};

/// Error recorded when a refresh is dropped before it settles.
pub const REFRESH_CANCELLED: &str = "refresh cancelled";

/// What a call to [`DashboardController::refresh`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed { updates: usize, analysed: bool },
    Failed(String),
    /// Another refresh was in flight; this request was a no-op.
    AlreadyLoading,
}

/// Drives fetch-then-analyse cycles through the dashboard state machine.
///
/// Shareable behind an `Arc`: the state lock is never held across the
/// provider calls, and a refresh requested while one is running is rejected.
/// A refresh future dropped mid-cycle (a timeout, a `select!` branch losing)
/// leaves the dashboard `Failed` with [`REFRESH_CANCELLED`], never `Loading`.
pub struct DashboardController {
    fetcher: UpdateFetcher,
    generator: AnalysisGenerator,
    state: Mutex<DashboardState>,
}

impl DashboardController {
    pub fn new(fetcher: UpdateFetcher, generator: AnalysisGenerator) -> Self {
        Self {
            fetcher,
            generator,
            state: Mutex::new(DashboardState::default()),
        }
    }

    /// Run one refresh cycle: fetch updates, then analyse them if any.
    pub async fn refresh(&self) -> RefreshOutcome {
        let mut guard = {
            let mut state = lock(&self.state);
            match state.begin_refresh() {
                Ok(next) => *state = next,
                Err(e) => {
                    debug!(error = %e, "refresh ignored");
                    return RefreshOutcome::AlreadyLoading;
                }
            }
            LoadingGuard::new(&self.state)
        };

        match self.fetcher.fetch().await {
            Ok(outcome) => {
                let analysis = if outcome.updates.is_empty() {
                    None
                } else {
                    self.generator.analyze(&outcome.updates).await
                };
                let result = RefreshOutcome::Completed {
                    updates: outcome.updates.len(),
                    analysed: analysis.is_some(),
                };
                info!(
                    updates = outcome.updates.len(),
                    analysed = analysis.is_some(),
                    origin = ?outcome.origin,
                    "dashboard refreshed"
                );
                guard.settle(|s| s.complete(outcome, analysis, Utc::now()));
                result
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "dashboard refresh failed");
                guard.settle(|s| s.fail(message.clone()));
                RefreshOutcome::Failed(message)
            }
        }
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot::from(&*lock(&self.state))
    }
}

/// Owns the `Loading` phase for one refresh. Dropping it unsettled moves
/// the state to `Failed`.
struct LoadingGuard<'a> {
    state: &'a Mutex<DashboardState>,
    settled: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a Mutex<DashboardState>) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    fn settle(
        &mut self,
        transition: impl FnOnce(&DashboardState) -> Result<DashboardState, TransitionError>,
    ) {
        self.settled = true;
        apply(&mut lock(self.state), transition);
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!("refresh dropped before completing");
        apply(&mut lock(self.state), |s| s.fail(REFRESH_CANCELLED));
    }
}

// Never held across an await, so a panic mid-transition is the only way to
// poison it and the last written state is still consistent.
fn lock(state: &Mutex<DashboardState>) -> MutexGuard<'_, DashboardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn apply(
    state: &mut DashboardState,
    transition: impl FnOnce(&DashboardState) -> Result<DashboardState, TransitionError>,
) {
    match transition(state) {
        Ok(next) => *state = next,
        // Only the loading guard leaves Loading, so this is unreachable in practice.
        Err(e) => warn!(error = %e, "dropping out-of-order refresh result"),
    }
}
