//! Command-line and environment configuration.

use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use regwatch_ai::{
    AnalysisConfig, AnalysisGenerator, DEFAULT_BASE_URL, FailurePolicy, FetcherConfig,
    GeminiClient, GeminiConfig, GenerativeClient, UpdateFetcher,
};
use regwatch_dashboard::DashboardController;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "regwatch",
    version,
    about = "Regulatory updates and AI risk analysis for Irish insurance and pensions"
)]
pub struct Cli {
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Refresh once and render the dashboard (default).
    Show {
        /// Emit the dashboard snapshot as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Refresh on an interval until interrupted.
    Watch {
        /// Seconds between refreshes.
        #[arg(long, default_value_t = 300)]
        interval: u64,
        #[arg(long)]
        json: bool,
    },
    /// Print the built-in fallback dataset.
    Fallback {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ProviderArgs {
    /// Gemini API key. Without one, the fallback dataset is shown.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "REGWATCH_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Model used for the search-grounded update retrieval.
    #[arg(long, default_value = "gemini-3-flash-preview", global = true)]
    pub fetch_model: String,

    /// Model used for the aggregated impact analysis.
    #[arg(long, default_value = "gemini-3-pro-preview", global = true)]
    pub analysis_model: String,

    /// How many days back counts as "recent".
    #[arg(long, default_value_t = 30, global = true)]
    pub window_days: u32,

    /// Per-request timeout for provider calls.
    #[arg(long, default_value_t = 60, global = true)]
    pub timeout_secs: u64,

    /// Treat a missing key or a failed retrieval as an error instead of
    /// degrading to fallback or empty content.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Show the fallback dataset when a live retrieval finds nothing.
    #[arg(long, global = true)]
    pub fallback_on_empty: bool,
}

impl ProviderArgs {
    /// The configured key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn policy(&self) -> FailurePolicy {
        if self.strict {
            FailurePolicy::Strict
        } else {
            FailurePolicy::Lenient
        }
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            model: self.fetch_model.clone(),
            window_days: self.window_days,
            policy: self.policy(),
            fallback_on_empty: self.fallback_on_empty,
        }
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            model: self.analysis_model.clone(),
            policy: self.policy(),
        }
    }

    pub fn gemini_config(&self, api_key: &str) -> GeminiConfig {
        GeminiConfig {
            api_key: api_key.to_string(),
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }

    /// Build the provider client, or `None` when no key is configured.
    pub fn client(&self) -> anyhow::Result<Option<Arc<dyn GenerativeClient>>> {
        let Some(key) = self.api_key() else {
            info!("GEMINI_API_KEY not set, running in fallback mode");
            return Ok(None);
        };
        let client = GeminiClient::new(self.gemini_config(key))?;
        Ok(Some(Arc::new(client)))
    }

    pub fn build_controller(&self) -> anyhow::Result<DashboardController> {
        let client = self.client()?;
        Ok(DashboardController::new(
            UpdateFetcher::new(client.clone(), self.fetcher_config()),
            AnalysisGenerator::new(client, self.analysis_config()),
        ))
    }
}
