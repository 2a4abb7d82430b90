//! Agent configuration.
//!
//! Configuration is an explicit struct handed to constructors; nothing in
//! the crate reads ambient global state. `from_env` exists for binaries
//! that want environment-driven setup, but the result is still passed in
//! explicitly.

use std::time::Duration;

use bon::Builder;

use crate::conversation::HistoryBehavior;
use crate::error::{Result, TychoError};

/// Configuration consumed by [`Agent`](crate::agent::Agent) and its
/// [`ToolExecutor`](crate::executor::ToolExecutor).
#[derive(Debug, Clone, Builder)]
pub struct AgentConfig {
    /// Model identifier passed through to the backend client.
    #[builder(into)]
    pub model: String,

    /// Sampling temperature forwarded to the backend, if set.
    pub temperature: Option<f64>,

    /// Iteration cap per turn. Forced to 1 when no tools are registered.
    #[builder(default = 10)]
    pub max_iterations: u32,

    /// Additional attempts after a failed backend call.
    #[builder(default = 3)]
    pub max_retries: u32,

    /// Fixed delay between backend retry attempts.
    #[builder(default = Duration::from_secs(2))]
    pub retry_delay: Duration,

    /// Worker bound for the parallel tool strategy. A value of 0 or 1
    /// forces sequential execution.
    #[builder(default = 4)]
    pub max_concurrent_tools: usize,

    /// Per-task deadline for parallel tool invocations.
    #[builder(default = Duration::from_secs(60))]
    pub tool_timeout: Duration,

    /// Upper bound on the staggered start delay for parallel tool tasks.
    /// Zero disables jitter entirely.
    #[builder(default = Duration::from_secs(1))]
    pub tool_start_jitter_max: Duration,

    /// Tool output longer than this many characters is truncated.
    #[builder(default = 20_000)]
    pub max_tool_response_length: usize,

    /// What survives into persistent memory at the end of each turn.
    #[builder(default = HistoryBehavior::Last)]
    pub history_behavior: HistoryBehavior,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::builder().model("gpt-4o-mini").build()
    }
}

impl AgentConfig {
    /// Build a config from `TYCHO_*` environment variables, loading `.env`
    /// first if present. Unset variables keep their defaults; a variable
    /// that is set but unparseable is a configuration error, not a silent
    /// fallback.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        if let Ok(model) = std::env::var("TYCHO_MODEL") {
            config.model = model;
        }
        if let Some(t) = parse_var::<f64>("TYCHO_TEMPERATURE")? {
            config.temperature = Some(t);
        }
        if let Some(n) = parse_var::<u32>("TYCHO_MAX_ITERATIONS")? {
            config.max_iterations = n;
        }
        if let Some(n) = parse_var::<u32>("TYCHO_MAX_RETRIES")? {
            config.max_retries = n;
        }
        if let Some(secs) = parse_var::<f64>("TYCHO_RETRY_DELAY_SECONDS")? {
            config.retry_delay = duration_from_secs(secs, "TYCHO_RETRY_DELAY_SECONDS")?;
        }
        if let Some(n) = parse_var::<usize>("TYCHO_MAX_CONCURRENT_TOOLS")? {
            config.max_concurrent_tools = n;
        }
        if let Some(secs) = parse_var::<f64>("TYCHO_TOOL_TIMEOUT_SECONDS")? {
            config.tool_timeout = duration_from_secs(secs, "TYCHO_TOOL_TIMEOUT_SECONDS")?;
        }
        if let Some(secs) = parse_var::<f64>("TYCHO_TOOL_START_JITTER_MAX_SECONDS")? {
            config.tool_start_jitter_max =
                duration_from_secs(secs, "TYCHO_TOOL_START_JITTER_MAX_SECONDS")?;
        }
        if let Some(n) = parse_var::<usize>("TYCHO_MAX_TOOL_RESPONSE_LENGTH")? {
            config.max_tool_response_length = n;
        }
        if let Ok(raw) = std::env::var("TYCHO_HISTORY_BEHAVIOR") {
            config.history_behavior = raw.parse::<HistoryBehavior>().map_err(|_| {
                TychoError::Configuration(format!(
                    "TYCHO_HISTORY_BEHAVIOR must be one of none, last, full (got {raw:?})"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the loop cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(TychoError::Configuration("model must not be empty".into()));
        }
        if self.max_iterations == 0 {
            return Err(TychoError::Configuration(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.max_tool_response_length == 0 {
            return Err(TychoError::Configuration(
                "max_tool_response_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            TychoError::Configuration(format!("{key} has an unparseable value: {raw:?}"))
        }),
        Err(_) => Ok(None),
    }
}

fn duration_from_secs(secs: f64, key: &str) -> Result<Duration> {
    if secs.is_sign_negative() || !secs.is_finite() {
        return Err(TychoError::Configuration(format!(
            "{key} must be a non-negative number of seconds"
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}
