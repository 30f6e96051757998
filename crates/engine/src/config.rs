use std::str::FromStr;
use std::time::Duration;

use smartsheet_core::grid::{DEFAULT_COLS, DEFAULT_ROWS};
use smartsheet_core::GridSize;

use crate::error::EngineError;

/// Default base URL of the job service.
pub const DEFAULT_JOB_SERVICE_URL: &str = "http://localhost:8080";

/// Default delay between poll ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default per-request timeout for job service calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local job service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Job service base URL (default: `http://localhost:8080`).
    pub job_service_url: String,
    /// Delay between poll ticks (default: 2000 ms).
    pub poll_interval: Duration,
    /// Per-request timeout (default: 30 s).
    pub request_timeout: Duration,
    /// Dimensions of a fresh or cleared grid (default: 101 x 11).
    pub grid_size: GridSize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            job_service_url: DEFAULT_JOB_SERVICE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            grid_size: GridSize::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `JOB_SERVICE_URL`      | `http://localhost:8080`  |
    /// | `POLL_INTERVAL_MS`     | `2000`                   |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                     |
    /// | `GRID_ROWS`            | `101`                    |
    /// | `GRID_COLS`            | `11`                     |
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let job_service_url = lookup("JOB_SERVICE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_JOB_SERVICE_URL.into());

        let poll_interval_ms: u64 = parse_var(&lookup, "POLL_INTERVAL_MS", 2000)?;
        if poll_interval_ms == 0 {
            return Err(EngineError::Config {
                var: "POLL_INTERVAL_MS",
                message: "must be greater than zero".into(),
            });
        }

        let request_timeout_secs: u64 = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        let rows: usize = parse_var(&lookup, "GRID_ROWS", DEFAULT_ROWS)?;
        let cols: usize = parse_var(&lookup, "GRID_COLS", DEFAULT_COLS)?;
        let grid_size = GridSize::new(rows, cols).map_err(|e| EngineError::Config {
            var: "GRID_ROWS/GRID_COLS",
            message: e.to_string(),
        })?;

        Ok(Self {
            job_service_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            grid_size,
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, EngineError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| EngineError::Config {
            var,
            message: format!("{raw:?}: {e}"),
        }),
    }
}
