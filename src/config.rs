use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "SAIT";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analysis API used when `SAIT_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_PROGRESS_TICK_MS: u64 = 500;

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "sait=info,sait_lib=info"
}

/// Get the application data directory
/// ~/.sait/ on all platforms. Falls back to the working directory when
/// no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sait")
}

/// Session marker file (auth flag + username).
pub fn session_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("session.json")
}

/// Default destination for report exports.
pub fn exports_dir(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("exports")
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the analysis API (no trailing slash).
    pub api_base_url: String,
    /// Root for the session marker and exports.
    pub data_dir: PathBuf,
    /// TCP connect timeout. Requests themselves are not time-limited:
    /// analysis of a large document can legitimately take minutes.
    pub connect_timeout: Duration,
    /// Interval between simulated progress ticks.
    pub progress_tick: Duration,
}

impl AppConfig {
    /// Resolve configuration from `SAIT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup("SAIT_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let data_dir = lookup("SAIT_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(app_data_dir);
        let connect_timeout_secs = lookup("SAIT_CONNECT_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        let progress_tick_ms = lookup("SAIT_PROGRESS_TICK_MS")
            .and_then(|v| v.parse().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_PROGRESS_TICK_MS);

        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            data_dir,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            progress_tick: Duration::from_millis(progress_tick_ms),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        session_path(&self.data_dir)
    }

    pub fn exports_dir(&self) -> PathBuf {
        exports_dir(&self.data_dir)
    }
}
