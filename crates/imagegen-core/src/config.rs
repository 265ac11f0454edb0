//! Runtime configuration for the generation gateway.
//!
//! Every struct here is built once at process start (usually via
//! `from_env`) and handed to the components that need it. Core logic never
//! reads the environment itself.

use std::time::Duration;

use thiserror::Error;

/// Default creation endpoint of the inference provider.
pub const DEFAULT_CREATE_URL: &str = "https://api.wavespeed.ai/api/v3/wavespeed-ai/z-image/turbo";
/// Default prefix for task status probes (`{prefix}/{task_id}/result`).
pub const DEFAULT_STATUS_URL: &str = "https://api.wavespeed.ai/api/v2/predictions";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

fn parsed_var<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        Err(_) => Ok(None),
    }
}

/// Fixed generation parameters sent with every creation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Output size in provider notation (`"1024*1024"`)
    pub size: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub enable_safety_checker: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            size: "1024*1024".to_string(),
            num_inference_steps: 28,
            guidance_scale: 3.5,
            enable_safety_checker: true,
        }
    }
}

/// Inference provider connection settings
#[derive(Clone)]
pub struct ProviderConfig {
    /// Bearer token for the provider API
    pub api_key: String,
    /// Creation endpoint
    pub create_url: String,
    /// Status probe prefix; the task id and `/result` are appended
    pub status_url: String,
    /// Per-request transport timeout
    pub request_timeout: Duration,
    pub params: GenerationParams,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("create_url", &self.create_url)
            .field("status_url", &self.status_url)
            .field("request_timeout", &self.request_timeout)
            .field("params", &self.params)
            .finish()
    }
}

impl ProviderConfig {
    /// Config for the default provider endpoints.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            create_url: DEFAULT_CREATE_URL.to_string(),
            status_url: DEFAULT_STATUS_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            params: GenerationParams::default(),
        }
    }

    /// Point both endpoints at `base` (`{base}/create`, `{base}/predictions`).
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.create_url = format!("{base}/create");
        self.status_url = format!("{base}/predictions");
        self
    }

    pub fn with_create_url(mut self, url: impl Into<String>) -> Self {
        self.create_url = url.into();
        self
    }

    pub fn with_status_url(mut self, url: impl Into<String>) -> Self {
        self.status_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Full status URL for a task handle. The id is percent-encoded as a
    /// single path segment.
    pub fn status_url_for(&self, task_id: &str) -> Result<reqwest::Url, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            var: "WAVESPEED_STATUS_URL",
            value: self.status_url.clone(),
        };
        let mut url = reqwest::Url::parse(&self.status_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(task_id)
            .push("result");
        Ok(url)
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - WAVESPEED_API_KEY (required)
    /// - WAVESPEED_API_URL (optional)
    /// - WAVESPEED_STATUS_URL (optional)
    /// - IMAGEGEN_REQUEST_TIMEOUT_SECS (optional, default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("WAVESPEED_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingVar("WAVESPEED_API_KEY"))?;

        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var("WAVESPEED_API_URL") {
            config.create_url = url;
        }
        if let Ok(url) = std::env::var("WAVESPEED_STATUS_URL") {
            config.status_url = url;
        }
        if let Some(secs) = parsed_var::<u64>("IMAGEGEN_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

/// Status polling cadence.
///
/// Total wall-clock bound is roughly `max_attempts × interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(2),
        }
    }
}

impl PollConfig {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Upper bound on time spent suspended between probes. Saturates at
    /// `Duration::MAX`.
    pub fn budget(&self) -> Duration {
        self.interval
            .checked_mul(self.max_attempts)
            .unwrap_or(Duration::MAX)
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - IMAGEGEN_POLL_MAX_ATTEMPTS (optional, default: 60)
    /// - IMAGEGEN_POLL_INTERVAL_MS (optional, default: 2000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(n) = parsed_var::<u32>("IMAGEGEN_POLL_MAX_ATTEMPTS")? {
            if n == 0 {
                return Err(ConfigError::InvalidValue {
                    var: "IMAGEGEN_POLL_MAX_ATTEMPTS",
                    value: "0".to_string(),
                });
            }
            config.max_attempts = n;
        }
        if let Some(ms) = parsed_var::<u64>("IMAGEGEN_POLL_INTERVAL_MS")? {
            config.interval = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_generation_params_match_provider_contract() {
        let p = GenerationParams::default();
        assert_eq!(p.size, "1024*1024");
        assert_eq!(p.num_inference_steps, 28);
        assert_eq!(p.guidance_scale, 3.5);
        assert!(p.enable_safety_checker);
    }

    #[test]
    fn default_poll_budget_is_two_minutes() {
        assert_eq!(PollConfig::default().budget(), Duration::from_secs(120));
    }

    #[test]
    fn status_url_appends_task_and_result() {
        let config = ProviderConfig::new("k").with_status_url("http://p/predictions/");
        assert_eq!(
            config.status_url_for("task-1").unwrap().as_str(),
            "http://p/predictions/task-1/result"
        );
    }

    #[test]
    fn status_url_escapes_reserved_characters_in_task_id() {
        let config = ProviderConfig::new("k").with_status_url("http://p/predictions");
        assert_eq!(
            config.status_url_for("a/b?c#d").unwrap().as_str(),
            "http://p/predictions/a%2Fb%3Fc%23d/result"
        );
    }

    #[test]
    fn unparsable_status_url_is_a_config_error() {
        let config = ProviderConfig::new("k").with_status_url("not a url");
        assert!(matches!(
            config.status_url_for("t"),
            Err(ConfigError::InvalidValue { var: "WAVESPEED_STATUS_URL", .. })
        ));
    }

    #[test]
    fn poll_budget_saturates_instead_of_overflowing() {
        let config = PollConfig::new(u32::MAX, Duration::from_millis(u64::MAX));
        assert_eq!(config.budget(), Duration::MAX);
    }

    #[test]
    fn base_url_sets_both_endpoints() {
        let config = ProviderConfig::new("k").with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.create_url, "http://127.0.0.1:9000/create");
        assert_eq!(config.status_url, "http://127.0.0.1:9000/predictions");
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let text = format!("{:?}", ProviderConfig::new("sk-secret"));
        assert!(!text.contains("sk-secret"));
        assert!(text.contains("<redacted>"));
    }
}
