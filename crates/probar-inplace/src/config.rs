//! Inline Field Configuration
//!
//! Timeouts, render mode and retry budget shared by every field handle of a
//! test. Built in code through `with_*` methods or loaded from YAML.
//!
//! ```yaml
//! render_mode: javascript
//! state_timeout_ms: 10000
//! retry:
//!   max_attempts: 3
//!   deadline_ms: 60000
//! ```

use crate::result::{FieldError, FieldResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default wait for open/closed state assertions (10 seconds)
pub const DEFAULT_STATE_TIMEOUT_MS: u64 = 10_000;

/// Default wait for the description save control (5 seconds)
pub const DEFAULT_SAVE_CONTROL_TIMEOUT_MS: u64 = 5_000;

/// Default wait for the editor to open after a trigger click (2 seconds)
pub const DEFAULT_ACTIVATION_WAIT_MS: u64 = 2_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default number of attempts for activation and update (1 try + 2 retries)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Environment variable overriding the render mode
pub const RENDER_MODE_ENV: &str = "PROBAR_RENDER_MODE";

/// How the page under test is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// A real browser executing client-side scripts
    #[default]
    Javascript,
    /// Server-rendered markup only, no client-side initialization
    Headless,
}

impl RenderMode {
    /// Whether the page must finish client-side initialization before lookups
    #[must_use]
    pub const fn needs_page_ready(&self) -> bool {
        matches!(self, Self::Javascript)
    }

    /// Parse a render mode name
    pub fn parse(name: &str) -> FieldResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Self::Javascript),
            "headless" | "rack" => Ok(Self::Headless),
            other => Err(FieldError::Config {
                message: format!("unknown render mode '{other}'"),
            }),
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Javascript => write!(f, "javascript"),
            Self::Headless => write!(f, "headless"),
        }
    }
}

/// Bounded retry budget for flaky editor interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Optional wall-clock cap across all attempts (milliseconds)
    pub deadline_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            deadline_ms: None,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            deadline_ms: None,
        }
    }

    /// A policy that never retries
    #[must_use]
    pub const fn once() -> Self {
        Self::new(1)
    }

    /// Cap the total time spent retrying
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = Some(deadline.as_millis() as u64);
        self
    }

    /// Get the deadline as Duration
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

/// Configuration for inline field handles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Render mode of the page under test
    pub render_mode: RenderMode,
    /// Wait for open/closed state assertions and page readiness
    pub state_timeout_ms: u64,
    /// Wait for the description save control
    pub save_control_timeout_ms: u64,
    /// Wait for the editor after a trigger click
    pub activation_wait_ms: u64,
    /// Polling interval for all waits
    pub poll_interval_ms: u64,
    /// Retry budget for activation and update
    pub retry: RetryPolicy,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::default(),
            state_timeout_ms: DEFAULT_STATE_TIMEOUT_MS,
            save_control_timeout_ms: DEFAULT_SAVE_CONTROL_TIMEOUT_MS,
            activation_wait_ms: DEFAULT_ACTIVATION_WAIT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            retry: RetryPolicy::default(),
        }
    }
}

impl FieldConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set render mode
    #[must_use]
    pub const fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    /// Set the state assertion timeout
    #[must_use]
    pub const fn with_state_timeout(mut self, timeout: Duration) -> Self {
        self.state_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the save control timeout
    #[must_use]
    pub const fn with_save_control_timeout(mut self, timeout: Duration) -> Self {
        self.save_control_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the activation wait
    #[must_use]
    pub const fn with_activation_wait(mut self, wait: Duration) -> Self {
        self.activation_wait_ms = wait.as_millis() as u64;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get state timeout as Duration
    #[must_use]
    pub const fn state_timeout(&self) -> Duration {
        Duration::from_millis(self.state_timeout_ms)
    }

    /// Get save control timeout as Duration
    #[must_use]
    pub const fn save_control_timeout(&self) -> Duration {
        Duration::from_millis(self.save_control_timeout_ms)
    }

    /// Get activation wait as Duration
    #[must_use]
    pub const fn activation_wait(&self) -> Duration {
        Duration::from_millis(self.activation_wait_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parse a config from YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> FieldResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> FieldResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Apply `PROBAR_RENDER_MODE` from the environment, if set
    pub fn from_env(self) -> FieldResult<Self> {
        match std::env::var(RENDER_MODE_ENV) {
            Ok(value) => Ok(self.with_render_mode(RenderMode::parse(&value)?)),
            Err(_) => Ok(self),
        }
    }

    /// Reject configurations that can never succeed
    pub fn validate(&self) -> FieldResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(FieldError::Config {
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(FieldError::Config {
                message: "poll_interval_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    mod render_mode_tests {
        use super::*;

        #[test]
        fn test_default_is_javascript() {
            assert_eq!(RenderMode::default(), RenderMode::Javascript);
            assert!(RenderMode::Javascript.needs_page_ready());
            assert!(!RenderMode::Headless.needs_page_ready());
        }

        #[test]
        fn test_parse() {
            assert_eq!(RenderMode::parse("JS").unwrap(), RenderMode::Javascript);
            assert_eq!(RenderMode::parse(" rack ").unwrap(), RenderMode::Headless);
            assert!(matches!(
                RenderMode::parse("webkit"),
                Err(FieldError::Config { .. })
            ));
        }

        #[test]
        fn test_display() {
            assert_eq!(RenderMode::Headless.to_string(), "headless");
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = FieldConfig::default();
            assert_eq!(config.state_timeout(), Duration::from_secs(10));
            assert_eq!(config.save_control_timeout(), Duration::from_secs(5));
            assert_eq!(config.retry.max_attempts, 3);
            assert!(config.retry.deadline().is_none());
        }

        #[test]
        fn test_builder_chain() {
            let config = FieldConfig::new()
                .with_render_mode(RenderMode::Headless)
                .with_state_timeout(Duration::from_millis(300))
                .with_poll_interval(Duration::from_millis(5))
                .with_retry(RetryPolicy::new(5).with_deadline(Duration::from_secs(2)));
            assert_eq!(config.render_mode, RenderMode::Headless);
            assert_eq!(config.state_timeout_ms, 300);
            assert_eq!(config.poll_interval_ms, 5);
            assert_eq!(config.retry.deadline(), Some(Duration::from_secs(2)));
        }

        #[test]
        fn test_yaml_partial_keeps_defaults() {
            let config = FieldConfig::from_yaml_str(
                "render_mode: headless\nretry:\n  max_attempts: 4\n",
            )
            .unwrap();
            assert_eq!(config.render_mode, RenderMode::Headless);
            assert_eq!(config.retry.max_attempts, 4);
            assert_eq!(config.state_timeout_ms, DEFAULT_STATE_TIMEOUT_MS);
        }

        #[test]
        fn test_yaml_rejects_zero_attempts() {
            let err = FieldConfig::from_yaml_str("retry:\n  max_attempts: 0\n").unwrap_err();
            assert!(matches!(err, FieldError::Config { .. }));
        }

        #[test]
        fn test_yaml_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "state_timeout_ms: 1500").unwrap();
            let config = FieldConfig::from_yaml_file(file.path()).unwrap();
            assert_eq!(config.state_timeout_ms, 1500);
        }

        #[test]
        fn test_yaml_missing_file() {
            let err = FieldConfig::from_yaml_file("/nonexistent/inplace.yaml").unwrap_err();
            assert!(matches!(err, FieldError::Io(_)));
        }

        #[test]
        fn test_env_overrides_render_mode() {
            let previous = std::env::var(RENDER_MODE_ENV).ok();

            std::env::set_var(RENDER_MODE_ENV, "headless");
            let headless = FieldConfig::new().from_env();
            std::env::set_var(RENDER_MODE_ENV, "js");
            let javascript = FieldConfig::new()
                .with_render_mode(RenderMode::Headless)
                .from_env();
            std::env::set_var(RENDER_MODE_ENV, "bogus");
            let bogus = FieldConfig::new().from_env();
            std::env::remove_var(RENDER_MODE_ENV);
            let unset = FieldConfig::new()
                .with_render_mode(RenderMode::Headless)
                .from_env();

            if let Some(value) = previous {
                std::env::set_var(RENDER_MODE_ENV, value);
            }

            assert_eq!(headless.unwrap().render_mode, RenderMode::Headless);
            assert_eq!(javascript.unwrap().render_mode, RenderMode::Javascript);
            assert!(matches!(
                bogus.unwrap_err(),
                FieldError::Config { ref message } if message == "unknown render mode 'bogus'"
            ));
            assert_eq!(unset.unwrap().render_mode, RenderMode::Headless);
        }
    }
}
