//! Resolver configuration.
//!
//! One configuration object, built once at process start (explicitly or
//! from `KOSH_*` environment variables) and passed down by reference.
//! Strict-mode resolution happens in exactly one place,
//! [`ResolverConfig::resolved_strict_mode`], never re-read ad hoc at call
//! sites.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::defaults;
use crate::error::{Error, Result};

/// Strictness setting for the decision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictMode {
    /// Always strict.
    On,
    /// Always lenient.
    Off,
    /// Strict outside a detected production deployment, lenient inside it.
    #[default]
    Auto,
}

impl FromStr for StrictMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "true" | "1" | "on" => Ok(StrictMode::On),
            "false" | "0" | "off" => Ok(StrictMode::Off),
            "auto" => Ok(StrictMode::Auto),
            other => Err(Error::Config(format!(
                "invalid strict mode '{}': expected true/1, false/0, or auto",
                other
            ))),
        }
    }
}

impl fmt::Display for StrictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrictMode::On => write!(f, "on"),
            StrictMode::Off => write!(f, "off"),
            StrictMode::Auto => write!(f, "auto"),
        }
    }
}

/// Resolver configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Strictness override; `Auto` defers to deployment detection.
    pub strict_mode: StrictMode,
    /// Contributions required before promotion into the canonical
    /// vocabulary.
    pub promotion_threshold: i64,
    /// Single-candidate auto-accept floor in strict mode.
    pub strict_accept_threshold: f32,
    /// Single-candidate auto-accept floor in lenient mode.
    pub lenient_accept_threshold: f32,
    /// Bound on each similarity index request.
    pub search_timeout: Duration,
    /// Neighbors requested per similarity query.
    pub search_limit: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strict_mode: StrictMode::Auto,
            promotion_threshold: defaults::PROMOTION_THRESHOLD,
            strict_accept_threshold: defaults::ACCEPT_THRESHOLD_STRICT,
            lenient_accept_threshold: defaults::ACCEPT_THRESHOLD_LENIENT,
            search_timeout: Duration::from_millis(defaults::SEARCH_TIMEOUT_MS),
            search_limit: defaults::SEARCH_LIMIT,
        }
    }
}

impl ResolverConfig {
    /// Build configuration from `KOSH_*` environment variables, falling
    /// back to defaults for anything unset.
    ///
    /// Recognized variables: `KOSH_STRICT_MODE`, `KOSH_PROMOTION_THRESHOLD`,
    /// `KOSH_ACCEPT_THRESHOLD_STRICT`, `KOSH_ACCEPT_THRESHOLD_LENIENT`,
    /// `KOSH_SEARCH_TIMEOUT_MS`, `KOSH_SEARCH_LIMIT`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("KOSH_STRICT_MODE") {
            config.strict_mode = raw.parse()?;
        }
        if let Some(threshold) = parse_env("KOSH_PROMOTION_THRESHOLD") {
            config.promotion_threshold = threshold;
        }
        if let Some(threshold) = parse_env("KOSH_ACCEPT_THRESHOLD_STRICT") {
            config.strict_accept_threshold = threshold;
        }
        if let Some(threshold) = parse_env("KOSH_ACCEPT_THRESHOLD_LENIENT") {
            config.lenient_accept_threshold = threshold;
        }
        if let Some(ms) = parse_env::<u64>("KOSH_SEARCH_TIMEOUT_MS") {
            config.search_timeout = Duration::from_millis(ms);
        }
        if let Some(limit) = parse_env("KOSH_SEARCH_LIMIT") {
            config.search_limit = limit;
        }

        config.validate()?;

        debug!(
            strict_mode = %config.strict_mode,
            promotion_threshold = config.promotion_threshold,
            search_timeout_ms = config.search_timeout.as_millis() as u64,
            "Resolver configuration loaded"
        );

        Ok(config)
    }

    /// Validate threshold ranges.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("strict_accept_threshold", self.strict_accept_threshold),
            ("lenient_accept_threshold", self.lenient_accept_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.promotion_threshold < 1 {
            return Err(Error::Config(format!(
                "promotion_threshold must be at least 1, got {}",
                self.promotion_threshold
            )));
        }
        Ok(())
    }

    /// Resolve the effective strict-mode boolean.
    ///
    /// Explicit `On`/`Off` win; `Auto` is strict everywhere except a
    /// detected production deployment.
    pub fn resolved_strict_mode(&self) -> bool {
        match self.strict_mode {
            StrictMode::On => true,
            StrictMode::Off => false,
            StrictMode::Auto => !production_deployment_detected(),
        }
    }

    /// Auto-accept floor for the given strictness.
    pub fn accept_threshold(&self, strict: bool) -> f32 {
        if strict {
            self.strict_accept_threshold
        } else {
            self.lenient_accept_threshold
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Detect a production deployment from `KOSH_ENV` (preferred) or
/// `APP_ENV`.
fn production_deployment_detected() -> bool {
    for key in ["KOSH_ENV", "APP_ENV"] {
        if let Ok(value) = env::var(key) {
            let value = value.to_lowercase();
            return value == "production" || value == "prod";
        }
    }
    false
}
