//! # Runtime Configuration Module
//!
//! Environment-driven tuning for routing and dispatch.
//!
//! ## Environment Variables
//!
//! ### `ACP_SLOW_MATCH_US`
//!
//! Route lookups slower than this many microseconds are logged at `warn` as
//! "Slow route matching detected". Accepts decimal (`1000`) or hexadecimal
//! (`0x3e8`). Default: `1000` (1 ms).
//!
//! ### `ACP_EXPOSE_ERRORS`
//!
//! When `true`, the failure response the dispatcher synthesizes for an
//! unhandled handler error carries the error text in a `details` field.
//! Leave it off in production. Default: `false`.
//!
//! ## Usage
//!
//! ```rust
//! use acprouter::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("slow match threshold: {:?}", config.slow_match_threshold());
//! ```

use std::env;
use std::time::Duration;

const DEFAULT_SLOW_MATCH_US: u64 = 1000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Slow lookup threshold in microseconds
    pub slow_match_us: u64,
    /// Include handler error text in synthesized failure bodies
    pub expose_errors: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            slow_match_us: DEFAULT_SLOW_MATCH_US,
            expose_errors: false,
        }
    }
}

fn parse_number(val: &str) -> Option<u64> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let slow_match_us = lookup("ACP_SLOW_MATCH_US")
            .and_then(|v| parse_number(&v))
            .unwrap_or(DEFAULT_SLOW_MATCH_US);
        let expose_errors = lookup("ACP_EXPOSE_ERRORS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(false);
        RuntimeConfig {
            slow_match_us,
            expose_errors,
        }
    }

    #[must_use]
    pub fn slow_match_threshold(&self) -> Duration {
        Duration::from_micros(self.slow_match_us)
    }
}
