//! # Configuration Module
//!
//! Environment-variable configuration for a [`Pipeline`](crate::pipeline::Pipeline)
//! and the coroutine runtime serving it.
//!
//! ## Environment Variables
//!
//! | Variable | Values | Default |
//! |---|---|---|
//! | `REQCTX_PLATFORM` | `standard` / `hosted` | `standard` |
//! | `REQCTX_BUILD_POLICY` | `best-effort` / `strict` | `best-effort` |
//! | `REQCTX_MAX_BODY_BYTES` | bytes, decimal or `0x` hex | 16 MiB |
//! | `REQCTX_MAX_FORM_BYTES` | bytes, decimal or `0x` hex | 10 MiB |
//! | `REQCTX_HOSTNAME` | hostname reported on the hosted platform | unset |
//! | `REQCTX_STACK_SIZE` | coroutine stack, decimal or `0x` hex | `0x4000` |
//!
//! Unparseable numbers fall back to the default.
//!
//! ```bash
//! export REQCTX_PLATFORM=hosted
//! export REQCTX_STACK_SIZE=0x8000
//! ```

use crate::request::{BuildPolicy, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_FORM_BYTES};
use crate::store::Environment;
use std::env;

pub const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Startup configuration, read once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub platform: Environment,
    pub build_policy: BuildPolicy,
    pub max_body_bytes: usize,
    pub max_form_bytes: usize,
    pub hostname: Option<String>,
    /// Coroutine stack size in bytes
    pub stack_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            platform: Environment::Standard,
            build_policy: BuildPolicy::BestEffort,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_form_bytes: DEFAULT_MAX_FORM_BYTES,
            hostname: None,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// Parse a size given in decimal or `0x` hexadecimal.
pub fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

impl PipelineConfig {
    /// Load configuration from `REQCTX_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let size = |key: &str, default: usize| {
            lookup(key)
                .and_then(|v| parse_size(&v))
                .unwrap_or(default)
        };
        Self {
            platform: lookup("REQCTX_PLATFORM")
                .map(|v| Environment::parse(&v))
                .unwrap_or(defaults.platform),
            build_policy: lookup("REQCTX_BUILD_POLICY")
                .map(|v| BuildPolicy::parse(&v))
                .unwrap_or(defaults.build_policy),
            max_body_bytes: size("REQCTX_MAX_BODY_BYTES", defaults.max_body_bytes),
            max_form_bytes: size("REQCTX_MAX_FORM_BYTES", defaults.max_form_bytes),
            hostname: lookup("REQCTX_HOSTNAME").filter(|h| !h.trim().is_empty()),
            stack_size: size("REQCTX_STACK_SIZE", defaults.stack_size),
        }
    }
}
