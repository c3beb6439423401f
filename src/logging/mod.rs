//! # Logging Module
//!
//! Two separate concerns live here:
//!
//! - [`Logger`]: the leveled logging capability handed to the pipeline and
//!   the error renderer. [`StandardLogger`] emits plain `tracing` events;
//!   [`HostedLogger`] tags events for the hosted platform's collector.
//! - [`init`]: process-wide `tracing-subscriber` setup driven by
//!   [`LogConfig::from_env`].
//!
//! ## Environment Variables
//!
//! - `REQCTX_LOG_LEVEL`: trace/debug/info/warn/error (default: info)
//! - `REQCTX_LOG_FORMAT`: json/pretty (default: json)
//! - `REQCTX_LOG_SAMPLING_MODE`: all/error-only/sampled (default: all)
//! - `REQCTX_LOG_SAMPLING_RATE`: 0.0-1.0 for sampled mode
//! - `REQCTX_LOG_ASYNC`: write through a background thread (default: true)
//! - `REQCTX_LOG_TARGET_FILTER`: extra directives, e.g. `reqctx=debug,may=warn`

mod init;
mod logger;

pub use init::{init, LogConfig, LogFormat, SamplingLayer, SamplingMode};
pub use logger::{logger_for, HostedLogger, Logger, Severity, StandardLogger};
