use crate::store::Store;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Log severity understood by every [`Logger`].
///
/// `Critical` sits above `Error`; sinks without a critical level fold it
/// into error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leveled logging capability injected into the pipeline.
///
/// Implement [`log`](Logger::log); the per-level methods forward to it and
/// can be overridden one by one.
pub trait Logger: Send + Sync {
    fn log(&self, store: &Store, severity: Severity, args: fmt::Arguments<'_>);

    fn critical(&self, store: &Store, args: fmt::Arguments<'_>) {
        self.log(store, Severity::Critical, args);
    }

    fn error(&self, store: &Store, args: fmt::Arguments<'_>) {
        self.log(store, Severity::Error, args);
    }

    fn warning(&self, store: &Store, args: fmt::Arguments<'_>) {
        self.log(store, Severity::Warning, args);
    }

    fn info(&self, store: &Store, args: fmt::Arguments<'_>) {
        self.log(store, Severity::Info, args);
    }

    fn debug(&self, store: &Store, args: fmt::Arguments<'_>) {
        self.log(store, Severity::Debug, args);
    }
}

impl<F> Logger for F
where
    F: Fn(&Store, Severity, fmt::Arguments<'_>) + Send + Sync,
{
    fn log(&self, store: &Store, severity: Severity, args: fmt::Arguments<'_>) {
        self(store, severity, args);
    }
}

/// Logger the pipeline registered on `store`, or [`StandardLogger`].
#[must_use]
pub fn logger_for(store: &Store) -> Arc<dyn Logger> {
    store
        .extension::<Arc<dyn Logger>>()
        .cloned()
        .unwrap_or_else(|| Arc::new(StandardLogger))
}

fn request_id(store: &Store) -> String {
    store
        .request()
        .map(|r| r.id().to_string())
        .unwrap_or_default()
}

/// Plain `tracing` events. Critical is logged at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLogger;

impl Logger for StandardLogger {
    fn log(&self, store: &Store, severity: Severity, args: fmt::Arguments<'_>) {
        let request_id = request_id(store);
        match severity {
            Severity::Critical | Severity::Error => error!(request_id = %request_id, "{}", args),
            Severity::Warning => warn!(request_id = %request_id, "{}", args),
            Severity::Info => info!(request_id = %request_id, "{}", args),
            Severity::Debug => debug!(request_id = %request_id, "{}", args),
        }
    }
}

/// Events for the hosted platform's log collector.
///
/// Every event goes to the `reqctx::hosted` target and carries the hosted
/// severity name plus the request namespace, so critical stays distinct
/// from error downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostedLogger;

pub(crate) const HOSTED_TARGET: &str = "reqctx::hosted";

impl Logger for HostedLogger {
    fn log(&self, store: &Store, severity: Severity, args: fmt::Arguments<'_>) {
        let request_id = request_id(store);
        let namespace = store.namespace().unwrap_or("");
        let sev = severity.as_str();
        match severity {
            Severity::Critical | Severity::Error => error!(
                target: HOSTED_TARGET,
                severity = sev,
                namespace,
                request_id = %request_id,
                "{}",
                args
            ),
            Severity::Warning => warn!(
                target: HOSTED_TARGET,
                severity = sev,
                namespace,
                request_id = %request_id,
                "{}",
                args
            ),
            Severity::Info => info!(
                target: HOSTED_TARGET,
                severity = sev,
                namespace,
                request_id = %request_id,
                "{}",
                args
            ),
            Severity::Debug => debug!(
                target: HOSTED_TARGET,
                severity = sev,
                namespace,
                request_id = %request_id,
                "{}",
                args
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        lines: Mutex<Vec<(Severity, String)>>,
    }

    impl Logger for Recording {
        fn log(&self, _store: &Store, severity: Severity, args: fmt::Arguments<'_>) {
            self.lines.lock().unwrap().push((severity, args.to_string()));
        }

        fn critical(&self, store: &Store, args: fmt::Arguments<'_>) {
            self.log(store, Severity::Error, format_args!("escalated: {args}"));
        }
    }

    #[test]
    fn test_level_methods_forward_to_log() {
        let rec = Recording::default();
        let store = Store::new();
        rec.info(&store, format_args!("hello {}", 1));
        rec.warning(&store, format_args!("careful"));
        let lines = rec.lines.lock().unwrap();
        assert_eq!(lines[0], (Severity::Info, "hello 1".to_string()));
        assert_eq!(lines[1].0, Severity::Warning);
    }

    #[test]
    fn test_level_method_override() {
        let rec = Recording::default();
        rec.critical(&Store::new(), format_args!("disk full"));
        let lines = rec.lines.lock().unwrap();
        assert_eq!(lines[0], (Severity::Error, "escalated: disk full".to_string()));
    }

    #[test]
    fn test_closure_logger() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        fn as_logger<F: Fn(&Store, Severity, fmt::Arguments<'_>) + Send + Sync>(f: F) -> F {
            f
        }
        let logger = as_logger(move |_, sev, args| {
            sink.lock().unwrap().push(format!("{sev}: {args}"));
        });
        logger.error(&Store::new(), format_args!("boom"));
        assert_eq!(seen.lock().unwrap()[0], "ERROR: boom");
    }

    #[test]
    fn test_builtin_loggers_do_not_panic_without_subscriber() {
        let store = Store::new();
        for sev in [
            Severity::Debug,
            Severity::Info,
            Severity::Warning,
            Severity::Error,
            Severity::Critical,
        ] {
            StandardLogger.log(&store, sev, format_args!("x"));
            HostedLogger.log(&store, sev, format_args!("x"));
        }
    }

    #[test]
    fn test_logger_for_store() {
        let seen = Arc::new(Recording::default());
        let registered: Arc<dyn Logger> = seen.clone();
        let store = Store::new().with_extension(registered);
        logger_for(&store).info(&store, format_args!("via store"));
        logger_for(&Store::new()).info(&store, format_args!("fallback"));
        assert_eq!(seen.lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critical > Severity::Error);
        assert_eq!(Severity::Warning.to_string(), "WARNING");
    }
}
