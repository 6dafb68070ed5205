//! Injected diagnostic logging

/// Receives diagnostic messages from the connector and its dialers.
///
/// Implementations may be called from many tasks at once. Any closure
/// `Fn(&str) + Send + Sync` is a hook.
pub trait DiagnosticHook: Send + Sync {
    /// Record one diagnostic message
    fn log(&self, message: &str);
}

impl<F> DiagnosticHook for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

/// Hook that forwards every message to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;

impl DiagnosticHook for TracingHook {
    fn log(&self, message: &str) {
        tracing::debug!(target: "pgtwixt::dial", "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_is_hook() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hook: Arc<dyn DiagnosticHook> =
            Arc::new(move |msg: &str| sink.lock().unwrap().push(msg.to_string()));

        hook.log("connecting");
        hook.log("connected");

        assert_eq!(*seen.lock().unwrap(), vec!["connecting", "connected"]);
    }

    #[test]
    fn test_tracing_hook_does_not_panic_without_subscriber() {
        TracingHook.log("no subscriber installed");
    }
}
