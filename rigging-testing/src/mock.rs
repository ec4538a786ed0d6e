// Mock and spy capabilities

use parking_lot::Mutex;
use std::sync::Arc;

/// A type that can produce a mock of itself
///
/// Usually implemented for a trait object, returning a stub struct or a
/// `mockall` generated mock behind the trait.
pub trait Mockable: Send + Sync + 'static {
    /// Create a fresh mock
    fn mock() -> Arc<Self>;
}

/// A type that can wrap a real instance in a spy
///
/// The spy delegates to `instance` and typically records the calls it sees
/// in a [`CallLog`].
pub trait Spyable: Send + Sync + 'static {
    /// Wrap `instance` in a new spy
    fn spy(instance: Arc<Self>) -> Arc<Self>;
}

/// A single recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: String,
    pub args: Vec<String>,
}

/// Shared record of calls made on a mock or spy
///
/// Clones share the same log, so a test can keep one handle while the mock
/// records into another.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a method call
    pub fn record(&self, method: &str) {
        self.record_with(method, Vec::new());
    }

    /// Record a method call with arguments
    pub fn record_with(&self, method: &str, args: Vec<String>) {
        self.calls.lock().push(Call {
            method: method.to_string(),
            args,
        });
    }

    /// Get the number of calls
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Get the number of calls to a specific method
    pub fn method_call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    /// Check if a method was called
    pub fn was_called(&self, method: &str) -> bool {
        self.calls.lock().iter().any(|call| call.method == method)
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Clear all recorded calls
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Panic unless `method` was called exactly `times` times
    #[track_caller]
    pub fn verify(&self, method: &str, times: usize) {
        let actual = self.method_call_count(method);
        assert!(
            actual == times,
            "expected {method} to be called {times} time(s), but it was called {actual} time(s)"
        );
    }

    /// Panic if `method` was called
    #[track_caller]
    pub fn verify_never(&self, method: &str) {
        self.verify(method, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_log() {
        let log = CallLog::new();
        log.record("get");
        log.record_with("put", vec!["id".to_string()]);
        log.record("get");

        assert_eq!(log.call_count(), 3);
        assert_eq!(log.method_call_count("get"), 2);
        assert!(log.was_called("put"));
        assert!(!log.was_called("delete"));
        assert_eq!(log.calls()[1].args, vec!["id".to_string()]);

        log.verify("get", 2);
        log.verify_never("delete");
    }

    #[test]
    fn test_clones_share_the_log() {
        let log = CallLog::new();
        let handle = log.clone();
        log.record("ping");
        assert_eq!(handle.call_count(), 1);

        handle.clear();
        assert_eq!(log.call_count(), 0);
    }

    #[test]
    #[should_panic(expected = "expected ping to be called 2 time(s)")]
    fn test_verify_fails_on_wrong_count() {
        let log = CallLog::new();
        log.record("ping");
        log.verify("ping", 2);
    }
}
