//! Common utilities and helpers for Secret Manager clients
//!
//! Span and metric bookkeeping shared by every remote call.

use crate::observability::metrics;
use std::time::Instant;
use tracing::Span;

use crate::paths::SecretOperation;

/// Helper struct for tracking operation state
#[derive(Debug)]
pub struct OperationTracker {
    operation: SecretOperation,
    start: Instant,
    span: Span,
}

impl OperationTracker {
    pub fn new(operation: SecretOperation, span: Span) -> Self {
        Self {
            operation,
            start: Instant::now(),
            span,
        }
    }

    /// Records operation metrics and span attributes for a successful call
    pub fn record_success(&self) {
        let duration = self.start.elapsed();
        self.span
            .record("operation.duration_ms", duration.as_millis() as u64);
        self.span.record("operation.success", true);
        metrics::record_secret_operation(self.operation.as_str(), duration.as_secs_f64());
    }

    /// Records operation metrics and span attributes for a failed call
    pub fn record_error(&self, error_message: &str) {
        let duration = self.start.elapsed();
        self.span.record("operation.success", false);
        self.span.record("error.message", error_message);
        self.span
            .record("operation.duration_ms", duration.as_millis() as u64);
        metrics::record_secret_operation(self.operation.as_str(), duration.as_secs_f64());
        metrics::increment_operation_errors(self.operation.as_str());
    }
}
