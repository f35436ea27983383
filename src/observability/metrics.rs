//! # Metrics
//!
//! Prometheus metrics for Secret Manager calls.
//!
//! ## Metrics Exposed
//!
//! - `secret_manager_client_operations_total` - Remote calls by operation
//! - `secret_manager_client_operation_duration_seconds` - Duration of remote calls
//! - `secret_manager_client_operation_errors_total` - Failed remote calls by operation

use prometheus::{Encoder, HistogramVec, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

use crate::error::{Result, SecretManagerError};

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_manager_client_operations_total",
            "Total number of Secret Manager operations by operation type",
        ),
        &["operation"],
    )
    .expect("Failed to create OPERATIONS_TOTAL metric - this should never happen")
});

static OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "secret_manager_client_operation_duration_seconds",
            "Duration of Secret Manager operations in seconds by operation type",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["operation"],
    )
    .expect("Failed to create OPERATION_DURATION metric - this should never happen")
});

static OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_manager_client_operation_errors_total",
            "Total number of failed Secret Manager operations by operation type",
        ),
        &["operation"],
    )
    .expect("Failed to create OPERATION_ERRORS_TOTAL metric - this should never happen")
});

/// Register all collectors with the crate registry; safe to call more than once
pub fn register_metrics() -> Result<()> {
    for collector in [
        Box::new(OPERATIONS_TOTAL.clone()) as Box<dyn prometheus::core::Collector>,
        Box::new(OPERATION_DURATION.clone()),
        Box::new(OPERATION_ERRORS_TOTAL.clone()),
    ] {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => {
                return Err(SecretManagerError::Config(format!(
                    "failed to register metrics: {e}"
                )))
            }
        }
    }
    Ok(())
}

/// Render registered metrics in the Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| SecretManagerError::Config(format!("failed to encode metrics: {e}")))?;
    String::from_utf8(buffer)
        .map_err(|e| SecretManagerError::Config(format!("metrics are not UTF-8: {e}")))
}

pub fn record_secret_operation(operation: &str, duration: f64) {
    OPERATIONS_TOTAL.with_label_values(&[operation]).inc();
    OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_operation_errors(operation: &str) {
    OPERATION_ERRORS_TOTAL.with_label_values(&[operation]).inc();
}

/// Current value of the operations counter for `operation`
pub fn operation_count(operation: &str) -> u64 {
    OPERATIONS_TOTAL.with_label_values(&[operation]).get()
}

/// Current value of the errors counter for `operation`
pub fn operation_error_count(operation: &str) -> u64 {
    OPERATION_ERRORS_TOTAL.with_label_values(&[operation]).get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_twice() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_record_secret_operation() {
        let before = operation_count("metrics_test_op");
        record_secret_operation("metrics_test_op", 0.25);
        assert_eq!(operation_count("metrics_test_op"), before + 1);
    }

    #[test]
    fn test_increment_operation_errors() {
        let before = operation_error_count("metrics_test_err");
        increment_operation_errors("metrics_test_err");
        assert_eq!(operation_error_count("metrics_test_err"), before + 1);
    }

    #[test]
    fn test_gather_contains_registered_metrics() {
        register_metrics().unwrap();
        record_secret_operation("metrics_gather_op", 0.1);
        let text = gather_metrics().unwrap();
        assert!(text.contains("secret_manager_client_operations_total"));
        assert!(text.contains("metrics_gather_op"));
    }
}
