//! User-facing error channel for failures that happen outside a caller's request flow.

use std::error::Error;

use tracing::error;

/// Receives failures raised by background work such as lazy tree expansion.
pub trait ErrorReporter: Send + Sync {
    fn report_exception(&self, message: &str, cause: &(dyn Error + 'static));
}

/// Logs reported failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report_exception(&self, message: &str, cause: &(dyn Error + 'static)) {
        error!(error = %cause, "{message}");
    }
}
