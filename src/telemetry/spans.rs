//! Span utilities and extension traits for reconciler tracing.

use tracing::Span;

/// Extension trait for adding context to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for creating standardized reconcile spans.
pub struct ReconcileSpan;

#[allow(clippy::new_ret_no_self)]
impl ReconcileSpan {
    /// Create a new reconcile span with standard fields.
    ///
    /// Fields included:
    /// - `object`: `namespace/name` of the object being reconciled
    /// - `controller`: which controller owns this reconcile
    /// - `status`: filled in by `SpanExt::record_result`
    /// - `error.message`: filled in on error
    pub fn new(object: &str, controller: &str) -> Span {
        tracing::info_span!(
            "reconcile",
            object = %object,
            controller = %controller,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}
