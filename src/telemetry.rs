//! Fire-and-forget observability sink.

/// Records dashboard events for observability.
///
/// Implementations must be cheap and must not fail; the service calls
/// `record` on hot paths and never inspects an outcome.
pub trait Telemetry: Send + Sync {
    /// Records one named event with a JSON payload.
    fn record(&self, event: &str, payload: serde_json::Value);
}

/// Telemetry sink that discards everything. The default when unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn record(&self, _event: &str, _payload: serde_json::Value) {}
}

/// Telemetry sink that forwards events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn record(&self, event: &str, payload: serde_json::Value) {
        tracing::debug!(target: "dashboard_orchestrator::telemetry", %event, %payload);
    }
}
