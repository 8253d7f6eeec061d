//! Telemetry library for gitlab-authn
//!
//! Provides the process-wide Prometheus recorder behind the `metrics` facade.

pub mod metrics;

pub use metrics_exporter_prometheus::PrometheusHandle;

/// Installs the Prometheus recorder as the global `metrics` recorder.
///
/// The recorder is installed once per process. Later calls return a handle to the same
/// registry, so every server started in the process renders the same metrics.
pub fn init() -> anyhow::Result<PrometheusHandle> {
    metrics::init_metrics()
}
