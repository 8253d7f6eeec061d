//! Metrics initialization and management

mod names;
mod recorder;

pub use names::*;
pub use recorder::Recorder;

use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Buckets for every `*_duration_seconds` histogram.
const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

pub(crate) fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let mut installed = HANDLE.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(handle) = installed.as_ref() {
        return Ok(handle.clone());
    }

    let recorder = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Suffix("duration_seconds".to_string()), DURATION_BUCKETS)
        .context("Failed to configure histogram buckets")?
        .build_recorder();

    let handle = recorder.handle();

    ::metrics::set_global_recorder(recorder).context("Failed to install the Prometheus recorder")?;
    describe();

    log::debug!("Prometheus metrics recorder installed");

    *installed = Some(handle.clone());

    Ok(handle)
}

fn describe() {
    ::metrics::describe_histogram!(
        HTTP_SERVER_REQUEST_DURATION,
        ::metrics::Unit::Seconds,
        "Duration of HTTP requests served by gitlab-authn"
    );
    ::metrics::describe_histogram!(
        GITLAB_REQUEST_DURATION,
        ::metrics::Unit::Seconds,
        "Duration of requests against the GitLab API"
    );
    ::metrics::describe_counter!(AUTHENTICATION_ATTEMPTS, "Number of token reviews per realm");
    ::metrics::describe_counter!(AUTHENTICATION_FAILURES, "Number of failed token reviews per realm and cause");
    ::metrics::describe_counter!(CACHE_INSERTIONS, "Number of review results stored in the cache");
    ::metrics::describe_counter!(CACHE_HITS, "Number of cache lookups served from the cache");
    ::metrics::describe_counter!(CACHE_MISSES, "Number of cache lookups without a live entry");
    ::metrics::describe_counter!(CACHE_EVICTIONS, "Number of expired cache entries removed");
}
