use std::time::Instant;

use metrics::{Label, SharedString};

/// A timer that records elapsed seconds to a histogram.
///
/// ```rust
/// use telemetry::metrics::{GITLAB_REQUEST_DURATION, Recorder};
///
/// let mut recorder = Recorder::new(GITLAB_REQUEST_DURATION);
/// recorder.push_attribute("service", "users");
///
/// // perform the request
///
/// recorder.record();
/// ```
pub struct Recorder {
    start: Instant,
    name: &'static str,
    labels: Vec<Label>,
}

impl Recorder {
    /// Creates a new recorder for the specified histogram. Timing starts immediately.
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
            labels: Vec::new(),
        }
    }

    /// Adds a label to be recorded with the measurement.
    pub fn push_attribute<K, V>(&mut self, key: K, value: V)
    where
        K: Into<SharedString>,
        V: Into<SharedString>,
    {
        self.labels.push(Label::new(key, value));
    }

    /// Records the elapsed time to the histogram.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        metrics::histogram!(self.name, self.labels).record(duration);
    }
}

#[cfg(test)]
mod tests {
    use metrics_exporter_prometheus::PrometheusBuilder;

    use super::Recorder;

    #[test]
    fn records_labelled_histogram() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let mut timer = Recorder::new("test_duration_seconds");
            timer.push_attribute("service", "users");
            timer.record();
        });

        let rendered = handle.render();

        assert!(rendered.contains("test_duration_seconds"), "{rendered}");
        assert!(rendered.contains("service=\"users\""), "{rendered}");
    }
}
