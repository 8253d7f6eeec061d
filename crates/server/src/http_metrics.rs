//! Records `http_server_request_duration_seconds` for every request a listener answers.

use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{body::Body, extract::MatchedPath};
use http::{Request, Response};
use telemetry::metrics::{HTTP_SERVER_REQUEST_DURATION, Recorder};
use tower::Layer;

/// Route label of requests no route matched. Requests for arbitrary URLs share a single series.
const UNMATCHED_ROUTE: &str = "unmatched";

#[derive(Clone, Default)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer
where
    S: Send + Clone,
{
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S, B> tower::Service<Request<B>> for MetricsService<S>
where
    S: tower::Service<Request<B>, Response = Response<Body>> + Send + Clone + 'static,
    S::Future: Send,
    S::Error: Display + 'static,
    B: http_body::Body + Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let mut recorder = Recorder::new(HTTP_SERVER_REQUEST_DURATION);
        recorder.push_attribute("method", request.method().as_str().to_owned());
        recorder.push_attribute("route", route(&request));

        // the clone may not be ready, so the polled service handles this request
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let result = inner.call(request).await;

            let status = match result {
                Ok(ref response) => response.status().as_str().to_owned(),
                Err(ref e) => {
                    log::debug!("Request failed before producing a response: {e}");
                    "500".to_owned()
                }
            };

            recorder.push_attribute("status", status);
            recorder.record();

            result
        })
    }
}

fn route<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned())
}
