//! Request identifier middleware
//!
//! Requests without an `X-Request-ID` header get one from a process wide counter. The id is
//! forwarded to GitLab and echoed in the response.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    task::{Context, Poll},
    time::{SystemTime, UNIX_EPOCH},
};

use axum::body::Body;
use gitlab::REQUEST_ID_HEADER;
use http::{HeaderValue, Request, Response};
use tower::Layer;

/// Amount the counter advances per generated id.
#[derive(Clone, Copy, Debug)]
enum Step {
    /// Seconds since the epoch.
    UnixTime,
    Linear(u64),
}

impl Step {
    fn next(self) -> u64 {
        match self {
            Step::UnixTime => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(1),
            Step::Linear(step) => step,
        }
    }
}

#[derive(Clone)]
pub struct RequestIdLayer {
    counter: Arc<AtomicU64>,
    step: Step,
}

impl RequestIdLayer {
    pub fn new() -> Self {
        Self::with_step(Step::UnixTime)
    }

    /// Generates multiples of `step`.
    #[cfg(test)]
    pub fn linear(step: u64) -> Self {
        Self::with_step(Step::Linear(step))
    }

    fn with_step(step: Step) -> Self {
        // primed, so the first id is never the bare step
        let counter = Arc::new(AtomicU64::new(step.next()));

        Self { counter, step }
    }
}

impl Default for RequestIdLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<Service> Layer<Service> for RequestIdLayer
where
    Service: Send + Clone,
{
    type Service = RequestIdService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        RequestIdService {
            next,
            counter: self.counter.clone(),
            step: self.step,
        }
    }
}

#[derive(Clone)]
pub struct RequestIdService<Service> {
    next: Service,
    counter: Arc<AtomicU64>,
    step: Step,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for RequestIdService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    ReqBody: Send + 'static,
{
    type Response = Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let request_id = match req.headers().get(REQUEST_ID_HEADER) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => {
                let step = self.step.next();
                let id = self.counter.fetch_add(step, Ordering::Relaxed).wrapping_add(step);
                let value = HeaderValue::from(id);

                req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
                value
            }
        };

        let mut next = self.next.clone();

        Box::pin(async move {
            let mut response = next.call(req).await?;
            response.headers_mut().insert(REQUEST_ID_HEADER, request_id);

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{HeaderMap, Request},
        routing::get,
    };
    use tower::ServiceExt;

    use super::RequestIdLayer;

    fn echo() -> Router {
        let handler = |headers: HeaderMap| async move {
            headers
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        Router::new().route("/", get(handler))
    }

    #[tokio::test]
    async fn generates_increasing_ids() {
        let step = u64::from(u32::MAX);
        let app = echo().layer(RequestIdLayer::linear(step));

        for i in 2..=11u64 {
            let response = app.clone().oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
            let echoed = response.headers()["x-request-id"].to_str().unwrap().to_string();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

            let want = (step * i).to_string();

            assert_eq!(body, want.as_bytes());
            assert_eq!(echoed, want);
        }
    }

    #[tokio::test]
    async fn keeps_existing_id() {
        let app = echo().layer(RequestIdLayer::linear(1));
        let request = Request::get("/").header("X-Request-ID", "abc-123").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "abc-123");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "abc-123".as_bytes());
    }
}
