use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use config::{HealthConfig, HealthContentType};

/// Readiness flag shared between the webhook listener and the health endpoint.
#[derive(Clone, Debug, Default)]
pub struct Health {
    ready: Arc<AtomicBool>,
}

impl Health {
    pub fn restore(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn degrade(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct HealthState {
    health: Health,
    content_type: HealthContentType,
}

pub(crate) fn router(health: Health, config: &HealthConfig) -> Router {
    let state = HealthState {
        health,
        content_type: config.content_type,
    };

    Router::new().route(&config.path, get(health_check)).with_state(state)
}

async fn health_check(State(state): State<HealthState>) -> Response {
    let (content_type, ok, fail) = match state.content_type {
        HealthContentType::Text => ("text/plain; charset=utf-8", "OK", "FAIL"),
        HealthContentType::Html => (
            "text/html; charset=utf-8",
            r#"<h1 style="color: green">OK</h1>"#,
            r#"<h1 style="color: red">FAIL</h1>"#,
        ),
        HealthContentType::Json => ("application/json", r#"{"status": "OK"}"#, r#"{"status": "FAIL"}"#),
    };

    let (status, body) = if state.health.is_ready() {
        (StatusCode::OK, ok)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, fail)
    };

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
    ];

    (status, headers, body).into_response()
}
