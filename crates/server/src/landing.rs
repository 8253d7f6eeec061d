//! Static landing page.
//!
//! `index.html` from the web directory is rendered once at startup. The placeholders
//! `{{ name }}`, `{{ version }}`, `{{ gitlab_url }}` and `{{ start_time }}` are replaced with
//! HTML escaped values. Every other file is served as is.

use std::path::Path;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, header},
    response::IntoResponse,
    routing::get,
};
use jiff::{Timestamp, tz::TimeZone};
use tower_http::services::ServeDir;
use url::Url;

const INDEX: &str = "index.html";

/// Values available to the landing page.
pub(crate) struct LandingPage<'a> {
    pub gitlab_url: &'a Url,
    pub start_time: Timestamp,
}

impl LandingPage<'_> {
    /// Renders `<directory>/index.html` and serves the remaining files of the directory as fallback.
    pub async fn router(&self, directory: &Path) -> anyhow::Result<Router> {
        let index = directory.join(INDEX);

        let template = tokio::fs::read_to_string(&index)
            .await
            .with_context(|| format!("Failed to read landing page {}", index.display()))?;

        let page = self.render(&template);
        let last_modified = HeaderValue::from_str(&http_date(self.start_time))?;

        log::debug!("Serving static files from {}", directory.display());

        let index = move || {
            let page = page.clone();
            let last_modified = last_modified.clone();

            async move {
                let headers = [
                    (header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8")),
                    (header::LAST_MODIFIED, last_modified),
                ];

                (headers, page).into_response()
            }
        };

        Ok(Router::new()
            .route("/", get(index.clone()))
            .route(&format!("/{INDEX}"), get(index))
            .fallback_service(ServeDir::new(directory)))
    }

    fn render(&self, template: &str) -> String {
        let values = [
            ("name", "gitlab-authn".to_string()),
            ("version", env!("CARGO_PKG_VERSION").to_string()),
            ("gitlab_url", self.gitlab_url.to_string()),
            ("start_time", self.start_time.to_string()),
        ];

        values.iter().fold(template.to_string(), |page, (key, value)| {
            page.replace(&format!("{{{{ {key} }}}}"), &escape_html(value))
        })
    }
}

fn http_date(timestamp: Timestamp) -> String {
    timestamp
        .to_zoned(TimeZone::UTC)
        .strftime("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use indoc::indoc;
    use jiff::Timestamp;
    use tower::ServiceExt;
    use url::Url;

    use super::LandingPage;

    fn web_directory() -> tempfile::TempDir {
        let directory = tempfile::tempdir().unwrap();

        let index = indoc! {r#"
            <h1>{{ name }}</h1>
            <a href="{{ gitlab_url }}-/user_settings/personal_access_tokens">Create a token</a>
            <footer>{{ start_time }}</footer>
        "#};

        std::fs::write(directory.path().join("index.html"), index).unwrap();
        std::fs::write(directory.path().join("style.css"), "h1 { color: #fc6d26; }").unwrap();

        directory
    }

    async fn router(directory: &std::path::Path) -> axum::Router {
        let gitlab_url: Url = "https://gitlab.example.com/".parse().unwrap();

        let page = LandingPage {
            gitlab_url: &gitlab_url,
            start_time: "2026-01-02T03:04:05Z".parse::<Timestamp>().unwrap(),
        };

        page.router(directory).await.unwrap()
    }

    async fn get(router: axum::Router, path: &str) -> (StatusCode, Option<String>, String) {
        let response = router.oneshot(Request::get(path).body(Body::empty()).unwrap()).await.unwrap();

        let status = response.status();
        let last_modified = response
            .headers()
            .get("last-modified")
            .map(|v| v.to_str().unwrap().to_string());

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, last_modified, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn index_is_rendered() {
        let directory = web_directory();
        let (status, last_modified, body) = get(router(directory.path()).await, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(last_modified.as_deref(), Some("Fri, 02 Jan 2026 03:04:05 GMT"));

        insta::assert_snapshot!(body, @r#"
        <h1>gitlab-authn</h1>
        <a href="https://gitlab.example.com/-/user_settings/personal_access_tokens">Create a token</a>
        <footer>2026-01-02T03:04:05Z</footer>
        "#);
    }

    #[tokio::test]
    async fn index_path_serves_the_rendered_page() {
        let directory = web_directory();

        let (_, _, root) = get(router(directory.path()).await, "/").await;
        let (status, _, index) = get(router(directory.path()).await, "/index.html").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(root, index);
    }

    #[tokio::test]
    async fn other_files_are_served_unchanged() {
        let directory = web_directory();
        let (status, _, body) = get(router(directory.path()).await, "/style.css").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "h1 { color: #fc6d26; }");

        let (status, _, _) = get(router(directory.path()).await, "/missing.png").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn values_are_escaped() {
        let escaped = super::escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#);

        insta::assert_snapshot!(escaped, @"&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
    }

    #[tokio::test]
    async fn missing_index_fails() {
        let directory = tempfile::tempdir().unwrap();
        let gitlab_url: Url = "https://gitlab.com/".parse().unwrap();

        let page = LandingPage {
            gitlab_url: &gitlab_url,
            start_time: Timestamp::now(),
        };

        let error = page.router(directory.path()).await.unwrap_err().to_string();

        assert!(error.starts_with("Failed to read landing page"), "{error}");
    }
}
