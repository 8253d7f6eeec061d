use std::{fs, path::Path};

use anyhow::Context;
use async_trait::async_trait;
use config::{GitlabConfig, GitlabTlsConfig};
use reqwest::{
    Certificate, Client, Identity, StatusCode,
    header::{HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use telemetry::metrics::{GITLAB_REQUEST_DURATION, Recorder};

use crate::{AccountService, GitlabError, GroupFilter, REQUEST_ID_HEADER, TOKEN_HEADER, model::{Account, Group}};

/// reqwest based [`AccountService`] talking to the GitLab REST API v4.
#[derive(Clone)]
pub struct GitlabClient {
    client: Client,
    api_url: String,
}

impl GitlabClient {
    pub fn new(config: &GitlabConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("gitlab-authn/", env!("CARGO_PKG_VERSION")));

        if let Some(ref tls) = config.tls {
            builder = apply_tls(builder, tls)?;
        }

        let client = builder.build().context("Failed to create the GitLab HTTP client")?;
        let api_url = format!("{}/api/v4", config.url.as_str().trim_end_matches('/'));

        log::debug!("GitLab API client targeting {api_url}");

        Ok(Self { client, api_url })
    }

    async fn get<T>(
        &self,
        service: &'static str,
        endpoint: &str,
        query: &[(&'static str, String)],
        token: &SecretString,
        request_id: Option<&str>,
    ) -> Result<T, GitlabError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{endpoint}", self.api_url);
        let headers = request_headers(token, request_id)?;

        let mut recorder = Recorder::new(GITLAB_REQUEST_DURATION);
        recorder.push_attribute("service", service);

        let result = self.client.get(&url).headers(headers).query(query).send().await;
        recorder.record();

        let response = result?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(GitlabError::Unauthorized);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            log::debug!("GitLab {service} API error ({status}): {message}");

            return Err(GitlabError::Status { status, message });
        }

        let body = response.bytes().await?;

        serde_json::from_slice(&body).map_err(|e| {
            log::error!("Failed to parse GitLab {service} response: {e}");
            GitlabError::Decode(e)
        })
    }
}

#[async_trait]
impl AccountService for GitlabClient {
    async fn current_account(&self, token: &SecretString, request_id: Option<&str>) -> Result<Account, GitlabError> {
        self.get("users", "user", &[], token, request_id).await
    }

    async fn list_groups(
        &self,
        token: &SecretString,
        filter: &GroupFilter,
        request_id: Option<&str>,
    ) -> Result<Vec<Group>, GitlabError> {
        self.get("groups", "groups", &filter.query(), token, request_id).await
    }
}

fn request_headers(token: &SecretString, request_id: Option<&str>) -> Result<HeaderMap, GitlabError> {
    let mut headers = HeaderMap::new();

    let mut value = HeaderValue::from_str(token.expose_secret()).map_err(|_| GitlabError::InvalidToken)?;
    value.set_sensitive(true);
    headers.insert(TOKEN_HEADER, value);

    if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    Ok(headers)
}

fn apply_tls(mut builder: reqwest::ClientBuilder, tls: &GitlabTlsConfig) -> anyhow::Result<reqwest::ClientBuilder> {
    if tls.skip_verify {
        log::warn!("TLS certificate verification of the GitLab API is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(ref path) = tls.ca_certificate {
        let pem = read_pem(path)?;

        for cert in Certificate::from_pem_bundle(&pem).context("Invalid GitLab CA certificate bundle")? {
            builder = builder.add_root_certificate(cert);
        }
    }

    if let Some((cert_path, key_path)) = tls.certificate.as_ref().zip(tls.key.as_ref()) {
        let mut pem = read_pem(cert_path)?;
        pem.push(b'\n');
        pem.extend(read_pem(key_path)?);

        let identity = Identity::from_pem(&pem).context("Invalid GitLab client certificate")?;
        builder = builder.identity(identity);
    }

    Ok(builder)
}

fn read_pem(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
