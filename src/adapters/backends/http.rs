//! HTTP agent backend.
//!
//! POSTs the invocation payload (descriptor + resolved arguments + any
//! validation feedback) to a remote agent service and expects the task's
//! JSON result back. Transport-level failures and 5xx/429 responses are
//! transient; other non-success statuses are permanent for that invocation.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::HttpBackendConfig;
use crate::domain::ports::backend::{AgentBackend, InvocationRequest};

/// Backend that delegates invocations to a remote agent service.
pub struct HttpBackend {
    config: HttpBackendConfig,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> DomainResult<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = &config.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| DomainError::AgentInvocation {
                    backend: "http".to_string(),
                    reason: format!("invalid token header: {err}"),
                    transient: false,
                })?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| DomainError::AgentInvocation {
                backend: "http".to_string(),
                reason: format!("failed to build client: {err}"),
                transient: false,
            })?;

        Ok(Self { config, client })
    }

    fn invocation_error(&self, reason: impl Into<String>, transient: bool) -> DomainError {
        DomainError::AgentInvocation {
            backend: "http".to_string(),
            reason: reason.into(),
            transient,
        }
    }

    fn status_is_transient(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }
}

#[async_trait]
impl AgentBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn is_available(&self) -> DomainResult<bool> {
        Ok(self
            .client
            .head(&self.config.endpoint)
            .send()
            .await
            .is_ok())
    }

    async fn invoke(&self, request: &InvocationRequest) -> DomainResult<Value> {
        debug!(
            endpoint = %self.config.endpoint,
            agent = %request.descriptor.agent.name,
            task = %request.descriptor.name,
            attempt = request.attempt,
            "posting invocation"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| self.invocation_error(format!("request failed: {err}"), true))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.invocation_error(
                format!("service returned {status}: {}", body.trim()),
                Self::status_is_transient(status),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| self.invocation_error(format!("malformed JSON response: {err}"), false))
    }
}
