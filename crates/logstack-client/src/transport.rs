// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP boundary between the dispatcher and the remote intake.
//!
//! The dispatcher only sees the [`Transport`] trait; retries, statistics,
//! and fallback stay in the engine while this layer does exactly one
//! request per call.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::debug;

use crate::config::Config;
use crate::entry::{IngestRequest, IngestResponse};
use crate::errors::{ConfigError, TransportError};
use crate::token::TokenFactory;

const INGEST_PATH: &str = "/v1/logs:ingest";
const HEALTH_PATH: &str = "/healthz";

/// One network send or probe. Implementations perform a single request per
/// call; the retry loop lives in the dispatcher.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs the envelope to the ingest endpoint. Err on any network
    /// failure or non-2xx status.
    async fn send_entries(&self, request: &IngestRequest) -> Result<(), TransportError>;

    /// GETs the health path and returns the raw status; the caller decides
    /// what counts as healthy.
    async fn probe(&self) -> Result<StatusCode, TransportError>;
}

/// Builds a reqwest client with optional HTTPS proxy configuration.
/// Timeouts are applied per request since sends and probes use different
/// budgets.
pub fn build_client(proxy_url: Option<&str>) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut builder = reqwest::Client::builder();
    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    Ok(builder.build()?)
}

/// reqwest-backed [`Transport`] for the LogStack intake.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    ingest_url: String,
    health_url: String,
    token: Arc<TokenFactory>,
    send_timeout: Duration,
    probe_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let client = build_client(config.https_proxy.as_deref())
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(HttpTransport {
            client,
            ingest_url: format!("{}{INGEST_PATH}", config.url),
            health_url: format!("{}{HEALTH_PATH}", config.url),
            token: Arc::clone(&config.token),
            send_timeout: config.send_timeout,
            probe_timeout: config.probe_timeout,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_entries(&self, request: &IngestRequest) -> Result<(), TransportError> {
        let body =
            serde_json::to_vec(request).map_err(|e| TransportError::Payload(e.to_string()))?;
        let token = self
            .token
            .get_token()
            .await
            .map_err(|e| TransportError::Auth(e.to_string()))?;

        let response = self
            .client
            .post(&self.ingest_url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.send_timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.send_timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        // The acknowledgement body is informational only.
        if let Ok(ack) = response.json::<IngestResponse>().await {
            debug!(
                "intake accepted {} entries (request {})",
                ack.entries_accepted, ack.request_id
            );
        }
        Ok(())
    }

    async fn probe(&self) -> Result<StatusCode, TransportError> {
        let token = self
            .token
            .get_token()
            .await
            .map_err(|e| TransportError::Auth(e.to_string()))?;
        let response = self
            .client
            .get(&self.health_url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.probe_timeout))?;
        Ok(response.status())
    }
}
