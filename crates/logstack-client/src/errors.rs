// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use core::time::Duration;

use reqwest::StatusCode;

/// Errors raised by the transport during an ingest attempt or health probe.
///
/// Every variant is retryable from the dispatcher's point of view; the
/// distinction exists so the fallback diagnostic names what actually failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to encode payload: {0}")]
    Payload(String),

    #[error("authentication unavailable: {0}")]
    Auth(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {0}")]
    Status(StatusCode),
}

impl TransportError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Errors raised while building a [`crate::config::Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("failed to resolve token: {0}")]
    TokenResolution(String),
}
