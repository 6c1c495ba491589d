// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Dispatcher configuration.
//!
//! Built once at startup, either directly via [`Config::new`] or from the
//! environment via [`Config::from_env`], and never mutated afterwards.

use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::token::TokenFactory;

const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(30_000);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(5_000);
const DEFAULT_MAX_RETRIES: u32 = 3;

const ENV_URL: &str = "LOGSTACK_URL";
const ENV_TOKEN: &str = "LOGSTACK_TOKEN";
const ENV_SERVICE: &str = "LOGSTACK_SERVICE";
const ENV_ENVIRONMENT: &str = "LOGSTACK_ENV";
const ENV_ASYNC: &str = "LOGSTACK_ASYNC";
const ENV_LABELS: &str = "LOGSTACK_LABELS";
const ENV_SEND_TIMEOUT_MS: &str = "LOGSTACK_TIMEOUT_MS";
const ENV_PROBE_TIMEOUT_MS: &str = "LOGSTACK_PROBE_TIMEOUT_MS";
const ENV_RETRY_ATTEMPTS: &str = "LOGSTACK_RETRY_ATTEMPTS";
const ENV_RETRY_DELAYS_MS: &str = "LOGSTACK_RETRY_DELAYS_MS";
const ENV_FALLBACK: &str = "LOGSTACK_FALLBACK";
const ENV_PROXY_HTTPS: &str = "LOGSTACK_PROXY_HTTPS";

fn default_retry_delays() -> Vec<Duration> {
    vec![
        Duration::from_millis(1_000),
        Duration::from_millis(2_000),
        Duration::from_millis(4_000),
    ]
}

/// Default labels attached to every entry (the caller's labels win on
/// key collisions).
#[derive(Debug, Clone, Default)]
pub struct Labels {
    labels: BTreeMap<String, String>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `key:value` pairs from an environment string. Space-separated
    /// pairs are the standard; comma-separated pairs are accepted for
    /// compatibility. Malformed pairs are dropped.
    pub fn from_env_string(env_labels: &str) -> Self {
        let mut labels = BTreeMap::new();

        let normalized = env_labels.replace(',', " ");
        for kv in normalized.split_whitespace() {
            let parts = kv.split(':').collect::<Vec<&str>>();
            if parts.len() == 2 {
                labels.insert(parts[0].to_string(), parts[1].to_string());
            }
        }
        Self { labels }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.labels.insert(key.into(), value.into());
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Process-wide dispatcher configuration, immutable after construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ingest endpoint, without a trailing slash.
    pub url: String,
    pub token: Arc<TokenFactory>,
    pub service_name: String,
    pub environment: String,
    /// When true (default), `submit` detaches the send and returns
    /// immediately; when false the full retry sequence runs inline.
    pub async_mode: bool,
    pub default_labels: Labels,
    /// Mirror terminally failed entries to the local console.
    pub fallback_to_console: bool,
    /// Per-attempt timeout for ingest requests.
    pub send_timeout: Duration,
    /// Timeout for the health probe, independent of the send timeout.
    pub probe_timeout: Duration,
    /// Number of retries after the initial attempt; 3 means up to 4 sends.
    pub max_retries: u32,
    /// Back-off before retry N is `retry_delays[N]`; the final value is
    /// reused when the schedule is shorter than the attempt count. An empty
    /// schedule retries immediately.
    pub retry_delays: Vec<Duration>,
    pub https_proxy: Option<String>,
}

impl Config {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        service_name: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        let url: String = url.into();
        Config {
            url: url.trim_end_matches('/').to_string(),
            token: Arc::new(TokenFactory::fixed(token)),
            service_name: service_name.into(),
            environment: environment.into(),
            async_mode: true,
            default_labels: Labels::new(),
            fallback_to_console: true,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delays: default_retry_delays(),
            https_proxy: None,
        }
    }

    /// Builds a configuration from `LOGSTACK_*` environment variables.
    /// `LOGSTACK_URL` and `LOGSTACK_TOKEN` are required; everything else
    /// falls back to the defaults of [`Config::new`].
    pub fn from_env() -> Result<Config, ConfigError> {
        let url = env::var(ENV_URL).map_err(|_| ConfigError::MissingVar(ENV_URL))?;
        let token = env::var(ENV_TOKEN).map_err(|_| ConfigError::MissingVar(ENV_TOKEN))?;
        let service_name = env::var(ENV_SERVICE).unwrap_or_else(|_| "unknown".to_string());
        let environment = env::var(ENV_ENVIRONMENT).unwrap_or_else(|_| "production".to_string());

        let mut config = Config::new(url, token, service_name, environment);

        if let Ok(val) = env::var(ENV_ASYNC) {
            config.async_mode = parse_bool(ENV_ASYNC, &val)?;
        }
        if let Ok(val) = env::var(ENV_FALLBACK) {
            config.fallback_to_console = parse_bool(ENV_FALLBACK, &val)?;
        }
        if let Ok(val) = env::var(ENV_LABELS) {
            config.default_labels = Labels::from_env_string(&val);
        }
        if let Ok(val) = env::var(ENV_SEND_TIMEOUT_MS) {
            config.send_timeout = Duration::from_millis(parse_u64(ENV_SEND_TIMEOUT_MS, &val)?);
        }
        if let Ok(val) = env::var(ENV_PROBE_TIMEOUT_MS) {
            config.probe_timeout = Duration::from_millis(parse_u64(ENV_PROBE_TIMEOUT_MS, &val)?);
        }
        if let Ok(val) = env::var(ENV_RETRY_ATTEMPTS) {
            config.max_retries = parse_u32(ENV_RETRY_ATTEMPTS, &val)?;
        }
        if let Ok(val) = env::var(ENV_RETRY_DELAYS_MS) {
            config.retry_delays = parse_delays(ENV_RETRY_DELAYS_MS, &val)?;
        }
        config.https_proxy = env::var(ENV_PROXY_HTTPS)
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();

        Ok(config)
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            var,
            value: value.to_string(),
        }),
    }
}

fn parse_u64(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidVar {
        var,
        value: value.to_string(),
    })
}

fn parse_u32(var: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidVar {
        var,
        value: value.to_string(),
    })
}

fn parse_delays(var: &'static str, value: &str) -> Result<Vec<Duration>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_u64(var, s).map(Duration::from_millis))
        .collect()
}
