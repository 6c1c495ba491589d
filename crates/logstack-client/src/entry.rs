// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire types for the LogStack ingest API.
//!
//! A [`LogEntry`] is one observability event. Entries are immutable once
//! handed to the dispatcher; enrichment happens on a copy before the send.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Metadata = serde_json::Map<String, Value>;

/// Severity of a log entry, serialized in its uppercase wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        };
        write!(f, "{s}")
    }
}

/// One observability event.
///
/// `service` and `env` may be left empty by the caller; the dispatcher fills
/// them from its configuration before sending. Empty messages are permitted
/// and forwarded as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-8601 timestamp, stamped at construction.
    pub timestamp: String,
    pub level: Level,
    pub message: String,
    pub service: String,
    pub env: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl LogEntry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            message: message.into(),
            service: String::new(),
            env: String::new(),
            labels: BTreeMap::new(),
            trace_id: None,
            span_id: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_trace(mut self, trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self.span_id = Some(span_id.into());
        self
    }
}

/// Envelope posted to `/v1/logs:ingest`. The dispatcher always wraps exactly
/// one entry per submission; there is no cross-call batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub entries: Vec<LogEntry>,
}

impl IngestRequest {
    pub fn single(entry: LogEntry) -> Self {
        IngestRequest {
            entries: vec![entry],
        }
    }
}

/// Acknowledgement body returned by the intake. Parsed leniently; a body
/// that does not match is ignored rather than treated as a failure.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    pub entries_accepted: u64,
    pub request_id: String,
    pub timestamp: String,
}
