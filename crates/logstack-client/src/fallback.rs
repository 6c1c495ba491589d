// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Last-resort local output for entries whose remote delivery is exhausted.

use std::io::Write;

use crate::entry::{Level, Metadata};

/// Best-effort local emission. Implementations must never fail: this path
/// runs only after remote delivery has already failed, so local IO errors
/// are absorbed silently.
pub trait FallbackSink: Send + Sync {
    /// Emits one diagnostic line naming the transport error.
    fn report_failure(&self, error: &str);

    /// Emits the failing entry itself.
    fn write(&self, level: Level, message: &str, metadata: &Metadata);
}

/// Writes to standard error, ignoring write failures.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl FallbackSink for ConsoleSink {
    fn report_failure(&self, error: &str) {
        let _ = writeln!(std::io::stderr(), "log delivery failed: {error}");
    }

    fn write(&self, level: Level, message: &str, metadata: &Metadata) {
        let mut stderr = std::io::stderr();
        if metadata.is_empty() {
            let _ = writeln!(stderr, "[{level}] {message}");
        } else {
            let meta = serde_json::to_string(metadata).unwrap_or_default();
            let _ = writeln!(stderr, "[{level}] {message} {meta}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_sink_absorbs_everything() {
        let sink = ConsoleSink;
        sink.report_failure("unexpected status 500 Internal Server Error");
        sink.write(Level::Error, "payment failed", &Metadata::new());

        let mut metadata = Metadata::new();
        metadata.insert("status".to_string(), serde_json::json!(500));
        sink.write(Level::Fatal, "", &metadata);
    }
}
