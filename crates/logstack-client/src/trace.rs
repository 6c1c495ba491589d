// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Optional ambient trace-context capability.
//!
//! Applications that run under a tracer can inject a provider so shipped
//! entries carry the active trace and span ids; without one the dispatcher
//! falls back to [`NoopTraceProvider`] and entries go out untraced.

/// Identifiers of the active span, harvested at enrichment time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: String,
    pub span_id: String,
}

pub trait TraceContextProvider: Send + Sync {
    /// Returns the active span context, or None when no trace is active.
    /// Must not fail; providers wrap their tracer lookups defensively.
    fn current(&self) -> Option<SpanContext>;
}

/// Provider used when no tracer is wired in.
#[derive(Debug, Default)]
pub struct NoopTraceProvider;

impl TraceContextProvider for NoopTraceProvider {
    fn current(&self) -> Option<SpanContext> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_provider_yields_nothing() {
        assert_eq!(NoopTraceProvider.current(), None);
    }
}
