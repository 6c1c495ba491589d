// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The dispatch engine: decides sync vs. detached delivery, runs the retry
//! loop with back-off, keeps the statistics current, and mirrors
//! terminally failed entries to the fallback sink.
//!
//! No error from this path ever reaches the submitting caller; a logging
//! failure must never crash the instrumented application.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::sleep;
use tracing::{debug, error};

use crate::config::Config;
use crate::entry::{IngestRequest, LogEntry};
use crate::errors::{ConfigError, TransportError};
use crate::fallback::{ConsoleSink, FallbackSink};
use crate::stats::{Stats, StatsTracker};
use crate::trace::{NoopTraceProvider, TraceContextProvider};
use crate::transport::{HttpTransport, Transport};

/// Cheaply cloneable handle over the shared engine state. Clones share the
/// same statistics and configuration.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    stats: Arc<StatsTracker>,
    fallback: Arc<dyn FallbackSink>,
    trace_provider: Arc<dyn TraceContextProvider>,
}

impl Dispatcher {
    /// Builds a dispatcher with the reqwest transport, console fallback,
    /// and no trace provider.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_parts(
            config,
            transport,
            Arc::new(ConsoleSink),
            Arc::new(NoopTraceProvider),
        ))
    }

    /// Builds a dispatcher from explicit collaborators. This is the seam
    /// used by tests and by applications that bring their own transport,
    /// sink, or tracer.
    pub fn with_parts(
        config: Config,
        transport: Arc<dyn Transport>,
        fallback: Arc<dyn FallbackSink>,
        trace_provider: Arc<dyn TraceContextProvider>,
    ) -> Self {
        Dispatcher {
            config: Arc::new(config),
            transport,
            stats: Arc::new(StatsTracker::new()),
            fallback,
            trace_provider,
        }
    }

    /// Accepts one entry for delivery.
    ///
    /// In async mode (the default) the send-and-retry sequence is detached
    /// onto the runtime and this returns immediately; any failure is
    /// visible only through [`Dispatcher::stats`] and the fallback sink.
    /// In sync mode the full retry sequence runs inline, but terminal
    /// failures are still absorbed rather than returned.
    pub async fn submit(&self, entry: LogEntry) {
        let entry = self.enrich(entry);
        self.stats.record_submit();

        if self.config.async_mode {
            let this = self.clone();
            tokio::spawn(async move { this.pipeline(entry).await });
        } else {
            self.pipeline(entry).await;
        }
    }

    /// Issues a single bearer-authenticated GET against the health path.
    /// True iff the remote answered 200; every transport error is false,
    /// never an error.
    pub async fn probe(&self) -> bool {
        match self.transport.probe().await {
            Ok(status) => status == StatusCode::OK,
            Err(err) => {
                debug!("health probe failed: {err}");
                false
            }
        }
    }

    /// Snapshot of the delivery counters.
    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    /// Resolves once every detached submission has been terminally handled.
    pub async fn settled(&self) {
        self.stats.settled().await;
    }

    /// Copy-on-enrich: fills service/env from the configuration when the
    /// caller left them empty, layers caller labels over the defaults, and
    /// harvests trace ids from the ambient provider when absent.
    fn enrich(&self, mut entry: LogEntry) -> LogEntry {
        if entry.service.is_empty() {
            entry.service = self.config.service_name.clone();
        }
        if entry.env.is_empty() {
            entry.env = self.config.environment.clone();
        }
        if !self.config.default_labels.is_empty() {
            let mut labels = self.config.default_labels.as_map().clone();
            labels.append(&mut entry.labels);
            entry.labels = labels;
        }
        if entry.trace_id.is_none() {
            if let Some(ctx) = self.trace_provider.current() {
                entry.trace_id = Some(ctx.trace_id);
                entry.span_id.get_or_insert(ctx.span_id);
            }
        }
        entry
    }

    async fn pipeline(&self, entry: LogEntry) {
        let request = IngestRequest::single(entry);
        match self.try_send(&request).await {
            Ok(()) => self.stats.record_success(),
            Err(err) => {
                let message = err.to_string();
                error!(
                    "log delivery failed (attempts: {}): {message}",
                    self.config.max_retries + 1
                );
                self.stats.record_failure(&message);
                if self.config.fallback_to_console {
                    let entry = &request.entries[0];
                    self.fallback.report_failure(&message);
                    self.fallback
                        .write(entry.level, &entry.message, &entry.metadata);
                }
            }
        }
        self.stats.end_flight();
    }

    /// Attempts `max_retries + 1` sends, sleeping the scheduled back-off
    /// between attempts. Returns the last attempt's error on exhaustion.
    async fn try_send(&self, request: &IngestRequest) -> Result<(), TransportError> {
        let max_retries = self.config.max_retries as usize;
        let mut attempt = 0;

        loop {
            match self.transport.send_entries(request).await {
                Ok(()) => {
                    debug!("entry delivered on attempt {}", attempt + 1);
                    return Ok(());
                }
                Err(err) => {
                    if attempt >= max_retries {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt);
                    debug!(
                        "ingest attempt {} failed ({err}), retrying in {delay:?}",
                        attempt + 1
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Back-off before retry `attempt`; the final configured delay is
    /// reused past the end of the schedule, and an empty schedule retries
    /// immediately.
    fn delay_for(&self, attempt: usize) -> Duration {
        let delays = &self.config.retry_delays;
        delays
            .get(attempt)
            .or_else(|| delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}
