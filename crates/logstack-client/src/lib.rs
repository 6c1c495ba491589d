// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client library for shipping structured log entries to a LogStack
//! ingestion endpoint over HTTP.
//!
//! The [`dispatcher::Dispatcher`] accepts entries, ships them with bounded
//! retries and back-off, tracks cumulative delivery statistics, and falls
//! back to local console output when every attempt is exhausted. Delivery
//! failures are never surfaced to the submitting application.

#![deny(clippy::all)]

pub mod config;
pub mod dispatcher;
pub mod entry;
pub mod errors;
pub mod fallback;
pub mod stats;
pub mod token;
pub mod trace;
pub mod transport;

pub use config::{Config, Labels};
pub use dispatcher::Dispatcher;
pub use entry::{IngestRequest, IngestResponse, Level, LogEntry, Metadata};
pub use errors::{ConfigError, TransportError};
pub use stats::Stats;
pub use token::TokenFactory;
