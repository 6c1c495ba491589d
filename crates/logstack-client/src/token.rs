// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Bearer-token resolution for the ingest endpoint.
//!
//! The token is either fixed at configuration time or produced by a
//! fallible asynchronous resolver (secret manager, metadata service). A
//! successful resolution is cached for the lifetime of the process; a
//! failed one is not, so the next send or probe retries the resolver.
//! Resolution failures surface as transport errors on the send path and
//! therefore go through the same retry/fallback handling as any network
//! failure — they never reach the submitting caller.

use std::fmt::Debug;
use std::sync::Arc;
use std::{future::Future, pin::Pin};

use tokio::sync::OnceCell;

use crate::errors::ConfigError;

type ResolverFuture = Pin<Box<dyn Future<Output = Result<String, ConfigError>> + Send>>;

pub type TokenResolver = Arc<dyn Fn() -> ResolverFuture + Send + Sync>;

#[derive(Clone)]
pub enum TokenFactory {
    /// Token supplied up front.
    Fixed(String),
    /// Token produced on first use by an async resolver.
    Deferred {
        resolver: TokenResolver,
        cached: Arc<OnceCell<String>>,
    },
}

impl TokenFactory {
    pub fn fixed(token: impl Into<String>) -> Self {
        Self::Fixed(token.into())
    }

    pub fn deferred(resolver: TokenResolver) -> Self {
        Self::Deferred {
            resolver,
            cached: Arc::new(OnceCell::new()),
        }
    }

    /// Returns the bearer token, running the resolver if no resolution has
    /// succeeded yet. Only a successful result is cached.
    pub async fn get_token(&self) -> Result<&str, ConfigError> {
        match self {
            Self::Fixed(token) => Ok(token),
            Self::Deferred { resolver, cached } => cached
                .get_or_try_init(|| (resolver)())
                .await
                .map(String::as_str),
        }
    }
}

// The token is a credential; never echo it through Debug output.
impl Debug for TokenFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(_) => f.write_str("TokenFactory::Fixed(<redacted>)"),
            Self::Deferred { cached, .. } => {
                write!(f, "TokenFactory::Deferred(resolved: {})", cached.initialized())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::TokenFactory;
    use crate::errors::ConfigError;

    #[tokio::test]
    async fn fixed_token_is_returned_as_is() {
        let factory = TokenFactory::fixed("s3cret");
        assert_eq!(factory.get_token().await.unwrap(), "s3cret");
    }

    #[tokio::test]
    async fn deferred_resolution_is_cached_after_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);
        let factory = TokenFactory::deferred(Arc::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok("issued".to_string()) })
        }));

        assert_eq!(factory.get_token().await.unwrap(), "issued");
        assert_eq!(factory.get_token().await.unwrap(), "issued");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_resolution_is_retried_on_next_use() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);
        let factory = TokenFactory::deferred(Arc::new(move || {
            let attempt = calls_clone.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if attempt == 0 {
                    Err(ConfigError::TokenResolution(
                        "secret store unavailable".to_string(),
                    ))
                } else {
                    Ok("recovered".to_string())
                }
            })
        }));

        let first = factory.get_token().await;
        assert_eq!(
            first.unwrap_err().to_string(),
            "failed to resolve token: secret store unavailable"
        );
        // The failure must not be cached.
        assert_eq!(factory.get_token().await.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn debug_never_leaks_the_token() {
        let fixed = TokenFactory::fixed("s3cret");
        let rendered = format!("{fixed:?}");
        assert!(!rendered.contains("s3cret"));
        assert_eq!(rendered, "TokenFactory::Fixed(<redacted>)");

        let deferred = TokenFactory::deferred(Arc::new(|| {
            Box::pin(async { Ok("hidden".to_string()) })
        }));
        assert_eq!(
            format!("{deferred:?}"),
            "TokenFactory::Deferred(resolved: false)"
        );
        deferred.get_token().await.unwrap();
        let rendered = format!("{deferred:?}");
        assert!(!rendered.contains("hidden"));
        assert_eq!(rendered, "TokenFactory::Deferred(resolved: true)");
    }
}
