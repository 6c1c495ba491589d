// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery statistics shared across concurrent in-flight submissions.
//!
//! The tracker is the only state mutated from detached send tasks, so every
//! update goes through one lock and [`StatsTracker::snapshot`] always returns
//! a consistent copy.

use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::Notify;

/// Point-in-time copy of the delivery counters. Mutations to the live
/// tracker are never visible through a previously returned snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Submissions accepted by the dispatcher, regardless of outcome.
    pub total_logs: u64,
    /// Entries that reached the remote endpoint.
    pub successful_logs: u64,
    /// Entries whose retries were exhausted.
    pub failed_logs: u64,
    /// Most recent failure message. Overwritten on each failure and never
    /// cleared, even by a later success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct StatsInner {
    total_logs: u64,
    successful_logs: u64,
    failed_logs: u64,
    in_flight: u64,
    last_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct StatsTracker {
    inner: Mutex<StatsInner>,
    drained: Notify,
}

#[allow(clippy::expect_used)]
impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submit(&self) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.total_logs += 1;
        inner.in_flight += 1;
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.successful_logs += 1;
    }

    pub fn record_failure(&self, message: impl Into<String>) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.failed_logs += 1;
        inner.last_error = Some(message.into());
    }

    /// Marks one submission as terminally handled. Called exactly once per
    /// submission, after the success/failure counter update.
    pub fn end_flight(&self) {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.in_flight == 0 {
            drop(inner);
            self.drained.notify_waiters();
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.inner.lock().expect("lock poisoned").in_flight
    }

    pub fn snapshot(&self) -> Stats {
        let inner = self.inner.lock().expect("lock poisoned");
        Stats {
            total_logs: inner.total_logs,
            successful_logs: inner.successful_logs,
            failed_logs: inner.failed_logs,
            last_error: inner.last_error.clone(),
        }
    }

    /// Resolves once no submissions are in flight. Used by tests and
    /// graceful shutdown to wait for detached sends to settle.
    pub async fn settled(&self) {
        loop {
            let mut drained = std::pin::pin!(self.drained.notified());
            // Register before checking the gauge so a concurrent end_flight
            // cannot slip between the check and the await.
            drained.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            drained.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn snapshot_is_independent_copy() {
        let tracker = StatsTracker::new();
        tracker.record_submit();
        let before = tracker.snapshot();

        tracker.record_failure("connection refused");
        tracker.end_flight();
        let after = tracker.snapshot();

        assert_eq!(before.total_logs, 1);
        assert_eq!(before.failed_logs, 0);
        assert!(before.last_error.is_none());
        assert_eq!(after.failed_logs, 1);
        assert_eq!(after.last_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn last_error_survives_later_success() {
        let tracker = StatsTracker::new();
        tracker.record_submit();
        tracker.record_failure("boom");
        tracker.end_flight();

        tracker.record_submit();
        tracker.record_success();
        tracker.end_flight();

        let stats = tracker.snapshot();
        assert_eq!(stats.successful_logs, 1);
        assert_eq!(stats.failed_logs, 1);
        assert_eq!(stats.last_error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn concurrent_increments_are_never_lost() {
        let tracker = Arc::new(StatsTracker::new());
        let mut handles = Vec::new();
        for i in 0..100u64 {
            let tracker = Arc::clone(&tracker);
            handles.push(tokio::spawn(async move {
                tracker.record_submit();
                if i % 2 == 0 {
                    tracker.record_success();
                } else {
                    tracker.record_failure(format!("error {i}"));
                }
                tracker.end_flight();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = tracker.snapshot();
        assert_eq!(stats.total_logs, 100);
        assert_eq!(stats.successful_logs, 50);
        assert_eq!(stats.failed_logs, 50);
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test]
    async fn settled_returns_immediately_when_idle() {
        let tracker = StatsTracker::new();
        tokio::time::timeout(Duration::from_millis(100), tracker.settled())
            .await
            .expect("settled should not block with nothing in flight");
    }

    #[tokio::test]
    async fn settled_waits_for_in_flight_work() {
        let tracker = Arc::new(StatsTracker::new());
        tracker.record_submit();

        let waiter = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.settled().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        tracker.record_success();
        tracker.end_flight();
        tokio::time::timeout(Duration::from_millis(500), waiter)
            .await
            .expect("settled should resolve once the flight ends")
            .unwrap();
    }

    proptest! {
        // Any interleaving of completed submissions keeps the accounting
        // identity and monotonic counters.
        #[test]
        fn counters_stay_consistent(outcomes in proptest::collection::vec(any::<bool>(), 0..64)) {
            let tracker = StatsTracker::new();
            let mut previous = Stats::default();
            for (i, success) in outcomes.iter().enumerate() {
                tracker.record_submit();
                if *success {
                    tracker.record_success();
                } else {
                    tracker.record_failure(format!("failure {i}"));
                }
                tracker.end_flight();

                let stats = tracker.snapshot();
                prop_assert!(stats.total_logs >= previous.total_logs);
                prop_assert!(stats.successful_logs >= previous.successful_logs);
                prop_assert!(stats.failed_logs >= previous.failed_logs);
                prop_assert!(stats.successful_logs + stats.failed_logs <= stats.total_logs);
                previous = stats;
            }
            let stats = tracker.snapshot();
            prop_assert_eq!(stats.total_logs, outcomes.len() as u64);
            prop_assert_eq!(
                stats.successful_logs + stats.failed_logs,
                outcomes.len() as u64
            );
        }
    }
}
