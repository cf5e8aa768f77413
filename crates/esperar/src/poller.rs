//! The retry poller: invoke a probe until it succeeds or a deadline elapses.
//!
//! Flaky-UI suites spend most of their time waiting for the application under
//! test to settle (indexing to finish, a panel to render, a URL to change).
//! [`RetryPoller`] is the single primitive behind those waits: a probe runs,
//! and on failure the poller sleeps one interval and tries again until the
//! timeout budget runs out.
//!
//! The inter-attempt sleep is the only suspension point. A probe invocation
//! always runs to completion before the deadline is re-checked, and the first
//! attempt is unconditional, so a budget smaller than one interval still gets
//! one evaluation pass.

use crate::policy::RetryPolicy;
use crate::result::{EsperarError, EsperarResult};
use std::future::Future;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Poller that retries a failing probe until a deadline elapses.
///
/// Stateless and reentrant: every call to [`retry_until`](Self::retry_until)
/// is independent and holds no state beyond the single invocation, so one
/// poller can serve concurrent waits.
#[derive(Debug, Clone, Default)]
pub struct RetryPoller {
    /// Policy used by [`try_with_default`](Self::try_with_default)
    policy: RetryPolicy,
    /// Aborts any in-flight inter-attempt wait when triggered
    cancel: CancellationToken,
}

impl RetryPoller {
    /// Create a poller with the default policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a poller with a custom default policy
    #[must_use]
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Attach a cancellation token observed during inter-attempt waits
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The poller's default policy
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `probe` until it succeeds or `policy.timeout_ms` elapses.
    ///
    /// The probe may be invoked multiple times and must be side-effect-safe
    /// to repeat. A successful probe returns immediately; a failing probe is
    /// retried after `policy.interval_ms` while enough budget remains for
    /// another full interval. Once the budget is exhausted the last failure
    /// is surfaced as [`EsperarError::RetryExhausted`].
    pub async fn retry_until<T, F, Fut>(&self, mut probe: F, policy: &RetryPolicy) -> EsperarResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EsperarResult<T>>,
    {
        policy.validate()?;

        let start = Instant::now();
        let timeout = policy.timeout();
        let mut interval = policy.interval();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match probe().await {
                Ok(value) => {
                    if attempts > 1 {
                        info!(
                            attempts,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "probe succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(failure) => {
                    let elapsed = start.elapsed();
                    if elapsed + interval >= timeout {
                        return Err(EsperarError::RetryExhausted {
                            timeout_ms: policy.timeout_ms,
                            attempts,
                            cause: Box::new(failure),
                        });
                    }
                    debug!(
                        attempt = attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        error = %failure,
                        "probe failed; retrying"
                    );
                    tokio::select! {
                        () = self.cancel.cancelled() => return Err(EsperarError::Cancelled),
                        () = sleep(interval) => {}
                    }
                    interval = policy.next_interval(interval);
                }
            }
        }
    }

    /// Exactly one evaluation pass, no waiting.
    ///
    /// Used where the test expects a current-state check. A failure is
    /// surfaced through the same [`EsperarError::RetryExhausted`] wrapper so
    /// callers handle a single taxonomy.
    pub async fn retry_once<T, F, Fut>(&self, mut probe: F) -> EsperarResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EsperarResult<T>>,
    {
        probe().await.map_err(|failure| EsperarError::RetryExhausted {
            timeout_ms: 0,
            attempts: 1,
            cause: Box::new(failure),
        })
    }

    /// Retry with an explicit budget and the default interval.
    pub async fn try_for_time<T, F, Fut>(&self, timeout_ms: u64, probe: F) -> EsperarResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EsperarResult<T>>,
    {
        let policy = self.policy.clone().with_timeout(timeout_ms);
        self.retry_until(probe, &policy).await
    }

    /// Retry with the poller's default policy.
    pub async fn try_with_default<T, F, Fut>(&self, probe: F) -> EsperarResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EsperarResult<T>>,
    {
        let policy = self.policy.clone();
        self.retry_until(probe, &policy).await
    }

    /// Poll a boolean condition until it holds.
    ///
    /// `description` names what is being waited for and is carried into the
    /// failure diagnostics when the budget runs out.
    pub async fn wait_for<F, Fut>(
        &self,
        description: &str,
        mut condition: F,
        policy: &RetryPolicy,
    ) -> EsperarResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.retry_until(
            || {
                let pending = condition();
                async move {
                    if pending.await {
                        Ok(())
                    } else {
                        Err(EsperarError::probe(format!("waiting for {description}")))
                    }
                }
            },
            policy,
        )
        .await
    }
}

/// Retry a probe with an explicit budget and default interval.
///
/// Convenience for call sites that have no poller in scope.
pub async fn try_for_time<T, F, Fut>(timeout_ms: u64, probe: F) -> EsperarResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EsperarResult<T>>,
{
    RetryPoller::new().try_for_time(timeout_ms, probe).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_probe(
        counter: &Arc<AtomicU32>,
        succeed_on: u32,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = EsperarResult<u32>> + Send>> {
        let counter = counter.clone();
        move || {
            let counter = counter.clone();
            Box::pin(async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt >= succeed_on {
                    Ok(attempt)
                } else {
                    Err(EsperarError::probe(format!("attempt {attempt} not ready")))
                }
            })
        }
    }

    mod retry_until_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_first_attempt_success_adds_no_latency() {
            let poller = RetryPoller::new();
            let policy = RetryPolicy::new().with_timeout(5000).with_interval(500);
            let counter = Arc::new(AtomicU32::new(0));

            let start = Instant::now();
            let value = poller
                .retry_until(counting_probe(&counter, 1), &policy)
                .await
                .unwrap();

            assert_eq!(value, 1);
            assert_eq!(counter.load(Ordering::SeqCst), 1);
            // No sleep happened, so paused time did not advance
            assert_eq!(start.elapsed(), Duration::ZERO);
        }

        #[tokio::test(start_paused = true)]
        async fn test_three_failures_then_success() {
            let poller = RetryPoller::new();
            let policy = RetryPolicy::new().with_timeout(5000).with_interval(500);
            let counter = Arc::new(AtomicU32::new(0));

            let start = Instant::now();
            let value = poller
                .retry_until(counting_probe(&counter, 4), &policy)
                .await
                .unwrap();

            assert_eq!(value, 4);
            assert_eq!(counter.load(Ordering::SeqCst), 4);
            assert_eq!(start.elapsed(), Duration::from_millis(1500));
        }

        #[tokio::test(start_paused = true)]
        async fn test_budget_smaller_than_interval_makes_one_attempt() {
            let poller = RetryPoller::new();
            let policy = RetryPolicy::new().with_timeout(1000).with_interval(2000);
            let counter = Arc::new(AtomicU32::new(0));

            let err = poller
                .retry_until(counting_probe(&counter, u32::MAX), &policy)
                .await
                .unwrap_err();

            assert_eq!(counter.load(Ordering::SeqCst), 1);
            match err {
                EsperarError::RetryExhausted {
                    timeout_ms,
                    attempts,
                    ..
                } => {
                    assert_eq!(timeout_ms, 1000);
                    assert_eq!(attempts, 1);
                }
                other => panic!("expected RetryExhausted, got {other:?}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_always_failing_probe_consumes_budget() {
            let poller = RetryPoller::new();
            let policy = RetryPolicy::new().with_timeout(5000).with_interval(500);
            let counter = Arc::new(AtomicU32::new(0));

            let start = Instant::now();
            let err = poller
                .retry_until(counting_probe(&counter, u32::MAX), &policy)
                .await
                .unwrap_err();

            // Ends within one interval of the timeout, without a trailing sleep
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(4500));
            assert!(elapsed < Duration::from_millis(5000));
            assert!(err.is_exhausted());
        }

        #[tokio::test(start_paused = true)]
        async fn test_exhausted_cause_is_last_failure() {
            let poller = RetryPoller::new();
            let policy = RetryPolicy::new().with_timeout(2000).with_interval(500);
            let counter = Arc::new(AtomicU32::new(0));

            let err = poller
                .retry_until(counting_probe(&counter, u32::MAX), &policy)
                .await
                .unwrap_err();

            let attempts = counter.load(Ordering::SeqCst);
            let cause = err.exhausted_cause().unwrap();
            assert_eq!(
                cause.to_string(),
                format!("probe failed: attempt {attempts} not ready")
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_exponential_backoff_stretches_sleeps() {
            let poller = RetryPoller::new();
            let policy = RetryPolicy::new()
                .with_timeout(60_000)
                .with_interval(500)
                .with_backoff(crate::policy::Backoff::Exponential {
                    multiplier: 2.0,
                    max_interval_ms: 10_000,
                });
            let counter = Arc::new(AtomicU32::new(0));

            let start = Instant::now();
            let value = poller
                .retry_until(counting_probe(&counter, 4), &policy)
                .await
                .unwrap();

            assert_eq!(value, 4);
            // Sleeps of 500, 1000, 2000 before the fourth attempt
            assert_eq!(start.elapsed(), Duration::from_millis(3500));
        }

        #[tokio::test]
        async fn test_zero_timeout_rejected() {
            let poller = RetryPoller::new();
            let policy = RetryPolicy::new().with_timeout(0);
            let err = poller
                .retry_until(|| async { Ok::<_, EsperarError>(1) }, &policy)
                .await
                .unwrap_err();
            assert!(matches!(err, EsperarError::InvalidPolicy { .. }));
        }

        #[tokio::test]
        async fn test_reentrant_calls_leave_no_residue() {
            let poller = RetryPoller::new();
            let policy = RetryPolicy::new().with_timeout(1000).with_interval(10);
            for _ in 0..3 {
                let value = poller
                    .retry_until(|| async { Ok::<_, EsperarError>("ready") }, &policy)
                    .await
                    .unwrap();
                assert_eq!(value, "ready");
            }
        }

        #[tokio::test]
        async fn test_concurrent_retries_are_independent() {
            let poller = Arc::new(RetryPoller::new());
            let policy = RetryPolicy::new().with_timeout(2000).with_interval(10);

            let mut handles = Vec::new();
            for id in 0u32..4 {
                let poller = poller.clone();
                let policy = policy.clone();
                let counter = Arc::new(AtomicU32::new(0));
                handles.push(tokio::spawn(async move {
                    poller
                        .retry_until(counting_probe(&counter, id % 3 + 1), &policy)
                        .await
                }));
            }
            for handle in handles {
                assert!(handle.await.unwrap().is_ok());
            }
        }
    }

    mod retry_once_tests {
        use super::*;

        #[tokio::test]
        async fn test_retry_once_success() {
            let poller = RetryPoller::new();
            let value = poller
                .retry_once(|| async { Ok::<_, EsperarError>(42) })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        #[tokio::test]
        async fn test_retry_once_makes_exactly_one_attempt() {
            let poller = RetryPoller::new();
            let counter = Arc::new(AtomicU32::new(0));
            let err = poller
                .retry_once(counting_probe(&counter, u32::MAX))
                .await
                .unwrap_err();
            assert_eq!(counter.load(Ordering::SeqCst), 1);
            match err {
                EsperarError::RetryExhausted { attempts, cause, .. } => {
                    assert_eq!(attempts, 1);
                    assert!(matches!(*cause, EsperarError::ProbeFailure { .. }));
                }
                other => panic!("expected RetryExhausted, got {other:?}"),
            }
        }
    }

    mod convenience_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_try_for_time_uses_explicit_budget() {
            let poller = RetryPoller::new();
            let counter = Arc::new(AtomicU32::new(0));
            let err = poller
                .try_for_time(1200, counting_probe(&counter, u32::MAX))
                .await
                .unwrap_err();
            match err {
                EsperarError::RetryExhausted { timeout_ms, .. } => assert_eq!(timeout_ms, 1200),
                other => panic!("expected RetryExhausted, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_try_with_default_uses_configured_policy() {
            let poller =
                RetryPoller::with_policy(RetryPolicy::new().with_timeout(50).with_interval(5));
            let counter = Arc::new(AtomicU32::new(0));
            let err = poller
                .try_with_default(counting_probe(&counter, u32::MAX))
                .await
                .unwrap_err();
            match err {
                EsperarError::RetryExhausted { timeout_ms, .. } => assert_eq!(timeout_ms, 50),
                other => panic!("expected RetryExhausted, got {other:?}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_free_try_for_time() {
            let value = try_for_time(1000, || async { Ok::<_, EsperarError>("ok") })
                .await
                .unwrap();
            assert_eq!(value, "ok");
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_condition_becomes_true() {
            let poller = RetryPoller::new();
            let policy = RetryPolicy::new().with_timeout(5000).with_interval(100);
            let counter = Arc::new(AtomicU32::new(0));

            let counter_inner = counter.clone();
            poller
                .wait_for(
                    "repository index to finish",
                    move || {
                        let counter = counter_inner.clone();
                        async move { counter.fetch_add(1, Ordering::SeqCst) + 1 >= 3 }
                    },
                    &policy,
                )
                .await
                .unwrap();
            assert_eq!(counter.load(Ordering::SeqCst), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_carries_description_into_failure() {
            let poller = RetryPoller::new();
            let policy = RetryPolicy::new().with_timeout(500).with_interval(100);

            let err = poller
                .wait_for("the source viewer to render", || async { false }, &policy)
                .await
                .unwrap_err();

            let cause = err.exhausted_cause().unwrap();
            assert_eq!(
                cause.to_string(),
                "probe failed: waiting for the source viewer to render"
            );
        }
    }

    mod cancellation_tests {
        use super::*;

        #[tokio::test]
        async fn test_cancelled_token_aborts_before_next_sleep() {
            let cancel = CancellationToken::new();
            cancel.cancel();
            let poller = RetryPoller::new().with_cancellation(cancel);
            let policy = RetryPolicy::new().with_timeout(60_000).with_interval(1000);
            let counter = Arc::new(AtomicU32::new(0));

            let err = poller
                .retry_until(counting_probe(&counter, u32::MAX), &policy)
                .await
                .unwrap_err();

            // The in-flight attempt ran to completion; the wait did not start
            assert_eq!(counter.load(Ordering::SeqCst), 1);
            assert!(matches!(err, EsperarError::Cancelled));
        }

        #[tokio::test]
        async fn test_cancellation_observed_within_one_tick() {
            let cancel = CancellationToken::new();
            let poller = RetryPoller::new().with_cancellation(cancel.clone());
            let policy = RetryPolicy::new().with_timeout(60_000).with_interval(5000);
            let counter = Arc::new(AtomicU32::new(0));

            let handle = tokio::spawn(async move {
                poller
                    .retry_until(counting_probe(&counter, u32::MAX), &policy)
                    .await
            });

            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();

            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, EsperarError::Cancelled));
        }

        #[tokio::test]
        async fn test_uncancelled_token_does_not_interfere() {
            let poller = RetryPoller::new().with_cancellation(CancellationToken::new());
            let policy = RetryPolicy::new().with_timeout(1000).with_interval(5);
            let counter = Arc::new(AtomicU32::new(0));
            let value = poller
                .retry_until(counting_probe(&counter, 3), &policy)
                .await
                .unwrap();
            assert_eq!(value, 3);
        }
    }
}
