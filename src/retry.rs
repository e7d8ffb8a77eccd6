//! Search retrieval with exponential backoff.
//!
//! [`RetryingFetcher`] wraps a [`SearchProvider`] and turns its failures into
//! observer notifications. Exhausting the retries is not fatal: the fetcher
//! returns an empty list and the pipeline carries on to its "no news" path.
//!
//! # Backoff Strategy
//!
//! Attempts are numbered from 0. After a failed attempt `n` that is not the
//! last one, the fetcher waits
//!
//! ```text
//! delay = initial_delay * 2^n
//! ```
//!
//! with no jitter and no cap. Every provider call is additionally bounded by
//! a per-call timeout, which counts as a failed attempt.

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::models::SearchResult;
use crate::observer::Observer;
use crate::search::SearchProvider;
use std::fmt;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};
use tracing::{error, info, instrument, warn};

/// Bounded retry loop around a single search provider.
pub struct RetryingFetcher<P> {
    inner: P,
    /// Total attempts, including the first.
    max_retries: usize,
    initial_delay: Duration,
    call_timeout: Duration,
}

impl<P> RetryingFetcher<P>
where
    P: SearchProvider,
{
    pub fn new(inner: P, retry: RetryConfig, call_timeout: Duration) -> Self {
        Self {
            inner,
            max_retries: retry.max_retries,
            initial_delay: retry.initial_delay,
            call_timeout,
        }
    }

    /// Wait after the failed 0-indexed `attempt`.
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt)
            .ok()
            .and_then(|a| 2u32.checked_pow(a))
            .unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }

    /// Fetch up to `max_results` results for `query`.
    ///
    /// Never fails: after `max_retries` failed attempts an error is reported
    /// to `observer` and an empty list is returned.
    ///
    /// # Arguments
    ///
    /// * `query` - Search terms, passed to the provider unchanged
    /// * `max_results` - Upper bound on the number of results
    /// * `observer` - Receives a warning per failed attempt and the final error
    ///
    /// # Returns
    ///
    /// The provider's results in its order, or an empty list.
    #[instrument(level = "info", skip(self, observer))]
    pub async fn fetch(
        &self,
        query: &str,
        max_results: usize,
        observer: &dyn Observer,
    ) -> Vec<SearchResult> {
        let total_t0 = Instant::now();

        for attempt in 0..self.max_retries {
            let attempt_t0 = Instant::now();
            match self.attempt(query, max_results).await {
                Ok(mut results) => {
                    results.truncate(max_results);
                    info!(
                        attempt,
                        count = results.len(),
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Search succeeded"
                    );
                    return results;
                }
                Err(e) if attempt + 1 < self.max_retries => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                        ?delay,
                        rate_limited = e.is_rate_limit(),
                        error = %e,
                        "search attempt failed; backing off"
                    );
                    let reason = if e.is_rate_limit() {
                        "Rate limit hit"
                    } else {
                        "Search failed"
                    };
                    observer.on_warning(&format!(
                        "{reason}. Waiting {:.2} seconds before retry (Attempt {})",
                        delay.as_secs_f64(),
                        attempt + 1
                    ));
                    sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        error = %e,
                        "search exhausted retries"
                    );
                    observer.on_error(&format!(
                        "Failed to fetch news after {} attempts. Error: {e}",
                        self.max_retries
                    ));
                    return Vec::new();
                }
            }
        }

        observer.on_error("No search attempts were made (max_retries is 0)");
        Vec::new()
    }

    async fn attempt(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        timeout(self.call_timeout, self.inner.search(query, max_results))
            .await
            .unwrap_or(Err(Error::Timeout(self.call_timeout)))
    }
}

impl<P> fmt::Debug for RetryingFetcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingFetcher")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
