//! News search providers.
//!
//! A [`SearchProvider`] turns a topic into a list of candidate articles. The
//! pipeline only ever calls it through [`crate::retry::RetryingFetcher`],
//! which owns the backoff policy; providers report failures and never retry
//! on their own.
//!
//! | Provider | Module | Notes |
//! |----------|--------|-------|
//! | DuckDuckGo News | [`duckduckgo`] | `vqd` token + `news.js` JSON endpoint |

pub mod duckduckgo;

use crate::error::Result;
use crate::models::SearchResult;

/// Source of candidate news articles for a query.
pub trait SearchProvider {
    /// Return at most `max_results` results for `query`.
    ///
    /// Rate limiting must be reported as [`crate::error::Error::RateLimited`]
    /// so that callers can tell it apart from other provider failures.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}
