//! Article collection: keep only the search results that can be read.
//!
//! Each result with a URL is scraped. A failed or empty scrape drops that
//! result with a warning; the stage as a whole never fails. After every
//! successful addition the growing list is published as a
//! [`Progress::Collected`] snapshot.
//!
//! Scrapes may run concurrently (`concurrency > 1`). Results are merged back
//! in input order, never completion order, so the output is always a
//! subsequence of the input.

use crate::models::{CollectedArticle, SearchResult};
use crate::observer::{Observer, Progress};
use crate::scrapers::Scraper;
use futures::stream::{self, StreamExt};
use std::pin::pin;
use tracing::{debug, info, instrument, warn};

pub struct ArticleCollector<S> {
    scraper: S,
    concurrency: usize,
}

impl<S> ArticleCollector<S>
where
    S: Scraper,
{
    /// `concurrency` is the number of scrapes in flight; values below 1 mean 1.
    pub fn new(scraper: S, concurrency: usize) -> Self {
        Self {
            scraper,
            concurrency: concurrency.max(1),
        }
    }

    /// Scrape the full text of every result.
    ///
    /// # Arguments
    ///
    /// * `results` - Candidates in search order
    /// * `observer` - Receives a warning for each page that fails or is empty,
    ///   and a [`Progress::Collected`] snapshot after each success
    ///
    /// # Returns
    ///
    /// The readable articles, in the order of `results`. Failures are dropped,
    /// so the list may be shorter or empty.
    #[instrument(level = "info", skip_all, fields(candidates = results.len()))]
    pub async fn collect(
        &self,
        results: Vec<SearchResult>,
        observer: &dyn Observer,
    ) -> Vec<CollectedArticle> {
        let candidates: Vec<SearchResult> = results
            .into_iter()
            .filter(|r| {
                let has_url = !r.url.trim().is_empty();
                if !has_url {
                    observer.on_warning(&format!("Skipping result {:?}: no URL", r.title));
                }
                has_url
            })
            .collect();

        let mut scraped = pin!(
            stream::iter(candidates)
                .map(|result| async move {
                    let outcome = self.scraper.extract(&result.url).await;
                    (result, outcome)
                })
                .buffered(self.concurrency)
        );

        let mut collected: Vec<CollectedArticle> = Vec::new();
        while let Some((result, outcome)) = scraped.next().await {
            let url = result.url.clone();
            match outcome {
                Ok(page) => match CollectedArticle::new(result, page.text) {
                    Some(article) => {
                        debug!(
                            %url,
                            page_title = ?page.title,
                            bytes = article.text().len(),
                            "Collected article"
                        );
                        collected.push(article);
                        observer.on_progress(Progress::Collected(collected.clone()));
                    }
                    None => {
                        warn!(%url, "Scrape produced no text");
                        observer.on_warning(&format!(
                            "Could not process article {url}: no readable text"
                        ));
                    }
                },
                Err(e) => {
                    warn!(%url, error = %e, "Scrape failed; dropping article");
                    observer.on_warning(&format!("Could not process article {url}: {e}"));
                }
            }
        }

        info!(count = collected.len(), "Article collection complete");
        collected
    }
}
