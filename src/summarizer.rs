//! Budgeted summarization of collected articles.
//!
//! Articles are summarized one at a time, in collection order. Each summary
//! is hard-cut to the per-article word cap and appended to the running
//! [`NewsSummary`], which is republished after every block.
//!
//! The total budget is a soft ceiling: it is checked only after a block has
//! been appended, and processing stops as soon as the running word count is
//! strictly greater than the budget. The block that crosses the line is kept
//! whole, and no later article is summarized.

use crate::api::Summarizer;
use crate::models::{CollectedArticle, NewsSummary, SummaryBlock};
use crate::observer::{Observer, Progress};
use crate::utils::{truncate_words, word_count};
use tracing::{debug, info, instrument, warn};

pub struct BudgetedSummarizer<Z> {
    summarizer: Z,
    per_article_word_cap: usize,
    total_word_budget: usize,
}

impl<Z> BudgetedSummarizer<Z>
where
    Z: Summarizer,
{
    pub fn new(summarizer: Z, per_article_word_cap: usize, total_word_budget: usize) -> Self {
        Self {
            summarizer,
            per_article_word_cap,
            total_word_budget,
        }
    }

    /// Summarize `articles` within the word budget.
    ///
    /// Returns `None` without calling the summarizer when there are no
    /// articles. A summary that fails is reported to `observer` and its
    /// article is skipped, so the result may be `Some` and still empty.
    ///
    /// # Arguments
    ///
    /// * `articles` - Collected articles, processed in order
    /// * `observer` - Receives failures and a [`Progress::Summary`] snapshot per block
    ///
    /// # Returns
    ///
    /// The blocks gathered until the running word count first exceeds the
    /// total budget. The block that crosses the budget is kept.
    #[instrument(level = "info", skip_all, fields(articles = articles.len()))]
    pub async fn summarize(
        &self,
        articles: &[CollectedArticle],
        observer: &dyn Observer,
    ) -> Option<NewsSummary> {
        if articles.is_empty() {
            return None;
        }

        let mut news_summary = NewsSummary::default();
        for (index, article) in articles.iter().enumerate() {
            let url = &article.result().url;
            let summary = match self.summarizer.summarize(article.text()).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(index, %url, error = %e, "Summarization failed; skipping article");
                    observer.on_warning(&format!("Could not summarize article {url}: {e}"));
                    continue;
                }
            };

            let summary = self.cap(summary, &article.result().title);
            news_summary.push(SummaryBlock::from_article(article, summary));
            observer.on_progress(Progress::Summary(news_summary.as_str().to_string()));

            let words = news_summary.word_count();
            debug!(index, words, "Appended summary block");
            if words > self.total_word_budget {
                info!(
                    index,
                    words,
                    budget = self.total_word_budget,
                    "Stopping news summary at length"
                );
                break;
            }
        }

        info!(
            blocks = news_summary.blocks().len(),
            words = news_summary.word_count(),
            "News summary complete"
        );
        Some(news_summary)
    }

    fn cap(&self, summary: String, title: &str) -> String {
        let words = word_count(&summary);
        if words > self.per_article_word_cap {
            info!(
                %title,
                from = words,
                to = self.per_article_word_cap,
                "Truncated summary"
            );
            truncate_words(&summary, self.per_article_word_cap)
        } else {
            summary.trim().to_string()
        }
    }
}
