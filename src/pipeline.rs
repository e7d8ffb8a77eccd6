//! Pipeline controller: one topic in, one article out.
//!
//! # States
//!
//! ```text
//! Idle -> Retrieving -> Collecting -> Summarizing -> Drafting -> Generating -> Done
//!                            |             |                        |
//!                            +-------------+--> SkippedNoNews       +--> Failed
//! ```
//!
//! Retrieval, collection, and summarization never fail a run: their
//! collaborators' errors are reported to the observer and absorbed. A run
//! with nothing to summarize ends early in `SkippedNoNews` with a
//! user-facing message. Only a generation error is fatal and ends in
//! `Failed`.
//!
//! A [`Pipeline`] runs once. Every entered state is published as
//! [`Progress::Stage`], so the state sequence of a run can be replayed from
//! the observer alone.

use crate::api::{Generator, Summarizer};
use crate::collector::ArticleCollector;
use crate::config::Settings;
use crate::draft;
use crate::error::{Error, Result};
use crate::generator::StreamingGenerator;
use crate::models::RunReport;
use crate::observer::{Observer, Progress};
use crate::retry::RetryingFetcher;
use crate::scrapers::Scraper;
use crate::search::SearchProvider;
use crate::summarizer::BudgetedSummarizer;
use chrono::Local;
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Shown when a run finds nothing to write about.
pub const NO_NEWS_MESSAGE: &str =
    "Sorry could not find any news or web search results. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Idle,
    Retrieving,
    Collecting,
    Summarizing,
    SkippedNoNews,
    Drafting,
    Generating,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::SkippedNoNews | Self::Done | Self::Failed)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Retrieving)
                | (Retrieving, Collecting)
                | (Collecting, Summarizing)
                | (Collecting, SkippedNoNews)
                | (Summarizing, Drafting)
                | (Summarizing, SkippedNoNews)
                | (Drafting, Generating)
                | (Generating, Done)
                | (Generating, Failed)
        )
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(Box<RunReport>),
    NoNews { message: String },
}

impl RunOutcome {
    fn no_news() -> Self {
        Self::NoNews {
            message: NO_NEWS_MESSAGE.to_string(),
        }
    }
}

pub struct Pipeline<P, S, Z, G> {
    settings: Settings,
    fetcher: RetryingFetcher<P>,
    collector: ArticleCollector<S>,
    summarizer: BudgetedSummarizer<Z>,
    generator: StreamingGenerator<G>,
    state: PipelineState,
}

impl<P, S, Z, G> Pipeline<P, S, Z, G>
where
    P: SearchProvider,
    S: Scraper,
    Z: Summarizer,
    G: Generator,
{
    /// Wire the stages around the collaborators, with budgets from `settings`.
    pub fn new(settings: Settings, provider: P, scraper: S, summarizer: Z, generator: G) -> Self {
        Self {
            fetcher: RetryingFetcher::new(provider, settings.retry, settings.request_timeout),
            collector: ArticleCollector::new(scraper, settings.scrape_concurrency),
            summarizer: BudgetedSummarizer::new(
                summarizer,
                settings.summary_words,
                settings.draft_words,
            ),
            generator: StreamingGenerator::new(generator),
            settings,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn enter(&mut self, next: PipelineState, observer: &dyn Observer) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        if next.is_terminal() {
            info!(from = ?self.state, state = ?next, "Pipeline finished");
        } else {
            info!(from = ?self.state, to = ?next, "Pipeline state");
        }
        self.state = next;
        observer.on_progress(Progress::Stage(next));
    }

    /// Research and write an article about `topic`.
    ///
    /// # Arguments
    ///
    /// * `topic` - Search query and article subject
    /// * `observer` - Receives every state change, snapshot, and non-fatal failure
    ///
    /// # Returns
    ///
    /// [`RunOutcome::Completed`] with the full report, or
    /// [`RunOutcome::NoNews`] when nothing readable was found.
    ///
    /// # Errors
    ///
    /// Returns `Err` only when generation fails or the pipeline has already
    /// run; in the first case the observer has been told and the state is
    /// [`PipelineState::Failed`].
    #[instrument(level = "info", skip(self, observer), fields(use_case = %self.settings.use_case))]
    pub async fn run(&mut self, topic: &str, observer: &dyn Observer) -> Result<RunOutcome> {
        if self.state != PipelineState::Idle {
            return Err(Error::Config(format!(
                "pipeline already ran (state {:?}); build a new one per topic",
                self.state
            )));
        }
        let start = Instant::now();
        let started_at = Local::now();

        self.enter(PipelineState::Retrieving, observer);
        let results = self
            .fetcher
            .fetch(topic, self.settings.search_results, observer)
            .await;

        self.enter(PipelineState::Collecting, observer);
        let articles = self.collector.collect(results, observer).await;
        if articles.is_empty() {
            self.enter(PipelineState::SkippedNoNews, observer);
            info!("No articles collected; skipping");
            return Ok(RunOutcome::no_news());
        }

        self.enter(PipelineState::Summarizing, observer);
        let Some(news_summary) = self.summarizer.summarize(&articles, observer).await else {
            self.enter(PipelineState::SkippedNoNews, observer);
            return Ok(RunOutcome::no_news());
        };

        self.enter(PipelineState::Drafting, observer);
        let draft = draft::assemble(self.settings.use_case.label(), topic, &news_summary);
        observer.on_progress(Progress::Draft(draft.to_string()));

        self.enter(PipelineState::Generating, observer);
        let article = match self.generator.generate(&draft, observer).await {
            Ok(article) => article,
            Err(e) => {
                error!(error = %e, "Article generation failed");
                observer.on_error(&format!("Could not write the article: {e}"));
                self.enter(PipelineState::Failed, observer);
                return Err(e);
            }
        };
        self.enter(PipelineState::Done, observer);

        info!(
            articles = articles.len(),
            summary_words = news_summary.word_count(),
            article_bytes = article.len(),
            complete = article.is_complete(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Run complete"
        );

        Ok(RunOutcome::Completed(Box::new(RunReport {
            use_case: self.settings.use_case.label().to_string(),
            topic: topic.to_string(),
            summary_model: self.settings.summary_model.clone(),
            writer_model: self.settings.writer_model.clone(),
            local_date: started_at.format("%Y-%m-%d").to_string(),
            local_time: started_at.format("%H:%M:%S").to_string(),
            articles,
            news_summary,
            draft,
            article,
        })))
    }
}
