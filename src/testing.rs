//! In-process collaborators and fixtures for unit tests.
//!
//! Every fake records how it was called so tests can assert on call counts
//! and order without touching the network.

use crate::api::{ChunkStream, Generator, Summarizer};
use crate::error::{Error, Result};
use crate::models::{CollectedArticle, Draft, FinalArticle, NewsSummary, RunReport, SearchResult};
use crate::observer::{Observer, Progress};
use crate::scrapers::{ScrapedPage, Scraper};
use crate::search::SearchProvider;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn result(n: usize) -> SearchResult {
    SearchResult {
        url: format!("https://example.com/{n}"),
        title: format!("Title {n}"),
        date: "2025-05-06T10:00:00+00:00".to_string(),
        body: format!("Snippet {n}"),
        source: None,
    }
}

/// `count` collected articles built from [`result`] with non-empty text.
pub(crate) fn collected(count: usize) -> Vec<CollectedArticle> {
    (0..count)
        .filter_map(|n| {
            let result = result(n);
            let text = format!("Full text of {}", result.url);
            CollectedArticle::new(result, text)
        })
        .collect()
}

/// A completed run on "Acme Merger!" with two articles and an empty summary.
pub(crate) fn run_report() -> RunReport {
    let mut article = FinalArticle::default();
    article.push("# Acme and Globex\n\nThe merger closed.");
    article.finish();
    RunReport {
        use_case: "Business News".to_string(),
        topic: "Acme Merger!".to_string(),
        summary_model: "llama3-8b-8192".to_string(),
        writer_model: "llama3-70b-8192".to_string(),
        local_date: "2025-05-06".to_string(),
        local_time: "09:30:00".to_string(),
        articles: collected(2),
        news_summary: NewsSummary::default(),
        draft: Draft::new("# Business News: Acme Merger!\n\n".to_string()),
        article,
    }
}

enum Script {
    RateLimited,
    FailingThen(usize, Vec<SearchResult>),
    Returning(Vec<SearchResult>),
}

pub(crate) struct FakeProvider {
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeProvider {
    fn scripted(script: Script) -> Self {
        Self {
            script,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn rate_limited() -> Self {
        Self::scripted(Script::RateLimited)
    }

    /// Fail the first `failures` calls with a provider error, then succeed.
    pub(crate) fn failing_then(failures: usize, results: Vec<SearchResult>) -> Self {
        Self::scripted(Script::FailingThen(failures, results))
    }

    pub(crate) fn returning(results: Vec<SearchResult>) -> Self {
        Self::scripted(Script::Returning(results))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SearchProvider for FakeProvider {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.script {
            Script::RateLimited => Err(Error::RateLimited("HTTP 202".to_string())),
            Script::FailingThen(failures, _) if call < *failures => {
                Err(Error::Provider("connection reset".to_string()))
            }
            Script::FailingThen(_, results) | Script::Returning(results) => Ok(results.clone()),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeScraper {
    failing: HashSet<String>,
    texts: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeScraper {
    /// Every URL reads as `Full text of {url}` unless configured otherwise.
    pub(crate) fn reading_all() -> Self {
        Self::default()
    }

    pub(crate) fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub(crate) fn with_text(mut self, url: &str, text: &str) -> Self {
        self.texts.insert(url.to_string(), text.to_string());
        self
    }

    pub(crate) fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// URLs in the order they were requested.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Scraper for FakeScraper {
    async fn extract(&self, url: &str) -> Result<ScrapedPage> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(url) {
            return Err(Error::Scrape {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            });
        }
        let text = self
            .texts
            .get(url)
            .cloned()
            .unwrap_or_else(|| format!("Full text of {url}"));
        Ok(ScrapedPage { title: None, text })
    }
}

pub(crate) struct FakeSummarizer {
    words: usize,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeSummarizer {
    /// Summaries of exactly `words` words, whatever the input.
    pub(crate) fn fixed(words: usize) -> Self {
        Self {
            words,
            failing: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Summarizer for FakeSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(text) {
            return Err(Error::Summarization("model overloaded".to_string()));
        }
        Ok((0..self.words)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" "))
    }
}

/// Sets its flag when the stream holding it is dropped.
struct ReleaseGuard(Arc<AtomicBool>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

pub(crate) struct FakeGenerator {
    chunks: Vec<String>,
    fail_after_chunks: bool,
    refuse: bool,
    endless: bool,
    released: Arc<AtomicBool>,
    calls: AtomicUsize,
    last_draft: Mutex<Option<String>>,
}

impl FakeGenerator {
    pub(crate) fn chunks(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            fail_after_chunks: false,
            refuse: false,
            endless: false,
            released: Arc::new(AtomicBool::new(false)),
            calls: AtomicUsize::new(0),
            last_draft: Mutex::new(None),
        }
    }

    /// Yield the chunks, then a generation error.
    pub(crate) fn failing_after_chunks(mut self) -> Self {
        self.fail_after_chunks = true;
        self
    }

    /// Fail before any stream is opened.
    pub(crate) fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }

    /// Yield the chunks, then never end.
    pub(crate) fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    /// Whether the last opened stream has been dropped.
    pub(crate) fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_draft(&self) -> Option<String> {
        self.last_draft.lock().unwrap().clone()
    }
}

impl Generator for FakeGenerator {
    async fn stream(&self, draft: &str) -> Result<ChunkStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_draft.lock().unwrap() = Some(draft.to_string());
        if self.refuse {
            return Err(Error::Generation("model unavailable".to_string()));
        }

        let mut items: Vec<Result<String>> = self.chunks.iter().cloned().map(Ok).collect();
        if self.fail_after_chunks {
            items.push(Err(Error::Generation("stream reset".to_string())));
        }
        let head = stream::iter(items);
        let chunks: ChunkStream = if self.endless {
            head.chain(stream::pending()).boxed()
        } else {
            head.boxed()
        };

        self.released.store(false, Ordering::SeqCst);
        let guard = ReleaseGuard(self.released.clone());
        Ok(chunks
            .map(move |item| {
                let _held = &guard;
                item
            })
            .boxed())
    }
}

/// Records everything it observes.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    progress: Mutex<Vec<Progress>>,
}

impl RecordingObserver {
    pub(crate) fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub(crate) fn progress(&self) -> Vec<Progress> {
        self.progress.lock().unwrap().clone()
    }
}

impl Observer for RecordingObserver {
    fn on_warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn on_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn on_progress(&self, progress: Progress) {
        self.progress.lock().unwrap().push(progress);
    }
}
