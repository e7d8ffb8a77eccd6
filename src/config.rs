//! Use-case presets, model choices, and run settings.
//!
//! Settings are assembled from three layers, lowest first:
//! 1. the selected [`UseCase`] preset (result count and word budgets)
//! 2. the optional YAML settings file ([`FileConfig`])
//! 3. command-line overrides (see [`crate::cli`])
//!
//! A [`Settings`] value is immutable for the duration of a run; changing a
//! model means building the next run from new settings.

use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{info, instrument};

/// Allowed number of search results to request.
pub const SEARCH_RESULTS_RANGE: RangeInclusive<usize> = 3..=20;
/// Allowed per-article summary length, in words.
pub const SUMMARY_WORDS_RANGE: RangeInclusive<usize> = 100..=2000;
/// Allowed draft length, in words.
pub const DRAFT_WORDS_RANGE: RangeInclusive<usize> = 1000..=10000;

/// Known summarizer models; the first is the default.
pub const SUMMARY_MODELS: &[&str] = &["llama3-8b-8192", "mixtral-8x7b-32768", "llama3-70b-8192"];
/// Known article writer models; the first is the default.
pub const WRITER_MODELS: &[&str] = &["llama3-70b-8192", "llama3-8b-8192", "mixtral-8x7b-32768"];

/// Groq's OpenAI-compatible endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

/// The kind of article being written. Selects a [`UseCasePreset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UseCase {
    BusinessNews,
    TravelGuides,
    ResearchPapers,
    TechnologyTrends,
}

/// Defaults bundled with a use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseCasePreset {
    pub default_topic: &'static str,
    pub search_results: usize,
    pub summary_words: usize,
    pub draft_words: usize,
    pub prompt_placeholder: &'static str,
}

impl UseCase {
    /// Human readable name, as used in the draft title.
    pub fn label(&self) -> &'static str {
        match self {
            UseCase::BusinessNews => "Business News",
            UseCase::TravelGuides => "Travel Guides",
            UseCase::ResearchPapers => "Research Papers",
            UseCase::TechnologyTrends => "Technology Trends",
        }
    }

    pub fn preset(&self) -> UseCasePreset {
        match self {
            UseCase::BusinessNews => UseCasePreset {
                default_topic: "Hashicorp IBM",
                search_results: 7,
                summary_words: 800,
                draft_words: 5000,
                prompt_placeholder: "Enter a business topic (e.g., Company mergers, Market trends)",
            },
            UseCase::TravelGuides => UseCasePreset {
                default_topic: "Paris Tourism",
                search_results: 10,
                summary_words: 1000,
                draft_words: 6000,
                prompt_placeholder: "Enter a destination or travel topic",
            },
            UseCase::ResearchPapers => UseCasePreset {
                default_topic: "Machine Learning Applications",
                search_results: 15,
                summary_words: 1200,
                draft_words: 8000,
                prompt_placeholder: "Enter a research topic or field",
            },
            UseCase::TechnologyTrends => UseCasePreset {
                default_topic: "AI Developments",
                search_results: 12,
                summary_words: 1000,
                draft_words: 6000,
                prompt_placeholder: "Enter a technology trend or topic",
            },
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// DuckDuckGo safe-search level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    On,
    #[default]
    Moderate,
    Off,
}

impl SafeSearch {
    /// Value of the `p` query parameter understood by DuckDuckGo.
    pub fn code(&self) -> &'static str {
        match self {
            SafeSearch::On => "1",
            SafeSearch::Moderate => "-1",
            SafeSearch::Off => "-2",
        }
    }
}

/// Contents of the optional YAML settings file.
///
/// ```yaml
/// api_base: https://api.groq.com/openai/v1
/// request_timeout_secs: 60
/// max_retries: 3
/// initial_delay_secs: 5.0
/// scrape_concurrency: 4
/// region: us-en
/// safesearch: moderate
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub max_retries: usize,
    pub initial_delay_secs: f64,
    pub scrape_concurrency: usize,
    pub region: String,
    pub safesearch: SafeSearch,
    pub summary_model: Option<String>,
    pub writer_model: Option<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            request_timeout_secs: 60,
            max_retries: 3,
            initial_delay_secs: 5.0,
            scrape_concurrency: 1,
            region: "wt-wt".to_string(),
            safesearch: SafeSearch::Moderate,
            summary_model: None,
            writer_model: None,
        }
    }
}

impl FileConfig {
    /// Load a settings file. Missing keys fall back to [`FileConfig::default`].
    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&raw)?;
        info!(path, "Loaded settings file");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// Backoff parameters for the search provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_retries: usize,
    /// Wait before the second attempt; doubles for each further attempt.
    pub initial_delay: Duration,
}

/// Everything a single pipeline run is parameterized by.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub use_case: UseCase,
    pub search_results: usize,
    pub summary_words: usize,
    pub draft_words: usize,
    pub summary_model: String,
    pub writer_model: String,
    pub retry: RetryConfig,
    pub request_timeout: Duration,
    pub scrape_concurrency: usize,
    pub api_base: String,
    pub api_key: Option<String>,
    pub region: String,
    pub safesearch: SafeSearch,
}

impl Settings {
    /// Settings for `use_case` with its preset budgets and the file's service options.
    ///
    /// # Arguments
    ///
    /// * `use_case` - Preset supplying the result count and word budgets
    /// * `file` - Service options from the settings file (or its defaults)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `initial_delay_secs` is negative, not a
    /// number, or too large to be a [`Duration`].
    pub fn new(use_case: UseCase, file: &FileConfig) -> Result<Self> {
        let preset = use_case.preset();
        let initial_delay = Duration::try_from_secs_f64(file.initial_delay_secs).map_err(|e| {
            Error::Config(format!("initial_delay_secs {}: {e}", file.initial_delay_secs))
        })?;
        Ok(Self {
            use_case,
            search_results: preset.search_results,
            summary_words: preset.summary_words,
            draft_words: preset.draft_words,
            summary_model: file
                .summary_model
                .clone()
                .unwrap_or_else(|| SUMMARY_MODELS[0].to_string()),
            writer_model: file
                .writer_model
                .clone()
                .unwrap_or_else(|| WRITER_MODELS[0].to_string()),
            retry: RetryConfig {
                max_retries: file.max_retries,
                initial_delay,
            },
            request_timeout: Duration::from_secs(file.request_timeout_secs),
            scrape_concurrency: file.scrape_concurrency,
            api_base: file.api_base.trim_end_matches('/').to_string(),
            api_key: file.api_key.clone(),
            region: file.region.clone(),
            safesearch: file.safesearch,
        })
    }

    /// Switch use case, resetting the budgets to the new preset.
    pub fn apply_use_case(&mut self, use_case: UseCase) {
        let preset = use_case.preset();
        self.use_case = use_case;
        self.search_results = preset.search_results;
        self.summary_words = preset.summary_words;
        self.draft_words = preset.draft_words;
    }

    pub fn validate(&self) -> Result<()> {
        check_range("search results", self.search_results, &SEARCH_RESULTS_RANGE)?;
        check_range("summary words", self.summary_words, &SUMMARY_WORDS_RANGE)?;
        check_range("draft words", self.draft_words, &DRAFT_WORDS_RANGE)?;
        if self.retry.max_retries == 0 {
            return Err(Error::Config("max_retries must be at least 1".to_string()));
        }
        if self.scrape_concurrency == 0 {
            return Err(Error::Config("scrape_concurrency must be at least 1".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request_timeout_secs must be positive".to_string()));
        }
        if self.summary_model.trim().is_empty() || self.writer_model.trim().is_empty() {
            return Err(Error::Config("model identifiers must not be empty".to_string()));
        }
        url::Url::parse(&self.api_base)
            .map_err(|e| Error::Config(format!("api_base {:?}: {e}", self.api_base)))?;
        Ok(())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("use_case", &self.use_case)
            .field("search_results", &self.search_results)
            .field("summary_words", &self.summary_words)
            .field("draft_words", &self.draft_words)
            .field("summary_model", &self.summary_model)
            .field("writer_model", &self.writer_model)
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .field("scrape_concurrency", &self.scrape_concurrency)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("safesearch", &self.safesearch)
            .finish()
    }
}

fn check_range(name: &str, value: usize, range: &RangeInclusive<usize>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )))
    }
}

/// Whether `model` is one of the known choices in `known`.
pub fn is_known_model(model: &str, known: &[&str]) -> bool {
    known.contains(&model)
}
