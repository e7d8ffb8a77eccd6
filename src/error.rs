//! Error taxonomy shared by every pipeline stage.
//!
//! Collaborators (search provider, scraper, summarizer, generator) return
//! [`Result`] so that the stages can decide per call whether a failure is
//! retried, swallowed, or fatal for the run.

use std::time::Duration;
use thiserror::Error;

/// Failure raised by a pipeline collaborator or by the run itself.
#[derive(Error, Debug)]
pub enum Error {
    /// The search provider refused the request because of rate limiting.
    #[error("rate limited by search provider: {0}")]
    RateLimited(String),

    /// Any other search provider failure.
    #[error("search provider error: {0}")]
    Provider(String),

    /// The article page could not be fetched or parsed.
    #[error("could not scrape {url}: {reason}")]
    Scrape { url: String, reason: String },

    /// The article page was fetched but no readable text was found.
    #[error("no readable text at {0}")]
    EmptyArticle(String),

    /// The chat completion endpoint answered with a non-success status.
    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("summarization failed: {0}")]
    Summarization(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether the failure belongs to the rate-limit class.
    ///
    /// HTTP 429 responses surfaced through `reqwest` count as rate limiting
    /// even when the provider did not classify them itself.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Error::RateLimited(_) => true,
            Error::Http(e) => e.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
