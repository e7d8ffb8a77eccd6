//! Long-lived session state around single-use pipelines.
//!
//! A [`Session`] owns the current [`Settings`] and the history of finished
//! runs. Every run builds a fresh [`Pipeline`] from the settings as they are
//! at that moment, so changing a model or use case only affects later runs;
//! the history is never reset.
//!
//! Interactive input is parsed into [`Command`]s. A line that does not start
//! with `:` is a topic; an empty line means the use case's default topic.

use crate::api::{ArticleSummarizer, ArticleWriter, ChatClient, Generator, Summarizer};
use crate::config::{SUMMARY_MODELS, Settings, UseCase, WRITER_MODELS, is_known_model};
use crate::error::{Error, Result};
use crate::observer::Observer;
use crate::pipeline::{Pipeline, RunOutcome};
use crate::scrapers::Scraper;
use crate::scrapers::article::HtmlArticleScraper;
use crate::search::SearchProvider;
use crate::search::duckduckgo::DuckDuckGoNews;
use crate::utils::word_count;
use chrono::Local;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use tracing::{info, instrument, warn};

/// Builds the collaborators of a pipeline from settings.
pub trait Backends {
    type Provider: SearchProvider;
    type Scraper: Scraper;
    type Summarizer: Summarizer;
    type Generator: Generator;

    #[allow(clippy::type_complexity)]
    fn pipeline(
        &self,
        settings: &Settings,
    ) -> Result<Pipeline<Self::Provider, Self::Scraper, Self::Summarizer, Self::Generator>>;
}

/// DuckDuckGo News, HTTP scraping, and the chat completion API.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveBackends;

impl Backends for LiveBackends {
    type Provider = DuckDuckGoNews;
    type Scraper = HtmlArticleScraper;
    type Summarizer = ArticleSummarizer;
    type Generator = ArticleWriter;

    fn pipeline(
        &self,
        settings: &Settings,
    ) -> Result<Pipeline<DuckDuckGoNews, HtmlArticleScraper, ArticleSummarizer, ArticleWriter>>
    {
        let provider =
            DuckDuckGoNews::new(settings.request_timeout, &settings.region, settings.safesearch)?;
        let scraper = HtmlArticleScraper::new(settings.request_timeout)?;
        let client = ChatClient::new(
            &settings.api_base,
            settings.api_key.clone(),
            settings.request_timeout,
        )?;
        let summarizer =
            ArticleSummarizer::new(client.clone(), &settings.summary_model, settings.summary_words);
        let writer = ArticleWriter::new(client, &settings.writer_model);
        Ok(Pipeline::new(
            settings.clone(),
            provider,
            scraper,
            summarizer,
            writer,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed { articles: usize, article_words: usize },
    NoNews,
    Failed { reason: String },
}

/// One finished run, as kept in the session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub topic: String,
    pub use_case: UseCase,
    pub summary_model: String,
    pub writer_model: String,
    pub finished_at: String,
    pub status: RunStatus,
}

impl RunRecord {
    fn new(topic: &str, settings: &Settings, outcome: &Result<RunOutcome>) -> Self {
        let status = match outcome {
            Ok(RunOutcome::Completed(report)) => RunStatus::Completed {
                articles: report.articles.len(),
                article_words: word_count(report.article.as_str()),
            },
            Ok(RunOutcome::NoNews { .. }) => RunStatus::NoNews,
            Err(e) => RunStatus::Failed {
                reason: e.to_string(),
            },
        };
        Self {
            topic: topic.to_string(),
            use_case: settings.use_case,
            summary_model: settings.summary_model.clone(),
            writer_model: settings.writer_model.clone(),
            finished_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            status,
        }
    }
}

impl fmt::Display for RunRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}: ", self.finished_at, self.use_case, self.topic)?;
        match &self.status {
            RunStatus::Completed {
                articles,
                article_words,
            } => write!(f, "{article_words} words from {articles} articles"),
            RunStatus::NoNews => f.write_str("no news found"),
            RunStatus::Failed { reason } => write!(f, "failed ({reason})"),
        }?;
        write!(f, " ({} / {})", self.summary_model, self.writer_model)
    }
}

pub struct Session<B = LiveBackends> {
    backends: B,
    settings: Settings,
    history: Vec<RunRecord>,
}

impl<B> Session<B>
where
    B: Backends,
{
    pub fn new(backends: B, settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            backends,
            settings,
            history: Vec::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &[RunRecord] {
        &self.history
    }

    pub fn set_summary_model(&mut self, model: &str) -> Result<()> {
        self.settings.summary_model = checked_model(model, SUMMARY_MODELS, "summary")?;
        info!(model = %self.settings.summary_model, "Summary model changed");
        Ok(())
    }

    pub fn set_writer_model(&mut self, model: &str) -> Result<()> {
        self.settings.writer_model = checked_model(model, WRITER_MODELS, "writer")?;
        info!(model = %self.settings.writer_model, "Writer model changed");
        Ok(())
    }

    /// Switch use case. Budgets reset to the new preset; models are kept.
    pub fn set_use_case(&mut self, use_case: UseCase) {
        self.settings.apply_use_case(use_case);
        info!(%use_case, "Use case changed");
    }

    /// The topic a run will use for `input`: trimmed, or the preset default when blank.
    pub fn resolve_topic(&self, input: &str) -> String {
        let topic = input.trim();
        if topic.is_empty() {
            self.settings.use_case.preset().default_topic.to_string()
        } else {
            topic.to_string()
        }
    }

    /// Run a fresh pipeline for `topic` and record how it ended.
    #[instrument(level = "info", skip(self, observer))]
    pub async fn run(&mut self, topic: &str, observer: &dyn Observer) -> Result<RunOutcome> {
        let topic = self.resolve_topic(topic);
        let mut pipeline = self.backends.pipeline(&self.settings)?;
        let outcome = pipeline.run(&topic, observer).await;
        info!(state = ?pipeline.state(), runs = self.history.len() + 1, "Run ended");
        self.history
            .push(RunRecord::new(&topic, &self.settings, &outcome));
        outcome
    }
}

fn checked_model(model: &str, known: &[&str], role: &str) -> Result<String> {
    let model = model.trim();
    if model.is_empty() {
        return Err(Error::Config(format!("{role} model must not be empty")));
    }
    if !is_known_model(model, known) {
        warn!(model, role, known = ?known, "Unknown model; using it anyway");
    }
    Ok(model.to_string())
}

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Research and write about a topic; empty means the default topic.
    Run(String),
    SummaryModel(String),
    WriterModel(String),
    UseCase(UseCase),
    History,
    Help,
    Quit,
}

pub const HELP: &str = "\
Type a topic and press enter to write an article (empty line: default topic).
Commands:
  :summary-model <model>   change the summarizer model
  :writer-model <model>    change the article writer model
  :use-case <name>         business-news | travel-guides | research-papers | technology-trends
  :history                 list finished runs
  :help                    show this help
  :quit                    leave";

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Command::Run(line.to_string()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let required = |what: &str| {
            if arg.is_empty() {
                Err(Error::Config(format!(":{name} needs a {what}")))
            } else {
                Ok(arg.to_string())
            }
        };
        match name {
            "summary-model" => Ok(Command::SummaryModel(required("model")?)),
            "writer-model" => Ok(Command::WriterModel(required("model")?)),
            "use-case" => <UseCase as ValueEnum>::from_str(&required("use case")?, true)
                .map(Command::UseCase)
                .map_err(|e| Error::Config(format!(":use-case: {e}"))),
            "history" => Ok(Command::History),
            "help" | "h" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(Error::Config(format!("unknown command :{other} (try :help)"))),
        }
    }
}
