//! Command-line interface definitions for the topic news writer.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The API key and base URL can also come from environment variables.

use crate::config::{
    FileConfig, SUMMARY_MODELS, SafeSearch, Settings, UseCase, WRITER_MODELS, is_known_model,
};
use crate::error::Result;
use clap::Parser;
use tracing::warn;

/// Command-line arguments.
///
/// Budgets default to the selected use case's preset; the flags below
/// override them for this invocation only.
///
/// # Examples
///
/// ```sh
/// # One article with the Business News preset
/// topic_news_writer --topic "Acme Merger" -o ./articles
///
/// # Research papers with a larger search
/// topic_news_writer -u research-papers --topic "Graph neural networks" --search-results 20
///
/// # Interactive session
/// topic_news_writer --interactive
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Kind of article to write
    #[arg(short, long, value_enum, default_value_t = UseCase::BusinessNews)]
    pub use_case: UseCase,

    /// Topic to research (defaults to the use case's default topic)
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Number of search results to request (3-20)
    #[arg(long, value_parser = clap::value_parser!(u16).range(3..=20))]
    pub search_results: Option<u16>,

    /// Per-article summary length in words (100-2000)
    #[arg(long, value_parser = clap::value_parser!(u16).range(100..=2000))]
    pub summary_words: Option<u16>,

    /// Total news summary budget in words (1000-10000)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1000..=10000))]
    pub draft_words: Option<u16>,

    /// Model used to summarize each article
    #[arg(long)]
    pub summary_model: Option<String>,

    /// Model used to write the final article
    #[arg(long)]
    pub writer_model: Option<String>,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// API key for the chat completion endpoint
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_API_BASE")]
    pub api_base: Option<String>,

    /// DuckDuckGo safe-search level (overrides the settings file)
    #[arg(long, value_enum)]
    pub safesearch: Option<SafeSearch>,

    /// Directory for the Markdown article and JSON run report
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Read topics and commands from stdin until `:quit`
    #[arg(short, long)]
    pub interactive: bool,
}

impl Cli {
    /// Layer the flags over the use-case preset and the settings file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Config`] when the settings file holds a
    /// value that cannot be represented (see [`Settings::new`]).
    pub fn settings(&self, file: &FileConfig) -> Result<Settings> {
        let mut settings = Settings::new(self.use_case, file)?;

        if let Some(n) = self.search_results {
            settings.search_results = n.into();
        }
        if let Some(n) = self.summary_words {
            settings.summary_words = n.into();
        }
        if let Some(n) = self.draft_words {
            settings.draft_words = n.into();
        }
        if let Some(model) = &self.summary_model {
            if !is_known_model(model, SUMMARY_MODELS) {
                warn!(%model, "Unknown summary model; using it anyway");
            }
            settings.summary_model = model.clone();
        }
        if let Some(model) = &self.writer_model {
            if !is_known_model(model, WRITER_MODELS) {
                warn!(%model, "Unknown writer model; using it anyway");
            }
            settings.writer_model = model.clone();
        }
        if let Some(key) = &self.api_key {
            settings.api_key = Some(key.clone());
        }
        if let Some(base) = &self.api_base {
            settings.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(level) = self.safesearch {
            settings.safesearch = level;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["topic_news_writer"]);

        assert_eq!(cli.use_case, UseCase::BusinessNews);
        assert_eq!(cli.topic, None);
        assert!(!cli.interactive);

        let settings = cli.settings(&FileConfig::default()).unwrap();
        assert_eq!(settings.search_results, 7);
        assert_eq!(settings.summary_words, 800);
        assert_eq!(settings.draft_words, 5000);
        assert_eq!(settings.summary_model, SUMMARY_MODELS[0]);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "topic_news_writer",
            "-u",
            "travel-guides",
            "-t",
            "Lisbon",
            "-o",
            "/tmp/articles",
            "-i",
        ]);

        assert_eq!(cli.use_case, UseCase::TravelGuides);
        assert_eq!(cli.topic.as_deref(), Some("Lisbon"));
        assert_eq!(cli.output_dir.as_deref(), Some("/tmp/articles"));
        assert!(cli.interactive);
    }

    #[test]
    fn test_cli_overrides_preset() {
        let cli = Cli::parse_from([
            "topic_news_writer",
            "--use-case",
            "research-papers",
            "--search-results",
            "20",
            "--draft-words",
            "1000",
            "--writer-model",
            "mixtral-8x7b-32768",
            "--api-base",
            "http://localhost:8080/v1/",
        ]);

        let settings = cli.settings(&FileConfig::default()).unwrap();

        assert_eq!(settings.search_results, 20);
        assert_eq!(settings.summary_words, 1200);
        assert_eq!(settings.draft_words, 1000);
        assert_eq!(settings.writer_model, "mixtral-8x7b-32768");
        assert_eq!(settings.api_base, "http://localhost:8080/v1");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_cli_rejects_out_of_range_budgets() {
        assert!(Cli::try_parse_from(["topic_news_writer", "--search-results", "2"]).is_err());
        assert!(Cli::try_parse_from(["topic_news_writer", "--search-results", "21"]).is_err());
        assert!(Cli::try_parse_from(["topic_news_writer", "--summary-words", "99"]).is_err());
        assert!(Cli::try_parse_from(["topic_news_writer", "--draft-words", "10001"]).is_err());
        assert!(Cli::try_parse_from(["topic_news_writer", "--use-case", "cooking"]).is_err());
    }

    #[test]
    fn test_safesearch_flag_overrides_file() {
        let file = FileConfig {
            safesearch: SafeSearch::On,
            ..FileConfig::default()
        };
        let kept = Cli::parse_from(["topic_news_writer"]).settings(&file).unwrap();
        assert_eq!(kept.safesearch, SafeSearch::On);

        let cli = Cli::parse_from(["topic_news_writer", "--safesearch", "off"]);
        assert_eq!(cli.settings(&file).unwrap().safesearch, SafeSearch::Off);
        assert!(Cli::try_parse_from(["topic_news_writer", "--safesearch", "strict"]).is_err());
    }

    #[test]
    fn test_file_models_are_kept_without_flags() {
        let file = FileConfig {
            summary_model: Some("llama3-70b-8192".to_string()),
            ..FileConfig::default()
        };
        let settings = Cli::parse_from(["topic_news_writer"]).settings(&file).unwrap();
        assert_eq!(settings.summary_model, "llama3-70b-8192");
        assert_eq!(settings.writer_model, WRITER_MODELS[0]);
    }
}
