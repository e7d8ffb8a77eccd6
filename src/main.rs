//! # Topic News Writer
//!
//! Researches a topic in the news and writes an article about it: search
//! results are fetched, the readable articles are scraped and summarized
//! within a word budget, and an LLM writes the final article from a draft
//! built around those summaries. The article streams to stdout as it is
//! written.
//!
//! ## Usage
//!
//! ```sh
//! topic_news_writer --topic "Acme Merger" -o ./articles
//! topic_news_writer --interactive
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Retrieving**: News search with exponential backoff on rate limits
//! 2. **Collecting**: Scrape the full text of each result, dropping failures
//! 3. **Summarizing**: Per-article summaries under a total word budget
//! 4. **Drafting**: Title and summary section for the writer
//! 5. **Generating**: Stream the final article from the writer model
//!
//! Logs go to stderr; stdout carries only the article.

use clap::Parser;
use std::error::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod collector;
mod config;
mod draft;
mod error;
mod generator;
mod models;
mod observer;
mod outputs;
mod pipeline;
mod retry;
mod scrapers;
mod search;
mod session;
mod summarizer;
#[cfg(test)]
mod testing;
mod utils;

use cli::Cli;
use config::FileConfig;
use observer::{ChannelObserver, Fanout, TracingObserver};
use outputs::{json, markdown};
use pipeline::RunOutcome;
use session::{Command, HELP, LiveBackends, Session};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("topic_news_writer starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(use_case = %args.use_case, ?args.topic, ?args.output_dir, "Parsed CLI arguments");

    let file = match &args.config {
        Some(path) => FileConfig::load(path).await.map_err(|e| {
            error!(path = %path, error = %e, "Failed to load settings file");
            e
        })?,
        None => FileConfig::default(),
    };
    let settings = args.settings(&file).map_err(|e| {
        error!(error = %e, "Invalid settings file");
        e
    })?;
    debug!(?settings, "Resolved settings");
    if settings.api_key.is_none() {
        warn!("No API key configured; set GROQ_API_KEY or api_key in the settings file");
    }

    if let Some(dir) = &args.output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory not writable");
            return Err(e);
        }
    }

    let mut session = Session::new(LiveBackends, settings).map_err(|e| {
        error!(error = %e, "Invalid settings");
        e
    })?;

    if args.interactive {
        interactive(&mut session, args.output_dir.as_deref()).await?;
    } else {
        let topic = args.topic.clone().unwrap_or_default();
        run_once(&mut session, &topic, args.output_dir.as_deref()).await?;
    }

    info!(
        runs = session.history().len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Finished"
    );
    Ok(())
}

/// Run one topic, streaming the article to stdout. Ctrl-C abandons the run.
#[instrument(level = "info", skip(session, output_dir))]
async fn run_once(
    session: &mut Session,
    topic: &str,
    output_dir: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let (channel, rx) = ChannelObserver::channel();
    let observer = Fanout::new().with(TracingObserver).with(channel);
    let renderer = tokio::spawn(observer::render(rx));

    let outcome = tokio::select! {
        outcome = session.run(topic, &observer) => Some(outcome),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; abandoning the run");
            None
        }
    };
    // closes the channel so the renderer can finish
    drop(observer);
    renderer.await??;

    match outcome {
        None => Ok(()),
        Some(Ok(RunOutcome::NoNews { message })) => {
            println!("{message}");
            Ok(())
        }
        Some(Ok(RunOutcome::Completed(report))) => {
            if let Some(dir) = output_dir {
                let md_path = markdown::write_article(&report, dir).await?;
                let json_path = json::write_report(&report, dir).await?;
                info!(%md_path, %json_path, "Saved article");
            }
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
    }
}

/// Read topics and commands from stdin until `:quit`, EOF, or Ctrl-C.
async fn interactive(session: &mut Session, output_dir: Option<&str>) -> Result<(), Box<dyn Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stderr = tokio::io::stderr();
    stderr.write_all(format!("{HELP}\n").as_bytes()).await?;

    loop {
        let preset = session.settings().use_case.preset();
        let prompt = format!(
            "\n[{}] {} (default: {})\n> ",
            session.settings().use_case,
            preset.prompt_placeholder,
            preset.default_topic
        );
        stderr.write_all(prompt.as_bytes()).await?;
        stderr.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "Invalid command");
                continue;
            }
        };
        match command {
            Command::Quit => break,
            Command::Help => stderr.write_all(format!("{HELP}\n").as_bytes()).await?,
            Command::History => {
                if session.history().is_empty() {
                    stderr.write_all(b"No runs yet.\n").await?;
                }
                for record in session.history() {
                    stderr.write_all(format!("{record}\n").as_bytes()).await?;
                }
            }
            Command::SummaryModel(model) => {
                if let Err(e) = session.set_summary_model(&model) {
                    warn!(error = %e, "Summary model unchanged");
                }
            }
            Command::WriterModel(model) => {
                if let Err(e) = session.set_writer_model(&model) {
                    warn!(error = %e, "Writer model unchanged");
                }
            }
            Command::UseCase(use_case) => session.set_use_case(use_case),
            Command::Run(topic) => {
                if let Err(e) = run_once(session, &topic, output_dir).await {
                    error!(error = %e, "Run failed");
                }
            }
        }
    }

    info!(runs = session.history().len(), "Leaving interactive session");
    Ok(())
}
