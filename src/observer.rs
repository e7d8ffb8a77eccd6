//! Observer sink for non-fatal events and progressive snapshots.
//!
//! Pipeline stages never talk to a presentation layer directly. They report
//! warnings, errors, and immutable progress snapshots through an
//! [`Observer`], and whatever is attached decides how to show them.
//!
//! # Implementations
//!
//! | Type | Behavior |
//! |------|----------|
//! | [`TracingObserver`] | Logs every event through `tracing` |
//! | [`ChannelObserver`] | Forwards events over an unbounded `tokio` channel |
//! | [`Fanout`] | Sends each event to several observers in order |
//!
//! [`render`] is the terminal consumer used by the binary: it streams the
//! article to stdout as snapshots arrive.

use crate::models::CollectedArticle;
use crate::pipeline::PipelineState;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

/// Immutable snapshot of a long-running stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// The controller entered a new state.
    Stage(PipelineState),
    /// Articles collected so far, in search result order.
    Collected(Vec<CollectedArticle>),
    /// The news summary text accumulated so far.
    Summary(String),
    /// The assembled draft.
    Draft(String),
    /// A newly generated piece of the article and the article's length
    /// in bytes once it is appended.
    Article { delta: String, bytes: usize },
}

/// Sink for events that must be surfaced but never abort a run.
pub trait Observer: Send + Sync {
    fn on_warning(&self, message: &str);
    fn on_error(&self, message: &str);
    fn on_progress(&self, progress: Progress);
}

impl<T: Observer + ?Sized> Observer for std::sync::Arc<T> {
    fn on_warning(&self, message: &str) {
        (**self).on_warning(message);
    }

    fn on_error(&self, message: &str) {
        (**self).on_error(message);
    }

    fn on_progress(&self, progress: Progress) {
        (**self).on_progress(progress);
    }
}

/// One observed event, as carried by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Warning(String),
    Error(String),
    Progress(Progress),
}

/// Logs events with `tracing`. Snapshots are logged by size only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_warning(&self, message: &str) {
        warn!("{message}");
    }

    fn on_error(&self, message: &str) {
        error!("{message}");
    }

    fn on_progress(&self, progress: Progress) {
        match progress {
            Progress::Stage(state) => info!(?state, "Pipeline state changed"),
            Progress::Collected(articles) => debug!(count = articles.len(), "Collected articles"),
            Progress::Summary(text) => debug!(bytes = text.len(), "News summary updated"),
            Progress::Draft(text) => debug!(bytes = text.len(), "Draft assembled"),
            Progress::Article { bytes, .. } => debug!(bytes, "Article updated"),
        }
    }
}

/// Forwards events to a receiver owned by the presentation layer.
///
/// Events sent after the receiver is dropped are discarded; the pipeline
/// keeps running.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<PipelineEvent>,
}

impl ChannelObserver {
    pub fn channel() -> (Self, UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }
}

impl Observer for ChannelObserver {
    fn on_warning(&self, message: &str) {
        self.send(PipelineEvent::Warning(message.to_string()));
    }

    fn on_error(&self, message: &str) {
        self.send(PipelineEvent::Error(message.to_string()));
    }

    fn on_progress(&self, progress: Progress) {
        self.send(PipelineEvent::Progress(progress));
    }
}

/// Delivers each event to every inner observer.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Box<dyn Observer>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl Observer + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl Observer for Fanout {
    fn on_warning(&self, message: &str) {
        for sink in &self.sinks {
            sink.on_warning(message);
        }
    }

    fn on_error(&self, message: &str) {
        for sink in &self.sinks {
            sink.on_error(message);
        }
    }

    fn on_progress(&self, progress: Progress) {
        for sink in &self.sinks {
            sink.on_progress(progress.clone());
        }
    }
}

/// Terminal presentation: streams the article body to stdout.
///
/// Returns when every sender is gone.
pub async fn render(rx: UnboundedReceiver<PipelineEvent>) -> std::io::Result<()> {
    render_to(rx, tokio::io::stdout()).await
}

async fn render_to<W>(mut rx: UnboundedReceiver<PipelineEvent>, mut out: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut printed = false;

    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::Progress(Progress::Collected(articles)) => {
                if let Some(last) = articles.last() {
                    info!(count = articles.len(), title = %last.result().title, "Read article");
                }
            }
            PipelineEvent::Progress(Progress::Article { delta, .. }) => {
                out.write_all(delta.as_bytes()).await?;
                out.flush().await?;
                printed = true;
            }
            PipelineEvent::Progress(Progress::Stage(_))
            | PipelineEvent::Progress(Progress::Summary(_))
            | PipelineEvent::Progress(Progress::Draft(_))
            | PipelineEvent::Warning(_)
            | PipelineEvent::Error(_) => {}
        }
    }
    if printed {
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}
