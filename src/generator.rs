//! Streaming article generation.
//!
//! The writer's chunk stream is drained into an append-only
//! [`FinalArticle`]; each chunk republishes the accumulated text so a
//! presentation layer can render the article as it is written. Dropping the
//! future returned by [`StreamingGenerator::generate`] drops the stream and
//! with it the underlying connection.

use crate::api::Generator;
use crate::error::Result;
use crate::models::{Draft, FinalArticle};
use crate::observer::{Observer, Progress};
use futures::StreamExt;
use std::time::Instant;
use tracing::{info, instrument, warn};

pub struct StreamingGenerator<G> {
    generator: G,
}

impl<G> StreamingGenerator<G>
where
    G: Generator,
{
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &G {
        &self.generator
    }

    /// Stream the article for `draft`.
    ///
    /// # Arguments
    ///
    /// * `draft` - Text handed to the writer model
    /// * `observer` - Receives a [`Progress::Article`] delta per chunk
    ///
    /// # Returns
    ///
    /// The complete article once the stream ends.
    ///
    /// # Errors
    ///
    /// Fails if the stream cannot be opened or yields an error; chunks
    /// received before the error are discarded with the partial article.
    #[instrument(level = "info", skip_all, fields(draft_bytes = draft.as_str().len()))]
    pub async fn generate(&self, draft: &Draft, observer: &dyn Observer) -> Result<FinalArticle> {
        let start = Instant::now();
        let mut chunks = self.generator.stream(draft.as_str()).await?;

        let mut article = FinalArticle::default();
        let mut received = 0usize;
        while let Some(chunk) = chunks.next().await {
            let delta = match chunk {
                Ok(delta) => delta,
                Err(e) => {
                    warn!(received, bytes = article.len(), error = %e, "Generation stream failed");
                    return Err(e);
                }
            };
            received += 1;
            article.push(&delta);
            observer.on_progress(Progress::Article {
                delta,
                bytes: article.len(),
            });
        }
        article.finish();

        info!(
            chunks = received,
            bytes = article.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Article generation complete"
        );
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::{FakeGenerator, RecordingObserver};
    use std::time::Duration;

    fn draft() -> Draft {
        Draft::new("# Business News: Acme Merger\n\n".to_string())
    }

    #[tokio::test]
    async fn test_accumulates_chunks_in_order() {
        let observer = RecordingObserver::default();
        let stage = StreamingGenerator::new(FakeGenerator::chunks(&["Acme ", "buys ", "Globex."]));

        let article = stage.generate(&draft(), &observer).await.unwrap();

        assert_eq!(article.as_str(), "Acme buys Globex.");
        assert!(article.is_complete());
        assert_eq!(stage.generator.last_draft().as_deref(), Some(draft().as_str()));
        assert_eq!(
            observer.progress(),
            vec![
                Progress::Article {
                    delta: "Acme ".to_string(),
                    bytes: 5
                },
                Progress::Article {
                    delta: "buys ".to_string(),
                    bytes: 10
                },
                Progress::Article {
                    delta: "Globex.".to_string(),
                    bytes: 17
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_stream_gives_complete_empty_article() {
        let observer = RecordingObserver::default();
        let stage = StreamingGenerator::new(FakeGenerator::chunks(&[]));
        let article = stage.generate(&draft(), &observer).await.unwrap();
        assert!(article.is_complete());
        assert_eq!(article.len(), 0);
    }

    #[tokio::test]
    async fn test_stream_error_is_fatal() {
        let observer = RecordingObserver::default();
        let stage = StreamingGenerator::new(FakeGenerator::chunks(&["Acme"]).failing_after_chunks());

        let err = stage.generate(&draft(), &observer).await.unwrap_err();

        assert!(matches!(err, Error::Generation(_)));
        assert!(stage.generator.released());
    }

    #[tokio::test]
    async fn test_refused_stream_is_fatal() {
        let observer = RecordingObserver::default();
        let stage = StreamingGenerator::new(FakeGenerator::chunks(&["x"]).refusing());
        assert!(stage.generate(&draft(), &observer).await.is_err());
        assert!(observer.progress().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_run_releases_the_stream() {
        let observer = RecordingObserver::default();
        let stage = StreamingGenerator::new(FakeGenerator::chunks(&["Acme "]).endless());

        let outcome =
            tokio::time::timeout(Duration::from_secs(1), stage.generate(&draft(), &observer)).await;

        assert!(outcome.is_err());
        assert!(stage.generator.released());
        assert_eq!(observer.progress().len(), 1);
    }
}
