//! LLM API interaction for summarizing articles and writing the final piece.
//!
//! # Architecture
//!
//! - [`Summarizer`]: reduces one article's full text to a summary
//! - [`Generator`]: turns a draft into a lazy stream of text chunks
//! - [`ChatClient`]: OpenAI-compatible `/chat/completions` transport
//! - [`ArticleSummarizer`] / [`ArticleWriter`]: the two roles, each bound to
//!   a model identifier chosen by the session
//!
//! # Streaming
//!
//! Streaming completions are read as server-sent events. Each
//! `data: {...}` line carries a `choices[0].delta.content` fragment and
//! `data: [DONE]` ends the stream. The returned [`ChunkStream`] owns the
//! HTTP response, so dropping it before the end closes the connection.

use crate::error::{Error, Result};
use crate::utils::truncate_for_log;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Lazy, finite, non-restartable sequence of generated text fragments.
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// Reduces an article's full text to a summary.
pub trait Summarizer {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Expands a draft into the final article, chunk by chunk.
pub trait Generator {
    async fn stream(&self, draft: &str) -> Result<ChunkStream>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// One parsed server-sent event line.
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    Delta(String),
    Done,
    Failed(String),
    Skip,
}

fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(StreamChunk {
            error: Some(err), ..
        }) => SseLine::Failed(err.message),
        Ok(chunk) => {
            let delta: String = chunk
                .choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .collect();
            if delta.is_empty() {
                SseLine::Skip
            } else {
                SseLine::Delta(delta)
            }
        }
        Err(e) => {
            warn!(error = %e, line = %truncate_for_log(data, 200), "Unparseable stream event");
            SseLine::Skip
        }
    }
}

struct SseState<S> {
    bytes: S,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String>>,
    done: bool,
    idle_timeout: Duration,
}

impl<S> SseState<S> {
    /// Parse every complete line in the buffer. At end of input the
    /// remainder is treated as a final line.
    fn drain_lines(&mut self, at_end: bool) {
        loop {
            let line = match self.buffer.iter().position(|b| *b == b'\n') {
                Some(pos) => self.buffer.drain(..=pos).collect::<Vec<u8>>(),
                None if at_end && !self.buffer.is_empty() => std::mem::take(&mut self.buffer),
                None => return,
            };
            match parse_sse_line(String::from_utf8_lossy(&line).trim()) {
                SseLine::Delta(delta) => self.pending.push_back(Ok(delta)),
                SseLine::Done => {
                    self.done = true;
                    self.buffer.clear();
                    return;
                }
                SseLine::Failed(message) => {
                    self.pending.push_back(Err(Error::Generation(message)));
                    self.done = true;
                    self.buffer.clear();
                    return;
                }
                SseLine::Skip => {}
            }
        }
    }
}

/// Turn a raw server-sent event byte stream into text deltas.
///
/// Waiting longer than `idle_timeout` for the next network chunk ends the
/// stream with [`Error::Timeout`].
fn sse_deltas<S, E>(bytes: S, idle_timeout: Duration) -> ChunkStream
where
    S: Stream<Item = std::result::Result<Vec<u8>, E>> + Send + Unpin + 'static,
    E: Into<Error> + Send + 'static,
{
    let state = SseState {
        bytes,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        done: false,
        idle_timeout,
    };
    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match timeout(st.idle_timeout, st.bytes.next()).await {
                Err(_) => {
                    st.done = true;
                    st.pending.push_back(Err(Error::Timeout(st.idle_timeout)));
                }
                Ok(None) => {
                    st.drain_lines(true);
                    st.done = true;
                }
                Ok(Some(Err(e))) => {
                    st.done = true;
                    st.pending.push_back(Err(e.into()));
                }
                Ok(Some(Ok(chunk))) => {
                    st.buffer.extend_from_slice(&chunk);
                    st.drain_lines(false);
                }
            }
        }
    })
    .boxed()
}

/// Client for an OpenAI-compatible chat completion API.
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("http", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ChatClient {
    /// `timeout` bounds a whole non-streaming call, and the wait for each
    /// chunk of a streaming one.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    fn request(&self, body: &ChatRequest<'_>) -> RequestBuilder {
        let req = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(body);
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    /// Single-shot completion; returns the assistant message content.
    #[instrument(level = "info", skip(self, system, user))]
    pub async fn complete(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let t0 = Instant::now();
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            stream: false,
        };
        let resp = self.request(&body).timeout(self.timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }
        let parsed: ChatResponse = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        info!(
            elapsed_ms = t0.elapsed().as_millis(),
            bytes = content.len(),
            "Completion received"
        );
        Ok(content)
    }

    /// Streaming completion; returns once the response headers arrive.
    #[instrument(level = "info", skip(self, system, user))]
    pub async fn complete_stream(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<ChunkStream> {
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            stream: true,
        };
        let resp = timeout(self.timeout, self.request(&body).send())
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }
        debug!("Stream opened");
        let bytes = resp.bytes_stream().map(|r| r.map(|b| b.to_vec()));
        Ok(sse_deltas(Box::pin(bytes), self.timeout))
    }
}

fn summarizer_instructions(length: usize) -> String {
    format!(
        "You are a senior research writer. You will be given the full text of a news article.\n\
         Write an informative, factual summary of it in at most {length} words.\n\
         Keep names, figures, dates and quotes exactly as they appear in the article.\n\
         Respond with the summary only, in Markdown, without any preamble."
    )
}

const WRITER_INSTRUCTIONS: &str = "You are a senior editor at a major newspaper. You will be given a draft \
containing a title, a framing paragraph, and summaries of news articles between <news_summary> and \
</news_summary> tags.\n\
Write an engaging, well-structured and factual article based only on that material.\n\
Use Markdown headings, attribute claims to their sources, and finish with a References section \
listing the source URLs.\n\
Never invent facts that are not supported by the summaries.";

/// Summarizer role bound to a model and a target length.
#[derive(Debug, Clone)]
pub struct ArticleSummarizer {
    client: ChatClient,
    model: String,
    length: usize,
}

impl ArticleSummarizer {
    /// `length` is the target summary length in words, passed to the model
    /// as a hint. The hard cut is applied later by the budgeted summarizer.
    pub fn new(client: ChatClient, model: &str, length: usize) -> Self {
        Self {
            client,
            model: model.to_string(),
            length,
        }
    }
}

impl Summarizer for ArticleSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        self.client
            .complete(&self.model, &summarizer_instructions(self.length), text)
            .await
            .map_err(|e| Error::Summarization(e.to_string()))
    }
}

/// Writer role bound to a model.
#[derive(Debug, Clone)]
pub struct ArticleWriter {
    client: ChatClient,
    model: String,
}

impl ArticleWriter {
    pub fn new(client: ChatClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

impl Generator for ArticleWriter {
    async fn stream(&self, draft: &str) -> Result<ChunkStream> {
        let chunks = self
            .client
            .complete_stream(&self.model, WRITER_INSTRUCTIONS, draft)
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;
        Ok(chunks.map(|chunk| chunk.map_err(as_generation_error)).boxed())
    }
}

fn as_generation_error(e: Error) -> Error {
    match e {
        Error::Generation(_) => e,
        other => Error::Generation(other.to_string()),
    }
}
