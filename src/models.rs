//! Data models that flow between pipeline stages.
//!
//! - [`SearchResult`]: a candidate article as returned by the search provider
//! - [`CollectedArticle`]: a search result whose full text was scraped
//! - [`SummaryBlock`] / [`NewsSummary`]: the bounded per-article summaries
//! - [`Draft`]: the structured text handed to the article writer
//! - [`FinalArticle`]: the append-only buffer filled by the generation stream
//! - [`RunReport`]: everything a completed run produced, for export

use crate::utils::word_count;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A news search hit. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchResult {
    /// Link to the full article; results without one cannot be collected.
    pub url: String,
    pub title: String,
    /// Publication date as reported by the provider (RFC 3339 when known).
    pub date: String,
    /// Short snippet shown by the provider, used as the introduction.
    pub body: String,
    /// Publisher name, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A search result enriched with its full scraped text.
///
/// Only built through [`CollectedArticle::new`], which refuses empty text;
/// deserialization goes through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawCollectedArticle")]
pub struct CollectedArticle {
    #[serde(flatten)]
    result: SearchResult,
    text: String,
}

impl CollectedArticle {
    /// Attach scraped text to a result. Returns `None` when the text is blank.
    pub fn new(result: SearchResult, text: String) -> Option<Self> {
        if text.trim().is_empty() {
            None
        } else {
            Some(Self { result, text })
        }
    }

    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    /// The scraped text; never blank.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_result(self) -> SearchResult {
        self.result
    }
}

#[derive(Deserialize)]
struct RawCollectedArticle {
    #[serde(flatten)]
    result: SearchResult,
    text: String,
}

impl TryFrom<RawCollectedArticle> for CollectedArticle {
    type Error = String;

    fn try_from(raw: RawCollectedArticle) -> Result<Self, Self::Error> {
        let url = raw.result.url.clone();
        Self::new(raw.result, raw.text).ok_or_else(|| format!("article {url} has no text"))
    }
}

/// One article's entry in the news summary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SummaryBlock {
    pub title: String,
    pub date: String,
    pub url: String,
    pub introduction: String,
    pub summary: String,
}

impl SummaryBlock {
    /// Build the block for `article` around an already length-capped summary.
    pub fn from_article(article: &CollectedArticle, summary: String) -> Self {
        Self {
            title: article.result().title.clone(),
            date: article.result().date.clone(),
            url: article.result().url.clone(),
            introduction: article.result().body.clone(),
            summary,
        }
    }

    /// Markdown rendering of the block, terminated by a horizontal rule.
    pub fn render(&self) -> String {
        format!(
            "### {}\n\n- Date: {}\n\n- URL: {}\n\n#### Introduction\n\n{}\n\n#### Summary\n\n{}\n\n---\n\n",
            self.title, self.date, self.url, self.introduction, self.summary
        )
    }
}

/// Ordered summary blocks and their concatenated rendering.
///
/// Block order is the order in which articles were processed, which is the
/// original search result order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsSummary {
    blocks: Vec<SummaryBlock>,
    text: String,
}

impl NewsSummary {
    pub fn push(&mut self, block: SummaryBlock) {
        self.text.push_str(&block.render());
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[SummaryBlock] {
        &self.blocks
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whitespace-delimited words across the whole rendering, headers included.
    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

/// The structured text handed to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Draft(String);

impl Draft {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append-only article buffer filled from the generation stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FinalArticle {
    text: String,
    complete: bool,
}

impl FinalArticle {
    /// Append a chunk. Ignored once the article is complete.
    pub fn push(&mut self, delta: &str) {
        if !self.complete {
            self.text.push_str(delta);
        }
    }

    /// Mark the stream as ended; the buffer is frozen from here on.
    pub fn finish(&mut self) {
        self.complete = true;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }
}

/// Everything produced by a completed run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunReport {
    pub use_case: String,
    pub topic: String,
    pub summary_model: String,
    pub writer_model: String,
    /// Local date the run started, `YYYY-MM-DD`.
    pub local_date: String,
    pub local_time: String,
    pub articles: Vec<CollectedArticle>,
    pub news_summary: NewsSummary,
    pub draft: Draft,
    pub article: FinalArticle,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(n: usize) -> SearchResult {
        SearchResult {
            url: format!("https://example.com/{n}"),
            title: format!("Title {n}"),
            date: "2025-05-06T10:00:00+00:00".to_string(),
            body: format!("Snippet {n}"),
            source: None,
        }
    }

    #[test]
    fn test_collected_article_rejects_blank_text() {
        assert!(CollectedArticle::new(result(1), "   \n".to_string()).is_none());
        let article = CollectedArticle::new(result(1), "Full text".to_string()).unwrap();
        assert_eq!(article.text(), "Full text");
    }

    #[test]
    fn test_collected_article_deserialize_rejects_blank_text() {
        let blank = r#"{"url":"https://example.com/1","title":"T","date":"","body":"","text":"  "}"#;
        assert!(serde_json::from_str::<CollectedArticle>(blank).is_err());

        let full = r#"{"url":"https://example.com/1","title":"T","date":"","body":"","text":"Body"}"#;
        let article: CollectedArticle = serde_json::from_str(full).unwrap();
        assert_eq!(article.text(), "Body");
        assert_eq!(article.result().url, "https://example.com/1");
    }

    #[test]
    fn test_collected_article_serializes_flat() {
        let article = CollectedArticle::new(result(2), "Body".to_string()).unwrap();
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["url"], "https://example.com/2");
        assert_eq!(json["text"], "Body");
        assert!(json.get("source").is_none());
    }

    #[test]
    fn test_summary_block_render() {
        let article = CollectedArticle::new(result(3), "Body".to_string()).unwrap();
        let block = SummaryBlock::from_article(&article, "Short summary".to_string());
        assert_eq!(
            block.render(),
            "### Title 3\n\n- Date: 2025-05-06T10:00:00+00:00\n\n- URL: https://example.com/3\n\n\
             #### Introduction\n\nSnippet 3\n\n#### Summary\n\nShort summary\n\n---\n\n"
        );
    }

    #[test]
    fn test_news_summary_accumulates_in_order() {
        let mut summary = NewsSummary::default();
        assert!(summary.is_empty());
        for n in 0..3 {
            let article = CollectedArticle::new(result(n), "Body".to_string()).unwrap();
            summary.push(SummaryBlock::from_article(&article, format!("summary {n}")));
        }
        assert_eq!(summary.blocks().len(), 3);
        let first = summary.as_str().find("Title 0").unwrap();
        let last = summary.as_str().find("Title 2").unwrap();
        assert!(first < last);
        assert_eq!(summary.word_count(), word_count(summary.as_str()));
    }

    #[test]
    fn test_final_article_is_append_only_until_finished() {
        let mut article = FinalArticle::default();
        article.push("Hello");
        article.push(", world");
        assert_eq!(article.as_str(), "Hello, world");
        article.finish();
        article.push("!");
        assert!(article.is_complete());
        assert_eq!(article.as_str(), "Hello, world");
    }
}
