//! Full-text extraction for collected search results.
//!
//! A [`Scraper`] downloads one article page and returns its readable body.
//! The collector calls it once per search result and treats every failure as
//! a per-item problem: the article is dropped and the run continues.
//!
//! # Implementations
//!
//! | Scraper | Module | Method |
//! |---------|--------|--------|
//! | Generic news page | [`article`] | HTML paragraphs inside the main content container |

pub mod article;

use crate::error::Result;

/// The readable part of an article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedPage {
    /// Document `<title>`, when present.
    pub title: Option<String>,
    /// Paragraph text separated by blank lines.
    pub text: String,
}

/// Fetches and extracts article text from a URL.
pub trait Scraper {
    async fn extract(&self, url: &str) -> Result<ScrapedPage>;
}
