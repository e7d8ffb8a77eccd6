//! Generic news article scraper.
//!
//! Publishers share no markup, so extraction is heuristic: the paragraphs of
//! the first container that has any are taken as the article body. The
//! containers are tried from most to least specific:
//!
//! 1. `article`
//! 2. `[itemprop=articleBody]`
//! 3. `main`
//! 4. `body`

use super::{ScrapedPage, Scraper};
use crate::error::{Error, Result};
use itertools::Itertools;
use once_cell::sync::Lazy;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static CONTAINER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", "[itemprop=articleBody]", "main", "body"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

/// Scrapes article pages over HTTP.
#[derive(Debug, Clone)]
pub struct HtmlArticleScraper {
    client: Client,
}

impl HtmlArticleScraper {
    /// Build a scraper whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

impl Scraper for HtmlArticleScraper {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<ScrapedPage> {
        let scrape_err = |reason: String| Error::Scrape {
            url: url.to_string(),
            reason,
        };

        let parsed = Url::parse(url).map_err(|e| scrape_err(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(scrape_err(format!("unsupported scheme {}", parsed.scheme())));
        }

        let resp = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| scrape_err(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(scrape_err(format!("HTTP {status}")));
        }
        if let Some(content_type) = resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            if !content_type.contains("html") {
                return Err(scrape_err(format!("not an HTML page ({content_type})")));
            }
        }
        let body = resp.text().await.map_err(|e| scrape_err(e.to_string()))?;

        let page = parse_article(&body);
        if page.text.trim().is_empty() {
            return Err(Error::EmptyArticle(url.to_string()));
        }
        info!(bytes = page.text.len(), "Parsed article");
        Ok(page)
    }
}

/// Extract the title and body paragraphs from an HTML document.
pub fn parse_article(html: &str) -> ScrapedPage {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| normalize(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let mut paragraphs = Vec::new();
    for container_selector in CONTAINER_SELECTORS.iter() {
        paragraphs = document
            .select(container_selector)
            .flat_map(|container| container.select(&PARAGRAPH_SELECTOR))
            .map(|p| normalize(&p.text().collect::<String>()))
            .filter(|p| !p.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            break;
        }
    }
    debug!(paragraphs = paragraphs.len(), "Extracted paragraphs");

    ScrapedPage {
        title,
        text: paragraphs.join("\n\n"),
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().join(" ")
}
