//! DuckDuckGo News search.
//!
//! DuckDuckGo has no public news API. The front page embeds a per-query
//! `vqd` token which the `news.js` JSON endpoint requires; results are then
//! paged with the `s` offset until enough unique URLs are collected or the
//! response no longer advertises a next page.
//!
//! Rate limiting shows up as HTTP 202, 403, or 429 and is reported as
//! [`Error::RateLimited`].

use super::SearchProvider;
use crate::config::SafeSearch;
use crate::error::{Error, Result};
use crate::models::SearchResult;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::Html;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
const FRONT_PAGE_URL: &str = "https://duckduckgo.com/";
const NEWS_URL: &str = "https://duckduckgo.com/news.js";

static VQD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"vqd=["']?([0-9-]+)"#).unwrap());

#[derive(Debug, Deserialize)]
struct NewsPage {
    #[serde(default)]
    results: Vec<NewsItem>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    date: Option<i64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    source: Option<String>,
}

impl NewsItem {
    fn into_result(self) -> SearchResult {
        SearchResult {
            url: self.url.trim().to_string(),
            title: plain_text(&self.title),
            date: self
                .date
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            body: plain_text(&self.excerpt),
            source: self.source.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// DuckDuckGo News client.
#[derive(Debug, Clone)]
pub struct DuckDuckGoNews {
    client: Client,
    region: String,
    safesearch: SafeSearch,
}

impl DuckDuckGoNews {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration, region: &str, safesearch: SafeSearch) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            region: region.to_string(),
            safesearch,
        })
    }

    #[instrument(level = "debug", skip(self))]
    async fn vqd(&self, query: &str) -> Result<String> {
        let url = format!("{FRONT_PAGE_URL}?q={}", urlencoding::encode(query));
        let resp = self.client.get(&url).send().await?;
        check_status(resp.status())?;
        let body = resp.text().await?;
        extract_vqd(&body)
            .ok_or_else(|| Error::Provider(format!("no vqd token in response for {query:?}")))
    }
}

impl SearchProvider for DuckDuckGoNews {
    #[instrument(level = "info", skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let vqd = self.vqd(query).await?;
        let mut results: Vec<SearchResult> = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0usize;

        while results.len() < max_results {
            let offset_param = offset.to_string();
            let resp = self
                .client
                .get(NEWS_URL)
                .query(&[
                    ("l", self.region.as_str()),
                    ("o", "json"),
                    ("noamp", "1"),
                    ("q", query),
                    ("vqd", vqd.as_str()),
                    ("p", self.safesearch.code()),
                    ("s", offset_param.as_str()),
                ])
                .send()
                .await?;
            check_status(resp.status())?;
            let page: NewsPage = resp.json().await?;
            let page_len = page.results.len();
            debug!(offset, page_len, "Fetched news page");

            for item in page.results {
                let result = item.into_result();
                if !result.url.is_empty() && seen.insert(result.url.clone()) {
                    results.push(result);
                }
            }

            if page_len == 0 || page.next.is_none() {
                break;
            }
            offset += page_len;
        }

        results.truncate(max_results);
        info!(count = results.len(), "DuckDuckGo news search complete");
        Ok(results)
    }
}

fn check_status(status: StatusCode) -> Result<()> {
    match status.as_u16() {
        202 | 403 | 429 => Err(Error::RateLimited(status.to_string())),
        _ if !status.is_success() => Err(Error::Provider(format!("unexpected status {status}"))),
        _ => Ok(()),
    }
}

fn extract_vqd(body: &str) -> Option<String> {
    VQD_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Strip markup and decode entities from a provider-supplied fragment.
fn plain_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}
