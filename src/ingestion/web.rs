//! URL fetching and HTML main-content extraction

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{SourceInfo, SourceKind};

use super::extractor::Extraction;

/// Fixed timeout for URL fetches
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Some sites refuse requests without a browser-like user agent
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Tried in order for the main content; `body` is the fallback
const CONTENT_SELECTORS: &[&str] = &["main", "article", ".content", "#content", ".post", ".entry"];

/// Elements whose text never belongs in the extraction
const STRIP_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Fetches web pages and reduces them to readable text
pub struct UrlFetcher {
    client: reqwest::Client,
}

impl UrlFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    /// Fetch `url` and extract its main content as plain text
    pub async fn fetch(&self, url: &str) -> Result<Extraction> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::fetch(url, format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::fetch(url, e.to_string()))?;

        Ok(extract_html(url, &body))
    }
}

impl Default for UrlFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract readable text and a title from an HTML document
pub fn extract_html(url: &str, html: &str) -> Extraction {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.to_string());

    let root = content_root(&document);
    let mut raw = String::new();
    collect_text(root, &mut raw);

    Extraction {
        text: collapse_whitespace(&raw),
        info: SourceInfo {
            source: url.to_string(),
            kind: SourceKind::Webpage,
            title: Some(title),
        },
    }
}

/// First matching content selector, then `body`, then the document root
fn content_root(document: &Html) -> ElementRef<'_> {
    for selector in CONTENT_SELECTORS {
        if let Ok(sel) = Selector::parse(selector) {
            if let Some(element) = document.select(&sel).next() {
                return element;
            }
        }
    }
    Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element())
}

/// Collect text nodes under `root`, skipping anything inside a stripped tag
fn collect_text(root: ElementRef<'_>, out: &mut String) {
    for node in root.descendants() {
        if let Some(text) = node.value().as_text() {
            let stripped = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map_or(false, |el| STRIP_TAGS.contains(&el.name()))
            });
            if !stripped {
                out.push_str(text);
                out.push('\n');
            }
        }
    }
}

/// Collapse whitespace runs containing a newline to one newline and
/// horizontal whitespace runs to one space, then trim.
fn collapse_whitespace(text: &str) -> String {
    let newline_runs = Regex::new(r"\s*\n\s*").expect("static regex");
    let space_runs = Regex::new(r"[ \t]+").expect("static regex");

    let text = newline_runs.replace_all(text, "\n");
    space_runs.replace_all(&text, " ").trim().to_string()
}
