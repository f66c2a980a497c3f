use std::time::Duration;

use async_trait::async_trait;
use itertools::Itertools;
use scraper::{ElementRef, Html, Node};
use thiserror::Error;

use crate::configuration::ScraperSettings;

const SKIP_TAGS: [&str; 6] = ["script", "style", "noscript", "template", "svg", "head"];

#[derive(Debug, Error)]
#[error("Error scraping {url}: {reason}")]
pub struct ScrapeError {
    pub url: String,
    pub reason: String,
}

#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape_text(&self, url: &str) -> Result<String, ScrapeError>;
}

pub struct HttpPageScraper {
    client: reqwest::Client,
    max_page_chars: usize,
}

impl HttpPageScraper {
    pub fn new(settings: &ScraperSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(fake_user_agent::get_rua())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(HttpPageScraper {
            client,
            max_page_chars: settings.max_page_chars,
        })
    }
}

#[async_trait]
impl PageScraper for HttpPageScraper {
    async fn scrape_text(&self, url: &str) -> Result<String, ScrapeError> {
        let failure = |reason: String| ScrapeError {
            url: url.to_string(),
            reason,
        };

        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| match e.is_timeout() {
                true => failure("request timed out".to_string()),
                false => failure(e.to_string()),
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(failure(format!("HTTP {}", status)));
        }

        let html_content = res.text().await.map_err(|e| failure(e.to_string()))?;
        let text = html_to_text(&html_content, self.max_page_chars);
        log::info!("Scraped {} chars from {}", text.chars().count(), url);

        Ok(text)
    }
}

/// Visible text of an HTML document: every text node trimmed, joined by
/// single spaces, cut to `max_chars` characters.
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let html_document = Html::parse_document(html);

    let mut pieces: Vec<String> = vec![];
    collect_text(html_document.root_element(), &mut pieces);

    pieces
        .iter()
        .flat_map(|piece| piece.split_whitespace())
        .join(" ")
        .chars()
        .take(max_chars)
        .collect()
}

fn collect_text(element: ElementRef, pieces: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    pieces.push(text.to_string());
                }
            }
            Node::Element(el) if SKIP_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, pieces);
                }
            }
            _ => {}
        }
    }
}
