use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::{
    configuration::SearchSettings,
    domain::result_link::extract_result_url,
};

const NO_RESULTS_MARKER: &str = "did not match any documents";

#[derive(Debug, Clone, PartialEq)]
pub enum GoogleSearchResult {
    NotFound,
    Links(Vec<String>),
    CaptchaBlocked,
}

#[async_trait]
pub trait LinkFinder: Send + Sync {
    /// At most `num_results` links, in the order the provider ranked them.
    async fn find_links(&self, query: &str, num_results: usize) -> GoogleSearchResult;
}

#[derive(Serialize)]
struct GoogleQuery<'a> {
    q: &'a str,
    num: usize,
    hl: &'static str,
}

pub struct GoogleScraper {
    url: String,
    timeout: Duration,
    attempts: u8,
    proxies: Vec<String>,
}

impl GoogleScraper {
    pub fn new(settings: &SearchSettings) -> Self {
        GoogleScraper {
            url: settings.base_url.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            attempts: settings.captcha_retries.max(1),
            proxies: settings.proxies.clone(),
        }
    }

    fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(fake_user_agent::get_rua())
            .read_timeout(self.timeout)
            .cookie_store(true);

        if let Some(proxy) = self.proxies.choose(&mut rand::thread_rng()) {
            builder = builder
                .proxy(reqwest::Proxy::http(proxy)?)
                .proxy(reqwest::Proxy::https(proxy)?);
        }

        builder.build()
    }
}

#[async_trait]
impl LinkFinder for GoogleScraper {
    async fn find_links(&self, query: &str, num_results: usize) -> GoogleSearchResult {
        let google_query = GoogleQuery {
            q: query,
            // Ads and widgets eat into the page, ask for a couple extra
            num: num_results + 2,
            hl: "en",
        };

        let mut retry_count = 0;

        while retry_count < self.attempts {
            retry_count += 1;

            let client = match self.build_client() {
                Ok(client) => client,
                Err(e) => {
                    log::error!("Failed to build search client. Error: {:?}", e);
                    continue;
                }
            };

            let html_content = match client.get(&self.url).query(&google_query).send().await {
                Ok(res) => match res.text().await {
                    Ok(text) => text,
                    Err(e) => {
                        log::error!("Failed to parse text from html_content. Error: {:?}", e);
                        continue;
                    }
                },
                Err(e) => {
                    log::error!("No response from reqwest, error: {:?}", e);
                    continue;
                }
            };

            match parse_search_page(&html_content, num_results) {
                GoogleSearchResult::CaptchaBlocked => {
                    log::error!(
                        "Blocked by captcha on query: {} (attempt {}/{})",
                        query,
                        retry_count,
                        self.attempts
                    );
                }
                GoogleSearchResult::NotFound => {
                    log::error!("Found no results on query: {}", query);
                    return GoogleSearchResult::NotFound;
                }
                GoogleSearchResult::Links(links) => {
                    log::info!("Found {} result links for query: {}", links.len(), query);
                    return GoogleSearchResult::Links(links);
                }
            }
        }

        GoogleSearchResult::CaptchaBlocked
    }
}

/// Reads result links off a search results page. A result is a heading
/// wrapped in an anchor; the anchor's target is the link.
pub fn parse_search_page(html_content: &str, num_results: usize) -> GoogleSearchResult {
    let h3_selector = match Selector::parse("h3") {
        Ok(selector) => selector,
        Err(_) => return GoogleSearchResult::CaptchaBlocked,
    };
    let html_document = Html::parse_document(html_content);

    let headings: Vec<ElementRef> = html_document.select(&h3_selector).collect();

    if headings.is_empty() {
        return match html_content.contains(NO_RESULTS_MARKER) {
            true => GoogleSearchResult::NotFound,
            false => GoogleSearchResult::CaptchaBlocked,
        };
    }

    let links: Vec<String> = headings
        .into_iter()
        .filter_map(|heading| {
            heading
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|element| element.value().name() == "a")
                .and_then(|a_tag| a_tag.value().attr("href"))
                .and_then(extract_result_url)
        })
        .take(num_results)
        .collect();

    GoogleSearchResult::Links(links)
}
