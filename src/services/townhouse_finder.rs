use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    coordinate::Coordinate,
    result_table::ResultTable,
    townhouse::{PageOutcome, TownhouseRecord},
};

use super::{
    ExtractError, FieldExtractor, Geocoder, GoogleSearchResult, LinkFinder, PageScraper,
};

#[derive(Debug, Error)]
pub enum FinderError {
    #[error("Failed to reverse geocode address.")]
    AddressNotFound(Coordinate),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Found,
    NoResults,
    Blocked,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub link: String,
    pub outcome: PageOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinderReport {
    pub coordinate: Coordinate,
    pub address: String,
    pub search: SearchStatus,
    pub links: Vec<String>,
    pub pages: Vec<PageReport>,
}

impl FinderReport {
    /// Populated records, in link order.
    pub fn records(&self) -> impl Iterator<Item = &TownhouseRecord> {
        self.pages.iter().filter_map(|page| page.outcome.record())
    }

    pub fn table(&self) -> ResultTable {
        ResultTable::from_records(self.records())
    }
}

/// Geocode, search, then scrape and extract every link one after another.
#[derive(Clone)]
pub struct TownhouseFinder {
    geocoder: Arc<dyn Geocoder>,
    link_finder: Arc<dyn LinkFinder>,
    page_scraper: Arc<dyn PageScraper>,
    field_extractor: Arc<dyn FieldExtractor>,
    num_results: usize,
}

impl TownhouseFinder {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        link_finder: Arc<dyn LinkFinder>,
        page_scraper: Arc<dyn PageScraper>,
        field_extractor: Arc<dyn FieldExtractor>,
        num_results: usize,
    ) -> Self {
        TownhouseFinder {
            geocoder,
            link_finder,
            page_scraper,
            field_extractor,
            num_results,
        }
    }

    pub async fn find(&self, coordinate: Coordinate) -> Result<FinderReport, FinderError> {
        let address = self
            .geocoder
            .reverse_geocode(coordinate)
            .await
            .ok_or(FinderError::AddressNotFound(coordinate))?;

        let (search, links) = match self
            .link_finder
            .find_links(&address, self.num_results)
            .await
        {
            GoogleSearchResult::Links(links) => (
                SearchStatus::Found,
                links.into_iter().take(self.num_results).collect(),
            ),
            GoogleSearchResult::NotFound => (SearchStatus::NoResults, vec![]),
            GoogleSearchResult::CaptchaBlocked => (SearchStatus::Blocked, vec![]),
        };

        let mut pages = Vec::with_capacity(links.len());
        for link in links.iter() {
            let outcome = self.process_link(link).await;
            log::info!("{} -> {}", link, outcome.label());
            pages.push(PageReport {
                link: link.clone(),
                outcome,
            });
        }

        let report = FinderReport {
            coordinate,
            address,
            search,
            links,
            pages,
        };
        log::info!(
            "Extracted {} records for {:?}",
            report.records().count(),
            coordinate
        );

        Ok(report)
    }

    async fn process_link(&self, link: &str) -> PageOutcome {
        let text = match self.page_scraper.scrape_text(link).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("{}", e);
                return PageOutcome::ScrapeFailed {
                    error: e.to_string(),
                };
            }
        };

        match self.field_extractor.extract_fields(&text).await {
            Ok(None) => PageOutcome::NothingFound,
            Ok(Some(record)) => {
                if record.is_empty() {
                    log::info!("Model answered with null fields only for {}", link);
                }
                PageOutcome::Extracted {
                    record: record.with_source(link),
                }
            }
            Err(ExtractError::Parse { raw, source }) => {
                log::error!("Unreadable model output for {}: {}", link, source);
                PageOutcome::ParseFailed {
                    error: source.to_string(),
                    raw,
                }
            }
            Err(e) => {
                log::error!("Model error for {}: {}", link, e);
                PageOutcome::ExtractFailed {
                    error: e.to_string(),
                }
            }
        }
    }
}
