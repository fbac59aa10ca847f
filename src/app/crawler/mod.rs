//! Hierarchical catalog crawler
//!
//! Walks `product -> year -> day-of-year -> file` listings and flattens the
//! surviving files into a [`Catalog`]. Years and days outside the date window
//! are pruned before any request is made for them; day and file listings are
//! fetched concurrently through [`dispatch`] and folded into the catalog as
//! they complete.

use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::app::catalog::{is_plain_filename, Catalog};
use crate::app::dispatch::dispatch;
use crate::app::fetch::{ContentValidator, FetchRequest, Fetcher};
use crate::errors::{CrawlError, CrawlResult};

pub mod filter;
pub mod listing;

pub use filter::FileFilter;
pub use listing::{DirectoryListing, ListingEntry};

/// What to crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub archive_set: String,
    pub product: String,
    /// Inclusive lower bound on acquisition date
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on acquisition date
    pub end_date: Option<NaiveDate>,
    pub filter: FileFilter,
}

impl CrawlTarget {
    fn year_in_window(&self, year: i32) -> bool {
        self.start_date.map_or(true, |start| year >= start.year())
            && self.end_date.map_or(true, |end| year <= end.year())
    }

    fn date_in_window(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

/// A year node that survived pruning
#[derive(Debug, Clone)]
struct YearNode {
    year: i32,
    url: String,
}

/// A day node that survived pruning
#[derive(Debug, Clone)]
struct DayNode {
    date: NaiveDate,
    url: String,
}

/// Crawls one product of the archive
#[derive(Debug, Clone)]
pub struct CatalogCrawler {
    fetcher: Fetcher,
    base_url: String,
    width: usize,
}

impl CatalogCrawler {
    /// Crawler over the archive rooted at `base_url` with `width` concurrent listings
    pub fn new(fetcher: Fetcher, base_url: impl Into<String>, width: usize) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            width,
        }
    }

    /// Produce the filtered filename -> checksum catalog for `target`
    ///
    /// # Errors
    ///
    /// Only a missing or malformed year listing fails the crawl. Day and file
    /// listings that cannot be fetched are skipped with a warning.
    pub async fn crawl(&self, target: &CrawlTarget) -> CrawlResult<Catalog> {
        let started = Instant::now();
        let product_url = listing::product_url(&self.base_url, &target.archive_set, &target.product);

        let years_listing = fetch_listing(&self.fetcher, &product_url)
            .await
            .map_err(|e| match e {
                CrawlError::ListingUnavailable { .. } => CrawlError::YearListingUnavailable {
                    archive_set: target.archive_set.clone(),
                    product: target.product.clone(),
                },
                other => other,
            })?;

        let years = self.surviving_years(target, &product_url, &years_listing);
        info!(
            "{} years of {} in archive set {} entering crawl",
            years.len(),
            target.product,
            target.archive_set
        );

        let days = self.crawl_years(target, years).await;
        info!("Total of {} days entering crawl", days.len());

        let catalog = self.crawl_days(target, days).await;
        info!(
            "File catalog for {} in archive set {} retrieved in {:.2} seconds ({} files)",
            target.product,
            target.archive_set,
            started.elapsed().as_secs_f64(),
            catalog.len()
        );
        Ok(catalog)
    }

    fn surviving_years(
        &self,
        target: &CrawlTarget,
        product_url: &str,
        listing: &DirectoryListing,
    ) -> Vec<YearNode> {
        let mut years = Vec::new();
        for entry in &listing.content {
            let Some(year) = parse_year(&entry.name) else {
                warn!(
                    "Year {} in product {} in archive set {} is not a valid year",
                    entry.name, target.product, target.archive_set
                );
                continue;
            };
            if !target.year_in_window(year) {
                debug!("Pruning year {}", year);
                continue;
            }
            match listing::child_url(product_url, entry) {
                Ok(url) => years.push(YearNode { year, url }),
                Err(e) => warn!("Skipping year {}: {}", year, e),
            }
        }
        years
    }

    /// Level 2: day listings of every surviving year
    async fn crawl_years(&self, target: &CrawlTarget, years: Vec<YearNode>) -> Vec<DayNode> {
        let fetcher = self.fetcher.clone();
        let mut results = dispatch(
            years,
            move |node: YearNode| {
                let fetcher = fetcher.clone();
                async move { fetch_listing(&fetcher, &node.url).await }
            },
            self.width,
        );

        let mut days = Vec::new();
        while let Some((node, result)) = results.next().await {
            let listing = match result.map_err(CrawlError::from).and_then(|listing| listing) {
                Ok(listing) => listing,
                Err(e) => {
                    warn!("Skipping year {}: {}", node.year, e);
                    continue;
                }
            };

            for entry in &listing.content {
                let Some(date) = parse_doy(node.year, &entry.name) else {
                    warn!("Day {} of year {} is not a valid day of year", entry.name, node.year);
                    continue;
                };
                if !target.date_in_window(date) {
                    continue;
                }
                match listing::child_url(&node.url, entry) {
                    Ok(url) => days.push(DayNode { date, url }),
                    Err(e) => warn!("Skipping {}: {}", date, e),
                }
            }
        }
        days
    }

    /// Level 3: file listings of every surviving day, filtered and folded
    async fn crawl_days(&self, target: &CrawlTarget, days: Vec<DayNode>) -> Catalog {
        let fetcher = self.fetcher.clone();
        let mut results = dispatch(
            days,
            move |node: DayNode| {
                let fetcher = fetcher.clone();
                async move { fetch_listing(&fetcher, &node.url).await }
            },
            self.width,
        );

        let mut catalog = Catalog::new();
        while let Some((node, result)) = results.next().await {
            let listing = match result.map_err(CrawlError::from).and_then(|listing| listing) {
                Ok(listing) => listing,
                Err(e) => {
                    warn!("Skipping day {}: {}", node.date, e);
                    continue;
                }
            };
            catalog.merge(files_of(&listing, &target.filter));
        }
        catalog
    }
}

/// Filtered file entries of one day listing
fn files_of(listing: &DirectoryListing, filter: &FileFilter) -> Catalog {
    listing
        .content
        .iter()
        .filter(|entry| {
            if is_plain_filename(&entry.name) {
                true
            } else {
                warn!("Ignoring listing entry {:?}: not a plain file name", entry.name);
                false
            }
        })
        .filter(|entry| filter.accepts(&entry.name))
        .map(|entry| {
            if entry.md5sum.is_none() {
                debug!("{} has no checksum in its listing", entry.name);
            }
            (entry.name.clone(), entry.md5sum.clone().unwrap_or_default())
        })
        .collect()
}

/// Fetch and parse one listing node
async fn fetch_listing(fetcher: &Fetcher, node_url: &str) -> CrawlResult<DirectoryListing> {
    let url = listing::listing_url(node_url);
    let request = FetchRequest::new(url.as_str()).validator(ContentValidator::Json);
    let content = fetcher
        .fetch(&request)
        .await
        .map_err(|source| CrawlError::ListingUnavailable {
            url: url.clone(),
            source,
        })?;
    DirectoryListing::parse(&url, &content.body)
}

fn parse_year(name: &str) -> Option<i32> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = name.parse().ok()?;
    NaiveDate::from_ymd_opt(year, 1, 1).map(|_| year)
}

fn parse_doy(year: i32, name: &str) -> Option<NaiveDate> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_yo_opt(year, name.parse().ok()?)
}
