//! In-memory archive shared by the integration tests
//!
//! Routes are keyed by the exact URL the fetcher requests. Unknown URLs answer
//! 404, like the real archive does for missing nodes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use laads_mirror::app::client::{RawResponse, Session};
use laads_mirror::app::crawler::listing;
use laads_mirror::app::fetch::{md5_hex, FetchPolicy, Fetcher};
use laads_mirror::constants::formats;
use laads_mirror::errors::FetchResult;

pub const BASE_URL: &str = "https://archive.test/archive/allData";
pub const ARCHIVE_SET: &str = "5000";
pub const PRODUCT: &str = "VNP46A2";

#[derive(Debug, Clone)]
struct Route {
    failures_left: usize,
    failure_status: u16,
    body: Vec<u8>,
}

/// Fake archive answering GETs from a route table
#[derive(Debug, Default)]
pub struct FakeArchive {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<String>>,
}

impl FakeArchive {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `url` with 200 and `body`
    pub fn serve(&self, url: &str, body: Vec<u8>) {
        self.flaky(url, 0, body);
    }

    /// Answer `url` with 503 `failures` times, then with `body`
    pub fn flaky(&self, url: &str, failures: usize, body: Vec<u8>) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route {
                failures_left: failures,
                failure_status: 503,
                body,
            },
        );
    }

    /// Answer `url` with `status` forever
    pub fn fail(&self, url: &str, status: u16) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route {
                failures_left: usize::MAX,
                failure_status: status,
                body: Vec::new(),
            },
        );
    }

    /// Stop failing `url`
    pub fn heal(&self, url: &str, body: Vec<u8>) {
        self.serve(url, body);
    }

    /// Number of GETs issued for `url`
    pub fn requests_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|requested| requested.as_str() == url)
            .count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Session for FakeArchive {
    async fn get(&self, url: &Url) -> FetchResult<RawResponse> {
        self.requests.lock().unwrap().push(url.to_string());

        let mut routes = self.routes.lock().unwrap();
        let Some(route) = routes.get_mut(url.as_str()) else {
            return Ok(RawResponse {
                status: 404,
                body: b"not found".to_vec(),
            });
        };
        if route.failures_left > 0 {
            route.failures_left -= 1;
            return Ok(RawResponse {
                status: route.failure_status,
                body: Vec::new(),
            });
        }
        Ok(RawResponse {
            status: 200,
            body: route.body.clone(),
        })
    }
}

/// Retries without waiting, so tests run on the real clock
pub fn quick_policy(max_attempts: u32) -> FetchPolicy {
    FetchPolicy {
        backoff_base: Duration::ZERO,
        backoff_increment: Duration::ZERO,
        max_attempts,
        attempts_per_session: max_attempts,
    }
}

pub fn fetcher(archive: &Arc<FakeArchive>, max_attempts: u32) -> Fetcher {
    let session: Arc<dyn Session> = archive.clone();
    Fetcher::new(session, quick_policy(max_attempts))
}

/// Body of a valid HDF5 file
pub fn hdf5_body(seed: &str) -> Vec<u8> {
    let mut body = formats::HDF5_SIGNATURE.to_vec();
    body.extend_from_slice(seed.as_bytes());
    body
}

pub fn product_url() -> String {
    listing::product_url(BASE_URL, ARCHIVE_SET, PRODUCT)
}

pub fn year_listing_url(year: i32) -> String {
    format!("{}/{}.json", product_url(), year)
}

pub fn day_listing_url(year: i32, doy: u32) -> String {
    format!("{}/{}/{:03}.json", product_url(), year, doy)
}

pub fn file_url(year: i32, doy: u32, filename: &str) -> String {
    listing::file_url(
        BASE_URL,
        ARCHIVE_SET,
        PRODUCT,
        &year.to_string(),
        &format!("{:03}", doy),
        filename,
    )
}

/// A file published by [`publish_product`]
#[derive(Debug, Clone)]
pub struct PublishedFile {
    pub filename: String,
    pub url: String,
    pub body: Vec<u8>,
}

/// Publish a product tree: listings for every level plus the file bodies
///
/// `days` holds `(year, doy, filenames)`. Year entries carry no link, day
/// entries carry an escaped absolute link, file entries carry their MD5.
pub fn publish_product(
    archive: &FakeArchive,
    days: &[(i32, u32, &[&str])],
    extra_years: &[&str],
) -> Vec<PublishedFile> {
    let mut by_year: HashMap<i32, Vec<(u32, &[&str])>> = HashMap::new();
    for (year, doy, files) in days {
        by_year.entry(*year).or_default().push((*doy, *files));
    }

    let mut year_entries: Vec<_> = by_year.keys().map(|y| json!({ "name": y.to_string() })).collect();
    year_entries.extend(extra_years.iter().map(|name| json!({ "name": name })));
    archive.serve(
        &format!("{}.json", product_url()),
        serde_json::to_vec(&json!({ "content": year_entries })).unwrap(),
    );

    let mut published = Vec::new();
    for (year, doys) in by_year {
        let day_entries: Vec<_> = doys
            .iter()
            .map(|(doy, _)| {
                let link = format!("{}/{}/{:03}", product_url(), year, doy).replace('/', "\\/");
                json!({ "name": format!("{:03}", doy), "downloadsLink": link })
            })
            .collect();
        archive.serve(
            &year_listing_url(year),
            serde_json::to_vec(&json!({ "content": day_entries })).unwrap(),
        );

        for (doy, files) in doys {
            let mut file_entries = Vec::new();
            for filename in files.iter() {
                let body = hdf5_body(filename);
                let url = file_url(year, doy, filename);
                file_entries.push(json!({
                    "name": filename,
                    "md5sum": md5_hex(&body),
                    "size": body.len(),
                }));
                archive.serve(&url, body.clone());
                published.push(PublishedFile {
                    filename: filename.to_string(),
                    url,
                    body,
                });
            }
            archive.serve(
                &day_listing_url(year, doy),
                serde_json::to_vec(&json!({ "content": file_entries })).unwrap(),
            );
        }
    }
    published
}
