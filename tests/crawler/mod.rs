//! Integration tests for catalog crawling and dataset persistence
//!
//! These tests crawl a fake in-memory archive through the real fetcher and
//! check what ends up in the catalog and in the support directory.

#[path = "../common/mod.rs"]
mod common;

use chrono::NaiveDate;
use tempfile::TempDir;

use common::*;
use laads_mirror::app::catalog::select_latest_catalog;
use laads_mirror::app::crawler::{CatalogCrawler, CrawlTarget, FileFilter};
use laads_mirror::app::dataset::{resolve, Dataset, SuppliedSpec};
use laads_mirror::app::support::{ArtifactKind, SupportStore};
use laads_mirror::errors::{CrawlError, DatasetError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn target(include: &[&str], exclude: &[&str]) -> CrawlTarget {
    CrawlTarget {
        archive_set: ARCHIVE_SET.to_string(),
        product: PRODUCT.to_string(),
        start_date: None,
        end_date: None,
        filter: FileFilter {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        },
    }
}

fn supplied(include: &[&str]) -> SuppliedSpec {
    SuppliedSpec {
        archive_set: Some(ARCHIVE_SET.to_string()),
        product: Some(PRODUCT.to_string()),
        include: include.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_include_filter_keeps_matching_tile_only() {
    let archive = FakeArchive::new();
    publish_product(
        &archive,
        &[(
            2019,
            152,
            &["X.A2019152.h11v07.001.h5", "X.A2019152.h10v07.001.h5"],
        )],
        &[],
    );

    let crawler = CatalogCrawler::new(fetcher(&archive, 3), BASE_URL, 4);
    let catalog = crawler.crawl(&target(&["h11v07"], &[])).await.unwrap();

    assert_eq!(catalog.len(), 1);
    assert!(catalog.contains("X.A2019152.h11v07.001.h5"));
    assert!(!catalog.contains("X.A2019152.h10v07.001.h5"));
    assert_eq!(
        catalog.checksum("X.A2019152.h11v07.001.h5"),
        Some(
            laads_mirror::app::fetch::md5_hex(&hdf5_body("X.A2019152.h11v07.001.h5")).as_str()
        )
    );
}

#[tokio::test]
async fn test_filter_requires_every_include_and_no_exclude() {
    let archive = FakeArchive::new();
    let files: &[&str] = &[
        "X.A2019152.h11v07.001.h5",
        "X.A2019152.h11v07.001.hdf",
        "X.A2019152.h11v08.001.h5",
        "X.A2019152.h11v07.002.h5",
    ];
    publish_product(&archive, &[(2019, 152, files)], &[]);

    let crawler = CatalogCrawler::new(fetcher(&archive, 3), BASE_URL, 2);
    let catalog = crawler
        .crawl(&target(&["h11v07", ".h5"], &[".002."]))
        .await
        .unwrap();

    let names: Vec<_> = catalog.filenames().cloned().collect();
    assert_eq!(names, vec!["X.A2019152.h11v07.001.h5".to_string()]);
}

#[tokio::test]
async fn test_date_window_prunes_years_and_days() {
    let archive = FakeArchive::new();
    publish_product(
        &archive,
        &[
            (2018, 365, &["X.A2018365.h11v07.001.h5"]),
            (2019, 151, &["X.A2019151.h11v07.001.h5"]),
            (2019, 152, &["X.A2019152.h11v07.001.h5"]),
            (2020, 1, &["X.A2020001.h11v07.001.h5"]),
            (2021, 10, &["X.A2021010.h11v07.001.h5"]),
        ],
        &["readme"],
    );

    let mut target = target(&[], &[]);
    target.start_date = Some(date(2019, 6, 1));
    target.end_date = Some(date(2020, 1, 1));

    let crawler = CatalogCrawler::new(fetcher(&archive, 3), BASE_URL, 4);
    let catalog = crawler.crawl(&target).await.unwrap();

    let names: Vec<_> = catalog.filenames().cloned().collect();
    assert_eq!(
        names,
        vec![
            "X.A2019152.h11v07.001.h5".to_string(),
            "X.A2020001.h11v07.001.h5".to_string()
        ]
    );
    // Pruned years are never listed
    assert_eq!(archive.requests_for(&year_listing_url(2018)), 0);
    assert_eq!(archive.requests_for(&year_listing_url(2021)), 0);
    assert_eq!(archive.requests_for(&day_listing_url(2019, 151)), 0);
}

#[tokio::test]
async fn test_unavailable_day_listing_is_skipped() {
    let archive = FakeArchive::new();
    publish_product(
        &archive,
        &[
            (2019, 152, &["X.A2019152.h11v07.001.h5"]),
            (2019, 153, &["X.A2019153.h11v07.001.h5"]),
        ],
        &[],
    );
    archive.fail(&day_listing_url(2019, 153), 500);

    let crawler = CatalogCrawler::new(fetcher(&archive, 3), BASE_URL, 4);
    let catalog = crawler.crawl(&target(&[], &[])).await.unwrap();

    assert_eq!(catalog.len(), 1);
    assert!(catalog.contains("X.A2019152.h11v07.001.h5"));
    assert_eq!(archive.requests_for(&day_listing_url(2019, 153)), 3);
}

#[tokio::test]
async fn test_flaky_listing_recovers_within_attempts() {
    let archive = FakeArchive::new();
    publish_product(&archive, &[(2019, 152, &["X.A2019152.h11v07.001.h5"])], &[]);
    let product_listing = format!("{}.json", product_url());
    let body = serde_json::to_vec(&serde_json::json!({ "content": [{ "name": "2019" }] })).unwrap();
    archive.flaky(&product_listing, 2, body);

    let crawler = CatalogCrawler::new(fetcher(&archive, 3), BASE_URL, 4);
    let catalog = crawler.crawl(&target(&[], &[])).await.unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(archive.requests_for(&product_listing), 3);
}

#[tokio::test]
async fn test_year_listing_failure_aborts_without_snapshot() {
    let temp = TempDir::new().unwrap();
    let store = SupportStore::new(temp.path());
    let archive = FakeArchive::new();
    archive.fail(&format!("{}.json", product_url()), 503);

    let spec = resolve(&store, "fiona", &supplied(&[])).unwrap();
    let crawler = CatalogCrawler::new(fetcher(&archive, 2), BASE_URL, 4);
    let err = Dataset::open(&store, spec, &crawler).await.unwrap_err();

    assert!(matches!(
        err,
        DatasetError::Crawl(CrawlError::YearListingUnavailable { .. })
    ));
    assert!(store.list(ArtifactKind::Catalog, "fiona").unwrap().is_empty());
}

#[tokio::test]
async fn test_open_crawls_once_then_reuses_snapshot() {
    let temp = TempDir::new().unwrap();
    let store = SupportStore::new(temp.path());
    let archive = FakeArchive::new();
    publish_product(
        &archive,
        &[(
            2019,
            152,
            &["X.A2019152.h11v07.001.h5", "X.A2019152.h10v07.001.h5"],
        )],
        &[],
    );
    let crawler = CatalogCrawler::new(fetcher(&archive, 3), BASE_URL, 4);

    let spec = resolve(&store, "fiona", &supplied(&["h11v07"])).unwrap();
    let first = Dataset::open(&store, spec, &crawler).await.unwrap();
    assert_eq!(first.snapshot().catalog.len(), 1);
    assert_eq!(
        first.index().files_on(date(2019, 6, 1)),
        &["X.A2019152.h11v07.001.h5".to_string()]
    );
    let requests_after_crawl = archive.total_requests();

    // Later callers get the stored spec and the stored snapshot
    let spec = resolve(&store, "fiona", &SuppliedSpec::default()).unwrap();
    assert_eq!(spec.include, vec!["h11v07".to_string()]);
    let second = Dataset::open(&store, spec, &crawler).await.unwrap();
    assert_eq!(second.snapshot().file, first.snapshot().file);
    assert_eq!(archive.total_requests(), requests_after_crawl);

    let latest = select_latest_catalog(&store, "fiona").unwrap().unwrap();
    assert_eq!(latest.catalog, first.snapshot().catalog);
}
