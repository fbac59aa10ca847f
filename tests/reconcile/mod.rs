//! Integration tests for download reconciliation
//!
//! Each test crawls or seeds a dataset, runs the reconciler against the fake
//! archive, and inspects the downloaded files and the per-run logs.

#[path = "../common/mod.rs"]
mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_test::assert_ok;

use common::*;
use laads_mirror::app::catalog::{write_snapshot, Catalog};
use laads_mirror::app::crawler::CatalogCrawler;
use laads_mirror::app::dataset::{resolve, Dataset, SuppliedSpec};
use laads_mirror::app::fetch::md5_hex;
use laads_mirror::app::reconcile::{DownloadLedger, DownloadReport, Reconciler};
use laads_mirror::app::support::{now_timestamp, ArtifactKind, SupportStore};

const FILES: &[&str] = &[
    "VNP46A2.A2019152.h11v07.001.2020.h5",
    "VNP46A2.A2019152.h11v08.001.2020.h5",
    "VNP46A2.A2019153.h11v07.001.2020.h5",
];

struct Fixture {
    _temp: TempDir,
    store: SupportStore,
    inputs: std::path::PathBuf,
    archive: Arc<FakeArchive>,
    published: Vec<PublishedFile>,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let store = SupportStore::new(temp.path().join("support"));
        let inputs = temp.path().join("inputs");
        let archive = FakeArchive::new();
        let published = publish_product(
            &archive,
            &[(2019, 152, &FILES[..2]), (2019, 153, &FILES[2..])],
            &[],
        );
        Self {
            _temp: temp,
            store,
            inputs,
            archive,
            published,
        }
    }

    async fn dataset(&self) -> Dataset {
        let spec = resolve(
            &self.store,
            "fiona",
            &SuppliedSpec {
                archive_set: Some(ARCHIVE_SET.to_string()),
                product: Some(PRODUCT.to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let crawler = CatalogCrawler::new(fetcher(&self.archive, 3), BASE_URL, 2);
        Dataset::open(&self.store, spec, &crawler).await.unwrap()
    }

    fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            fetcher(&self.archive, 3),
            BASE_URL,
            self.store.clone(),
            &self.inputs,
            4,
        )
    }

    fn file(&self, filename: &str) -> &PublishedFile {
        self.published
            .iter()
            .find(|f| f.filename == filename)
            .unwrap()
    }
}

fn log_lines(path: &Path) -> Vec<String> {
    let mut lines: Vec<String> = std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    lines
}

/// Download logs carry second-resolution timestamps
async fn next_second() {
    tokio::time::sleep(Duration::from_millis(1100)).await;
}

#[tokio::test]
async fn test_first_run_downloads_everything_and_second_run_is_a_no_op() {
    let fx = Fixture::new();
    let dataset = fx.dataset().await;
    let reconciler = fx.reconciler();

    let summary = reconciler.reconcile(&dataset).await.unwrap();
    assert_eq!(summary.pending, 3);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed(), 0);

    for published in &fx.published {
        let stored = std::fs::read(fx.inputs.join("fiona").join(&published.filename)).unwrap();
        assert_eq!(stored, published.body);
    }
    assert!(!fx
        .inputs
        .join("fiona")
        .join(format!("{}.tmp", FILES[0]))
        .exists());

    let log_path = summary.log_path.unwrap();
    let expected: Vec<String> = FILES.iter().map(|f| format!("{} True", f)).collect();
    assert_eq!(log_lines(&log_path), expected);

    next_second().await;
    let file_requests: usize = fx
        .published
        .iter()
        .map(|f| fx.archive.requests_for(&f.url))
        .sum();

    let again = reconciler.reconcile(&dataset).await.unwrap();
    assert_eq!(again.pending, 0);
    assert_eq!(again.log_path, None);
    assert_eq!(
        fx.store.list(ArtifactKind::DownloadLog, "fiona").unwrap().len(),
        1
    );
    let after: usize = fx
        .published
        .iter()
        .map(|f| fx.archive.requests_for(&f.url))
        .sum();
    assert_eq!(after, file_requests);
}

#[tokio::test]
async fn test_failed_fetch_is_logged_false_and_retried_next_run() {
    let fx = Fixture::new();
    let dataset = fx.dataset().await;
    let reconciler = fx.reconciler();
    let broken = fx.file(FILES[1]).clone();
    fx.archive.fail(&broken.url, 500);

    let first = reconciler.reconcile(&dataset).await.unwrap();
    assert_eq!(first.succeeded, 2);
    assert_eq!(first.fetch_failures, 1);
    assert_eq!(fx.archive.requests_for(&broken.url), 3);
    assert!(log_lines(first.log_path.as_deref().unwrap())
        .contains(&format!("{} False", broken.filename)));
    assert!(!fx.inputs.join("fiona").join(&broken.filename).exists());

    let report = DownloadReport::build(&fx.store, &dataset).unwrap();
    assert_eq!(report.confirmed, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.is_complete());

    next_second().await;
    fx.archive.heal(&broken.url, broken.body.clone());

    let plan = reconciler.plan(&dataset).unwrap();
    assert_eq!(plan.pending(), 1);
    assert_eq!(plan.tasks[0].filename, broken.filename);

    let second = reconciler.reconcile(&dataset).await.unwrap();
    assert_eq!(second.pending, 1);
    assert_eq!(second.succeeded, 1);
    assert_eq!(
        log_lines(second.log_path.as_deref().unwrap()),
        vec![format!("{} True", broken.filename)]
    );

    let ledger = assert_ok!(DownloadLedger::from_logs(&fx.store, "fiona"));
    assert!(FILES.iter().all(|f| ledger.is_confirmed(f)));
    let report = DownloadReport::build(&fx.store, &dataset).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.download_logs, 2);
}

#[tokio::test]
async fn test_corrupt_body_fails_checksum_and_is_not_stored() {
    let fx = Fixture::new();
    let dataset = fx.dataset().await;
    let target = fx.file(FILES[2]).clone();
    fx.archive.serve(&target.url, hdf5_body("tampered"));

    let summary = fx.reconciler().reconcile(&dataset).await.unwrap();

    assert_eq!(summary.fetch_failures, 1);
    assert!(!fx.inputs.join("fiona").join(&target.filename).exists());
    let ledger = DownloadLedger::from_logs(&fx.store, "fiona").unwrap();
    assert_eq!(ledger.status(&target.filename), Some(false));
}

#[tokio::test]
async fn test_local_write_failure_is_logged_false() {
    let fx = Fixture::new();
    let dataset = fx.dataset().await;
    // A non-empty directory where the file should go makes the rename fail
    let blocked = fx.inputs.join("fiona").join(FILES[0]);
    std::fs::create_dir_all(blocked.join("occupied")).unwrap();

    let summary = fx.reconciler().reconcile(&dataset).await.unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.write_failures, 1);
    assert_eq!(summary.fetch_failures, 0);
    assert!(log_lines(summary.log_path.as_deref().unwrap())
        .contains(&format!("{} False", FILES[0])));
    assert!(!fx
        .inputs
        .join("fiona")
        .join(format!("{}.tmp", FILES[0]))
        .exists());

    next_second().await;
    std::fs::remove_dir_all(&blocked).unwrap();
    let retry = fx.reconciler().reconcile(&dataset).await.unwrap();
    assert_eq!(retry.pending, 1);
    assert_eq!(retry.succeeded, 1);
}

#[tokio::test]
async fn test_undated_catalog_entry_is_logged_false_without_a_request() {
    let fx = Fixture::new();
    let spec = resolve(
        &fx.store,
        "legacy",
        &SuppliedSpec {
            archive_set: Some(ARCHIVE_SET.to_string()),
            product: Some(PRODUCT.to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    let mut catalog = Catalog::new();
    catalog.insert("f1.h5", "");
    let snapshot = write_snapshot(&fx.store, "legacy", &catalog, now_timestamp()).unwrap();
    let dataset = Dataset::ingest(spec, snapshot);

    let summary = fx.reconciler().reconcile(&dataset).await.unwrap();

    assert_eq!(summary.pending, 1);
    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(fx.archive.total_requests(), 0);
    assert_eq!(
        log_lines(summary.log_path.as_deref().unwrap()),
        vec!["f1.h5 False".to_string()]
    );
}

#[tokio::test]
async fn test_path_like_catalog_entry_is_never_written_outside_inputs() {
    let fx = Fixture::new();
    let outside = fx._temp.path().join("outside").join(FILES[0]);
    let name = outside.to_str().unwrap().to_string();
    let spec = resolve(
        &fx.store,
        "fiona",
        &SuppliedSpec {
            archive_set: Some(ARCHIVE_SET.to_string()),
            product: Some(PRODUCT.to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    let mut catalog = Catalog::new();
    catalog.insert(name.clone(), md5_hex(&fx.file(FILES[0]).body));
    let snapshot = write_snapshot(&fx.store, "fiona", &catalog, now_timestamp()).unwrap();
    let dataset = Dataset::ingest(spec, snapshot);
    // Serve it where a naive join of the name would look for it
    fx.archive.serve(
        &format!("{}/2019/152/{}", product_url(), name),
        fx.file(FILES[0]).body.clone(),
    );

    let summary = fx.reconciler().reconcile(&dataset).await.unwrap();

    assert_eq!(summary.pending, 1);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(fx.archive.total_requests(), 0);
    assert!(!outside.exists());
    assert_eq!(
        log_lines(summary.log_path.as_deref().unwrap()),
        vec![format!("{} False", name)]
    );
}
