//! Download reconciliation engine
//!
//! One run: fold the historical logs into a ledger, compute the pending set
//! against the current catalog, fetch every pending file concurrently, and
//! record each outcome in a fresh log. Outcomes are consumed one at a time by
//! the run itself; workers only fetch, they never write files or log lines.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use futures::StreamExt;
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use super::ledger::DownloadLedger;
use super::log::DownloadLog;
use super::storage::FileStore;
use crate::app::catalog::{is_plain_filename, AcquisitionDate};
use crate::app::crawler::listing;
use crate::app::dataset::Dataset;
use crate::app::dispatch::dispatch;
use crate::app::fetch::{ContentValidator, FetchRequest, Fetcher};
use crate::app::support::{now_timestamp, SupportStore};
use crate::errors::{CatalogResult, FetchError, LedgerResult};

/// One pending file, ready to dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub filename: String,
    pub request: FetchRequest,
}

/// Work computed before any request is made
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    /// Merged historical ledger
    pub ledger: DownloadLedger,
    /// Files with a constructible URL
    pub tasks: Vec<DownloadTask>,
    /// Pending files with no acquisition date or not a plain file name
    pub unresolvable: Vec<String>,
}

impl ReconcilePlan {
    /// Size of the pending set
    pub fn pending(&self) -> usize {
        self.tasks.len() + self.unresolvable.len()
    }
}

/// Outcome counts of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub pending: usize,
    pub succeeded: usize,
    pub fetch_failures: usize,
    pub write_failures: usize,
    pub elapsed: Duration,
    /// This run's log, if one was written
    pub log_path: Option<PathBuf>,
}

impl ReconcileSummary {
    pub fn failed(&self) -> usize {
        self.fetch_failures + self.write_failures
    }
}

/// Drives downloads for datasets of one archive
#[derive(Clone)]
pub struct Reconciler {
    fetcher: Fetcher,
    base_url: String,
    support: SupportStore,
    inputs_dir: PathBuf,
    width: usize,
    progress: ProgressBar,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("base_url", &self.base_url)
            .field("support", &self.support)
            .field("inputs_dir", &self.inputs_dir)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        fetcher: Fetcher,
        base_url: impl Into<String>,
        support: SupportStore,
        inputs_dir: impl Into<PathBuf>,
        width: usize,
    ) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            support,
            inputs_dir: inputs_dir.into(),
            width,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report per-file progress on `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Merge the logs and compute pending work without fetching anything
    pub fn plan(&self, dataset: &Dataset) -> LedgerResult<ReconcilePlan> {
        let ledger = DownloadLedger::from_logs(&self.support, dataset.name())?;
        let catalog = &dataset.snapshot().catalog;
        let spec = dataset.spec();

        let mut tasks = Vec::new();
        let mut unresolvable = Vec::new();
        for filename in ledger.pending(catalog) {
            if !is_plain_filename(&filename) {
                warn!("{:?} is not a plain file name; refusing to download it", filename);
                unresolvable.push(filename);
                continue;
            }
            let url = match remote_url(&self.base_url, &spec.archive_set, &spec.product, &filename) {
                Ok(url) => url,
                Err(e) => {
                    warn!("{}; cannot locate it in the archive", e);
                    unresolvable.push(filename);
                    continue;
                }
            };
            let mut request = FetchRequest::new(url)
                .checksum(catalog.checksum(&filename).unwrap_or_default());
            if let Some(validator) = ContentValidator::for_filename(&filename) {
                request = request.validator(validator);
            }
            tasks.push(DownloadTask { filename, request });
        }

        Ok(ReconcilePlan {
            ledger,
            tasks,
            unresolvable,
        })
    }

    /// Download every pending file of `dataset` and log the outcomes
    ///
    /// # Errors
    ///
    /// Only ledger I/O fails the run (unreadable historical logs, or this
    /// run's log cannot be created or appended). Individual files that
    /// cannot be fetched or stored are logged as `False`.
    pub async fn reconcile(&self, dataset: &Dataset) -> LedgerResult<ReconcileSummary> {
        let started = Instant::now();
        let plan = self.plan(dataset)?;
        let mut summary = ReconcileSummary {
            pending: plan.pending(),
            ..Default::default()
        };

        info!(
            "Sending {} files of dataset {} to download ({} already confirmed)",
            summary.pending,
            dataset.name(),
            dataset.snapshot().catalog.len().saturating_sub(summary.pending)
        );
        if summary.pending == 0 {
            summary.elapsed = started.elapsed();
            return Ok(summary);
        }

        let mut log = DownloadLog::create(&self.support, dataset.name(), now_timestamp()).await?;
        let store = FileStore::new(&self.inputs_dir, dataset.name());
        self.progress.set_length(summary.pending as u64);

        for filename in &plan.unresolvable {
            log.append(filename, false).await?;
            summary.fetch_failures += 1;
            self.progress.inc(1);
        }

        let fetcher = self.fetcher.clone();
        let mut results = dispatch(
            plan.tasks,
            move |task: DownloadTask| {
                let fetcher = fetcher.clone();
                async move { fetcher.fetch(&task.request).await }
            },
            self.width,
        );

        while let Some((task, result)) = results.next().await {
            let fetched = match result.map_err(FetchError::from).and_then(|fetched| fetched) {
                Ok(content) => Some(content),
                Err(e) => {
                    warn!("Could not obtain {} this run: {}", task.filename, e);
                    None
                }
            };

            let status = match fetched {
                None => {
                    summary.fetch_failures += 1;
                    false
                }
                Some(content) => match store.save_atomic(&task.filename, &content.body).await {
                    Ok(path) => {
                        debug!("{} stored at {}", task.filename, path.display());
                        summary.succeeded += 1;
                        true
                    }
                    Err(e) => {
                        warn!("Fetched {} but could not store it: {}", task.filename, e);
                        summary.write_failures += 1;
                        false
                    }
                },
            };

            log.append(&task.filename, status).await?;
            self.progress.inc(1);
            self.progress.set_message(task.filename);
        }

        self.progress.finish_and_clear();
        summary.log_path = Some(log.finish().await?);
        summary.elapsed = started.elapsed();

        info!(
            "All downloads finished in {:.2} seconds: {} succeeded, {} failed to fetch, {} failed to store",
            summary.elapsed.as_secs_f64(),
            summary.succeeded,
            summary.fetch_failures,
            summary.write_failures
        );
        Ok(summary)
    }
}

/// URL of a catalogued file
pub fn remote_url(
    base_url: &str,
    archive_set: &str,
    product: &str,
    filename: &str,
) -> CatalogResult<String> {
    let acquisition = AcquisitionDate::from_filename(filename)?;
    Ok(listing::file_url(
        base_url,
        archive_set,
        product,
        &acquisition.year_key(),
        &acquisition.doy_key(),
        filename,
    ))
}
