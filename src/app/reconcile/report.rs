//! Download status of a dataset

use std::fmt;

use chrono::NaiveDateTime;

use super::ledger::DownloadLedger;
use super::log::select_latest_download_log;
use crate::app::catalog::Catalog;
use crate::app::dataset::Dataset;
use crate::app::support::{ArtifactKind, SupportStore};
use crate::constants::files;
use crate::errors::LedgerResult;

/// Catalog versus ledger, without touching the network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub dataset: String,
    pub catalog_files: usize,
    /// Catalog files recorded `True`
    pub confirmed: usize,
    /// Catalog files only ever recorded `False`
    pub failed: usize,
    /// Catalog files never attempted
    pub never_attempted: usize,
    /// Ledger entries no longer in the current catalog
    pub not_in_catalog: usize,
    pub download_logs: usize,
    pub latest_catalog: Option<NaiveDateTime>,
    pub latest_download_log: Option<NaiveDateTime>,
}

impl DownloadReport {
    /// Build the report for an ingested dataset
    pub fn build(store: &SupportStore, dataset: &Dataset) -> LedgerResult<Self> {
        let ledger = DownloadLedger::from_logs(store, dataset.name())?;
        let mut report = Self::compare(dataset.name(), &dataset.snapshot().catalog, &ledger);
        report.download_logs = store.list(ArtifactKind::DownloadLog, dataset.name())?.len();
        report.latest_catalog = Some(dataset.snapshot().created_at());
        report.latest_download_log =
            select_latest_download_log(store, dataset.name())?.map(|log| log.created_at);
        Ok(report)
    }

    /// Counts only
    pub fn compare(name: &str, catalog: &Catalog, ledger: &DownloadLedger) -> Self {
        let mut report = Self {
            dataset: name.to_string(),
            catalog_files: catalog.len(),
            ..Default::default()
        };

        for filename in catalog.filenames() {
            match ledger.status(filename) {
                Some(true) => report.confirmed += 1,
                Some(false) => report.failed += 1,
                None => report.never_attempted += 1,
            }
        }
        report.not_in_catalog = ledger
            .iter()
            .filter(|(filename, _)| !catalog.contains(filename))
            .count();
        report
    }

    /// Files a new run would fetch
    pub fn pending(&self) -> usize {
        self.failed + self.never_attempted
    }

    /// Whether every catalog file is confirmed
    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }
}

impl fmt::Display for DownloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = |t: Option<NaiveDateTime>| {
            t.map_or_else(
                || "none".to_string(),
                |t| t.format(files::TIMESTAMP_FORMAT).to_string(),
            )
        };

        writeln!(f, "Dataset: {}", self.dataset)?;
        writeln!(f, "  Catalog files:        {}", self.catalog_files)?;
        writeln!(f, "  Confirmed:            {}", self.confirmed)?;
        writeln!(f, "  Failed (will retry):  {}", self.failed)?;
        writeln!(f, "  Never attempted:      {}", self.never_attempted)?;
        writeln!(f, "  Not in catalog:       {}", self.not_in_catalog)?;
        writeln!(f, "  Download logs:        {}", self.download_logs)?;
        writeln!(f, "  Latest catalog:       {}", stamp(self.latest_catalog))?;
        write!(f, "  Latest download log:  {}", stamp(self.latest_download_log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let catalog: Catalog = ["f1.h5", "f2.h5", "f3.h5"]
            .into_iter()
            .map(|f| (f.to_string(), String::new()))
            .collect();
        let mut ledger = DownloadLedger::new();
        ledger.record("f1.h5", true);
        ledger.record("f2.h5", false);
        ledger.record("old.h5", true);

        let report = DownloadReport::compare("fiona", &catalog, &ledger);
        assert_eq!(report.confirmed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.never_attempted, 1);
        assert_eq!(report.not_in_catalog, 1);
        assert_eq!(report.pending(), 2);
        assert!(!report.is_complete());
        assert!(report.to_string().contains("Never attempted:      1"));
    }
}
