//! Download reconciliation
//!
//! - `ledger`: monotonic merge of historical download logs
//! - `log`: this run's append-only log
//! - `storage`: atomic local writes of fetched files
//! - `engine`: pending-set computation and the download run itself
//! - `report`: catalog versus ledger status

pub mod engine;
pub mod ledger;
pub mod log;
pub mod report;
pub mod storage;

pub use engine::{remote_url, DownloadTask, ReconcilePlan, ReconcileSummary, Reconciler};
pub use ledger::DownloadLedger;
pub use log::{select_latest_download_log, DownloadLog};
pub use report::DownloadReport;
pub use storage::FileStore;
