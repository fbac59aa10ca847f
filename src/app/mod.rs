//! Core application logic for LAADS Mirror
//!
//! This module contains the archive sessions, the resilient fetcher, the
//! bounded dispatcher, the catalog crawler, dataset and catalog persistence,
//! and the download reconciliation engine.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use laads_mirror::app::{
//!     resolve, CatalogCrawler, Dataset, FetchPolicy, Fetcher, LaadsSessionFactory,
//!     Reconciler, SessionFactory, SuppliedSpec, SupportStore,
//! };
//! use laads_mirror::app::client::ClientConfig;
//! use laads_mirror::auth::BearerToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client_config = ClientConfig::default();
//! let base_url = client_config.base_url().to_string();
//! let factory = Arc::new(LaadsSessionFactory::new(client_config, BearerToken::from_env()?)?);
//! let fetcher = Fetcher::new(factory.new_session()?, FetchPolicy::default())
//!     .with_session_factory(factory);
//!
//! let store = SupportStore::new("/data/support");
//! let spec = resolve(&store, "fiona", &SuppliedSpec {
//!     archive_set: Some("5000".to_string()),
//!     product: Some("VNP46A2".to_string()),
//!     include: vec!["h11v07".to_string()],
//!     ..Default::default()
//! })?;
//!
//! let crawler = CatalogCrawler::new(fetcher.clone(), base_url.clone(), 4);
//! let dataset = Dataset::open(&store, spec, &crawler).await?;
//!
//! let reconciler = Reconciler::new(fetcher, base_url, store, "/data/inputs", 20);
//! let summary = reconciler.reconcile(&dataset).await?;
//! println!("{} of {} pending files downloaded", summary.succeeded, summary.pending);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod crawler;
pub mod dataset;
pub mod dispatch;
pub mod fetch;
pub mod reconcile;
pub mod support;

// Re-export main public API
pub use catalog::{select_latest_catalog, write_snapshot, Catalog, CatalogIndex, CatalogSnapshot};
pub use client::{ClientConfig, LaadsSessionFactory, Session, SessionFactory};
pub use crawler::{CatalogCrawler, CrawlTarget, FileFilter};
pub use dataset::{resolve, Dataset, DatasetSpec, SuppliedSpec};
pub use dispatch::dispatch;
pub use fetch::{ContentValidator, FetchPolicy, FetchRequest, FetchedContent, Fetcher};
pub use reconcile::{
    select_latest_download_log, DownloadLedger, DownloadReport, ReconcileSummary, Reconciler,
};
pub use support::SupportStore;
