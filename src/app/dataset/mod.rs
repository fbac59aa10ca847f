//! Named datasets
//!
//! A dataset couples a durable [`DatasetSpec`] with the catalog snapshot it
//! produced. The spec written on first construction is authoritative from
//! then on: later callers may pass parameters, but conflicting values only
//! produce warnings.

use std::fmt::Display;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::app::catalog::{self, CatalogIndex, CatalogSnapshot};
use crate::app::crawler::CatalogCrawler;
use crate::app::support::{now_timestamp, SupportStore};
use crate::errors::{DatasetError, DatasetResult};

pub mod spec;

pub use spec::{format_spec_date, parse_spec_date, DatasetSpec};

/// Parameters a caller offers when opening a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppliedSpec {
    pub archive_set: Option<String>,
    pub product: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Check that a dataset name can prefix support file names
pub fn validate_name(name: &str) -> DatasetResult<()> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if name.starts_with('.') {
        Some("name starts with a dot")
    } else if name.chars().any(char::is_whitespace) {
        Some("name contains whitespace")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DatasetError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Load the stored spec for `name`, or create it from `supplied`
///
/// # Errors
///
/// [`DatasetError::MissingIdentifiers`] when no spec exists and the caller
/// did not give both archive set and product.
pub fn resolve(store: &SupportStore, name: &str, supplied: &SuppliedSpec) -> DatasetResult<DatasetSpec> {
    validate_name(name)?;
    let path = store.spec_path(name);

    if path.exists() {
        let stored = DatasetSpec::load(&path)?;
        warn_on_conflicts(&stored, supplied);
        info!("Loaded dataset specification {}", path.display());
        return Ok(stored);
    }

    let (Some(archive_set), Some(product)) = (supplied.archive_set.clone(), supplied.product.clone())
    else {
        error!(
            "No preexisting specification found for dataset {}. Provide at least archive set and product",
            name
        );
        return Err(DatasetError::MissingIdentifiers {
            name: name.to_string(),
        });
    };

    let spec = DatasetSpec {
        name: name.to_string(),
        archive_set,
        product,
        start_date: supplied.start_date,
        end_date: supplied.end_date,
        include: supplied.include.clone(),
        exclude: supplied.exclude.clone(),
    };
    spec.validate()?;
    spec.save(&path)?;
    info!("Created dataset specification {}", path.display());
    Ok(spec)
}

fn warn_on_conflicts(stored: &DatasetSpec, supplied: &SuppliedSpec) {
    fn check<T: PartialEq + Display>(name: &str, field: &str, supplied: Option<&T>, stored: Option<&T>) {
        let Some(supplied) = supplied else {
            return;
        };
        if Some(supplied) != stored {
            let stored = stored.map_or_else(|| "none".to_string(), ToString::to_string);
            warn!(
                "For dataset {}, {} {} was specified, but {} {} was found in the preexisting specification and was used",
                name, field, supplied, field, stored
            );
        }
    }

    let name = stored.name.as_str();
    check(name, "archive set", supplied.archive_set.as_ref(), Some(&stored.archive_set));
    check(name, "product", supplied.product.as_ref(), Some(&stored.product));
    check(name, "start date", supplied.start_date.as_ref(), stored.start_date.as_ref());
    check(name, "end date", supplied.end_date.as_ref(), stored.end_date.as_ref());

    if !supplied.include.is_empty() && supplied.include != stored.include {
        warn!(
            "For dataset {}, include {:?} was specified, but {:?} from the preexisting specification was used",
            name, supplied.include, stored.include
        );
    }
    if !supplied.exclude.is_empty() && supplied.exclude != stored.exclude {
        warn!(
            "For dataset {}, exclude {:?} was specified, but {:?} from the preexisting specification was used",
            name, supplied.exclude, stored.exclude
        );
    }
}

/// A resolved dataset with its current catalog ingested
#[derive(Debug, Clone)]
pub struct Dataset {
    spec: DatasetSpec,
    snapshot: CatalogSnapshot,
    index: CatalogIndex,
}

impl Dataset {
    /// Ingest the latest snapshot, if one exists
    pub fn load(store: &SupportStore, spec: DatasetSpec) -> DatasetResult<Option<Self>> {
        Ok(catalog::select_latest_catalog(store, &spec.name)?.map(|snapshot| Self::ingest(spec, snapshot)))
    }

    /// Ingest the latest snapshot, crawling and persisting a first one if needed
    pub async fn open(
        store: &SupportStore,
        spec: DatasetSpec,
        crawler: &CatalogCrawler,
    ) -> DatasetResult<Self> {
        match catalog::select_latest_catalog(store, &spec.name)? {
            Some(snapshot) => Ok(Self::ingest(spec, snapshot)),
            None => {
                info!("No catalog found for dataset {}, crawling the archive", spec.name);
                Self::refresh(store, spec, crawler).await
            }
        }
    }

    /// Crawl again and persist a new snapshot; older snapshots stay untouched
    pub async fn refresh(
        store: &SupportStore,
        spec: DatasetSpec,
        crawler: &CatalogCrawler,
    ) -> DatasetResult<Self> {
        let catalog = crawler.crawl(&spec.crawl_target()).await?;
        let snapshot = catalog::write_snapshot(store, &spec.name, &catalog, now_timestamp())?;
        Ok(Self::ingest(spec, snapshot))
    }

    /// Build the in-memory indices for a snapshot
    pub fn ingest(spec: DatasetSpec, snapshot: CatalogSnapshot) -> Self {
        let index = CatalogIndex::ingest(&snapshot.catalog);
        info!(
            "Ingested {} files for dataset {} ({} without a parseable date)",
            index.len(),
            spec.name,
            index.undated().count()
        );
        Self {
            spec,
            snapshot,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }
}
