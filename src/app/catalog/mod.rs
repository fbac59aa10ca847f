//! Catalog snapshots
//!
//! A catalog is the flat `filename -> md5` mapping produced by one crawl.
//! Snapshots are written once, under a timestamped name, and never modified;
//! the current catalog of a dataset is the snapshot with the greatest
//! embedded timestamp.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::support::{ArtifactKind, SupportStore, TimestampedFile};
use crate::constants::files;
use crate::errors::{CatalogError, CatalogResult};

pub mod filename;
pub mod index;

pub use filename::{is_plain_filename, AcquisitionDate};
pub use index::{CatalogEntry, CatalogIndex};

/// Flat filename -> checksum mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    files: BTreeMap<String, String>,
}

impl Catalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one file
    pub fn insert(&mut self, filename: impl Into<String>, checksum: impl Into<String>) {
        self.files.insert(filename.into(), checksum.into());
    }

    /// Union with another partial catalog
    ///
    /// Both sides come from the same remote listing, so a file present in both
    /// carries the same checksum and the fold is order-independent.
    pub fn merge(&mut self, other: Catalog) {
        self.files.extend(other.files);
    }

    /// Checksum of a file
    pub fn checksum(&self, filename: &str) -> Option<&str> {
        self.files.get(filename).map(String::as_str)
    }

    /// Whether a file is catalogued
    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate in file name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.files.iter()
    }

    /// File names in order
    pub fn filenames(&self) -> impl Iterator<Item = &String> {
        self.files.keys()
    }
}

impl FromIterator<(String, String)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// A catalog loaded from, or just written to, the support store
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    /// Snapshot file and its embedded timestamp
    pub file: TimestampedFile,
    /// Snapshot contents
    pub catalog: Catalog,
}

impl CatalogSnapshot {
    /// Creation time embedded in the file name
    pub fn created_at(&self) -> NaiveDateTime {
        self.file.created_at
    }
}

/// Read a snapshot file
pub fn load_snapshot(file: &TimestampedFile) -> CatalogResult<CatalogSnapshot> {
    let content = match std::fs::read_to_string(&file.path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CatalogError::NotFound {
                path: file.path.clone(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let catalog: Catalog =
        serde_json::from_str(&content).map_err(|source| CatalogError::InvalidSnapshot {
            path: file.path.clone(),
            source,
        })?;

    debug!("Loaded {} files from {}", catalog.len(), file.path.display());
    Ok(CatalogSnapshot {
        file: file.clone(),
        catalog,
    })
}

/// Load the most recent snapshot for `name`, if any
pub fn select_latest_catalog(
    store: &SupportStore,
    name: &str,
) -> CatalogResult<Option<CatalogSnapshot>> {
    match store.latest(ArtifactKind::Catalog, name)? {
        Some(file) => {
            info!(
                "Using catalog {} ({})",
                file.path.display(),
                file.created_at.format(files::TIMESTAMP_FORMAT)
            );
            load_snapshot(&file).map(Some)
        }
        None => Ok(None),
    }
}

/// Persist a new snapshot stamped `created_at`
///
/// # Errors
///
/// Returns [`CatalogError::AlreadyExists`] rather than replacing an existing
/// snapshot with the same timestamp.
pub fn write_snapshot(
    store: &SupportStore,
    name: &str,
    catalog: &Catalog,
    created_at: NaiveDateTime,
) -> CatalogResult<CatalogSnapshot> {
    std::fs::create_dir_all(store.dir())?;
    let path = store.artifact_path(ArtifactKind::Catalog, name, created_at);
    let content = serde_json::to_string_pretty(catalog)?;

    write_new_file(&path, content.as_bytes())?;

    info!("Wrote catalog snapshot {} ({} files)", path.display(), catalog.len());
    Ok(CatalogSnapshot {
        file: TimestampedFile { path, created_at },
        catalog: catalog.clone(),
    })
}

/// Create `path` exclusively so an existing snapshot is never touched
fn write_new_file(path: &Path, content: &[u8]) -> CatalogResult<()> {
    let mut file = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(CatalogError::AlreadyExists {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(content)?;
    file.sync_all()?;
    Ok(())
}
