//! In-memory indices derived from a catalog
//!
//! Everything here is rebuilt from the flat filename -> checksum mapping and
//! the file name grammar; an index carries no state of its own.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use super::filename::AcquisitionDate;
use super::Catalog;

/// One catalog file with its parsed date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub filename: String,
    pub checksum: String,
    /// `None` when the file name does not carry a parseable date
    pub acquisition: Option<AcquisitionDate>,
}

/// Lookup structures over an ingested catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    by_filename: BTreeMap<String, CatalogEntry>,
    by_date: BTreeMap<NaiveDate, Vec<String>>,
    by_year_doy: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl CatalogIndex {
    /// Build every index from a catalog
    pub fn ingest(catalog: &Catalog) -> Self {
        let mut index = Self::default();

        for (filename, checksum) in catalog.iter() {
            let acquisition = match AcquisitionDate::from_filename(filename) {
                Ok(acquisition) => Some(acquisition),
                Err(e) => {
                    warn!("{}; file kept without date indexing", e);
                    None
                }
            };

            if let Some(acquisition) = acquisition {
                if let Some(date) = acquisition.date() {
                    index
                        .by_date
                        .entry(date)
                        .or_default()
                        .push(filename.clone());
                }
                index
                    .by_year_doy
                    .entry(acquisition.year_key())
                    .or_default()
                    .entry(acquisition.doy_key())
                    .or_default()
                    .push(filename.clone());
            }

            index.by_filename.insert(
                filename.clone(),
                CatalogEntry {
                    filename: filename.clone(),
                    checksum: checksum.clone(),
                    acquisition,
                },
            );
        }

        index
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.by_filename.len()
    }

    /// Whether the index holds no files
    pub fn is_empty(&self) -> bool {
        self.by_filename.is_empty()
    }

    /// Entry for an exact file name
    pub fn get(&self, filename: &str) -> Option<&CatalogEntry> {
        self.by_filename.get(filename)
    }

    /// All entries in file name order
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.by_filename.values()
    }

    /// Files acquired on `date`
    pub fn files_on(&self, date: NaiveDate) -> &[String] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Files acquired on day `doy` (zero-padded) of `year`
    pub fn files_on_day(&self, year: &str, doy: &str) -> &[String] {
        self.by_year_doy
            .get(year)
            .and_then(|days| days.get(doy))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Distinct acquisition dates, ascending
    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.by_date.keys()
    }

    /// Earliest and latest acquisition dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.by_date.keys().next()?;
        let last = self.by_date.keys().next_back()?;
        Some((*first, *last))
    }

    /// Files whose name carried no parseable date
    pub fn undated(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.by_filename.values().filter(|e| e.acquisition.is_none())
    }
}
