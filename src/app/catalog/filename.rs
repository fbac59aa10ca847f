//! Acquisition date embedded in archive file names
//!
//! Archive products are named `<product>.A<YYYY><DDD>.<tile>.<collection>.<rest>.<ext>`.
//! The date segment is read by prefix stripping and fixed offsets only.

use std::path::{Component, Path};

use chrono::NaiveDate;

use crate::constants::grammar;
use crate::errors::{CatalogError, CatalogResult};

/// Year and day-of-year of an archive file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AcquisitionDate {
    /// Four-digit year
    pub year: i32,
    /// Day of year, 1-indexed
    pub doy: u32,
}

impl AcquisitionDate {
    /// Parse the acquisition date out of a file name
    pub fn from_filename(filename: &str) -> CatalogResult<Self> {
        let invalid = || CatalogError::InvalidFilename {
            filename: filename.to_string(),
        };

        let segment = filename.split('.').nth(1).ok_or_else(invalid)?;
        let digits = segment
            .strip_prefix(grammar::ACQUISITION_PREFIX)
            .ok_or_else(invalid)?;

        if digits.len() != grammar::YEAR_DIGITS + grammar::DOY_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let (year, doy) = digits.split_at(grammar::YEAR_DIGITS);
        let acquisition = Self {
            year: year.parse().map_err(|_| invalid())?,
            doy: doy.parse().map_err(|_| invalid())?,
        };

        // Day 366 of a common year is not a date
        acquisition.date().ok_or_else(invalid)?;
        Ok(acquisition)
    }

    /// Calendar date
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_yo_opt(self.year, self.doy)
    }

    /// Year as it appears in archive paths
    pub fn year_key(&self) -> String {
        format!("{:04}", self.year)
    }

    /// Zero-padded day-of-year as it appears in archive paths
    pub fn doy_key(&self) -> String {
        format!("{:03}", self.doy)
    }
}

/// Whether `name` is a single plain path component
///
/// Names come from the remote listing and are joined onto local directories,
/// so separators of either platform, `.`, `..` and absolute paths are refused.
pub fn is_plain_filename(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
