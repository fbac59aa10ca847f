//! Durable dataset specification
//!
//! Stored as `<support_dir>/<name>_dataset_spec.json`:
//!
//! ```json
//! {
//!     "Name": "fiona",
//!     "Archive Set": "5000",
//!     "Product": "VNP46A2",
//!     "Start Date": "06/01/2019",
//!     "End Date": null,
//!     "Include": ["h11v07"],
//!     "Exclude": []
//! }
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::app::crawler::{CrawlTarget, FileFilter};
use crate::constants::files;
use crate::errors::{DatasetError, DatasetResult};

/// Parameters that define a dataset's catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Archive Set")]
    pub archive_set: String,
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Start Date", default, with = "spec_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "End Date", default, with = "spec_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "Include", default, deserialize_with = "one_or_many")]
    pub include: Vec<String>,
    #[serde(rename = "Exclude", default, deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,
}

impl DatasetSpec {
    /// What the crawler needs from this spec
    pub fn crawl_target(&self) -> CrawlTarget {
        CrawlTarget {
            archive_set: self.archive_set.clone(),
            product: self.product.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            filter: FileFilter::new(self.include.clone(), self.exclude.clone()),
        }
    }

    /// Reject an inverted date window
    pub fn validate(&self) -> DatasetResult<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(DatasetError::InvertedDateRange {
                    start: format_spec_date(start),
                    end: format_spec_date(end),
                });
            }
        }
        Ok(())
    }

    /// Read a spec file
    pub fn load(path: &Path) -> DatasetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| DatasetError::InvalidSpec {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write a spec file, four-space indented
    pub fn save(&self, path: &Path) -> DatasetResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)
            .map_err(|source| DatasetError::InvalidSpec {
                path: path.to_path_buf(),
                source,
            })?;
        std::fs::write(path, buffer)?;
        Ok(())
    }
}

/// Parse an `MM/DD/YYYY` date
pub fn parse_spec_date(value: &str) -> DatasetResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), files::SPEC_DATE_FORMAT).map_err(|_| {
        DatasetError::InvalidDate {
            value: value.to_string(),
        }
    })
}

/// Render a date as `MM/DD/YYYY`
pub fn format_spec_date(date: NaiveDate) -> String {
    date.format(files::SPEC_DATE_FORMAT).to_string()
}

mod spec_date {
    use super::*;

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&format_spec_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let value: Option<String> = Option::deserialize(deserializer)?;
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_spec_date(value)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Accept `null`, a single string or a list of strings
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}
