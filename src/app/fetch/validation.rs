//! Content checks applied to every successful response body
//!
//! A body that fails any check is treated exactly like a transient network
//! failure: the attempt is discarded and the fetcher retries.

use std::path::Path;

use crate::constants::formats;
use crate::errors::{FetchError, FetchResult};

/// Structural check on a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentValidator {
    /// Body parses as JSON
    Json,
    /// Body is an HDF5 container
    Hdf5,
    /// Body is an HDF4 container
    Hdf4,
}

impl ContentValidator {
    /// Validator for a data file, chosen by its extension
    pub fn for_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename).extension()?.to_str()?;
        if extension.eq_ignore_ascii_case(formats::HDF5_EXTENSION) {
            Some(ContentValidator::Hdf5)
        } else if extension.eq_ignore_ascii_case(formats::HDF4_EXTENSION) {
            Some(ContentValidator::Hdf4)
        } else {
            None
        }
    }

    /// Short name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            ContentValidator::Json => "json",
            ContentValidator::Hdf5 => "hdf5",
            ContentValidator::Hdf4 => "hdf4",
        }
    }

    /// Whether the body is acceptable
    pub fn accepts(&self, body: &[u8]) -> bool {
        match self {
            ContentValidator::Json => serde_json::from_slice::<serde_json::Value>(body).is_ok(),
            ContentValidator::Hdf5 => has_hdf5_signature(body),
            ContentValidator::Hdf4 => body.starts_with(formats::HDF4_SIGNATURE),
        }
    }

    /// `accepts` as a fetch result
    pub fn check(&self, body: &[u8]) -> FetchResult<()> {
        if self.accepts(body) {
            Ok(())
        } else {
            Err(FetchError::InvalidContent {
                validator: self.name(),
            })
        }
    }
}

/// HDF5 superblock may sit at 0, 512, 1024, 2048, ...
fn has_hdf5_signature(body: &[u8]) -> bool {
    if body.starts_with(formats::HDF5_SIGNATURE) {
        return true;
    }
    let mut offset = formats::HDF5_FIRST_USERBLOCK;
    while offset + formats::HDF5_SIGNATURE.len() <= body.len() {
        if body[offset..].starts_with(formats::HDF5_SIGNATURE) {
            return true;
        }
        offset *= 2;
    }
    false
}

/// Lower-case hex MD5 of a body
pub fn md5_hex(body: &[u8]) -> String {
    format!("{:x}", md5::compute(body))
}

/// Compare a body against the archive's reference checksum
pub fn verify_checksum(body: &[u8], expected: &str) -> FetchResult<()> {
    let actual = md5_hex(body);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(FetchError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
