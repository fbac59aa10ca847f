//! Error types for LAADS Mirror
//!
//! This module defines the error types for every component of the mirror.
//! Per-file failures (fetch, validation, local write) are modelled as values
//! that degrade into a recorded negative status; only configuration errors are
//! meant to abort a whole dataset operation.

use std::path::PathBuf;
use thiserror::Error;

/// Credential errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No bearer token available
    #[error("Missing LAADS token. Set the LAADS_TOKEN environment variable or add it to .env")]
    MissingToken,

    /// Token present but unusable as an HTTP header value
    #[error("Invalid LAADS token: {reason}")]
    InvalidToken { reason: String },

    /// HTTP client could not be built
    #[error("Failed to build HTTP session")]
    Http(#[from] reqwest::Error),

    /// Rate limiter could not be configured
    #[error("Invalid rate limit: {reason}")]
    InvalidRateLimit { reason: String },
}

/// Failures of a single logical fetch
///
/// Attempt-level variants are logged and retried inside the fetcher; the
/// terminal variants are what a caller sees when an item could not be
/// obtained this run.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (connection reset, timeout, DNS)
    #[error("Request failed: {message}")]
    Transport { message: String },

    /// Any status other than 200, including redirects
    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    /// Body digest did not equal the reference checksum
    #[error("Checksum mismatch. Expected: {expected}, got: {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Body rejected by a content-format validator
    #[error("Content rejected by {validator} validator")]
    InvalidContent { validator: &'static str },

    /// Session attempt budget exhausted and no way to rotate
    #[error("Session exhausted after {attempts} attempts for {url}")]
    SessionExhausted { url: String, attempts: u32 },

    /// Total attempt budget exhausted
    #[error("Maximum attempts ({max_attempts}) reached for {url}")]
    MaxAttemptsReached { url: String, max_attempts: u32 },

    /// A fresh session could not be created
    #[error("Failed to rotate session for {url}: {reason}")]
    SessionRotation { url: String, reason: String },

    /// URL could not be parsed
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// The worker running the fetch never returned
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl FetchError {
    /// Whether this error ends the fetch loop rather than a single attempt
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FetchError::SessionExhausted { .. }
                | FetchError::MaxAttemptsReached { .. }
                | FetchError::SessionRotation { .. }
                | FetchError::InvalidUrl { .. }
        )
    }
}

/// A dispatched worker that did not produce a result
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The spawned task panicked or was cancelled
    #[error("Worker task failed: {message}")]
    WorkerFailed { message: String },
}

/// Catalog crawl errors
#[derive(Error, Debug)]
pub enum CrawlError {
    /// The top-level year listing could not be obtained
    #[error("Year listing for {archive_set}/{product} could not be retrieved")]
    YearListingUnavailable {
        archive_set: String,
        product: String,
    },

    /// A year or day listing could not be fetched
    #[error("Listing {url} could not be retrieved")]
    ListingUnavailable {
        url: String,
        #[source]
        source: FetchError,
    },

    /// A listing body was accepted by the fetcher but is not a directory node
    #[error("Malformed listing at {url}")]
    MalformedListing {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The worker fetching a listing never returned
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Catalog snapshot persistence errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Snapshot file not found
    #[error("Catalog snapshot not found: {path}")]
    NotFound { path: PathBuf },

    /// Snapshot file is not a filename -> checksum JSON object
    #[error("Invalid catalog snapshot {path}")]
    InvalidSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Filename does not follow `<product>.A<YYYYDDD>.<...>`
    #[error("Cannot derive acquisition date from filename: {filename}")]
    InvalidFilename { filename: String },

    /// Refusing to overwrite an existing immutable snapshot
    #[error("Catalog snapshot already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// I/O error reading or writing snapshots
    #[error("Catalog I/O error")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Catalog serialization error")]
    Json(#[from] serde_json::Error),
}

/// Dataset specification errors
#[derive(Error, Debug)]
pub enum DatasetError {
    /// First construction of a dataset without archive set / product
    #[error(
        "No preexisting specification found for dataset {name}. Provide at least archive set and product"
    )]
    MissingIdentifiers { name: String },

    /// Dataset names become file name prefixes and must be path-safe
    #[error("Invalid dataset name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Spec file exists but cannot be parsed
    #[error("Invalid dataset specification file {path}")]
    InvalidSpec {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Date given in a form other than MM/DD/YYYY
    #[error("Invalid date '{value}'. Expected MM/DD/YYYY")]
    InvalidDate { value: String },

    /// Start date after end date
    #[error("Start date {start} is after end date {end}")]
    InvertedDateRange { start: String, end: String },

    /// Crawl failed while creating the first catalog
    #[error(transparent)]
    Crawl(#[from] CrawlError),

    /// Catalog persistence failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// I/O error on the spec file
    #[error("Dataset specification I/O error")]
    Io(#[from] std::io::Error),
}

/// Download ledger and log errors
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Unable to read a historical log
    #[error("Failed to read download log {path}")]
    ReadLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unable to create or append to this run's log
    #[error("Failed to write download log {path}")]
    WriteLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error enumerating the support directory
    #[error("Download ledger I/O error")]
    Io(#[from] std::io::Error),
}

/// Local write errors for downloaded content
#[derive(Error, Debug)]
pub enum StorageError {
    /// Name is not a single plain path component
    #[error("Refusing to store {filename}: not a plain file name")]
    UnsafeFilename { filename: String },

    /// Could not create the destination directory
    #[error("Could not create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the temporary file
    #[error("Could not write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not move the temporary file into place
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be rendered
    #[error("Could not serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No platform config directory
    #[error("Could not determine user config directory")]
    NoConfigDir,

    /// I/O error reading or writing configuration
    #[error("Configuration I/O error")]
    Io(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Credential error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Crawl error
    #[error(transparent)]
    Crawl(#[from] CrawlError),

    /// Catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Dataset error
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Ledger error
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Storage error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(e) => !e.is_terminal(),
            AppError::Crawl(CrawlError::YearListingUnavailable { .. }) => true,
            AppError::Dataset(DatasetError::Crawl(CrawlError::YearListingUnavailable {
                ..
            })) => true,
            AppError::Dataset(DatasetError::MissingIdentifiers { .. })
            | AppError::Auth(AuthError::MissingToken)
            | AppError::Config(_) => false,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Fetch(_) => "fetch",
            AppError::Crawl(_) => "crawl",
            AppError::Catalog(_) => "catalog",
            AppError::Dataset(_) => "dataset",
            AppError::Ledger(_) => "ledger",
            AppError::Storage(_) => "storage",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Crawl result type alias
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

/// Catalog result type alias
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Dataset result type alias
pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

/// Ledger result type alias
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Storage result type alias
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_fetch_errors() {
        assert!(FetchError::MaxAttemptsReached {
            url: "u".into(),
            max_attempts: 3
        }
        .is_terminal());
        assert!(FetchError::SessionExhausted {
            url: "u".into(),
            attempts: 3
        }
        .is_terminal());
        assert!(!FetchError::Status { status: 302 }.is_terminal());
        assert!(!FetchError::InvalidContent { validator: "hdf5" }.is_terminal());
    }

    #[test]
    fn test_missing_identifiers_is_fatal_configuration() {
        let err = AppError::from(DatasetError::MissingIdentifiers {
            name: "fiona".to_string(),
        });
        assert_eq!(err.category(), "dataset");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("fiona"));
    }

    #[test]
    fn test_year_listing_failure_is_recoverable() {
        let err = AppError::from(DatasetError::Crawl(CrawlError::YearListingUnavailable {
            archive_set: "5000".to_string(),
            product: "VNP46A2".to_string(),
        }));
        assert!(err.is_recoverable());
    }
}
