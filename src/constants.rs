//! Application constants for LAADS Mirror
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Bearer token for the LAADS archive
    pub const TOKEN: &str = "LAADS_TOKEN";

    /// Optional override of the archive base URL
    pub const BASE_URL: &str = "LAADS_BASE_URL";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "LAADS-Mirror/0.1.0 (Remote Sensing Research Tool)";

    /// Per-request timeout; a hung request would otherwise stall a pool slot
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 32;

    /// The only status code counted as success
    pub const SUCCESS_STATUS: u16 = 200;
}

/// Retry and rate limiting configuration
pub mod limits {
    use super::Duration;

    /// Default rate limit (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 20;

    /// Backoff before the second attempt is `BASE + INCREMENT`
    pub const BACKOFF_BASE: Duration = Duration::from_secs(0);

    /// Linear backoff increment per retry
    pub const BACKOFF_INCREMENT: Duration = Duration::from_secs(1);

    /// Total attempts per logical fetch
    pub const MAX_ATTEMPTS: u32 = 10;

    /// Consecutive attempts on one session before rotation
    pub const ATTEMPTS_PER_SESSION: u32 = 3;
}

/// LAADS archive endpoints
pub mod laads {
    /// Root of the archive's all-data tree
    pub const ALLDATA_URL: &str = "https://ladsweb.modaps.eosdis.nasa.gov/archive/allData";

    /// Suffix that turns a directory node into its JSON listing
    pub const LISTING_SUFFIX: &str = ".json";
}

/// Filename grammar of archive products
pub mod grammar {
    /// Prefix of the acquisition date segment (`A2019152`)
    pub const ACQUISITION_PREFIX: char = 'A';

    /// Digits of the year in the acquisition segment
    pub const YEAR_DIGITS: usize = 4;

    /// Digits of the zero-padded day-of-year
    pub const DOY_DIGITS: usize = 3;
}

/// Binary container formats accepted for downloaded files
pub mod formats {
    /// HDF5 extension
    pub const HDF5_EXTENSION: &str = "h5";

    /// HDF4 extension
    pub const HDF4_EXTENSION: &str = "hdf";

    /// HDF5 superblock signature
    pub const HDF5_SIGNATURE: &[u8] = b"\x89HDF\r\n\x1a\n";

    /// HDF4 magic number
    pub const HDF4_SIGNATURE: &[u8] = b"\x0e\x03\x13\x01";

    /// HDF5 may place its superblock at 0 or any power of two from 512
    pub const HDF5_FIRST_USERBLOCK: usize = 512;
}

/// Support-store file naming
pub mod files {
    /// Timestamp embedded in snapshot and log file names
    pub const TIMESTAMP_FORMAT: &str = "%m%d%Y_%H%M%S";

    /// Date format in dataset specification files
    pub const SPEC_DATE_FORMAT: &str = "%m/%d/%Y";

    /// Dataset specification file suffix (`<name>_dataset_spec.json`)
    pub const SPEC_SUFFIX: &str = "_dataset_spec.json";

    /// Catalog snapshot infix (`<name>_catalog_<ts>.json`)
    pub const CATALOG_INFIX: &str = "_catalog_";

    /// Catalog snapshot extension
    pub const CATALOG_EXTENSION: &str = "json";

    /// Download log infix (`<name>_download_<ts>.txt`)
    pub const DOWNLOAD_LOG_INFIX: &str = "_download_";

    /// Download log extension
    pub const DOWNLOAD_LOG_EXTENSION: &str = "txt";

    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Run log timestamp (`<name>_<YYYYMMDDHHMMSS>.log`)
    pub const RUN_LOG_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
}

/// Concurrency configuration
pub mod workers {
    /// Default width for metadata crawling
    pub const DEFAULT_CRAWL_WIDTH: usize = 4;

    /// Default width for bulk file downloads
    pub const DEFAULT_DOWNLOAD_WIDTH: usize = 20;

    /// Upper bound accepted from configuration
    pub const MAX_WIDTH: usize = 64;
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use env::TOKEN as ENV_TOKEN;
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use laads::ALLDATA_URL;
pub use limits::{ATTEMPTS_PER_SESSION, MAX_ATTEMPTS};
pub use workers::{DEFAULT_CRAWL_WIDTH, DEFAULT_DOWNLOAD_WIDTH};
