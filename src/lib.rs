//! LAADS Mirror Library
//!
//! Keeps a local, reconciled mirror of a filtered subset of the LAADS DAAC
//! archive: crawls the archive into versioned catalog snapshots, then
//! downloads what the merged download ledger has not yet confirmed.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
