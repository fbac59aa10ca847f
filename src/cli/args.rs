//! Command-line argument parsing for LAADS Mirror
//!
//! This module defines the CLI structure using clap derive macros: catalog
//! building and inspection, downloading, status reporting, configuration and
//! credential checks.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::app::dataset::{parse_spec_date, SuppliedSpec};

/// LAADS Mirror - keep a local mirror of LAADS DAAC archive products
#[derive(Parser, Debug)]
#[command(
    name = "laads_mirror",
    version,
    about = "Mirror filtered LAADS DAAC archive products locally",
    long_about = "Crawls the LAADS DAAC archive into versioned catalog snapshots and downloads every
catalogued file that previous runs have not confirmed. Interrupted or failed runs are simply
run again."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for dataset specs, catalogs and download logs
    #[arg(long, global = true, value_name = "DIR")]
    pub support_dir: Option<PathBuf>,

    /// Directory for downloaded files
    #[arg(long, global = true, value_name = "DIR")]
    pub inputs_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, refresh or inspect dataset catalogs
    Catalog(CatalogArgs),

    /// Download every catalogued file not yet confirmed
    Download(DownloadArgs),

    /// Show the download status of a dataset
    Status(NameArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Check archive credentials
    Auth(AuthArgs),
}

/// Arguments for catalog management
#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub action: CatalogAction,
}

/// Catalog actions
#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// Resolve the dataset and ingest its latest catalog, crawling if none exists
    Build(DatasetArgs),

    /// Crawl the archive again and write a new snapshot
    Refresh(NameArgs),

    /// Show the dataset specification and latest snapshot
    Show(NameArgs),
}

/// A dataset name
#[derive(Args, Debug, Clone)]
pub struct NameArgs {
    /// Dataset name
    pub name: String,
}

/// Dataset parameters; ignored with a warning once a spec exists
#[derive(Args, Debug, Clone, Default)]
pub struct DatasetArgs {
    /// Dataset name
    pub name: String,

    /// Archive set identifier (e.g. 5000)
    #[arg(long)]
    pub archive_set: Option<String>,

    /// Product identifier (e.g. VNP46A2)
    #[arg(long)]
    pub product: Option<String>,

    /// First acquisition date, MM/DD/YYYY
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    /// Last acquisition date, MM/DD/YYYY
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,

    /// Keep only files whose name contains this (repeatable)
    #[arg(long = "include", value_name = "SUBSTRING")]
    pub include: Vec<String>,

    /// Drop files whose name contains this (repeatable)
    #[arg(long = "exclude", value_name = "SUBSTRING")]
    pub exclude: Vec<String>,
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Dataset name
    pub name: String,

    /// Number of concurrent downloads (defaults to the configured width)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Dry run - show what would be downloaded without downloading
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Destination (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Replace an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Arguments for authentication checks
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Authentication actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Show whether a token is available
    Status,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_spec_date(value).map_err(|e| e.to_string())
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level from the flags, falling back to the configured level
    pub fn log_level(&self, configured: &str) -> String {
        if self.global.quiet {
            "error".to_string()
        } else if self.global.very_verbose {
            "debug".to_string()
        } else if self.global.verbose {
            "info".to_string()
        } else {
            configured.to_string()
        }
    }

    /// Dataset the command works on, if any
    pub fn dataset_name(&self) -> Option<&str> {
        match &self.command {
            Commands::Catalog(args) => match &args.action {
                CatalogAction::Build(args) => Some(&args.name),
                CatalogAction::Refresh(args) | CatalogAction::Show(args) => Some(&args.name),
            },
            Commands::Download(args) => Some(&args.name),
            Commands::Status(args) => Some(&args.name),
            Commands::Config(_) | Commands::Auth(_) => None,
        }
    }
}

impl DatasetArgs {
    /// Parameters offered to dataset resolution
    pub fn supplied(&self) -> SuppliedSpec {
        SuppliedSpec {
            archive_set: self.archive_set.clone(),
            product: self.product.clone(),
            start_date: self.start,
            end_date: self.end,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

impl DownloadArgs {
    /// Reject a zero worker count
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == Some(0) {
            return Err("Number of workers must be greater than 0".to_string());
        }
        Ok(())
    }
}
