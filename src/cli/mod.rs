//! Command-line interface components
//!
//! This module contains CLI-specific code for the LAADS Mirror application,
//! including argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    AuthAction, AuthArgs, CatalogAction, CatalogArgs, Cli, Commands, ConfigAction, ConfigArgs,
    DatasetArgs, DownloadArgs, GlobalArgs, NameArgs,
};
pub use commands::{
    handle_auth, handle_catalog, handle_config, handle_download, handle_status, CommandContext,
};
pub use progress::ProgressConfig;
