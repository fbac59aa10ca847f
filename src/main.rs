//! LAADS Mirror CLI application
//!
//! Command-line interface for keeping a local mirror of LAADS DAAC archive
//! products: catalog crawling, resumable downloads and status reports.

use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;

use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

use laads_mirror::cli::{
    handle_auth, handle_catalog, handle_config, handle_download, handle_status, Cli, Commands,
    CommandContext,
};
use laads_mirror::config::AppConfig;
use laads_mirror::constants::files;
use laads_mirror::errors::{AppError, Result};

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    let log_file = init_logging(&cli, &config)?;

    info!("LAADS Mirror v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = log_file {
        debug!("Writing run log to {}", path.display());
    }

    match cli.command {
        Commands::Catalog(args) => {
            info!("Executing catalog command");
            let ctx = CommandContext::new(config, &cli.global)?;
            handle_catalog(&ctx, args).await
        }
        Commands::Download(args) => {
            info!("Executing download command");
            let ctx = CommandContext::new(config, &cli.global)?;
            handle_download(&ctx, args).await
        }
        Commands::Status(args) => {
            info!("Executing status command");
            let ctx = CommandContext::new(config, &cli.global)?;
            handle_status(&ctx, args).await
        }
        Commands::Config(args) => handle_config(&config, args).await,
        Commands::Auth(args) => handle_auth(args).await,
    }
}

/// Initialize logging from CLI verbosity and the `[logging]` section
///
/// Commands that work on a dataset also log into
/// `<logs_dir>/<dataset>_<YYYYMMDDHHMMSS>.log` when file logging is enabled.
fn init_logging(cli: &Cli, config: &AppConfig) -> Result<Option<PathBuf>> {
    let log_level = cli.log_level(&config.logging.level);

    let directive = format!("laads_mirror={}", log_level)
        .parse::<Directive>()
        .map_err(|e| AppError::generic(format!("Invalid log level '{}': {}", log_level, e)))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    let console = fmt::layer()
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_ansi(config.logging.colored_output);

    let (file_layer, log_path) = match cli.dataset_name() {
        Some(name) if config.logging.file_logging => {
            let logs_dir = config.storage().logs_dir;
            std::fs::create_dir_all(&logs_dir)?;
            let path = logs_dir.join(format!(
                "{}_{}.log",
                name,
                chrono::Local::now().format(files::RUN_LOG_TIMESTAMP_FORMAT)
            ));
            let file = File::create(&path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
    Ok(log_path)
}
