//! Command handlers for the LAADS Mirror CLI
//!
//! This module implements the command handlers that coordinate between CLI
//! arguments and the core application functionality. Handlers print their
//! results on stdout; diagnostics go through `tracing`.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::app::catalog::CatalogSnapshot;
use crate::app::client::{LaadsSessionFactory, SessionFactory};
use crate::app::crawler::CatalogCrawler;
use crate::app::dataset::{self, format_spec_date, Dataset, DatasetSpec, SuppliedSpec};
use crate::app::fetch::Fetcher;
use crate::app::reconcile::{remote_url, DownloadLedger, DownloadReport, Reconciler};
use crate::app::support::SupportStore;
use crate::auth::{get_auth_status, BearerToken};
use crate::cli::{
    AuthAction, AuthArgs, CatalogAction, CatalogArgs, ConfigAction, ConfigArgs, DownloadArgs,
    GlobalArgs, NameArgs, ProgressConfig,
};
use crate::config::{AppConfig, StorageConfig};
use crate::errors::{AppError, Result};

/// Files listed by a dry run before the rest are summarised
const DRY_RUN_PREVIEW: usize = 10;

/// Everything a dataset command needs, resolved once per invocation
#[derive(Debug, Clone)]
pub struct CommandContext {
    config: AppConfig,
    storage: StorageConfig,
    support: SupportStore,
    progress: ProgressConfig,
}

impl CommandContext {
    /// Apply directory overrides from the command line and create the directories
    pub fn new(config: AppConfig, global: &GlobalArgs) -> Result<Self> {
        let mut storage = config.storage();
        if let Some(dir) = &global.support_dir {
            storage.support_dir = dir.clone();
        }
        if let Some(dir) = &global.inputs_dir {
            storage.inputs_dir = dir.clone();
        }
        storage.ensure_dirs()?;

        Ok(Self {
            support: SupportStore::new(&storage.support_dir),
            progress: ProgressConfig::detect(global.quiet),
            config,
            storage,
        })
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Authorized fetcher that rotates sessions through the archive factory
    fn fetcher(&self) -> Result<Fetcher> {
        let token = BearerToken::from_env()?;
        let factory = Arc::new(LaadsSessionFactory::new(self.config.client.clone(), token)?);
        let session = factory.new_session()?;
        Ok(Fetcher::new(session, self.config.fetch).with_session_factory(factory))
    }

    fn crawler(&self) -> Result<CatalogCrawler> {
        Ok(CatalogCrawler::new(
            self.fetcher()?,
            self.config.client.base_url(),
            self.config.concurrency.crawl_width,
        ))
    }

    /// Ingest the latest snapshot, crawling only when none exists
    async fn open_dataset(&self, spec: DatasetSpec) -> Result<Dataset> {
        let crawler = self.crawler()?;
        let spinner = self
            .progress
            .spinner(format!("Opening {} {}...", spec.archive_set, spec.product))?;
        let result = Dataset::open(&self.support, spec, &crawler).await;
        spinner.finish_and_clear();
        Ok(result?)
    }

    async fn refresh_dataset(&self, spec: DatasetSpec) -> Result<Dataset> {
        let crawler = self.crawler()?;
        let spinner = self
            .progress
            .spinner(format!("Crawling {} {}...", spec.archive_set, spec.product))?;
        let result = Dataset::refresh(&self.support, spec, &crawler).await;
        spinner.finish_and_clear();
        Ok(result?)
    }
}

/// Handle catalog commands
pub async fn handle_catalog(ctx: &CommandContext, args: CatalogArgs) -> Result<()> {
    match args.action {
        CatalogAction::Build(args) => {
            let spec = dataset::resolve(&ctx.support, &args.name, &args.supplied())?;
            let dataset = ctx.open_dataset(spec).await?;
            print_catalog_summary(&dataset);
        }
        CatalogAction::Refresh(NameArgs { name }) => {
            let spec = dataset::resolve(&ctx.support, &name, &SuppliedSpec::default())?;
            let dataset = ctx.refresh_dataset(spec).await?;
            print_catalog_summary(&dataset);
        }
        CatalogAction::Show(NameArgs { name }) => {
            let spec = dataset::resolve(&ctx.support, &name, &SuppliedSpec::default())?;
            print_spec(&spec, &ctx.support.spec_path(&name));
            match Dataset::load(&ctx.support, spec)? {
                Some(dataset) => print_catalog_summary(&dataset),
                None => println!("\nNo catalog yet. Run 'laads_mirror catalog build {}'", name),
            }
        }
    }
    Ok(())
}

/// Handle the download command
///
/// Resolves the dataset, ingests its latest catalog (crawling if there is
/// none) and downloads everything not yet confirmed by earlier runs. A dry
/// run only reads local state and never crawls.
pub async fn handle_download(ctx: &CommandContext, args: DownloadArgs) -> Result<()> {
    args.validate().map_err(AppError::generic)?;

    let spec = dataset::resolve(&ctx.support, &args.name, &SuppliedSpec::default())?;

    if args.dry_run {
        return match Dataset::load(&ctx.support, spec)? {
            Some(dataset) => print_dry_run(ctx, &dataset),
            None => {
                println!(
                    "Dry run: dataset {} has no catalog yet. Run 'laads_mirror catalog build {}'",
                    args.name, args.name
                );
                Ok(())
            }
        };
    }

    let dataset = ctx.open_dataset(spec).await?;

    let width = args
        .workers
        .unwrap_or(ctx.config.concurrency.download_width);
    let reconciler = Reconciler::new(
        ctx.fetcher()?,
        ctx.config.client.base_url(),
        ctx.support.clone(),
        &ctx.storage.inputs_dir,
        width,
    )
    .with_progress(ctx.progress.download_bar()?);

    let summary = reconciler.reconcile(&dataset).await?;

    if summary.pending == 0 {
        println!(
            "All {} files of dataset {} are already downloaded",
            dataset.snapshot().catalog.len(),
            dataset.name()
        );
        return Ok(());
    }

    println!("\nDownload run for dataset {}", dataset.name());
    println!("  Pending:            {}", summary.pending);
    println!("  Downloaded:         {}", summary.succeeded);
    println!("  Failed to fetch:    {}", summary.fetch_failures);
    println!("  Failed to store:    {}", summary.write_failures);
    println!("  Elapsed:            {:.2}s", summary.elapsed.as_secs_f64());
    if let Some(path) = &summary.log_path {
        println!("  Download log:       {}", path.display());
    }
    if summary.failed() > 0 {
        warn!(
            "{} files of dataset {} were not downloaded; run again to retry them",
            summary.failed(),
            dataset.name()
        );
        println!(
            "\n{} files will be retried on the next run",
            summary.failed()
        );
    }
    Ok(())
}

/// Handle the status command
pub async fn handle_status(ctx: &CommandContext, args: NameArgs) -> Result<()> {
    let spec = dataset::resolve(&ctx.support, &args.name, &SuppliedSpec::default())?;
    match Dataset::load(&ctx.support, spec)? {
        Some(dataset) => println!("{}", DownloadReport::build(&ctx.support, &dataset)?),
        None => println!(
            "Dataset {} has no catalog yet. Run 'laads_mirror catalog build {}'",
            args.name, args.name
        ),
    }
    Ok(())
}

/// Handle configuration commands
pub async fn handle_config(config: &AppConfig, args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => AppConfig::default_config_path()?,
            };
            AppConfig::initialize(&path, force).await?;
            println!("Configuration written to {}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}

/// Handle authentication commands
pub async fn handle_auth(args: AuthArgs) -> Result<()> {
    match args.action {
        AuthAction::Status => {
            let status = get_auth_status();
            println!("{}", status.status_message());
            if !status.has_credentials() && status.dotenv_file_exists {
                println!("A .env file exists but does not define the token");
            }
            if status.has_credentials() {
                // Parse it so a malformed token is reported before any run
                BearerToken::from_env()?;
            }
        }
    }
    Ok(())
}

fn print_spec(spec: &DatasetSpec, path: &Path) {
    let date = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "open".to_string(), format_spec_date);

    println!("Dataset {} ({})", spec.name, path.display());
    println!("  Archive set:  {}", spec.archive_set);
    println!("  Product:      {}", spec.product);
    println!("  Start date:   {}", date(spec.start_date));
    println!("  End date:     {}", date(spec.end_date));
    println!("  Include:      {:?}", spec.include);
    println!("  Exclude:      {:?}", spec.exclude);
}

fn print_catalog_summary(dataset: &Dataset) {
    let snapshot: &CatalogSnapshot = dataset.snapshot();
    let index = dataset.index();

    println!("\nCatalog {}", snapshot.file.path.display());
    println!("  Files:        {}", snapshot.catalog.len());
    match index.date_range() {
        Some((first, last)) => println!("  Dates:        {} to {}", first, last),
        None => println!("  Dates:        none"),
    }
    println!("  Days:         {}", index.dates().count());
    let undated = index.undated().count();
    if undated > 0 {
        println!("  Undated:      {}", undated);
    }
}

fn print_dry_run(ctx: &CommandContext, dataset: &Dataset) -> Result<()> {
    let ledger = DownloadLedger::from_logs(&ctx.support, dataset.name())?;
    let pending = ledger.pending(&dataset.snapshot().catalog);
    let spec = dataset.spec();

    println!(
        "Dry run: {} of {} files of dataset {} would be downloaded into {}",
        pending.len(),
        dataset.snapshot().catalog.len(),
        dataset.name(),
        ctx.storage.inputs_dir.join(dataset.name()).display()
    );
    for filename in pending.iter().take(DRY_RUN_PREVIEW) {
        match remote_url(
            ctx.config.client.base_url(),
            &spec.archive_set,
            &spec.product,
            filename,
        ) {
            Ok(url) => println!("  {}", url),
            Err(e) => println!("  {} ({})", filename, e),
        }
    }
    if pending.len() > DRY_RUN_PREVIEW {
        println!("  ... and {} more", pending.len() - DRY_RUN_PREVIEW);
    }
    Ok(())
}
