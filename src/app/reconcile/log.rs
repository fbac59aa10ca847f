//! Per-run download log
//!
//! Each run creates a fresh `<name>_download_<timestamp>.txt` and appends one
//! final line per attempted file. Earlier logs are never opened for writing.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::ledger::format_line;
use crate::app::support::{ArtifactKind, SupportStore, TimestampedFile};
use crate::errors::{LedgerError, LedgerResult};

/// Append-only log owned by the single consumer of a reconcile run
#[derive(Debug)]
pub struct DownloadLog {
    path: PathBuf,
    file: File,
    lines: usize,
}

impl DownloadLog {
    /// Create this run's log; an existing file with the same name is an error
    pub async fn create(
        store: &SupportStore,
        name: &str,
        created_at: NaiveDateTime,
    ) -> LedgerResult<Self> {
        let path = store.artifact_path(ArtifactKind::DownloadLog, name, created_at);
        let write_error = |source| LedgerError::WriteLog {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(store.dir())
            .await
            .map_err(write_error)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(write_error)?;

        info!("Recording download outcomes in {}", path.display());
        Ok(Self {
            path,
            file,
            lines: 0,
        })
    }

    /// Append `<filename> True|False` and flush it
    pub async fn append(&mut self, filename: &str, status: bool) -> LedgerResult<()> {
        let line = format_line(filename, status);
        let result = async {
            self.file.write_all(line.as_bytes()).await?;
            self.file.flush().await
        }
        .await;
        result.map_err(|source| LedgerError::WriteLog {
            path: self.path.clone(),
            source,
        })?;
        self.lines += 1;
        Ok(())
    }

    /// Flush to disk and close
    pub async fn finish(mut self) -> LedgerResult<PathBuf> {
        self.file
            .sync_all()
            .await
            .map_err(|source| LedgerError::WriteLog {
                path: self.path.clone(),
                source,
            })?;
        Ok(self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines written so far
    pub fn lines(&self) -> usize {
        self.lines
    }
}

/// Most recent download log of a dataset
pub fn select_latest_download_log(
    store: &SupportStore,
    name: &str,
) -> LedgerResult<Option<TimestampedFile>> {
    Ok(store.latest(ArtifactKind::DownloadLog, name)?)
}
