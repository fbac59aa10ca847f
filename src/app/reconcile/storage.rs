//! Local storage of downloaded files

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, warn};

use crate::app::catalog::is_plain_filename;
use crate::constants::files;
use crate::errors::{StorageError, StorageResult};

/// Destination directory of one dataset (`<inputs_dir>/<name>`)
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store for dataset `name` under `inputs_dir`
    pub fn new(inputs_dir: &Path, name: &str) -> Self {
        Self {
            root: inputs_dir.join(name),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final location of `filename`
    pub fn destination(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Save file content atomically using temp file + rename pattern
    ///
    /// Missing directories are created. An existing file is replaced, with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if `filename` is not a plain file name or any
    /// step fails; the temporary file is removed on a failed rename.
    pub async fn save_atomic(&self, filename: &str, content: &[u8]) -> StorageResult<PathBuf> {
        if !is_plain_filename(filename) {
            return Err(StorageError::UnsafeFilename {
                filename: filename.to_string(),
            });
        }
        let final_path = self.destination(filename);
        let temp_path = PathBuf::from(format!(
            "{}{}",
            final_path.display(),
            files::TEMP_FILE_SUFFIX
        ));

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        if fs::try_exists(&final_path).await.unwrap_or(false) {
            warn!("Overwriting existing file {}", final_path.display());
        }

        fs::write(&temp_path, content)
            .await
            .map_err(|source| StorageError::Write {
                path: temp_path.clone(),
                source,
            })?;

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            error!("Failed to rename temporary file: {}", e);
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::AtomicOperationFailed {
                temp_path,
                final_path,
            });
        }

        debug!("Saved {} ({} bytes)", final_path.display(), content.len());
        Ok(final_path)
    }
}
