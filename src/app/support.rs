//! Support store layout
//!
//! The support directory holds every durable artifact of a dataset: its
//! specification, its catalog snapshots and its download logs. Snapshots and
//! logs embed their creation time in the file name
//! (`<name>_catalog_MMDDYYYY_HHMMSS.json`, `<name>_download_MMDDYYYY_HHMMSS.txt`),
//! and "latest" always means the maximum parsed timestamp, never the file
//! system's modification time.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use tracing::debug;

use crate::constants::files;

/// Kind of timestamped artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Catalog snapshot
    Catalog,
    /// Per-run download log
    DownloadLog,
}

impl ArtifactKind {
    fn infix(&self) -> &'static str {
        match self {
            ArtifactKind::Catalog => files::CATALOG_INFIX,
            ArtifactKind::DownloadLog => files::DOWNLOAD_LOG_INFIX,
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Catalog => files::CATALOG_EXTENSION,
            ArtifactKind::DownloadLog => files::DOWNLOAD_LOG_EXTENSION,
        }
    }
}

/// A snapshot or log file with its embedded creation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedFile {
    /// Location on disk
    pub path: PathBuf,
    /// Timestamp parsed from the file name
    pub created_at: NaiveDateTime,
}

/// Naming and discovery of files in the support directory
#[derive(Debug, Clone)]
pub struct SupportStore {
    dir: PathBuf,
}

impl SupportStore {
    /// Store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<name>_dataset_spec.json`
    pub fn spec_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", name, files::SPEC_SUFFIX))
    }

    /// Path of an artifact created at `created_at`
    pub fn artifact_path(
        &self,
        kind: ArtifactKind,
        name: &str,
        created_at: NaiveDateTime,
    ) -> PathBuf {
        self.dir.join(format!(
            "{}{}{}.{}",
            name,
            kind.infix(),
            created_at.format(files::TIMESTAMP_FORMAT),
            kind.extension()
        ))
    }

    /// Every artifact of `kind` for `name`, oldest first
    ///
    /// A missing support directory simply has no artifacts.
    pub fn list(&self, kind: ArtifactKind, name: &str) -> std::io::Result<Vec<TimestampedFile>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(created_at) = parse_artifact_name(file_name, kind, name) {
                found.push(TimestampedFile {
                    path: entry.path(),
                    created_at,
                });
            } else {
                debug!("Ignoring {} while listing {:?} for {}", file_name, kind, name);
            }
        }

        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }

    /// The artifact with the maximum embedded timestamp
    pub fn latest(&self, kind: ArtifactKind, name: &str) -> std::io::Result<Option<TimestampedFile>> {
        Ok(self
            .list(kind, name)?
            .into_iter()
            .max_by(|a, b| a.created_at.cmp(&b.created_at)))
    }
}

/// Current local time at the resolution of artifact names
pub fn now_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Parse `<name><infix><timestamp>.<ext>`; anything else is not ours
pub fn parse_artifact_name(
    file_name: &str,
    kind: ArtifactKind,
    name: &str,
) -> Option<NaiveDateTime> {
    let stamp = file_name
        .strip_prefix(name)?
        .strip_prefix(kind.infix())?
        .strip_suffix(kind.extension())?
        .strip_suffix('.')?;
    NaiveDateTime::parse_from_str(stamp, files::TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, month, day)
            .unwrap()
            .and_hms_opt(hour, 30, 15)
            .unwrap()
    }

    #[test]
    fn test_artifact_naming() {
        let store = SupportStore::new("/support");
        assert_eq!(
            store.artifact_path(ArtifactKind::Catalog, "fiona", at(3, 7, 9)),
            PathBuf::from("/support/fiona_catalog_03072024_093015.json")
        );
        assert_eq!(
            store.artifact_path(ArtifactKind::DownloadLog, "fiona", at(3, 7, 9)),
            PathBuf::from("/support/fiona_download_03072024_093015.txt")
        );
        assert_eq!(
            store.spec_path("fiona"),
            PathBuf::from("/support/fiona_dataset_spec.json")
        );
    }

    #[test]
    fn test_parse_rejects_other_datasets_and_kinds() {
        let stamp = "fiona_catalog_03072024_093015.json";
        assert_eq!(
            parse_artifact_name(stamp, ArtifactKind::Catalog, "fiona"),
            Some(at(3, 7, 9))
        );
        assert_eq!(parse_artifact_name(stamp, ArtifactKind::DownloadLog, "fiona"), None);
        assert_eq!(parse_artifact_name(stamp, ArtifactKind::Catalog, "fio"), None);
        assert_eq!(
            parse_artifact_name("fiona_catalog_garbage.json", ArtifactKind::Catalog, "fiona"),
            None
        );
    }

    #[test]
    fn test_latest_uses_embedded_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let store = SupportStore::new(temp_dir.path());

        // Month-first names sort lexically in the wrong order across years
        let older = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let newer = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        for created_at in [newer, older] {
            std::fs::write(store.artifact_path(ArtifactKind::Catalog, "fiona", created_at), "{}")
                .unwrap();
        }
        std::fs::write(temp_dir.path().join("unrelated.json"), "{}").unwrap();

        let listed = store.list(ArtifactKind::Catalog, "fiona").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].created_at, older);

        let latest = store.latest(ArtifactKind::Catalog, "fiona").unwrap().unwrap();
        assert_eq!(latest.created_at, newer);
    }

    #[test]
    fn test_missing_directory_has_no_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let store = SupportStore::new(temp_dir.path().join("absent"));
        assert!(store.list(ArtifactKind::DownloadLog, "fiona").unwrap().is_empty());
        assert!(store.latest(ArtifactKind::Catalog, "fiona").unwrap().is_none());
    }
}
