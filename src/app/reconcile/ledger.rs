//! Download ledger
//!
//! The ledger is never stored; it is recomputed on every run by folding all
//! historical download logs of a dataset. The fold is monotonic: once a file
//! has been recorded `True` no later or earlier `False` can downgrade it, so
//! the result does not depend on the order logs are read in.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::app::catalog::Catalog;
use crate::app::support::{ArtifactKind, SupportStore};
use crate::errors::{LedgerError, LedgerResult};

/// Log token for a confirmed download
pub const CONFIRMED: &str = "True";
/// Log token for a failed attempt
pub const FAILED: &str = "False";

/// Per-file confirmed-download status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadLedger {
    entries: BTreeMap<String, bool>,
}

impl DownloadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold every `<name>_download_*.txt` log in the support store
    pub fn from_logs(store: &SupportStore, name: &str) -> LedgerResult<Self> {
        let mut ledger = Self::new();
        let logs = store.list(ArtifactKind::DownloadLog, name)?;
        for log in &logs {
            ledger.absorb_log(&log.path)?;
        }
        debug!(
            "Merged {} download logs for {} into {} entries",
            logs.len(),
            name,
            ledger.len()
        );
        Ok(ledger)
    }

    /// Fold one log file
    pub fn absorb_log(&mut self, path: &Path) -> LedgerResult<()> {
        let content = std::fs::read_to_string(path).map_err(|source| LedgerError::ReadLog {
            path: path.to_path_buf(),
            source,
        })?;
        self.absorb_text(&content, path);
        Ok(())
    }

    fn absorb_text(&mut self, content: &str, origin: &Path) {
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Some((filename, status)) => self.record(filename, status),
                None => warn!(
                    "Skipping malformed line {} of {}: {:?}",
                    number + 1,
                    origin.display(),
                    line
                ),
            }
        }
    }

    /// Record one outcome; `true` is sticky
    pub fn record(&mut self, filename: impl Into<String>, status: bool) {
        let entry = self.entries.entry(filename.into()).or_insert(status);
        *entry |= status;
    }

    /// Fold another ledger into this one
    pub fn merge(&mut self, other: &DownloadLedger) {
        for (filename, status) in &other.entries {
            self.record(filename.clone(), *status);
        }
    }

    /// Recorded status, `None` if never attempted
    pub fn status(&self, filename: &str) -> Option<bool> {
        self.entries.get(filename).copied()
    }

    /// Whether the file has been confirmed downloaded
    pub fn is_confirmed(&self, filename: &str) -> bool {
        self.status(filename) == Some(true)
    }

    /// Catalog files not confirmed downloaded, in file name order
    pub fn pending(&self, catalog: &Catalog) -> Vec<String> {
        catalog
            .filenames()
            .filter(|filename| !self.is_confirmed(filename))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &bool)> {
        self.entries.iter()
    }
}

/// Parse `<filename> <True|False>`
///
/// The status is the token after the last space, so file names may
/// themselves contain spaces.
pub fn parse_line(line: &str) -> Option<(&str, bool)> {
    let (filename, status) = line.trim_end().rsplit_once(' ')?;
    let status = match status {
        CONFIRMED => true,
        FAILED => false,
        _ => return None,
    };
    if filename.is_empty() {
        return None;
    }
    Some((filename, status))
}

/// Render one log line, newline included
pub fn format_line(filename: &str, status: bool) -> String {
    format!("{} {}\n", filename, if status { CONFIRMED } else { FAILED })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn ledger_from(logs: &[&str]) -> DownloadLedger {
        let mut ledger = DownloadLedger::new();
        for log in logs {
            ledger.absorb_text(log, &PathBuf::from("test.txt"));
        }
        ledger
    }

    #[test]
    fn test_true_wins_regardless_of_order() {
        let forward = ledger_from(&["f1.h5 False\n", "f1.h5 True\n"]);
        let backward = ledger_from(&["f1.h5 True\n", "f1.h5 False\n"]);
        assert_eq!(forward.status("f1.h5"), Some(true));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_false_alone_stays_pending() {
        let ledger = ledger_from(&["f1.h5 False\nf1.h5 False\n"]);
        assert_eq!(ledger.status("f1.h5"), Some(false));
        assert!(!ledger.is_confirmed("f1.h5"));
    }

    #[test]
    fn test_pending_is_catalog_minus_confirmed() {
        let catalog: Catalog = [("f1.h5", "h1"), ("f2.h5", "h2")]
            .into_iter()
            .map(|(f, c)| (f.to_string(), c.to_string()))
            .collect();
        let mut ledger = DownloadLedger::new();
        ledger.record("f1.h5", true);
        assert_eq!(ledger.pending(&catalog), vec!["f2.h5".to_string()]);

        ledger.record("f2.h5", false);
        assert_eq!(ledger.pending(&catalog), vec!["f2.h5".to_string()]);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let ledger = ledger_from(&["f1.h5 True\ngarbage\nf2.h5 maybe\nf3.h5 True extra\n\nf4.h5 False\n"]);
        assert_eq!(ledger.len(), 2);
        assert!(ledger.is_confirmed("f1.h5"));
        assert_eq!(ledger.status("f4.h5"), Some(false));
    }

    #[test]
    fn test_merge_is_monotonic() {
        let mut left = ledger_from(&["a.h5 True\nb.h5 False\n"]);
        let right = ledger_from(&["a.h5 False\nb.h5 True\nc.h5 False\n"]);
        left.merge(&right);
        assert!(left.is_confirmed("a.h5"));
        assert!(left.is_confirmed("b.h5"));
        assert_eq!(left.status("c.h5"), Some(false));
    }

    #[test]
    fn test_line_format() {
        assert_eq!(format_line("f1.h5", true), "f1.h5 True\n");
        assert_eq!(format_line("f1.h5", false), "f1.h5 False\n");
        assert_eq!(parse_line("f1.h5 True"), Some(("f1.h5", true)));
    }

    #[test]
    fn test_filename_with_spaces_survives_a_log_round_trip() {
        let filename = "VNP46A2.A2019152.h11v07 copy.001.h5";
        let line = format_line(filename, true);
        assert_eq!(parse_line(&line), Some((filename, true)));

        let ledger = ledger_from(&[line.as_str()]);
        assert!(ledger.is_confirmed(filename));
        assert_eq!(parse_line(" True"), None);
    }
}
