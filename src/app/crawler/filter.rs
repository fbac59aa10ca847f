//! Substring filters on file names

use serde::{Deserialize, Serialize};

/// Include/exclude substring filter
///
/// A file is kept iff every include substring occurs in its name and no
/// exclude substring does. Empty lists impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl FileFilter {
    /// Filter from include and exclude lists
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    /// Whether `filename` passes the filter
    pub fn accepts(&self, filename: &str) -> bool {
        self.include.iter().all(|s| filename.contains(s.as_str()))
            && !self.exclude.iter().any(|s| filename.contains(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        assert!(FileFilter::default().accepts("X.A2019152.h10v07.001.h5"));
    }

    #[test]
    fn test_include_requires_every_substring() {
        let filter = FileFilter::new(strings(&["h11v07", ".h5"]), Vec::new());
        assert!(filter.accepts("X.A2019152.h11v07.001.h5"));
        assert!(!filter.accepts("X.A2019152.h10v07.001.h5"));
        assert!(!filter.accepts("X.A2019152.h11v07.001.hdf"));
    }

    #[test]
    fn test_exclude_rejects_any_substring() {
        let filter = FileFilter::new(Vec::new(), strings(&["h10v07", "h12v07"]));
        assert!(filter.accepts("X.A2019152.h11v07.001.h5"));
        assert!(!filter.accepts("X.A2019152.h10v07.001.h5"));
        assert!(!filter.accepts("X.A2019152.h12v07.001.h5"));
    }

    #[test]
    fn test_filter_correctness_over_fixture() {
        let filter = FileFilter::new(strings(&["h11", "001"]), strings(&["v08"]));
        let fixture = [
            "X.A2019152.h11v07.001.h5",
            "X.A2019152.h11v08.001.h5",
            "X.A2019152.h10v07.001.h5",
            "X.A2019152.h11v07.002.h5",
            "X.A2019153.h11v07.001.h5",
        ];
        for name in fixture {
            let expected = filter.include.iter().all(|s| name.contains(s.as_str()))
                && filter.exclude.iter().all(|s| !name.contains(s.as_str()));
            assert_eq!(filter.accepts(name), expected, "{}", name);
        }
        let kept: Vec<_> = fixture.iter().filter(|n| filter.accepts(n)).collect();
        assert_eq!(kept.len(), 2);
    }
}
