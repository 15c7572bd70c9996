use super::installation::InstallationRecord;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A directory waiting to be examined by a scan worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTask {
    pub path: PathBuf,
    /// 1 for the scan root, parent depth + 1 below it
    pub depth: usize,
}

impl ScanTask {
    pub fn root(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            depth: 1,
        }
    }

    /// Task for a subdirectory of this task's directory.
    pub fn child(&self, path: PathBuf) -> Self {
        Self {
            path,
            depth: self.depth + 1,
        }
    }
}

/// What a worker concluded about one task.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The directory is an installation; its children are not examined.
    Found(InstallationRecord),
    /// The directory was listed; one task per subdirectory (possibly none).
    Expanded(Vec<ScanTask>),
    /// Filtered by name, too deep, unreadable or cancelled.
    Skipped,
    /// Equal to or nested under an already registered installation.
    Excluded,
}

/// Counters collected while folding worker outcomes.
///
/// `scanned == found + expanded + skipped + excluded` holds for every
/// snapshot, since each outcome bumps `scanned` and exactly one other counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub scanned: usize,
    pub found: usize,
    pub expanded: usize,
    pub skipped: usize,
    pub excluded: usize,
}

/// Finished, immutable result of one scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    installations: Vec<InstallationRecord>,
    stats: ScanStats,
    duration: Duration,
    cancelled: bool,
}

impl ScanResult {
    pub(crate) fn new(
        installations: Vec<InstallationRecord>,
        stats: ScanStats,
        duration: Duration,
        cancelled: bool,
    ) -> Self {
        Self {
            installations,
            stats,
            duration,
            cancelled,
        }
    }

    /// Installations found, unique by normalized path, sorted by path.
    pub fn installations(&self) -> &[InstallationRecord] {
        &self.installations
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn scanned(&self) -> usize {
        self.stats.scanned
    }

    pub fn skipped(&self) -> usize {
        self.stats.skipped
    }

    pub fn excluded(&self) -> usize {
        self.stats.excluded
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// True when the scan was stopped before the frontier was exhausted.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.installations.iter().any(|i| i.path == path)
    }
}
