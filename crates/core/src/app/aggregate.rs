use crate::domain::{InstallationRecord, ScanOutcome, ScanResult, ScanStats, ScanTask};
use crate::exclusion::clean_absolute;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Dedupe key for a found installation. Case is folded only on platforms
/// whose filesystems are case-insensitive by default.
fn identity_key(path: &Path) -> String {
    let cleaned = clean_absolute(path).unwrap_or_else(|_| path.to_string_lossy().to_string());
    if cfg!(any(windows, target_os = "macos")) {
        cleaned.to_lowercase()
    } else {
        cleaned
    }
}

/// What folding one outcome produced for the dispatcher.
#[derive(Debug, PartialEq)]
pub enum Folded {
    /// A newly seen installation
    Installation(InstallationRecord),
    /// Subdirectory tasks to enqueue
    Children(Vec<ScanTask>),
    /// Only counters changed
    Counted,
}

/// Incrementally built scan state, owned by a single dispatcher.
#[derive(Debug, Default)]
pub struct ScanAggregator {
    installations: BTreeMap<String, InstallationRecord>,
    stats: ScanStats,
}

impl ScanAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one worker outcome into the aggregate.
    pub fn record(&mut self, outcome: ScanOutcome) -> Folded {
        self.stats.scanned += 1;

        match outcome {
            ScanOutcome::Found(record) => {
                self.stats.found += 1;
                let key = identity_key(&record.path);

                if self.installations.contains_key(&key) {
                    return Folded::Counted;
                }
                self.installations.insert(key, record.clone());
                Folded::Installation(record)
            }
            ScanOutcome::Expanded(children) => {
                self.stats.expanded += 1;
                if children.is_empty() {
                    Folded::Counted
                } else {
                    Folded::Children(children)
                }
            }
            ScanOutcome::Skipped => {
                self.stats.skipped += 1;
                Folded::Counted
            }
            ScanOutcome::Excluded => {
                self.stats.excluded += 1;
                Folded::Counted
            }
        }
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn finish(self, duration: Duration, cancelled: bool) -> ScanResult {
        let mut installations: Vec<_> = self.installations.into_values().collect();
        installations.sort_by(|a, b| a.path.cmp(&b.path));
        ScanResult::new(installations, self.stats, duration, cancelled)
    }
}
