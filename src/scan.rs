//! Concurrent JDK discovery.
//!
//! One dispatcher thread owns the frontier, the pending counter and the
//! aggregate. A fixed pool of workers pulls tasks from a bounded channel,
//! does the blocking filesystem work and pushes one outcome per task back
//! through a second bounded channel. The dispatcher selects over "send the
//! next task" and "receive an outcome" so that a full task channel never
//! stops it from draining outcomes. The scan ends when the pending counter,
//! tasks issued but not yet resolved, drops to zero.

use crossbeam_channel::{Receiver, Select, Sender, TryRecvError, bounded};
use jenv_core::app::{Folded, ScanAggregator};
use jenv_core::domain::{InstallationRecord, ScanOutcome, ScanResult, ScanStats, ScanTask};
use jenv_core::exclusion::ExclusionSet;
use jenv_core::filter::{FilterRules, PathFilter};
use jenv_core::ports::{InstallationRegistry, InstallationValidator};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Worker count used when none is configured: twice the available
/// parallelism, since workers spend most of their time blocked on I/O.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(4)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub max_depth: usize,
    pub workers: usize,
    pub filter: FilterRules,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            workers: default_workers(),
            filter: FilterRules::default(),
        }
    }
}

/// Progress notifications for an observer of a running scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    InstallationFound(InstallationRecord),
    ScanCompleted(ScanStats),
}

/// Requests cancellation of the scans holding the paired [`CancelToken`].
///
/// Dropping the handle cancels as well.
#[derive(Debug)]
pub struct CancelHandle {
    _tx: Sender<()>,
}

impl CancelHandle {
    pub fn cancel(self) {}
}

/// Cancellation signal observed by the dispatcher and its workers.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> (CancelHandle, CancelToken) {
        let (tx, rx) = bounded(0);
        (CancelHandle { _tx: tx }, CancelToken { rx })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

/// Finds JDK installations below a root directory.
///
/// The scanner only reads: it never registers what it finds.
pub struct Scanner {
    options: ScanOptions,
    filter: PathFilter,
    validator: Arc<dyn InstallationValidator>,
    registry: Arc<dyn InstallationRegistry>,
}

impl Scanner {
    pub fn new(
        options: ScanOptions,
        validator: Arc<dyn InstallationValidator>,
        registry: Arc<dyn InstallationRegistry>,
    ) -> Self {
        let filter = PathFilter::new(&options.filter);
        Self {
            options,
            filter,
            validator,
            registry,
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan `root` to completion.
    pub fn scan(&self, root: &Path) -> ScanResult {
        let (_handle, cancel) = CancelToken::new();
        self.scan_with(root, &cancel, None)
    }

    /// Scan `root`, stopping early once `cancel` fires and reporting found
    /// installations to `events` as they are folded in.
    pub fn scan_with(
        &self,
        root: &Path,
        cancel: &CancelToken,
        events: Option<&Sender<ScanEvent>>,
    ) -> ScanResult {
        let started = Instant::now();

        if !root.exists() {
            info!("Scan root does not exist: {}", root.display());
            let result = ScanAggregator::new().finish(started.elapsed(), false);
            notify(events, ScanEvent::ScanCompleted(result.stats()));
            return result;
        }

        let existing = ExclusionSet::from_paths(self.registry.existing_paths());
        let workers = self.options.workers.max(1);
        info!(
            root = %root.display(),
            workers,
            max_depth = self.options.max_depth,
            registered = existing.len(),
            "Starting JDK scan"
        );

        let (task_tx, task_rx) = bounded::<ScanTask>(workers * 2);
        let (outcome_tx, outcome_rx) = bounded::<ScanOutcome>(workers * 2);

        let (aggregate, cancelled) = thread::scope(|s| {
            for _ in 0..workers {
                let tasks = task_rx.clone();
                let outcomes = outcome_tx.clone();
                let existing = &existing;
                s.spawn(move || self.work(tasks, outcomes, existing, cancel));
            }
            drop(task_rx);
            drop(outcome_tx);

            let folded = self.dispatch(root, &task_tx, &outcome_rx, cancel, events);

            // Closing the task channel lets idle workers leave their loop;
            // the scope joins them before returning.
            drop(task_tx);
            folded
        });

        let result = aggregate.finish(started.elapsed(), cancelled);
        info!(
            found = result.installations().len(),
            scanned = result.scanned(),
            skipped = result.skipped(),
            excluded = result.excluded(),
            cancelled,
            "Scan finished in {:?}",
            result.duration()
        );
        notify(events, ScanEvent::ScanCompleted(result.stats()));
        result
    }

    fn dispatch(
        &self,
        root: &Path,
        task_tx: &Sender<ScanTask>,
        outcome_rx: &Receiver<ScanOutcome>,
        cancel: &CancelToken,
        events: Option<&Sender<ScanEvent>>,
    ) -> (ScanAggregator, bool) {
        let mut aggregate = ScanAggregator::new();
        let mut frontier = VecDeque::from([ScanTask::root(root)]);
        let mut pending: usize = 1;
        let mut cancelled = false;

        while pending > 0 {
            if !cancelled && cancel.is_cancelled() {
                cancelled = true;
                debug!(
                    dropped = frontier.len(),
                    in_flight = pending - frontier.len(),
                    "Scan cancelled, draining in-flight tasks"
                );
                pending -= frontier.len();
                frontier.clear();
                if pending == 0 {
                    break;
                }
            }

            let next = frontier.pop_front();
            let mut select = Select::new();
            let send_index = next.as_ref().map(|_| select.send(task_tx));
            select.recv(outcome_rx);

            let operation = select.select();
            if send_index == Some(operation.index()) {
                if let Some(task) = next {
                    if operation.send(task_tx, task).is_err() {
                        warn!("All scan workers exited with {} tasks pending", pending);
                        break;
                    }
                }
                continue;
            }

            if let Some(task) = next {
                frontier.push_front(task);
            }

            let outcome = match operation.recv(outcome_rx) {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("All scan workers exited with {} tasks pending", pending);
                    break;
                }
            };
            pending -= 1;

            match aggregate.record(outcome) {
                Folded::Children(children) if !cancelled => {
                    pending += children.len();
                    frontier.extend(children);
                }
                Folded::Installation(record) => {
                    debug!("Found JDK {}", record);
                    notify(events, ScanEvent::InstallationFound(record));
                }
                _ => {}
            }
        }

        (aggregate, cancelled)
    }

    fn work(
        &self,
        tasks: Receiver<ScanTask>,
        outcomes: Sender<ScanOutcome>,
        existing: &ExclusionSet,
        cancel: &CancelToken,
    ) {
        for task in tasks.iter() {
            let outcome = if cancel.is_cancelled() {
                ScanOutcome::Skipped
            } else {
                self.process(&task, existing)
            };

            if outcomes.send(outcome).is_err() {
                // Dispatcher gone
                return;
            }
        }
    }

    /// Examine one directory. Never fails: problems become `Skipped`.
    fn process(&self, task: &ScanTask, existing: &ExclusionSet) -> ScanOutcome {
        if task.depth > self.options.max_depth || !self.filter.should_scan(&task.path) {
            trace!(path = %task.path.display(), depth = task.depth, "Skipping directory");
            return ScanOutcome::Skipped;
        }

        if existing.is_excluded(&task.path) {
            trace!(path = %task.path.display(), "Already registered");
            return ScanOutcome::Excluded;
        }

        if self.validator.is_valid_installation(&task.path) {
            return ScanOutcome::Found(InstallationRecord::from_path(&task.path));
        }

        match list_subdirectories(&task.path) {
            Ok(children) => ScanOutcome::Expanded(
                children.into_iter().map(|path| task.child(path)).collect(),
            ),
            Err(e) => {
                debug!("Cannot read {}: {}", task.path.display(), e);
                ScanOutcome::Skipped
            }
        }
    }
}

/// Immediate subdirectories of `dir`, without following symlinks.
///
/// Fails only when `dir` itself cannot be read; unreadable entries are
/// left out.
fn list_subdirectories(dir: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut children = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => children.push(entry.into_path()),
            Ok(_) => {}
            Err(e) if e.depth() == 0 => return Err(e),
            Err(e) => trace!("Ignoring unreadable entry: {}", e),
        }
    }

    Ok(children)
}

fn notify(events: Option<&Sender<ScanEvent>>, event: ScanEvent) {
    if let Some(tx) = events {
        // A dropped observer must not disturb the scan
        let _ = tx.send(event);
    }
}
