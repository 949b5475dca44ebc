//! JWalk-based collection of rename plans.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jwalk::{Parallelism, WalkDir};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use nfcfix_core::{
    CollectError, ItemKind, NormalizeConfig, Plan, PlanItem, RunStats, ScanWarning, WarningKind,
    analyze,
};

use crate::progress::{ProgressTracker, ScanProgress};

/// Entries between two progress broadcasts.
const PROGRESS_INTERVAL: u64 = 1000;

/// Everything a collection walk produced.
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    /// Canonicalized root directory.
    pub root: PathBuf,
    /// Entries that need renaming, in walk order.
    pub plan: Plan,
    /// Scan counters.
    pub stats: RunStats,
    /// Entries and directories that were skipped.
    pub warnings: Vec<ScanWarning>,
    /// Whether the walk stopped early on cancellation.
    pub interrupted: bool,
    /// Duration of the walk.
    pub duration: Duration,
}

impl Collection {
    /// Check if there were any warnings during the walk.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Walks a directory tree and plans renames for non-canonical names.
///
/// Entries of each directory are visited files first, then directories,
/// each group by name. A directory's contents are visited right after the
/// directory itself. Symbolic links are planned like files and never
/// followed.
pub struct Collector {
    progress_tx: broadcast::Sender<ScanProgress>,
    cancel: CancellationToken,
}

impl Collector {
    /// Create a new collector.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            progress_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop the walk between entries once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Subscribe to collection progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk `config.root` and build the rename plan.
    pub fn collect(&self, config: &NormalizeConfig) -> Result<Collection, CollectError> {
        let tracker = ProgressTracker::new();
        let root = config
            .root
            .canonicalize()
            .map_err(|e| CollectError::io(&config.root, e))?;

        if !root.is_dir() {
            return Err(CollectError::NotADirectory { path: root });
        }

        let mut walk = WalkState::default();
        let mut interrupted = false;

        for entry_result in walker(&root) {
            if self.cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    walk.warn(walk_warning(&err, None));
                    continue;
                }
            };

            let path = entry.path();

            // A directory whose listing failed is still reported; its
            // contents are simply absent from the walk.
            if let Some(err) = &entry.read_children_error {
                walk.warn(walk_warning(err, Some(&path)));
            }

            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                ItemKind::Directory
            } else if file_type.is_file() || file_type.is_symlink() {
                ItemKind::File
            } else {
                continue;
            };

            let Some(name) = entry.file_name().to_str() else {
                walk.warn(ScanWarning::invalid_utf8(&path));
                continue;
            };

            let analysis = analyze(name, config.all_files);
            walk.stats.record_entry(kind, &analysis);

            if analysis.needs_normalization {
                debug!(
                    path = %path.display(),
                    target = %analysis.canonical,
                    %kind,
                    "planned rename"
                );
                walk.plan.push(PlanItem::new(&path, kind, analysis));
            }

            if walk.stats.total_scanned() % PROGRESS_INTERVAL == 0 {
                let _ = self
                    .progress_tx
                    .send(tracker.snapshot(&walk.stats, walk.plan.len(), path));
            }
        }

        let _ = self
            .progress_tx
            .send(tracker.snapshot(&walk.stats, walk.plan.len(), root.clone()));

        Ok(Collection {
            root,
            plan: walk.plan,
            stats: walk.stats,
            warnings: walk.warnings,
            interrupted,
            duration: tracker.elapsed(),
        })
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulators owned by a single walk.
#[derive(Default)]
struct WalkState {
    plan: Plan,
    stats: RunStats,
    warnings: Vec<ScanWarning>,
    warned_paths: HashSet<PathBuf>,
}

impl WalkState {
    /// Record a warning, once per path.
    fn warn(&mut self, warning: ScanWarning) {
        if !self.warned_paths.insert(warning.path.clone()) {
            return;
        }
        warn!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
        self.stats.record_warning();
        self.warnings.push(warning);
    }
}

/// Build a serial, deterministic walker over `root`.
fn walker(root: &Path) -> WalkDir {
    WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false)
        .min_depth(0)
        .process_read_dir(|_depth, _path, _state, children| {
            children.sort_by(|a, b| match (a, b) {
                (Ok(a), Ok(b)) => (a.file_type().is_dir(), a.file_name())
                    .cmp(&(b.file_type().is_dir(), b.file_name())),
                (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                (Err(_), Err(_)) => std::cmp::Ordering::Equal,
            });
        })
}

/// Convert a walk error into a warning.
fn walk_warning(err: &jwalk::Error, fallback: Option<&Path>) -> ScanWarning {
    let path = err
        .path()
        .or(fallback)
        .map(Path::to_path_buf)
        .unwrap_or_default();

    match err.io_error() {
        Some(io) => ScanWarning::from_io(path, io),
        None => ScanWarning::new(path, err.to_string(), WarningKind::ReadError),
    }
}
