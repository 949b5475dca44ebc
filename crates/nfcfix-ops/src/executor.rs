//! Plan execution: ordering, conflict resolution, renaming and ledger staging.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use nfcfix_core::{ContentHash, ItemKind, NormalizeConfig, Plan, PlanItem, RunStats};

use crate::conflict::{ConflictResolution, ResolvedTarget, path_occupied, resolve_target};
use crate::hash::hash_file;
use crate::ledger::BackupLedger;
use crate::rename::rename_entry;
use crate::{RenameError, RenameFailure};

/// Options controlling plan execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteOptions {
    /// Resolve targets read-only and rename nothing.
    pub dry_run: bool,
    /// Overwrite existing targets instead of disambiguating.
    pub force: bool,
    /// Hash renamed files and record them in the ledger.
    pub backup: bool,
    /// Narrate renames at debug level instead of info.
    pub quiet: bool,
}

impl From<&NormalizeConfig> for ExecuteOptions {
    fn from(config: &NormalizeConfig) -> Self {
        Self {
            dry_run: config.is_dry_run(),
            force: config.force,
            backup: config.backup,
            quiet: config.quiet,
        }
    }
}

/// What happened to one plan item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The entry was renamed.
    Renamed,
    /// Dry run: the entry would be renamed.
    Planned,
    /// The rename failed; see the matching [`RenameFailure`].
    Failed,
}

/// Result of executing one plan item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameOutcome {
    /// Path the entry had before execution.
    pub source: PathBuf,
    /// Resolved destination (the canonical target when resolution failed).
    pub target: PathBuf,
    /// Whether the entry is a file or a directory.
    pub kind: ItemKind,
    /// Whether `target` is a `_nfcN` variant of the canonical name.
    pub disambiguated: bool,
    /// Final status.
    pub status: OutcomeStatus,
}

/// Everything produced by one execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Rename counters; merge with the collection stats for a full picture.
    pub stats: RunStats,
    /// One outcome per processed item, in execution order.
    pub outcomes: Vec<RenameOutcome>,
    /// Items that could not be renamed.
    pub failures: Vec<RenameFailure>,
    /// Committed ledger entries; empty unless backup was requested.
    pub ledger: BackupLedger,
    /// Whether execution stopped early on cancellation.
    pub interrupted: bool,
}

impl ExecutionReport {
    /// Check if every processed item succeeded and the run completed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }

    /// Outcomes with the given status.
    pub fn with_status(&self, status: OutcomeStatus) -> impl Iterator<Item = &RenameOutcome> {
        self.outcomes.iter().filter(move |o| o.status == status)
    }
}

/// Order in which plan items are executed.
///
/// Files keep their collection order and come first. Directories follow,
/// deepest first, so no rename invalidates a path that is still pending.
pub fn execution_order(plan: &Plan) -> Vec<&PlanItem> {
    plan.files()
        .chain(plan.directories().sorted_by_key(|item| Reverse(item.depth())))
        .collect()
}

/// Executes a rename plan.
#[derive(Debug, Clone)]
pub struct RenameExecutor {
    options: ExecuteOptions,
    cancel: CancellationToken,
}

impl RenameExecutor {
    /// Create a new executor.
    pub fn new(options: ExecuteOptions) -> Self {
        Self {
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between items once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The options this executor runs with.
    pub fn options(&self) -> ExecuteOptions {
        self.options
    }

    /// Execute every item of `plan`.
    ///
    /// Per-item failures are recorded in the report and never stop the run.
    pub fn execute(&self, plan: &Plan) -> ExecutionReport {
        let mut run = Run::new(self.options);

        for item in execution_order(plan) {
            if self.cancel.is_cancelled() {
                let remaining = plan.len() - run.report.outcomes.len();
                warn!("Execution interrupted, {remaining} items not processed");
                run.report.interrupted = true;
                break;
            }
            run.process(item);
        }

        run.report
    }
}

/// Mutable state of one execution.
struct Run {
    options: ExecuteOptions,
    resolution: ConflictResolution,
    report: ExecutionReport,
    /// Dry run: targets taken by simulated renames.
    claimed: HashSet<PathBuf>,
    /// Dry run: sources freed by simulated renames.
    vacated: HashSet<PathBuf>,
}

impl Run {
    fn new(options: ExecuteOptions) -> Self {
        Self {
            options,
            resolution: ConflictResolution::from_force(options.force),
            report: ExecutionReport::default(),
            claimed: HashSet::new(),
            vacated: HashSet::new(),
        }
    }

    fn process(&mut self, item: &PlanItem) {
        let canonical = item.target_path();
        let resolved = match resolve_target(&item.path, canonical.clone(), self.resolution, |p| {
            self.occupied(p)
        }) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.fail(item, canonical, e);
                return;
            }
        };

        if let Some(conflict) = &resolved.conflict {
            if resolved.disambiguated {
                self.report.stats.skipped_exists += 1;
                debug!(
                    "{}: {}, using {}",
                    conflict.destination.display(),
                    conflict.kind,
                    resolved.path.display()
                );
            } else {
                debug!("{}: {}, overwriting", conflict.destination.display(), conflict.kind);
            }
        }

        if self.options.dry_run {
            self.simulate(item, resolved);
            return;
        }

        let staged = self.options.backup.then(|| {
            self.report
                .ledger
                .stage(&item.path, &resolved.path, content_hash(item))
        });

        match rename_entry(&item.path, &resolved.path) {
            Ok(()) => {
                self.narrate("Renamed", item, &resolved.path);
                self.report.stats.renamed_success += 1;
                if let Some(staged) = staged {
                    self.report.ledger.commit(staged);
                }
                self.push_outcome(item, resolved, OutcomeStatus::Renamed);
            }
            Err(e) => self.fail(item, resolved.path, e),
        }
    }

    fn simulate(&mut self, item: &PlanItem, resolved: ResolvedTarget) {
        self.narrate("Would rename", item, &resolved.path);
        self.claimed.remove(&item.path);
        self.vacated.insert(item.path.clone());
        self.claimed.insert(resolved.path.clone());
        self.push_outcome(item, resolved, OutcomeStatus::Planned);
    }

    fn occupied(&self, path: &Path) -> bool {
        if !self.options.dry_run {
            return path_occupied(path);
        }
        self.claimed.contains(path) || (!self.vacated.contains(path) && path_occupied(path))
    }

    fn fail(&mut self, item: &PlanItem, target: PathBuf, error: RenameError) {
        warn!("Failed to rename {}: {}", item.path.display(), error);
        if !self.options.dry_run {
            self.report.stats.renamed_failed += 1;
        }
        self.report.failures.push(RenameFailure::new(
            item.path.clone(),
            Some(target.clone()),
            error.to_string(),
        ));
        self.report.outcomes.push(RenameOutcome {
            source: item.path.clone(),
            target,
            kind: item.kind,
            disambiguated: false,
            status: OutcomeStatus::Failed,
        });
    }

    fn push_outcome(&mut self, item: &PlanItem, resolved: ResolvedTarget, status: OutcomeStatus) {
        self.report.outcomes.push(RenameOutcome {
            source: item.path.clone(),
            target: resolved.path,
            kind: item.kind,
            disambiguated: resolved.disambiguated,
            status,
        });
    }

    fn narrate(&self, action: &str, item: &PlanItem, target: &Path) {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if self.options.quiet {
            debug!("{action} {} {} -> {}", item.kind, item.path.display(), name);
        } else {
            info!("{action} {} {} -> {}", item.kind, item.path.display(), name);
        }
    }
}

/// Hash a plan item for the ledger; only regular files are hashed.
fn content_hash(item: &PlanItem) -> Option<ContentHash> {
    if !item.kind.is_file() {
        return None;
    }
    let is_regular = std::fs::symlink_metadata(&item.path).is_ok_and(|m| m.file_type().is_file());
    if !is_regular {
        return None;
    }

    match hash_file(&item.path) {
        Ok(hash) => Some(hash),
        Err(e) => {
            warn!("Failed to hash {}: {}", item.path.display(), e);
            None
        }
    }
}
