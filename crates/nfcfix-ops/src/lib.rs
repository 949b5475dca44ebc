//! Rename execution engine for nfcfix.
//!
//! This crate applies a rename [`Plan`](nfcfix_core::Plan) to the filesystem:
//! files first, then directories deepest first. Taken targets are either
//! disambiguated with a `_nfcN` suffix or overwritten, and every successful
//! rename can be recorded in a [`BackupLedger`] written next to the data.

mod conflict;
mod executor;
mod hash;
mod ledger;
mod operation;
mod rename;

pub use conflict::{
    Conflict, ConflictKind, ConflictResolution, MAX_DISAMBIGUATION_ATTEMPTS, NFC_MARKER,
    ResolvedTarget, disambiguated_name, path_occupied, resolve_target,
};
pub use executor::{
    ExecuteOptions, ExecutionReport, OutcomeStatus, RenameExecutor, RenameOutcome, execution_order,
};
pub use hash::hash_file;
pub use ledger::{
    BackupLedger, LEDGER_PREFIX, LEDGER_VERSION, LedgerDocument, LedgerEntry, LedgerError,
    StagedEntry, ledger_file_name,
};
pub use operation::{RenameError, RenameFailure};
pub use rename::rename_entry;
