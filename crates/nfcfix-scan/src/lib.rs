//! Directory walking and rename plan collection for nfcfix.
//!
//! `nfcfix-scan` walks a root directory with jwalk, analyzes every entry
//! name, and collects the entries whose names are not in canonical (NFC)
//! form into a [`Plan`].
//!
//! - **Deterministic order**: files before directories, then by name
//! - **Non-fatal errors**: unreadable directories become warnings
//! - **Progress updates** via broadcast channels
//! - **Cancellation** between entries
//!
//! # Example
//!
//! ```rust,no_run
//! use nfcfix_scan::{Collector, NormalizeConfig};
//!
//! let config = NormalizeConfig::new("/path/to/music");
//! let collection = Collector::new().collect(&config).unwrap();
//!
//! println!("{} entries need renaming", collection.plan.len());
//! println!("{} warnings", collection.warnings.len());
//! ```

mod collector;
mod progress;

pub use collector::{Collection, Collector};
pub use progress::ScanProgress;

// Re-export core types for convenience
pub use nfcfix_core::{
    CollectError, ItemKind, NormalizeConfig, Plan, PlanItem, RunStats, ScanWarning, WarningKind,
};
