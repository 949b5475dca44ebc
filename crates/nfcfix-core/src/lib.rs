//! Core types and name analysis for nfcfix.
//!
//! This crate provides the data structures shared by the collector and the
//! rename executor: name analysis, rename plans, run statistics, and
//! configuration.

pub mod analysis;
mod config;
mod error;
mod plan;
mod stats;

pub use analysis::{NameAnalysis, ScriptTag, analyze, canonical, detect_scripts};
pub use config::{NormalizeConfig, NormalizeConfigBuilder};
pub use error::{CollectError, ScanWarning, WarningKind};
pub use plan::{ContentHash, ItemKind, Plan, PlanItem};
pub use stats::RunStats;
