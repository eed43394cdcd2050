//! docbench: a slow-vs-indexed query demonstration
//!
//! This crate drives a MongoDB server through a fixed query battery,
//! reads back its profiling log and execution plans, and shows how
//! much a handful of secondary indexes change.

pub mod battery;
pub mod config;
pub mod console;
pub mod errors;
pub mod plan;
pub mod profile;
pub mod report;
pub mod runner;
pub mod seed;
pub mod value;

// Types principaux, accessibles depuis la racine du crate
pub use battery::{BatteryQuery, Collection, IndexSpec};
pub use config::BenchConfig;
pub use console::{NoPause, Pacer, Palette, PromptPacer};
pub use errors::{BenchError, Result};
pub use plan::{interpret_plan, AccessPath, PlanSummary};
pub use profile::{ProfileEntry, ProfilingLevel};
pub use report::{BatteryReport, Comparison};
pub use runner::{BenchmarkRunner, RunSummary};
pub use seed::{Dataset, DatasetSummary, SeedConfig};
