//! covmerge library crate: the pipeline behind the `covmerge` binary.
//!
//! The primary interface is the binary. This crate exposes the run entry
//! point, configuration and the report collaborators so integration tests can
//! drive a whole merge with fakes in place of git and `go tool cover`.

pub mod augment;
pub mod config;
pub mod format;
pub mod report;
pub mod run;
pub mod telemetry;

pub use config::{CovmergeConfig, Overrides, RunConfig};
pub use report::{GoCoverRenderer, ReportRenderer};
pub use run::{RevisionSummary, RunSummary, run};
