//! # stig-annotator
//!
//! Comment-history maintenance and reporting for DISA STIG checklists.
//!
//! STIG checklists record, per hardening rule, a review status and a
//! free-text history of reviewer comments. This crate keeps that history in
//! a consistent, dated, newest-first format across whole directories of
//! `.ckl` and `.cklb` files.
//!
//! ## Features
//!
//! - **Append duplicate**: prepend a new finding statement while keeping the
//!   full prior history
//! - **Fresh insert**: bootstrap a structured log from empty or free text,
//!   with a question template for open findings
//! - **Date refresh**: bump the date of the latest entry after checking it
//!   still matches the record's status
//! - **Field migration**: move comments into finding details
//! - **CSV reports** across a directory of checklists
//!
//! ## Quick Start
//!
//! ```ignore
//! use stig_annotator::{AnnotatorConfig, observability};
//! use stig_annotator::checklist::{BatchJob, Transformation};
//!
//! let config = AnnotatorConfig::from_file("stig-annotator.toml")?;
//! observability::init_logging(&config.log)?;
//!
//! let job = BatchJob::from_config(&config, Transformation::AppendDuplicate);
//! let summary = job.run_directory(".")?;
//! print!("{}", summary);
//! ```
//!
//! A malformed record never aborts a run: it is logged, listed in the
//! summary, and left as it was.

pub mod checklist;
pub mod config;
pub mod observability;

// Re-exports
pub use checklist::{
    BatchJob, ChecklistDocument, CommentLogEngine, CommentLogError, FindingStatus,
    Transformation,
};
pub use config::{AnnotatorConfig, AnnotatorConfigBuilder, ConfigError};
pub use observability::{init_logging, LogFormat, LoggingConfig};
