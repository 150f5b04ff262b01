//! STIG checklist annotation
//!
//! Rewrites the comment history of checklist rules and reports on their
//! contents.
//!
//! # Overview
//!
//! A checklist (`.ckl` XML or `.cklb` JSON) holds one record per STIG rule.
//! Each record carries a status and a free-text comment log: a newest-first
//! series of entries, each opened by a finding statement such as
//!
//! ```text
//! Jane Doe validated on 09/20/2024 that the finding is NOT A FINDING.
//! ```
//!
//! The [`comment_log`] module parses and rewrites those logs. Everything else
//! here moves records in and out of checklist files:
//!
//! - [`ChecklistDocument`]: uniform record access over both formats
//! - [`BatchJob`]: apply a [`Transformation`] to every record, file or directory
//! - [`report`]: CSV export of records across a directory
//!
//! # Usage
//!
//! ```ignore
//! use stig_annotator::checklist::{open_checklist, BatchJob, CommentLogEngine, Transformation};
//!
//! let engine = CommentLogEngine::new("Jane Doe", review_date);
//! let job = BatchJob::new(engine, Transformation::InsertFresh);
//!
//! let mut doc = open_checklist("web01.ckl")?;
//! let summary = job.apply(doc.as_mut())?;
//! for failure in &summary.failures {
//!     eprintln!("{}", failure);
//! }
//! doc.write_to("web01_annotated.ckl".as_ref())?;
//! ```

pub mod comment_log;
pub mod report;

mod batch;
mod ckl;
mod cklb;
mod document;
mod error;
mod record;
mod status;

pub use batch::{
    BatchJob, BatchSummary, ChecklistSummary, FileFailure, FileOutcome, RecordFailure,
    Transformation, DEFAULT_OUTPUT_SUFFIX,
};
pub use ckl::CklDocument;
pub use cklb::CklbDocument;
pub use comment_log::{
    append_duplicate_statement, extract_latest_entry_body, format_review_date,
    insert_fresh_finding_statement, refresh_latest_entry_date, Attestation, CommentLogEngine,
    Revision, DEFAULT_OPEN_QUESTIONS, VALIDATED_MARKER,
};
pub use document::{checklist_files, open_checklist, ChecklistDocument, ChecklistFormat};
pub use error::{ChecklistError, ChecklistResult, CommentLogError};
pub use record::{CommentField, RuleRecord};
pub use report::{report_directory, write_csv, ReportSummary};
pub use status::FindingStatus;
