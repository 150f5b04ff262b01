//! Batch driver: apply one transformation to every record of a checklist
//!
//! Records are processed in source order and independently. A record whose
//! comment log fails validation is reported and left untouched; the rest of
//! the checklist is still rewritten. Likewise a checklist that cannot be read
//! or written does not stop the other files in a directory run.
//!
//! # Usage
//!
//! ```ignore
//! use stig_annotator::checklist::{BatchJob, Transformation};
//! use stig_annotator::AnnotatorConfig;
//!
//! let config = AnnotatorConfig::from_file("stig-annotator.toml")?;
//! let job = BatchJob::from_config(&config, Transformation::RefreshDate);
//! let summary = job.run_directory("checklists/")?;
//! println!("{}", summary);
//! ```

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::comment_log::{CommentLogEngine, Revision};
use super::document::{checklist_files, open_checklist, ChecklistDocument, ChecklistFormat};
use super::error::{ChecklistError, ChecklistResult, CommentLogError};
use super::record::{CommentField, RuleRecord};
use crate::config::AnnotatorConfig;

/// Suffix added to the file stem of rewritten checklists
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_annotated";

/// Rewrite applied to each record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transformation {
    /// Prepend a statement and a copy of the latest entry body
    AppendDuplicate,
    /// Bootstrap a structured log from empty or free text
    InsertFresh,
    /// Bump the date of the latest entry
    RefreshDate,
    /// Move `comments` into `finding_details` and clear `comments`
    MoveCommentsToFindingDetails,
}

impl Transformation {
    /// Parse from a configuration string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "append_duplicate" | "append" => Some(Self::AppendDuplicate),
            "insert_fresh" | "insert" => Some(Self::InsertFresh),
            "refresh_date" | "refresh" => Some(Self::RefreshDate),
            "move_comments_to_finding_details" | "move_comments" => {
                Some(Self::MoveCommentsToFindingDetails)
            }
            _ => None,
        }
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::AppendDuplicate => "append_duplicate",
            Self::InsertFresh => "insert_fresh",
            Self::RefreshDate => "refresh_date",
            Self::MoveCommentsToFindingDetails => "move_comments_to_finding_details",
        }
    }
}

impl std::fmt::Display for Transformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A record whose comment log could not be rewritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Position of the record in the checklist
    pub index: usize,
    /// Vuln id (or fallback) for diagnostics
    pub record_id: String,
    /// Why the record was skipped
    pub error: CommentLogError,
}

impl std::fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.record_id, self.error)
    }
}

/// Result of applying a transformation to one checklist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistSummary {
    /// Records visited
    pub records: usize,
    /// Records whose field text was replaced
    pub rewritten: usize,
    /// Records intentionally left alone
    pub unchanged: usize,
    /// Records that failed validation
    pub failures: Vec<RecordFailure>,
}

impl ChecklistSummary {
    /// Returns true if every record was processed without error
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A checklist that was read, rewritten and written out
#[derive(Debug)]
pub struct FileOutcome {
    /// Source checklist
    pub input: PathBuf,
    /// Written checklist
    pub output: PathBuf,
    /// Per-record results
    pub summary: ChecklistSummary,
}

/// A checklist that could not be processed at all
#[derive(Debug)]
pub struct FileFailure {
    /// Offending file
    pub path: PathBuf,
    /// What went wrong
    pub error: ChecklistError,
}

/// Result of a directory run
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Files processed
    pub files: Vec<FileOutcome>,
    /// Files skipped because of read/write errors
    pub file_failures: Vec<FileFailure>,
}

impl BatchSummary {
    /// Total records that failed validation across all files
    pub fn record_failures(&self) -> usize {
        self.files.iter().map(|f| f.summary.failures.len()).sum()
    }

    /// Returns true if no file or record failed
    pub fn is_clean(&self) -> bool {
        self.file_failures.is_empty() && self.files.iter().all(|f| f.summary.is_clean())
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Batch Summary")?;
        writeln!(f, "=============")?;
        for outcome in &self.files {
            writeln!(
                f,
                "{} -> {}: {} records, {} rewritten, {} unchanged, {} failed",
                outcome.input.display(),
                outcome.output.display(),
                outcome.summary.records,
                outcome.summary.rewritten,
                outcome.summary.unchanged,
                outcome.summary.failures.len()
            )?;
            for failure in &outcome.summary.failures {
                writeln!(f, "  ✗ {}", failure)?;
            }
        }
        for failure in &self.file_failures {
            writeln!(f, "✗ {}: {}", failure.path.display(), failure.error)?;
        }
        Ok(())
    }
}

/// One transformation, with everything needed to run it over checklists
#[derive(Debug, Clone)]
pub struct BatchJob {
    engine: CommentLogEngine,
    transformation: Transformation,
    field: CommentField,
    output_suffix: String,
    output_dir: Option<PathBuf>,
}

impl BatchJob {
    /// Create a job rewriting the `comments` field
    pub fn new(engine: CommentLogEngine, transformation: Transformation) -> Self {
        Self {
            engine,
            transformation,
            field: CommentField::default(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            output_dir: None,
        }
    }

    /// Create a job from configuration
    pub fn from_config(config: &AnnotatorConfig, transformation: Transformation) -> Self {
        Self {
            engine: config.engine(),
            transformation,
            field: config.comment_field,
            output_suffix: config.output_suffix.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    /// Rewrite `field` instead of `comments`
    pub fn with_field(mut self, field: CommentField) -> Self {
        self.field = field;
        self
    }

    /// Set the suffix appended to output file stems
    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    /// Write outputs to `dir` instead of next to the inputs
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// The transformation this job applies
    pub fn transformation(&self) -> Transformation {
        self.transformation
    }

    /// Apply the transformation to every record of `doc`, in order
    ///
    /// Validation failures are collected in the summary, not returned.
    /// Only a failure to update the document itself is an error.
    pub fn apply(&self, doc: &mut dyn ChecklistDocument) -> ChecklistResult<ChecklistSummary> {
        let mut summary = ChecklistSummary::default();

        for (index, record) in doc.records().into_iter().enumerate() {
            summary.records += 1;
            let record_id = record.display_id(index);
            // Record ids must show up under the default `info` filter
            let span = tracing::info_span!(
                "record",
                record = %record_id,
                transformation = %self.transformation,
            );
            let _guard = span.enter();

            if self.transformation == Transformation::MoveCommentsToFindingDetails {
                let comments = record.comments.as_deref().unwrap_or_default();
                doc.set_field(index, CommentField::FindingDetails, comments)?;
                doc.set_field(index, CommentField::Comments, "")?;
                summary.rewritten += 1;
                continue;
            }

            match self.revise(&record) {
                Ok(Revision::Rewritten(text)) => {
                    doc.set_field(index, self.field, &text)?;
                    summary.rewritten += 1;
                }
                Ok(Revision::Unchanged) => {
                    summary.unchanged += 1;
                }
                Err(error) => {
                    warn!(
                        record = %record_id,
                        kind = error.kind(),
                        error = %error,
                        "Skipping record"
                    );
                    summary.failures.push(RecordFailure {
                        index,
                        record_id,
                        error,
                    });
                }
            }
        }

        Ok(summary)
    }

    fn revise(&self, record: &RuleRecord) -> Result<Revision, CommentLogError> {
        let log = record.field(self.field);
        let status = record.status.as_str();
        match self.transformation {
            Transformation::AppendDuplicate => {
                self.engine.append_duplicate(log, status).map(Revision::Rewritten)
            }
            Transformation::InsertFresh => {
                self.engine.insert_fresh(log, status).map(Revision::Rewritten)
            }
            Transformation::RefreshDate => self.engine.refresh_date(log, status),
            Transformation::MoveCommentsToFindingDetails => Ok(Revision::Unchanged),
        }
    }

    /// Where the rewritten copy of `input` is written
    pub fn output_path(&self, input: &Path, format: ChecklistFormat) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = format!("{}{}.{}", stem, self.output_suffix, format.extension());

        let dir = match &self.output_dir {
            Some(dir) => dir.as_path(),
            None => input.parent().unwrap_or_else(|| Path::new("")),
        };
        dir.join(name)
    }

    /// Returns true if `path` looks like an output of this job
    ///
    /// Always false with an empty suffix.
    pub fn is_output_file(&self, path: &Path) -> bool {
        !self.output_suffix.is_empty()
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| stem.ends_with(&self.output_suffix))
    }

    /// Rewrite one checklist file
    pub fn run_file(&self, path: impl AsRef<Path>) -> ChecklistResult<FileOutcome> {
        let input = path.as_ref();
        let mut doc = open_checklist(input)?;

        let output = self.output_path(input, doc.format());
        if same_file(input, &output) {
            return Err(ChecklistError::WouldOverwriteInput {
                path: input.to_path_buf(),
            });
        }

        let summary = self.apply(doc.as_mut())?;
        info!(
            input = %input.display(),
            output = %output.display(),
            records = summary.records,
            rewritten = summary.rewritten,
            failed = summary.failures.len(),
            "Writing {}",
            output.display()
        );
        doc.write_to(&output)?;

        Ok(FileOutcome {
            input: input.to_path_buf(),
            output,
            summary,
        })
    }

    /// Rewrite every checklist in `dir`
    ///
    /// Files that are already outputs of this job are skipped. Only failing
    /// to list the directory is an error.
    pub fn run_directory(&self, dir: impl AsRef<Path>) -> ChecklistResult<BatchSummary> {
        let mut summary = BatchSummary::default();

        for path in checklist_files(dir)? {
            if self.is_output_file(&path) {
                continue;
            }
            match self.run_file(&path) {
                Ok(outcome) => summary.files.push(outcome),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "Skipping checklist");
                    summary.file_failures.push(FileFailure { path, error });
                }
            }
        }

        Ok(summary)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
