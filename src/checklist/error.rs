//! Error types for checklist processing
//!
//! [`CommentLogError`] covers validation failures of a single record's
//! comment log. They are per-record: the batch driver reports them and moves
//! on to the next record. [`ChecklistError`] covers reading and writing
//! checklist containers and reports.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for comment-log transformations
pub type Result<T> = std::result::Result<T, CommentLogError>;

/// Validation failures raised while rewriting a comment log
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommentLogError {
    /// Raw status code is not one of the recognised kinds
    #[error("Invalid finding status: {raw_status:?}")]
    InvalidStatus { raw_status: String },

    /// No non-blank comment text to operate on
    #[error("Missing comment: the comment log has no non-blank text")]
    MissingComment,

    /// The latest entry asserts a different status than the record
    #[error("Status mismatch: expected {expected:?} in latest entry {line:?}")]
    StatusMismatch { expected: &'static str, line: String },

    /// The latest entry carries no recognisable date
    #[error("Missing date: no MM/DD/YYYY or YYYY/MM/DD date in {line:?}")]
    MissingDate { line: String },
}

impl CommentLogError {
    /// Create an invalid status error
    pub fn invalid_status(raw_status: impl Into<String>) -> Self {
        Self::InvalidStatus {
            raw_status: raw_status.into(),
        }
    }

    /// Short machine-friendly name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidStatus { .. } => "invalid_status",
            Self::MissingComment => "missing_comment",
            Self::StatusMismatch { .. } => "status_mismatch",
            Self::MissingDate { .. } => "missing_date",
        }
    }
}

/// Result type alias for checklist I/O
pub type ChecklistResult<T> = std::result::Result<T, ChecklistError>;

/// Errors reading, writing or navigating checklist files
#[derive(Error, Debug)]
pub enum ChecklistError {
    /// Filesystem error
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `.ckl` parse or write failure
    #[error("XML error in {path}: {message}")]
    Xml { path: PathBuf, message: String },

    /// `.cklb` parse or write failure
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// CSV report failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File extension is neither `.ckl` nor `.cklb`
    #[error("Unsupported checklist format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Container parsed but lacks the expected structure
    #[error("Malformed checklist {path}: {message}")]
    MalformedChecklist { path: PathBuf, message: String },

    /// Output path resolves to the checklist being read
    #[error("Refusing to overwrite input checklist {path}: set an output suffix or directory")]
    WouldOverwriteInput { path: PathBuf },

    /// Record index past the end of the checklist
    #[error("Record index {index} out of range")]
    RecordOutOfRange { index: usize },
}

impl ChecklistError {
    /// Create an IO error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed checklist error
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedChecklist {
            path: path.into(),
            message: message.into(),
        }
    }
}
