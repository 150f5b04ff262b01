//! Comment-log transformations
//!
//! A comment log is the free-text annotation field of a checklist rule. It is
//! a newest-first sequence of entries with no explicit delimiter. Each entry
//! starts with a marker line such as
//!
//! ```text
//! Jane Doe validated on 09/20/2024 that the finding is NOT A FINDING.
//! ```
//!
//! followed by zero or more continuation lines. Entry boundaries are inferred
//! from the `" validated on "` marker substring.
//!
//! Three rewrites are supported:
//!
//! - [`append_duplicate_statement`]: prepend a new finding statement and a copy
//!   of the previous entry's body, keeping the whole prior log underneath.
//! - [`insert_fresh_finding_statement`]: bootstrap a log that has no structure
//!   yet (or no text at all).
//! - [`refresh_latest_entry_date`]: bump the date on the newest entry after
//!   checking that it still asserts the record's status.
//!
//! All of them are pure. The review date is always supplied by the caller.
//!
//! # Example
//!
//! ```
//! use stig_annotator::checklist::{append_duplicate_statement, Attestation};
//!
//! let log = "X validated on 01/01/2020 that the finding is OPEN.\nfoo\nbar";
//! let attestation = Attestation::new("Y", "02/02/2021");
//! let revised = append_duplicate_statement(Some(log), "Open", &attestation).unwrap();
//! assert!(revised.starts_with("Y validated on 02/02/2021 that the finding is OPEN.\nfoo\nbar\n"));
//! assert!(revised.ends_with(log));
//! ```

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use super::error::{CommentLogError, Result};
use super::status::FindingStatus;

/// Substring identifying the first line of an entry
pub const VALIDATED_MARKER: &str = " validated on ";

/// Questions appended under a fresh statement for open findings
pub const DEFAULT_OPEN_QUESTIONS: &str = "\
1. What is the operational impact of this finding on the system?
2. What mitigating controls are currently in place?
3. What is the plan and schedule to remediate this finding?
4. Who is responsible for remediating this finding?
5. Is a POA&M item or risk acceptance required for this finding?";

/// Render a date the way finding statements carry it (`MM/DD/YYYY`)
pub fn format_review_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Who validated a finding, and when
///
/// The date is kept as text because the statement embeds it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    /// Reviewer name (e.g. "Jane Doe")
    pub identity: String,
    /// Review date as written in the statement
    pub date: String,
}

impl Attestation {
    /// Create an attestation from an identity and a preformatted date
    pub fn new(identity: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            date: date.into(),
        }
    }

    /// Create an attestation dated `date`, rendered as `MM/DD/YYYY`
    pub fn dated(identity: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(identity, format_review_date(date))
    }

    /// The marker line asserting `status`, without the trailing period
    pub fn finding_statement(&self, status: FindingStatus) -> String {
        format!(
            "{}{}{} that the finding is {}",
            self.identity,
            VALIDATED_MARKER,
            self.date,
            status.label()
        )
    }
}

/// Outcome of a rewrite that may legitimately leave the log alone
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// New comment-log text
    Rewritten(String),
    /// Nothing to do for this record
    Unchanged,
}

impl Revision {
    /// Returns true if the log was left as is
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Resolve to the text that should be stored, given the original
    pub fn into_text(self, original: Option<&str>) -> Option<String> {
        match self {
            Self::Rewritten(text) => Some(text),
            Self::Unchanged => original.map(str::to_string),
        }
    }
}

/// Continuation lines of the newest entry
///
/// Returns lines from the second line up to (not including) the next line
/// containing [`VALIDATED_MARKER`], or to the end of the text if there is
/// none. The marker line of the newest entry itself is not part of the body.
///
/// A single-line log is returned verbatim, and an absent log stays absent.
/// Note the boundary: a two-line log whose second line is a marker line
/// yields an empty body, while a one-line log yields itself.
pub fn extract_latest_entry_body(log: Option<&str>) -> Option<String> {
    let text = log?;
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() <= 1 {
        return Some(text.to_string());
    }

    let end = lines[1..]
        .iter()
        .position(|line| line.contains(VALIDATED_MARKER))
        .map_or(lines.len(), |offset| offset + 1);

    Some(lines[1..end].join("\n"))
}

/// Prepend a new statement plus a copy of the newest entry's body
///
/// Produces `"{statement}.\n{body}\n{log}"`. The original log is kept intact
/// as the tail of the result.
///
/// # Errors
///
/// - [`CommentLogError::InvalidStatus`] if `raw_status` is not recognised
/// - [`CommentLogError::MissingComment`] if `log` is absent or empty
pub fn append_duplicate_statement(
    log: Option<&str>,
    raw_status: &str,
    attestation: &Attestation,
) -> Result<String> {
    let status = FindingStatus::from_raw(raw_status)?;
    let log = match log {
        Some(text) if !text.is_empty() => text,
        _ => return Err(CommentLogError::MissingComment),
    };

    let body = extract_latest_entry_body(Some(log)).unwrap_or_default();
    Ok(format!(
        "{}.\n{}\n{}",
        attestation.finding_statement(status),
        body,
        log
    ))
}

/// Start a structured log from nothing or from unstructured text
///
/// Blank lines are removed from anywhere in the existing text, which then
/// follows the new statement. Open findings get `open_questions` appended.
///
/// # Errors
///
/// - [`CommentLogError::InvalidStatus`] if `raw_status` is not recognised
pub fn insert_fresh_finding_statement(
    log: Option<&str>,
    raw_status: &str,
    attestation: &Attestation,
    open_questions: &str,
) -> Result<String> {
    let status = FindingStatus::from_raw(raw_status)?;
    let mut revised = format!("{}.", attestation.finding_statement(status));

    let body = log
        .map(|text| {
            text.split('\n')
                .filter(|line| !line.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    if body.is_empty() {
        tracing::info!(status = %status, "No prior comment, inserting finding statement");
    } else {
        revised.push('\n');
        revised.push_str(&body);
    }

    if status == FindingStatus::Open {
        revised.push('\n');
        revised.push_str(open_questions);
    }

    Ok(revised)
}

fn date_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"[0-9]{2}/[0-9]{2}/[0-9]{4}").expect("MM/DD/YYYY pattern is valid"),
            Regex::new(r"[0-9]{4}/[0-9]{2}/[0-9]{2}").expect("YYYY/MM/DD pattern is valid"),
        ]
    })
}

/// Replace the date on the newest entry with `today`
///
/// Leading blank lines are dropped; interior lines are kept as they are.
/// `MM/DD/YYYY` dates are looked for first, then `YYYY/MM/DD`. Dates are
/// matched by shape only and are not calendar-checked. The replacement is
/// always `MM/DD/YYYY`, so repeated calls with the same `today` are stable.
///
/// Not-reviewed records are skipped with [`Revision::Unchanged`].
///
/// # Errors
///
/// - [`CommentLogError::InvalidStatus`] if `raw_status` is not recognised
/// - [`CommentLogError::MissingComment`] if the log has no non-blank line
/// - [`CommentLogError::StatusMismatch`] if the top line lacks the status label
/// - [`CommentLogError::MissingDate`] if the top line has no date
pub fn refresh_latest_entry_date(
    log: Option<&str>,
    raw_status: &str,
    today: NaiveDate,
) -> Result<Revision> {
    let status = FindingStatus::from_raw(raw_status)?;
    if status == FindingStatus::NotReviewed {
        return Ok(Revision::Unchanged);
    }

    let text = log.unwrap_or_default();
    let mut lines = text.split('\n').skip_while(|line| line.trim().is_empty());
    let top = lines.next().ok_or(CommentLogError::MissingComment)?;

    let label = status.label();
    if !top.contains(label) {
        return Err(CommentLogError::StatusMismatch {
            expected: label,
            line: top.to_string(),
        });
    }

    let found = date_patterns()
        .iter()
        .find_map(|pattern| pattern.find(top))
        .ok_or_else(|| CommentLogError::MissingDate {
            line: top.to_string(),
        })?;

    let mut revised = String::with_capacity(text.len());
    revised.push_str(&top[..found.start()]);
    revised.push_str(&format_review_date(today));
    revised.push_str(&top[found.end()..]);
    for line in lines {
        revised.push('\n');
        revised.push_str(line);
    }

    Ok(Revision::Rewritten(revised))
}

/// The three rewrites bound to one reviewer, date and question template
///
/// Built once per batch run from configuration so each record only supplies
/// its own log text and raw status.
#[derive(Debug, Clone)]
pub struct CommentLogEngine {
    attestation: Attestation,
    today: NaiveDate,
    open_questions: String,
}

impl CommentLogEngine {
    /// Create an engine attesting as `reviewer` on `today`
    pub fn new(reviewer: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            attestation: Attestation::dated(reviewer, today),
            today,
            open_questions: DEFAULT_OPEN_QUESTIONS.to_string(),
        }
    }

    /// Replace the open-findings question template
    pub fn with_open_questions(mut self, template: impl Into<String>) -> Self {
        self.open_questions = template.into();
        self
    }

    /// Attestation used for new statements
    pub fn attestation(&self) -> &Attestation {
        &self.attestation
    }

    /// Date used for new statements and refreshes
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Question template appended for open findings
    pub fn open_questions(&self) -> &str {
        &self.open_questions
    }

    /// See [`append_duplicate_statement`]
    pub fn append_duplicate(&self, log: Option<&str>, raw_status: &str) -> Result<String> {
        append_duplicate_statement(log, raw_status, &self.attestation)
    }

    /// See [`insert_fresh_finding_statement`]
    pub fn insert_fresh(&self, log: Option<&str>, raw_status: &str) -> Result<String> {
        insert_fresh_finding_statement(log, raw_status, &self.attestation, &self.open_questions)
    }

    /// See [`refresh_latest_entry_date`]
    pub fn refresh_date(&self, log: Option<&str>, raw_status: &str) -> Result<Revision> {
        refresh_latest_entry_date(log, raw_status, self.today)
    }
}
