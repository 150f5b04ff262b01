//! CSV reports over checklist records
//!
//! Each row is one [`RuleRecord`]. The caller decides which records belong
//! in the report through a plain predicate.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::batch::FileFailure;
use super::document::{checklist_files, open_checklist};
use super::error::ChecklistResult;
use super::record::RuleRecord;

/// Report column headers, in [`RuleRecord`] field order
pub const REPORT_COLUMNS: [&str; 12] = [
    "vuln_id",
    "rule_id",
    "severity",
    "group_title",
    "rule_title",
    "discussion",
    "check_content",
    "fix_text",
    "cci",
    "status",
    "comments",
    "finding_details",
];

/// Write `records` as CSV with a header row
///
/// The header is written even when there are no records.
pub fn write_csv<W: Write>(records: &[RuleRecord], writer: W) -> ChecklistResult<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv.write_record(REPORT_COLUMNS)?;
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Result of a directory report
#[derive(Debug, Default)]
pub struct ReportSummary {
    /// Matching record count per checklist
    pub per_file: Vec<(PathBuf, usize)>,
    /// Checklists that could not be read
    pub file_failures: Vec<FileFailure>,
}

impl ReportSummary {
    /// Matching records across all files
    pub fn total(&self) -> usize {
        self.per_file.iter().map(|(_, count)| count).sum()
    }
}

/// Collect matching records from every checklist in `dir` into one CSV
///
/// Unreadable checklists are logged and skipped.
pub fn report_directory<W, F>(dir: impl AsRef<Path>, predicate: F, writer: W) -> ChecklistResult<ReportSummary>
where
    W: Write,
    F: Fn(&RuleRecord) -> bool,
{
    let mut summary = ReportSummary::default();
    let mut rows = Vec::new();

    for path in checklist_files(dir)? {
        let doc = match open_checklist(&path) {
            Ok(doc) => doc,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "Skipping checklist");
                summary.file_failures.push(FileFailure { path, error });
                continue;
            }
        };

        let matched: Vec<RuleRecord> = doc.records().into_iter().filter(|r| predicate(r)).collect();
        info!(path = %path.display(), matched = matched.len(), "{}: {}", path.display(), matched.len());
        summary.per_file.push((path, matched.len()));
        rows.extend(matched);
    }

    info!(total = summary.total(), "Total: {}", summary.total());
    write_csv(&rows, writer)?;
    Ok(summary)
}
