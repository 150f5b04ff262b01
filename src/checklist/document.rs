//! Uniform access to checklist containers
//!
//! `.ckl` (XML) and `.cklb` (JSON) checklists both reduce to an ordered list
//! of rule records. The comment-log engine only ever sees a record's status
//! and comment text, so everything format specific lives behind
//! [`ChecklistDocument`].

use std::path::{Path, PathBuf};

use super::ckl::CklDocument;
use super::cklb::CklbDocument;
use super::error::{ChecklistError, ChecklistResult};
use super::record::{CommentField, RuleRecord};

/// Checklist container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecklistFormat {
    /// XML checklist (`.ckl`)
    Ckl,
    /// JSON checklist (`.cklb`)
    Cklb,
}

impl ChecklistFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ckl => "ckl",
            Self::Cklb => "cklb",
        }
    }

    /// Detect the format from a file extension (case insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ckl" => Some(Self::Ckl),
            "cklb" => Some(Self::Cklb),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChecklistFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// A loaded checklist whose rule records can be read and rewritten
pub trait ChecklistDocument {
    /// Container format
    fn format(&self) -> ChecklistFormat;

    /// Number of rule records
    fn len(&self) -> usize;

    /// Returns true if the checklist has no rule records
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the record at `index`, in source order
    fn record(&self, index: usize) -> Option<RuleRecord>;

    /// Snapshots of all records, in source order
    fn records(&self) -> Vec<RuleRecord> {
        (0..self.len()).filter_map(|i| self.record(i)).collect()
    }

    /// Replace the text of one comment field
    fn set_field(&mut self, index: usize, field: CommentField, text: &str) -> ChecklistResult<()>;

    /// Serialize the whole checklist
    fn to_bytes(&self) -> ChecklistResult<Vec<u8>>;

    /// Serialize the whole checklist to `path`
    fn write_to(&self, path: &Path) -> ChecklistResult<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| ChecklistError::io(path, e))
    }
}

/// Load a checklist, choosing the format from the file extension
pub fn open_checklist(path: impl AsRef<Path>) -> ChecklistResult<Box<dyn ChecklistDocument>> {
    let path = path.as_ref();
    match ChecklistFormat::from_path(path) {
        Some(ChecklistFormat::Ckl) => Ok(Box::new(CklDocument::from_file(path)?)),
        Some(ChecklistFormat::Cklb) => Ok(Box::new(CklbDocument::from_file(path)?)),
        None => Err(ChecklistError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Checklist files directly inside `dir`, sorted by path
///
/// Subdirectories and files with other extensions are skipped.
pub fn checklist_files(dir: impl AsRef<Path>) -> ChecklistResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| ChecklistError::io(dir, e))?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && ChecklistFormat::from_path(path).is_some())
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checklist_files_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.cklb", "a.ckl", "notes.txt", "c.CKL"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.ckl")).unwrap();

        let files = checklist_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.ckl", "b.cklb", "c.CKL"]);
    }

    #[test]
    fn test_checklist_files_missing_dir() {
        let err = checklist_files("/definitely/not/here").unwrap_err();
        assert!(matches!(err, ChecklistError::Io { .. }));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ChecklistFormat::from_path(Path::new("dir/host.ckl")),
            Some(ChecklistFormat::Ckl)
        );
        assert_eq!(
            ChecklistFormat::from_path(Path::new("HOST.CKLB")),
            Some(ChecklistFormat::Cklb)
        );
        assert_eq!(ChecklistFormat::from_path(Path::new("host.xml")), None);
        assert_eq!(ChecklistFormat::from_path(Path::new("ckl")), None);
    }

    #[test]
    fn test_open_unsupported_extension() {
        let err = open_checklist("report.csv").err().unwrap();
        assert!(matches!(err, ChecklistError::UnsupportedFormat { .. }));
    }
}
