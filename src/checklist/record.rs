//! Format-independent view of a checklist rule

use serde::{Deserialize, Serialize};

use super::error::CommentLogError;
use super::status::FindingStatus;

/// Which record field holds the comment log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentField {
    /// The `COMMENTS` / `comments` field
    #[default]
    Comments,
    /// The `FINDING_DETAILS` / `finding_details` field
    FindingDetails,
}

impl CommentField {
    /// Parse from a configuration string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "comments" => Some(Self::Comments),
            "finding_details" => Some(Self::FindingDetails),
            _ => None,
        }
    }

    /// Element name in `.ckl` files
    pub fn ckl_element(&self) -> &'static str {
        match self {
            Self::Comments => "COMMENTS",
            Self::FindingDetails => "FINDING_DETAILS",
        }
    }

    /// Key name in `.cklb` files
    pub fn cklb_key(&self) -> &'static str {
        match self {
            Self::Comments => "comments",
            Self::FindingDetails => "finding_details",
        }
    }
}

/// Snapshot of one rule read from a checklist
///
/// Field order is the CSV report column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Vulnerability / group id (e.g. "V-230221")
    pub vuln_id: String,
    /// Rule id (e.g. "SV-230221r858734_rule")
    pub rule_id: String,
    /// Severity as written in the checklist ("high", "medium", "low")
    pub severity: String,
    /// Group title
    pub group_title: String,
    /// Rule title
    pub rule_title: String,
    /// Vulnerability discussion
    pub discussion: String,
    /// Check procedure
    pub check_content: String,
    /// Fix procedure
    pub fix_text: String,
    /// CCI references, comma separated
    pub cci: String,
    /// Raw status code
    pub status: String,
    /// Reviewer comments
    pub comments: Option<String>,
    /// Finding details
    pub finding_details: Option<String>,
}

impl RuleRecord {
    /// Identifier used in diagnostics: vuln id, then rule id, then position
    pub fn display_id(&self, index: usize) -> String {
        if !self.vuln_id.is_empty() {
            self.vuln_id.clone()
        } else if !self.rule_id.is_empty() {
            self.rule_id.clone()
        } else {
            format!("record #{}", index)
        }
    }

    /// Parsed status
    pub fn finding_status(&self) -> Result<FindingStatus, CommentLogError> {
        FindingStatus::from_raw(&self.status)
    }

    /// Current text of `field`
    pub fn field(&self, field: CommentField) -> Option<&str> {
        match field {
            CommentField::Comments => self.comments.as_deref(),
            CommentField::FindingDetails => self.finding_details.as_deref(),
        }
    }
}
