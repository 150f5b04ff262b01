//! JSON checklist (`.cklb`) support
//!
//! Rules live under `stigs[*].rules[*]`. The document is kept as a
//! [`serde_json::Value`] so keys this crate does not know about survive a
//! rewrite.

use std::path::{Path, PathBuf};

use serde_json::Value;

use super::document::{ChecklistDocument, ChecklistFormat};
use super::error::{ChecklistError, ChecklistResult};
use super::record::{CommentField, RuleRecord};

/// A parsed `.cklb` checklist
#[derive(Debug, Clone)]
pub struct CklbDocument {
    path: PathBuf,
    root: Value,
}

impl CklbDocument {
    /// Load from a file
    pub fn from_file(path: impl AsRef<Path>) -> ChecklistResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|e| ChecklistError::io(path, e))?;
        Self::parse(&content, path)
    }

    /// Parse from JSON bytes; `path` is only used in error messages
    pub fn parse(content: &[u8], path: impl AsRef<Path>) -> ChecklistResult<Self> {
        let path = path.as_ref();
        let root: Value = serde_json::from_slice(content).map_err(|e| ChecklistError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;

        if !root.get("stigs").is_some_and(Value::is_array) {
            return Err(ChecklistError::malformed(path, "missing \"stigs\" array"));
        }

        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    /// Path the checklist was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rules(&self) -> impl Iterator<Item = &Value> {
        self.root
            .get("stigs")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|stig| stig.get("rules").and_then(Value::as_array))
            .flatten()
    }

    fn rule_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.root
            .get_mut("stigs")?
            .as_array_mut()?
            .iter_mut()
            .filter_map(|stig| stig.get_mut("rules").and_then(Value::as_array_mut))
            .flatten()
            .nth(index)
    }
}

fn string_field(rule: &Value, key: &str) -> String {
    optional_field(rule, key).unwrap_or_default()
}

/// Missing keys and JSON nulls both read as absent
fn optional_field(rule: &Value, key: &str) -> Option<String> {
    match rule.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn ccis(rule: &Value) -> String {
    match rule.get("ccis") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn rule_record(rule: &Value) -> RuleRecord {
    RuleRecord {
        vuln_id: string_field(rule, "group_id"),
        rule_id: string_field(rule, "rule_id"),
        severity: string_field(rule, "severity"),
        group_title: string_field(rule, "group_title"),
        rule_title: string_field(rule, "rule_title"),
        discussion: string_field(rule, "discussion"),
        check_content: string_field(rule, "check_content"),
        fix_text: string_field(rule, "fix_text"),
        cci: ccis(rule),
        status: string_field(rule, "status"),
        comments: optional_field(rule, CommentField::Comments.cklb_key()),
        finding_details: optional_field(rule, CommentField::FindingDetails.cklb_key()),
    }
}

impl ChecklistDocument for CklbDocument {
    fn format(&self) -> ChecklistFormat {
        ChecklistFormat::Cklb
    }

    fn len(&self) -> usize {
        self.rules().count()
    }

    fn record(&self, index: usize) -> Option<RuleRecord> {
        self.rules().nth(index).map(rule_record)
    }

    fn records(&self) -> Vec<RuleRecord> {
        self.rules().map(rule_record).collect()
    }

    fn set_field(&mut self, index: usize, field: CommentField, text: &str) -> ChecklistResult<()> {
        let path = self.path.clone();
        let rule = self
            .rule_mut(index)
            .ok_or(ChecklistError::RecordOutOfRange { index })?;
        let object = rule
            .as_object_mut()
            .ok_or_else(|| ChecklistError::malformed(path, format!("rule {} is not an object", index)))?;
        object.insert(field.cklb_key().to_string(), Value::String(text.to_string()));
        Ok(())
    }

    fn to_bytes(&self) -> ChecklistResult<Vec<u8>> {
        serde_json::to_vec_pretty(&self.root).map_err(|e| ChecklistError::Json {
            path: self.path.clone(),
            source: e,
        })
    }
}
