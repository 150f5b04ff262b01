//! Annotator configuration
//!
//! Who signs new finding statements, which date they carry, where rewritten
//! checklists go, and how logging is set up.
//!
//! The review date is the only notion of "today" in the crate. It is resolved
//! once, when the configuration is built, and passed explicitly to every
//! date-dependent rewrite.
//!
//! # Example
//!
//! ```ignore
//! use stig_annotator::AnnotatorConfig;
//!
//! // Load from stig-annotator.toml
//! let config = AnnotatorConfig::from_file("stig-annotator.toml")?;
//!
//! // Or from STIG_ANNOTATOR_* environment variables
//! let config = AnnotatorConfig::from_env();
//!
//! // Or build programmatically
//! let config = AnnotatorConfig::builder()
//!     .reviewer("Jane Doe")
//!     .review_date(NaiveDate::from_ymd_opt(2024, 9, 20).unwrap())
//!     .output_suffix("_jd")
//!     .build();
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checklist::{CommentField, CommentLogEngine, DEFAULT_OPEN_QUESTIONS, DEFAULT_OUTPUT_SUFFIX};
use crate::observability::{LogFormat, LoggingConfig};

/// Prefix for environment variables read by [`AnnotatorConfig::from_env`]
pub const ENV_PREFIX: &str = "STIG_ANNOTATOR_";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this schema
    #[error("Failed to parse configuration file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A value is present but unusable
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn default_output_suffix() -> String {
    DEFAULT_OUTPUT_SUFFIX.to_string()
}

fn default_open_questions() -> String {
    DEFAULT_OPEN_QUESTIONS.to_string()
}

/// Parse a review date as `YYYY-MM-DD` or `MM/DD/YYYY`
pub fn parse_review_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

/// Annotator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    /// Name written into finding statements
    #[serde(default)]
    pub reviewer: String,

    /// Date written into statements and used by date refresh
    #[serde(default = "today")]
    pub review_date: NaiveDate,

    /// Suffix appended to output file stems (e.g. "_jd")
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Directory for rewritten checklists; defaults to each input's directory
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Field holding the comment log
    #[serde(default)]
    pub comment_field: CommentField,

    /// Questions appended under fresh statements for open findings
    #[serde(default = "default_open_questions")]
    pub open_questions: String,

    /// Logging setup
    #[serde(default)]
    pub log: LoggingConfig,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            reviewer: String::new(),
            review_date: today(),
            output_suffix: default_output_suffix(),
            output_dir: None,
            comment_field: CommentField::default(),
            open_questions: default_open_questions(),
            log: LoggingConfig::default(),
        }
    }
}

impl AnnotatorConfig {
    /// Start building a configuration
    pub fn builder() -> AnnotatorConfigBuilder {
        AnnotatorConfigBuilder::default()
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content, path)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `STIG_ANNOTATOR_REVIEWER`: name in finding statements (default: empty)
    /// - `STIG_ANNOTATOR_REVIEW_DATE`: `YYYY-MM-DD` or `MM/DD/YYYY` (default: today)
    /// - `STIG_ANNOTATOR_OUTPUT_SUFFIX`: output file stem suffix (default: "_annotated")
    /// - `STIG_ANNOTATOR_OUTPUT_DIR`: output directory (default: next to input)
    /// - `STIG_ANNOTATOR_COMMENT_FIELD`: "comments" or "finding_details" (default: "comments")
    /// - `STIG_ANNOTATOR_LOG_FILTER`: tracing filter (default: "info")
    /// - `STIG_ANNOTATOR_LOG_FORMAT`: "pretty", "json", "compact" (default: "compact")
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(reviewer) = var("REVIEWER") {
            config.reviewer = reviewer;
        }

        if let Some(raw) = var("REVIEW_DATE") {
            match parse_review_date(&raw) {
                Some(date) => config.review_date = date,
                None => tracing::warn!(value = %raw, "Ignoring unparseable review date"),
            }
        }

        if let Some(suffix) = var("OUTPUT_SUFFIX") {
            config.output_suffix = suffix;
        }

        config.output_dir = var("OUTPUT_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        if let Some(raw) = var("COMMENT_FIELD") {
            match CommentField::parse(&raw) {
                Some(field) => config.comment_field = field,
                None => tracing::warn!(value = %raw, "Ignoring unknown comment field"),
            }
        }

        if let Some(filter) = var("LOG_FILTER") {
            config.log.filter = filter;
        }

        if let Some(raw) = var("LOG_FORMAT") {
            match LogFormat::parse(&raw) {
                Some(format) => config.log.format = format,
                None => tracing::warn!(value = %raw, "Ignoring unknown log format"),
            }
        }

        config
    }

    /// Check values that would produce malformed statements or clobber inputs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reviewer.trim().is_empty() {
            return Err(ConfigError::invalid("reviewer", "must not be empty"));
        }
        if self.reviewer.contains('\n') {
            return Err(ConfigError::invalid("reviewer", "must be a single line"));
        }
        if self.output_suffix.is_empty() && self.output_dir.is_none() {
            return Err(ConfigError::invalid(
                "output_suffix",
                "must not be empty unless output_dir is set",
            ));
        }
        if self.output_suffix.contains(|c: char| c == '/' || c == '\\') {
            return Err(ConfigError::invalid(
                "output_suffix",
                "must not contain path separators",
            ));
        }
        Ok(())
    }

    /// Comment-log engine signing as this reviewer on the review date
    pub fn engine(&self) -> CommentLogEngine {
        CommentLogEngine::new(self.reviewer.clone(), self.review_date)
            .with_open_questions(self.open_questions.clone())
    }
}

/// Builder for [`AnnotatorConfig`]
#[derive(Debug, Clone, Default)]
pub struct AnnotatorConfigBuilder {
    config: AnnotatorConfig,
}

impl AnnotatorConfigBuilder {
    /// Reviewer name
    pub fn reviewer(mut self, reviewer: impl Into<String>) -> Self {
        self.config.reviewer = reviewer.into();
        self
    }

    /// Review date
    pub fn review_date(mut self, date: NaiveDate) -> Self {
        self.config.review_date = date;
        self
    }

    /// Output file stem suffix
    pub fn output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.output_suffix = suffix.into();
        self
    }

    /// Output directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    /// Field holding the comment log
    pub fn comment_field(mut self, field: CommentField) -> Self {
        self.config.comment_field = field;
        self
    }

    /// Open-findings question template
    pub fn open_questions(mut self, template: impl Into<String>) -> Self {
        self.config.open_questions = template.into();
        self
    }

    /// Logging setup
    pub fn log(mut self, log: LoggingConfig) -> Self {
        self.config.log = log;
        self
    }

    /// Build the configuration
    pub fn build(self) -> AnnotatorConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_review_date() {
        assert_eq!(parse_review_date("2024-09-20"), Some(date(2024, 9, 20)));
        assert_eq!(parse_review_date(" 09/20/2024 "), Some(date(2024, 9, 20)));
        assert_eq!(parse_review_date("2024/09/20"), None);
        assert_eq!(parse_review_date("02/30/2024"), None);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
reviewer = "Jane Doe"
review_date = "2024-09-20"
output_suffix = "_jd"
comment_field = "finding_details"

[log]
filter = "stig_annotator=debug"
format = "json"
"#;
        let config = AnnotatorConfig::from_toml(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.reviewer, "Jane Doe");
        assert_eq!(config.review_date, date(2024, 9, 20));
        assert_eq!(config.output_suffix, "_jd");
        assert_eq!(config.output_dir, None);
        assert_eq!(config.comment_field, CommentField::FindingDetails);
        assert_eq!(config.open_questions, DEFAULT_OPEN_QUESTIONS);
        assert_eq!(config.log.filter, "stig_annotator=debug");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_from_toml_requires_reviewer() {
        let err = AnnotatorConfig::from_toml("review_date = \"2024-09-20\"", Path::new("t.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "reviewer"));
    }

    #[test]
    fn test_from_toml_parse_error() {
        let err = AnnotatorConfig::from_toml("reviewer = ", Path::new("t.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = AnnotatorConfig::from_toml(
            "reviewer = \"x\"\ncomment_field = \"notes\"",
            Path::new("t.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_from_file_missing() {
        let err = AnnotatorConfig::from_file("/no/such/stig-annotator.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<String, String> = [
            ("STIG_ANNOTATOR_REVIEWER", "Env Reviewer"),
            ("STIG_ANNOTATOR_REVIEW_DATE", "06/07/2021"),
            ("STIG_ANNOTATOR_OUTPUT_DIR", "out"),
            ("STIG_ANNOTATOR_COMMENT_FIELD", "finding-details"),
            ("STIG_ANNOTATOR_LOG_FORMAT", "bogus"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = AnnotatorConfig::from_lookup(|key| vars.get(key).cloned());
        assert_eq!(config.reviewer, "Env Reviewer");
        assert_eq!(config.review_date, date(2021, 6, 7));
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
        assert_eq!(config.output_suffix, DEFAULT_OUTPUT_SUFFIX);
        assert_eq!(config.comment_field, CommentField::FindingDetails);
        assert_eq!(config.log.format, LogFormat::default());
    }

    #[test]
    fn test_from_lookup_bad_date_keeps_default() {
        let config = AnnotatorConfig::from_lookup(|key| {
            (key == "STIG_ANNOTATOR_REVIEW_DATE").then(|| "yesterday".to_string())
        });
        assert_eq!(config.review_date, today());
    }

    #[test]
    fn test_validate() {
        let base = AnnotatorConfig::builder()
            .reviewer("Jane Doe")
            .review_date(date(2024, 9, 20))
            .build();
        assert!(base.validate().is_ok());

        let config = AnnotatorConfig { reviewer: "a\nb".into(), ..base.clone() };
        assert!(config.validate().is_err());

        let config = AnnotatorConfig { output_suffix: String::new(), ..base.clone() };
        assert!(config.validate().is_err());

        let config = AnnotatorConfig {
            output_suffix: String::new(),
            output_dir: Some(PathBuf::from("out")),
            ..base.clone()
        };
        assert!(config.validate().is_ok());

        let config = AnnotatorConfig { output_suffix: "/x".into(), ..base };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_from_config() {
        let config = AnnotatorConfig::builder()
            .reviewer("Jane Doe")
            .review_date(date(2024, 9, 20))
            .open_questions("Why?")
            .build();
        let engine = config.engine();
        assert_eq!(engine.attestation().identity, "Jane Doe");
        assert_eq!(engine.attestation().date, "09/20/2024");
        assert_eq!(engine.today(), date(2024, 9, 20));
        assert_eq!(engine.open_questions(), "Why?");
    }
}
