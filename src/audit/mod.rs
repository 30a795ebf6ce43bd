//! On-demand quality checks over a rendered page.
//!
//! Every run starts from an empty issue list; nothing carries over between
//! runs. A check that fails is logged and skipped, the rest still run.

pub mod accessibility;
pub mod content;
pub mod contrast;
pub mod dom;
pub mod forms;
pub mod links;
pub mod performance;
pub mod style;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub use accessibility::{AccessibilityIssue, AccessibilityIssueType, AccessibilityTester};
pub use content::{ContentIssue, ContentIssueType, ContentReviewer};
pub use dom::Page;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Error => "❌",
            Severity::Warning => "⚠️",
            Severity::Info => "ℹ️",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum WcagLevel {
    A,
    AA,
    AAA,
}

impl fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WcagLevel::A => "A",
            WcagLevel::AA => "AA",
            WcagLevel::AAA => "AAA",
        };
        f.write_str(s)
    }
}

/// What an issue pointed at, captured when the check ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementSnapshot {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub excerpt: String,
}

impl fmt::Display for ElementSnapshot {
    /// `TAG#id.first-class`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)?;
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        if let Some(class) = self.classes.first() {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

/// Machine-readable counts for one audit run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    /// Per WCAG level or per issue type, depending on the audit.
    pub groups: BTreeMap<String, usize>,
}

impl AuditSummary {
    pub fn from_issues<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = (Severity, String)>,
    {
        let mut summary = AuditSummary::default();
        for (severity, group) in issues {
            summary.total += 1;
            match severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
            }
            *summary.groups.entry(group).or_insert(0) += 1;
        }
        summary
    }
}
