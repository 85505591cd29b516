//! Types and loading for difference report JSON.
//!
//! A difference report bundles the full text of two documents with a list of
//! semantic changes detected between them. Each change carries a
//! classification and, optionally, the excerpts it touches and a diff hunk
//! with approximate line numbers.
//!
//! ## Example JSON Structure
//!
//! ```json
//! {
//!   "document_a": "alpha\nbeta\ngamma",
//!   "document_b": "alpha\nbeta2\ngamma",
//!   "difference_report": {
//!     "summary": "One wording change.",
//!     "changes": [{
//!       "change_id": "c-1",
//!       "change_classification": {"change_type": "modified", "category": "Minor"},
//!       "diff_hunk": {
//!         "unified_diff": "@@ -2 +2 @@\n-beta\n+beta2",
//!         "old_excerpt": "beta",
//!         "new_excerpt": "beta2",
//!         "hunk_header": {"start_line_old": 2, "end_line_old": 2, "start_line_new": 2, "end_line_new": 2}
//!       }
//!     }]
//!   }
//! }
//! ```
//!
//! Older producers put `old_excerpt`/`new_excerpt` on the change itself and
//! emit no `diff_hunk`; both shapes are accepted.

use crate::error::{ReportError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Moved,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Modified => "modified",
            ChangeType::Moved => "moved",
        }
    }
}

/// Coarse severity bucket of a change.
///
/// Distinct from [`Severity`], which only exists on changes with an impact analysis.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum Category {
    Critical,
    Minor,
    Formatting,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Critical => "Critical",
            Category::Minor => "Minor",
            Category::Formatting => "Formatting",
        }
    }

    /// Highlight group used for lines touched by a change of this category.
    pub fn highlight_group(self) -> &'static str {
        match self {
            Category::Critical => "CompairCritical",
            Category::Minor => "CompairMinor",
            Category::Formatting => "CompairFormatting",
        }
    }

    /// Highlight group used for the border of a hover card.
    pub fn frame_group(self) -> &'static str {
        match self {
            Category::Critical => "CompairFrameCritical",
            Category::Minor => "CompairFrameMinor",
            Category::Formatting => "CompairFrameFormatting",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum Party {
    #[serde(rename = "Data Controller")]
    DataController,
    #[serde(rename = "Data Processor")]
    DataProcessor,
    Both,
}

impl Party {
    pub fn as_str(self) -> &'static str {
        match self {
            Party::DataController => "Data Controller",
            Party::DataProcessor => "Data Processor",
            Party::Both => "Both",
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ImpactAnalysis {
    pub severity: Severity,
    pub party_affected: Vec<Party>,
    pub rationale: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChangeClassification {
    pub change_type: ChangeType,
    pub category: Category,
    /// Producer confidence in `0.0..=1.0`.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Clause identifier, e.g. `"5.1.1"` or `"Appendix 3"`.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub impact_analysis: Option<ImpactAnalysis>,
    /// Free-text summary of the change; only surfaced by the CSV export.
    #[serde(default)]
    pub summary: Option<String>,
}

/// Approximate 1-based, inclusive line ranges of a change in both documents.
///
/// A hint, not ground truth. Signed so that out-of-range producer output
/// (zero or negative lines) still deserializes and simply clamps.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct HunkHeader {
    pub start_line_old: i64,
    pub end_line_old: i64,
    pub start_line_new: i64,
    pub end_line_new: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DiffHunk {
    #[serde(default)]
    pub unified_diff: String,
    #[serde(default)]
    pub old_excerpt: Option<String>,
    #[serde(default)]
    pub new_excerpt: Option<String>,
    #[serde(default)]
    pub hunk_header: Option<HunkHeader>,
}

/// One detected difference between document A and document B.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Change {
    #[serde(default)]
    pub change_id: Option<String>,
    /// Legacy location of the old-side snippet; superseded by [`DiffHunk::old_excerpt`].
    #[serde(default)]
    pub old_excerpt: Option<String>,
    /// Legacy location of the new-side snippet; superseded by [`DiffHunk::new_excerpt`].
    #[serde(default)]
    pub new_excerpt: Option<String>,
    pub change_classification: ChangeClassification,
    #[serde(default)]
    pub diff_hunk: Option<DiffHunk>,
}

impl Change {
    /// The hunk header, if this change carries one.
    #[inline]
    pub fn hunk_header(&self) -> Option<HunkHeader> {
        self.diff_hunk.as_ref().and_then(|hunk| hunk.hunk_header)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DifferenceReport {
    pub changes: Vec<Change>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// The full upload: both document texts plus the report describing them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DifferenceReportWithInputs {
    pub document_a: String,
    pub document_b: String,
    pub difference_report: DifferenceReport,
}

/// Parses an uploaded difference report.
///
/// Fails if the JSON is malformed or `document_a`, `document_b` or
/// `difference_report.changes` is missing.
pub fn parse(json: &str) -> Result<DifferenceReportWithInputs> {
    let report: DifferenceReportWithInputs = serde_json::from_str(json)?;
    tracing::debug!(
        changes = report.difference_report.changes.len(),
        "parsed difference report"
    );
    Ok(report)
}

/// Reads and parses a difference report from disk.
pub fn load_file(path: &Path) -> Result<DifferenceReportWithInputs> {
    let json = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_report() {
        let json = r#"{
            "document_a": "a",
            "document_b": "b",
            "difference_report": {"changes": []}
        }"#;

        let report = parse(json).unwrap();
        assert_eq!(report.document_a, "a");
        assert_eq!(report.document_b, "b");
        assert!(report.difference_report.changes.is_empty());
        assert!(report.difference_report.summary.is_none());
    }

    #[test]
    fn parse_legacy_change_without_hunk() {
        let json = r#"{
            "document_a": "alpha\nbeta",
            "document_b": "alpha\nbeta2",
            "difference_report": {
                "summary": "small edit",
                "changes": [{
                    "old_excerpt": "beta",
                    "new_excerpt": "beta2",
                    "change_classification": {"change_type": "modified", "category": "Minor"}
                }]
            }
        }"#;

        let report = parse(json).unwrap();
        let change = &report.difference_report.changes[0];
        assert!(change.change_id.is_none());
        assert_eq!(change.old_excerpt.as_deref(), Some("beta"));
        assert!(change.diff_hunk.is_none());
        assert!(change.hunk_header().is_none());
        assert_eq!(change.change_classification.category, Category::Minor);
        assert_eq!(report.difference_report.summary.as_deref(), Some("small edit"));
    }

    #[test]
    fn parse_change_with_hunk_and_impact() {
        let json = r#"{
            "document_a": "x",
            "document_b": "y",
            "difference_report": {"changes": [{
                "change_id": "c-7",
                "change_classification": {
                    "change_type": "removed",
                    "category": "Critical",
                    "confidence": 0.9,
                    "location": "5.1.1",
                    "impact_analysis": {
                        "severity": "high",
                        "party_affected": ["Data Controller", "Both"],
                        "rationale": "Removes a notification duty."
                    }
                },
                "diff_hunk": {
                    "unified_diff": "@@ -3,2 +3,0 @@",
                    "old_excerpt": "notify within 72 hours",
                    "new_excerpt": null,
                    "hunk_header": {"start_line_old": 3, "end_line_old": 4, "start_line_new": 3, "end_line_new": 3}
                }
            }]}
        }"#;

        let report = parse(json).unwrap();
        let change = &report.difference_report.changes[0];
        let class = &change.change_classification;
        assert_eq!(class.change_type, ChangeType::Removed);
        assert_eq!(class.confidence, Some(0.9));
        let impact = class.impact_analysis.as_ref().unwrap();
        assert_eq!(impact.severity, Severity::High);
        assert_eq!(impact.party_affected, vec![Party::DataController, Party::Both]);
        let header = change.hunk_header().unwrap();
        assert_eq!(header.start_line_old, 3);
        assert_eq!(header.end_line_old, 4);
        assert!(change.diff_hunk.as_ref().unwrap().new_excerpt.is_none());
    }

    #[test]
    fn parse_hunk_without_header() {
        let json = r#"{
            "document_a": "", "document_b": "",
            "difference_report": {"changes": [{
                "change_classification": {"change_type": "added", "category": "Formatting"},
                "diff_hunk": {"unified_diff": "", "new_excerpt": "x"}
            }]}
        }"#;

        let report = parse(json).unwrap();
        let change = &report.difference_report.changes[0];
        assert!(change.diff_hunk.is_some());
        assert!(change.hunk_header().is_none());
    }

    #[test]
    fn parse_rejects_missing_document() {
        let json = r#"{"document_a": "a", "difference_report": {"changes": []}}"#;
        let err = parse(json).unwrap_err();
        assert!(matches!(err, ReportError::Json(_)));
        assert!(err.to_string().starts_with("Failed to parse JSON"));
    }

    #[test]
    fn parse_rejects_missing_changes() {
        let json = r#"{"document_a": "a", "document_b": "b", "difference_report": {}}"#;
        assert!(parse(json).is_err());
    }

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(parse("{not json").is_err());
    }

    #[test]
    fn load_file_missing_path() {
        let err = load_file(Path::new("/nonexistent/compair/report.json")).unwrap_err();
        assert!(matches!(err, ReportError::Read { .. }));
    }
}
