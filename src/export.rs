//! CSV export of a report's critical changes.

use crate::processor::Excerpts;
use crate::report::{Category, Change, DifferenceReport};

/// File name suggested to the user when saving the export.
pub const DEFAULT_EXPORT_FILE: &str = "critical-changes.csv";

const COLUMNS: [&str; 9] = [
    "change_id",
    "location",
    "change_type",
    "severity",
    "party_affected",
    "rationale",
    "summary",
    "old_excerpt",
    "new_excerpt",
];

/// Renders one row per `Critical` change, preceded by a header row.
///
/// Every field is quoted and flattened to a single line. Rows are joined
/// with `\n` without a trailing newline.
#[must_use]
pub fn critical_csv(report: &DifferenceReport) -> String {
    let header = join_row(COLUMNS.iter().copied());
    let rows = report
        .changes
        .iter()
        .filter(|change| change.change_classification.category == Category::Critical)
        .map(critical_row);

    std::iter::once(header).chain(rows).collect::<Vec<_>>().join("\n")
}

fn critical_row(change: &Change) -> String {
    let class = &change.change_classification;
    let impact = class.impact_analysis.as_ref();
    let excerpts = Excerpts::of(change);

    let party = impact
        .map(|ia| {
            ia.party_affected
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .unwrap_or_default();

    join_row([
        change.change_id.as_deref().unwrap_or(""),
        class.location.as_deref().unwrap_or(""),
        class.change_type.as_str(),
        impact.map_or("", |ia| ia.severity.as_str()),
        party.as_str(),
        impact.map_or("", |ia| ia.rationale.as_str()),
        class.summary.as_deref().unwrap_or(""),
        excerpts.old,
        excerpts.new,
    ])
}

fn join_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields.into_iter().map(quote).collect::<Vec<_>>().join(",")
}

/// Flattens line breaks to spaces, trims, and wraps in double quotes.
fn quote(value: &str) -> String {
    let flat = value.replace("\r\n", " ").replace('\n', " ");
    format!("\"{}\"", flat.trim().replace('"', "\"\""))
}
