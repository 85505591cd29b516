//! Hover cards describing a single change.
//!
//! A card is a handful of plain-text lines shown in a floating window when
//! the cursor rests on a highlighted line. The border uses
//! [`Category::frame_group`](crate::report::Category::frame_group).

use crate::report::Change;

/// A rendered hover card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub lines: Vec<String>,
    /// Highlight group for the card border.
    pub frame_group: &'static str,
}

impl Card {
    #[must_use]
    pub fn of(change: &Change) -> Self {
        Self {
            lines: card_lines(change),
            frame_group: change.change_classification.category.frame_group(),
        }
    }
}

/// Renders the detail card of `change`.
///
/// The first line holds the badges (id, change type, category, severity);
/// optional rows are omitted when the change lacks the data.
#[must_use]
pub fn card_lines(change: &Change) -> Vec<String> {
    let class = &change.change_classification;
    let impact = class.impact_analysis.as_ref();

    let mut badges = Vec::with_capacity(4);
    if let Some(id) = change.change_id.as_deref().filter(|id| !id.is_empty()) {
        badges.push(format!("#{id}"));
    }
    badges.push(class.change_type.as_str().to_string());
    badges.push(class.category.as_str().to_string());
    if let Some(ia) = impact {
        badges.push(format!("severity: {}", ia.severity.as_str()));
    }

    let mut lines = vec![
        badges.join("  "),
        format!("Location: {}", class.location.as_deref().unwrap_or("-")),
    ];
    if let Some(confidence) = class.confidence {
        // halves round away from zero
        lines.push(format!("Confidence: {}%", (confidence * 100.0).round()));
    }
    if let Some(ia) = impact {
        let parties: Vec<&str> = ia.party_affected.iter().map(|p| p.as_str()).collect();
        lines.push(format!("Party: {}", parties.join(", ")));
        lines.push(format!("Rationale: {}", ia.rationale));
    }
    lines
}
