//! Resolving report changes to physical lines in both documents.
//!
//! A difference report describes *what* changed but is vague about *where*:
//! excerpts are free text and hunk headers are approximate. This module turns
//! each change into concrete line positions so the viewer can wrap those lines
//! in highlight containers.
//!
//! ## Resolution Flow
//!
//! 1. Both documents are split into [`Document`] lines on `\n`
//! 2. Each change's old/new excerpt is picked by [`Excerpts::of`], preferring the
//!    diff hunk's copy over the legacy top-level field
//! 3. A [`SearchScope`] is derived per side from the optional hunk header
//! 4. Every non-trivial excerpt line is located by substring search, first hit wins
//! 5. Matches are appended to a per-side [`HighlightIndex`] in change order
//!
//! ## Matching Policy
//!
//! Localization is best-effort. Excerpt lines shorter than
//! [`MatchOptions::min_needle_chars`] after trimming are never matched, and a
//! change with a hunk header is only ever searched inside its padded window.
//! A line that cannot be placed simply produces no highlight.

use crate::report::{Category, Change, HunkHeader};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::ops::Range;

/// Most lines are touched by at most a couple of changes.
pub type Highlights = SmallVec<[Highlight; 2]>;

/// Tunables for excerpt matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Trimmed excerpt lines shorter than this are skipped. Length is
    /// counted in UTF-16 code units, as the report producer's viewer does.
    pub min_needle_chars: usize,
    /// Lines added on each side of a hunk header's range.
    pub window_padding: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_needle_chars: 2,
            window_padding: 1,
        }
    }
}

/// A document as an ordered sequence of physical lines.
///
/// Splits strictly on `\n`; a trailing `\r` stays part of its line and an
/// empty text is a single empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Document<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
        }
    }

    #[inline]
    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Which document a highlight belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    /// Document A, matched from the old excerpt.
    Old,
    /// Document B, matched from the new excerpt.
    New,
}

impl Part {
    pub fn as_str(self) -> &'static str {
        match self {
            Part::Old => "old",
            Part::New => "new",
        }
    }

    #[inline]
    fn key_tag(self) -> char {
        match self {
            Part::Old => 'o',
            Part::New => 'n',
        }
    }
}

/// The canonical old/new excerpt of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Excerpts<'c> {
    pub old: &'c str,
    pub new: &'c str,
}

impl<'c> Excerpts<'c> {
    /// Picks each side's excerpt by precedence: diff hunk, then top-level
    /// field, then the empty string.
    #[must_use]
    pub fn of(change: &'c Change) -> Self {
        let hunk = change.diff_hunk.as_ref();
        Self {
            old: first_present([
                hunk.and_then(|h| h.old_excerpt.as_ref()),
                change.old_excerpt.as_ref(),
            ]),
            new: first_present([
                hunk.and_then(|h| h.new_excerpt.as_ref()),
                change.new_excerpt.as_ref(),
            ]),
        }
    }

    #[inline]
    pub fn get(&self, part: Part) -> &'c str {
        match part {
            Part::Old => self.old,
            Part::New => self.new,
        }
    }
}

#[inline]
fn first_present<const N: usize>(candidates: [Option<&String>; N]) -> &str {
    candidates
        .into_iter()
        .flatten()
        .next()
        .map_or("", String::as_str)
}

/// Where an excerpt line may be searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    /// Only these line indices; set when the change has a hunk header.
    /// Never escapes the window, even when nothing matches.
    Windowed(Range<usize>),
    /// The whole document.
    Unbounded,
}

impl SearchScope {
    /// Derives the scope for one side of a change.
    ///
    /// The header's 1-based inclusive range is converted to 0-based, padded
    /// and clamped to `0..line_count`. A header pointing past the document
    /// yields an empty window.
    #[must_use]
    pub fn for_side(
        header: Option<HunkHeader>,
        part: Part,
        line_count: usize,
        padding: usize,
    ) -> Self {
        let Some(header) = header else {
            return SearchScope::Unbounded;
        };

        let (start_line, end_line) = match part {
            Part::Old => (header.start_line_old, header.end_line_old),
            Part::New => (header.start_line_new, header.end_line_new),
        };
        let padding = i64::try_from(padding).unwrap_or(i64::MAX);
        let last = i64::try_from(line_count).unwrap_or(i64::MAX) - 1;

        let start = start_line.saturating_sub(1).saturating_sub(padding).max(0);
        let end = end_line.saturating_sub(1).saturating_add(padding).min(last);

        // start is non-negative; an end below it means an empty window
        let start = start as usize;
        let end = if end < 0 { start } else { (end as usize + 1).max(start) };
        SearchScope::Windowed(start..end)
    }

    /// Index of the first line within scope containing `needle`.
    fn find(&self, lines: &[&str], needle: &str) -> Option<usize> {
        // Header-less changes scan the whole document, which subsumes the
        // fallback scan.
        let range = match self {
            SearchScope::Windowed(range) => range.clone(),
            SearchScope::Unbounded => 0..lines.len(),
        };
        lines
            .get(range.clone())
            .unwrap_or_default()
            .iter()
            .position(|line| line.contains(needle))
            .map(|offset| range.start + offset)
    }
}

/// One resolved association between a physical line and a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    /// Unique within the line's highlight list; stable across re-renders of
    /// the same report.
    pub key: String,
    /// Index of the owning change in the report.
    pub change: usize,
    pub category: Category,
    pub part: Part,
    /// The excerpt line that matched, untrimmed.
    pub text: String,
}

/// Highlights of one document side, keyed by 0-based line index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightIndex {
    lines: BTreeMap<usize, Highlights>,
}

impl HighlightIndex {
    /// Highlights on `line`, in processing order. Empty when the line is untouched.
    pub fn get(&self, line: usize) -> &[Highlight] {
        self.lines
            .get(&line)
            .map(|h| h.as_slice())
            .unwrap_or_default()
    }

    /// Populated lines in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Highlight])> {
        self.lines.iter().map(|(line, h)| (*line, h.as_slice()))
    }

    /// Number of populated lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of highlights across all lines.
    pub fn highlight_count(&self) -> usize {
        self.lines.values().map(SmallVec::len).sum()
    }

    fn push(&mut self, line: usize, highlight: Highlight) {
        self.lines.entry(line).or_default().push(highlight);
    }
}

/// The highlight maps of both documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineHighlights {
    /// Document A, fed by old excerpts.
    pub a: HighlightIndex,
    /// Document B, fed by new excerpts.
    pub b: HighlightIndex,
}

/// Matches of a single change, in excerpt-line order.
#[derive(Debug, Default)]
struct ResolvedChange {
    old: Vec<(usize, Highlight)>,
    new: Vec<(usize, Highlight)>,
}

/// Resolves every change to physical lines of both documents.
///
/// Changes are resolved independently on the rayon pool and merged in input
/// order, so the result is identical to a sequential pass.
#[must_use]
pub fn build_highlights(
    doc_a: &Document<'_>,
    doc_b: &Document<'_>,
    changes: &[Change],
    options: &MatchOptions,
) -> LineHighlights {
    let resolved: Vec<ResolvedChange> = changes
        .par_iter()
        .enumerate()
        .map(|(idx, change)| resolve_change(idx, change, doc_a, doc_b, options))
        .collect();

    let mut result = LineHighlights::default();
    for change in resolved {
        for (line, highlight) in change.old {
            result.a.push(line, highlight);
        }
        for (line, highlight) in change.new {
            result.b.push(line, highlight);
        }
    }

    tracing::debug!(
        changes = changes.len(),
        highlights_a = result.a.highlight_count(),
        highlights_b = result.b.highlight_count(),
        "resolved change highlights"
    );
    result
}

fn resolve_change(
    idx: usize,
    change: &Change,
    doc_a: &Document<'_>,
    doc_b: &Document<'_>,
    options: &MatchOptions,
) -> ResolvedChange {
    let excerpts = Excerpts::of(change);
    let header = change.hunk_header();
    let key_prefix = change
        .change_id
        .clone()
        .unwrap_or_else(|| idx.to_string());

    let side = |part: Part, doc: &Document<'_>| -> Vec<(usize, Highlight)> {
        let scope = SearchScope::for_side(header, part, doc.len(), options.window_padding);
        if matches!(&scope, SearchScope::Windowed(range) if range.is_empty()) {
            tracing::trace!(
                change = idx,
                part = part.as_str(),
                "hunk window outside document"
            );
        }
        match_excerpt(excerpts.get(part), doc, &scope, options)
            .map(|(excerpt_line, line, text)| {
                let highlight = Highlight {
                    key: format!("{key_prefix}-{}-{excerpt_line}-{line}", part.key_tag()),
                    change: idx,
                    category: change.change_classification.category,
                    part,
                    text: text.to_string(),
                };
                (line, highlight)
            })
            .collect()
    };

    ResolvedChange {
        old: side(Part::Old, doc_a),
        new: side(Part::New, doc_b),
    }
}

/// Strips surrounding whitespace and byte-order marks.
#[inline]
fn trim_needle(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Locates each excerpt line in `doc`, yielding
/// `(excerpt_line_index, physical_line_index, excerpt_line)`.
///
/// Skips lines that are too short after trimming; a line that matches
/// nowhere within `scope` yields nothing.
fn match_excerpt<'e>(
    excerpt: &'e str,
    doc: &Document<'_>,
    scope: &SearchScope,
    options: &MatchOptions,
) -> impl Iterator<Item = (usize, usize, &'e str)> {
    excerpt
        .split('\n')
        .enumerate()
        .filter_map(move |(excerpt_line, raw)| {
            let needle = trim_needle(raw);
            if needle.encode_utf16().count() < options.min_needle_chars {
                return None;
            }
            let Some(line) = scope.find(doc.lines(), needle) else {
                tracing::trace!(excerpt_line, needle, "excerpt line not located");
                return None;
            };
            Some((excerpt_line, line, raw))
        })
}

#[cfg(feature = "lua")]
mod lua {
    use super::{Highlight, HighlightIndex};
    use mlua::prelude::*;

    impl IntoLua for Highlight {
        fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
            let table = lua.create_table()?;
            table.set("key", self.key)?;
            table.set("part", self.part.as_str())?;
            table.set("text", self.text)?;
            // 1-based, matching the `cards` sequence on the Lua side
            table.set("change", self.change + 1)?;
            table.set("group", self.category.highlight_group())?;
            Ok(LuaValue::Table(table))
        }
    }

    /// Converts to a table keyed by 1-based line number.
    impl IntoLua for HighlightIndex {
        fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
            let table = lua.create_table()?;
            for (line, highlights) in self.lines {
                let list: Vec<LuaValue> = highlights
                    .into_iter()
                    .map(|h| h.into_lua(lua))
                    .collect::<LuaResult<_>>()?;
                table.set(line + 1, lua.create_sequence_from(list)?)?;
            }
            Ok(LuaValue::Table(table))
        }
    }
}
