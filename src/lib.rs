//! # compair-nvim
//!
//! A Neovim plugin core for reviewing semantic difference reports between two
//! documents in a side-by-side viewer.
//!
//! A difference report is produced upstream (typically by an LLM comparing two
//! contracts) and lists classified changes with text excerpts and approximate
//! line hints. This crate resolves those changes to physical lines in both
//! documents, producing per-line highlights and hover cards ready to render.
//!
//! ## Architecture
//!
//! - `report` - Types and loading for the difference report JSON
//! - `processor` - Resolves changes to lines and builds the highlight maps
//! - `card` - Hover card text for a single change
//! - `export` - CSV export of critical changes
//! - `lib` (this module) - The assembled [`ReportView`] and Lua bindings
//!
//! ## Usage from Lua
//!
//! Build with `--features lua` to produce the `compair_nvim` Lua module.
//!
//! ```lua
//! local compair = require("compair_nvim")
//!
//! -- Resolve a report read from disk
//! local view = compair.render_file("report.json")
//!
//! -- Tighter matching for noisy reports
//! local view = compair.render(json, { min_needle_chars = 4, window_padding = 0 })
//!
//! -- CSV of the critical changes
//! local csv = compair.export_csv(json)
//! ```
//!
//! ## Environment Variables
//!
//! - `COMPAIR_LOG` - `tracing` filter directives (e.g. `compair_nvim=trace`);
//!   logging goes to stderr and is disabled when unset

pub mod card;
pub mod error;
pub mod export;
pub mod processor;
pub mod report;

pub use error::{ReportError, Result};

use card::Card;
use processor::{Document, LineHighlights, MatchOptions};
use report::DifferenceReportWithInputs;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "COMPAIR_LOG";

/// Everything the viewer needs to display one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportView {
    /// Physical lines of document A.
    pub lines_a: Vec<String>,
    /// Physical lines of document B.
    pub lines_b: Vec<String>,
    pub highlights: LineHighlights,
    /// One card per change, in report order.
    pub cards: Vec<Card>,
    pub summary: Option<String>,
}

/// Resolves a parsed report into a display-ready view.
#[must_use]
pub fn build_view(report: &DifferenceReportWithInputs, options: &MatchOptions) -> ReportView {
    let doc_a = Document::new(&report.document_a);
    let doc_b = Document::new(&report.document_b);
    let changes = &report.difference_report.changes;

    let highlights = processor::build_highlights(&doc_a, &doc_b, changes, options);

    ReportView {
        lines_a: into_lines(&doc_a),
        lines_b: into_lines(&doc_b),
        highlights,
        cards: changes.iter().map(Card::of).collect(),
        summary: report.difference_report.summary.clone(),
    }
}

#[inline]
fn into_lines(doc: &Document<'_>) -> Vec<String> {
    doc.lines().iter().map(|line| line.to_string()).collect()
}

#[cfg(feature = "lua")]
mod bindings {
    use super::*;
    use mlua::prelude::*;
    use std::path::PathBuf;
    use std::sync::Once;

    impl IntoLua for Card {
        fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
            let table = lua.create_table()?;
            table.set("lines", lua.create_sequence_from(self.lines)?)?;
            table.set("frame_group", self.frame_group)?;
            Ok(LuaValue::Table(table))
        }
    }

    impl IntoLua for ReportView {
        fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
            let table = lua.create_table()?;
            table.set("lines_a", lua.create_sequence_from(self.lines_a)?)?;
            table.set("lines_b", lua.create_sequence_from(self.lines_b)?)?;
            table.set("a", self.highlights.a.into_lua(lua)?)?;
            table.set("b", self.highlights.b.into_lua(lua)?)?;

            let cards: Vec<LuaValue> = self
                .cards
                .into_iter()
                .map(|c| c.into_lua(lua))
                .collect::<LuaResult<_>>()?;
            table.set("cards", lua.create_sequence_from(cards)?)?;
            table.set("summary", self.summary)?;
            Ok(LuaValue::Table(table))
        }
    }

    /// Installs a stderr subscriber once, if `COMPAIR_LOG` is set.
    fn init_logging() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let Ok(filter) = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV) else {
                return;
            };
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .try_init();
        });
    }

    /// Reads matching overrides from an optional Lua table.
    fn match_options(opts: Option<LuaTable>) -> LuaResult<MatchOptions> {
        let mut options = MatchOptions::default();
        if let Some(opts) = opts {
            if let Some(n) = opts.get::<Option<usize>>("min_needle_chars")? {
                options.min_needle_chars = n;
            }
            if let Some(n) = opts.get::<Option<usize>>("window_padding")? {
                options.window_padding = n;
            }
        }
        Ok(options)
    }

    /// Resolves a report given as a JSON string.
    fn render(lua: &Lua, (json, opts): (String, Option<LuaTable>)) -> LuaResult<LuaValue> {
        let options = match_options(opts)?;
        let report = report::parse(&json).map_err(LuaError::external)?;
        build_view(&report, &options).into_lua(lua)
    }

    /// Resolves a report read from `path`.
    fn render_file(lua: &Lua, (path, opts): (String, Option<LuaTable>)) -> LuaResult<LuaValue> {
        let options = match_options(opts)?;
        let report = report::load_file(&PathBuf::from(path)).map_err(LuaError::external)?;
        build_view(&report, &options).into_lua(lua)
    }

    /// Exports the critical changes of a report as CSV.
    fn export_csv(_: &Lua, json: String) -> LuaResult<String> {
        let report = report::parse(&json).map_err(LuaError::external)?;
        Ok(export::critical_csv(&report.difference_report))
    }

    /// Creates the Lua module exports. Called by mlua when loaded via `require("compair_nvim")`.
    #[mlua::lua_module]
    fn compair_nvim(lua: &Lua) -> LuaResult<LuaTable> {
        init_logging();

        let exports = lua.create_table()?;
        exports.set("render", lua.create_function(render)?)?;
        exports.set("render_file", lua.create_function(render_file)?)?;
        exports.set("export_csv", lua.create_function(export_csv)?)?;
        exports.set("export_file_name", export::DEFAULT_EXPORT_FILE)?;
        Ok(exports)
    }
}
