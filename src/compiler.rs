//! Boundary with the external Re:VIEW compiler: the compile-output format,
//! occurrence selection, and invoking the compiler as a process.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use crate::error::Error;
use crate::types::{Location, Range};

/// Prefix prepended to a column caption in the outline.
const COLUMN_LABEL_PREFIX: &str = "[column] ";

/// One builder output segment of the compiled book.
#[derive(Debug, Clone, Deserialize)]
pub struct Chunk {
    /// Chapter file the segment was produced from.
    #[serde(default)]
    pub file: String,
    /// Rendered HTML for the chapter.
    #[serde(default)]
    pub html: String,
}

/// Everything one compile cycle reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompileOutput {
    /// Per-chapter builder results, in book order.
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    /// Validation reports, in emission order.
    #[serde(default)]
    pub reports: Vec<ReportItem>,
    /// Symbol occurrences, in document order.
    #[serde(default)]
    pub symbols: Vec<SymbolOccurrence>,
}

impl CompileOutput {
    /// Occurrences that take part in the outline of `chapter`: those from
    /// that file, not inline, headline or column, and located. Order is preserved.
    pub fn outline_occurrences(&self, chapter: &str) -> Vec<SymbolOccurrence> {
        return self
            .symbols
            .iter()
            .filter(|s| {
                return s.file == chapter && !s.inline && s.kind.is_structural() && s.location.is_some();
            })
            .cloned()
            .collect();
    }

    /// Parse compile output from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `Error::CompileOutputInvalid` if the JSON does not match the format.
    pub fn parse(origin: &Path, content: &str) -> Result<Self, Error> {
        return serde_json::from_str(content).map_err(|e| {
            return Error::CompileOutputInvalid {
                origin: origin.to_path_buf(),
                reason: e.to_string(),
            };
        });
    }
}

/// Severity reported by the compiler. Unrecognized or missing strings
/// become `Unknown`.
#[allow(clippy::arbitrary_source_item_ordering, reason = "serde(other) must be the last variant")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    /// A hard validation error.
    Error,
    /// Informational note.
    Info,
    /// A suspicious construct.
    Warning,
    /// Any level this tool does not know.
    #[default]
    #[serde(other)]
    Unknown,
}

/// A diagnostic emitted by the compiler.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportItem {
    /// Chapter file the report belongs to.
    #[serde(default)]
    pub file: String,
    /// Severity as reported.
    #[serde(default)]
    pub level: ReportLevel,
    /// Span of the offending node, if the report carries one.
    #[serde(default)]
    pub location: Option<Location>,
    /// Human-readable message.
    pub message: String,
}

/// Kind of a symbol occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// A boxed side-note with its own level and extent.
    Column,
    /// A section heading.
    #[serde(alias = "hd", alias = "heading")]
    Headline,
    /// Anything else the compiler tracks (footnotes, lists, images...).
    #[serde(other)]
    Other,
}

impl SymbolKind {
    /// Headlines and columns take part in the outline.
    pub const fn is_structural(self) -> bool {
        return matches!(self, Self::Column | Self::Headline);
    }
}

/// A symbol as reported by the compiler.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolOccurrence {
    /// Caption text of the heading or column.
    #[serde(default)]
    pub caption: String,
    /// Chapter file the occurrence belongs to.
    #[serde(default)]
    pub file: String,
    /// Cross-reference id attached to a heading, if any.
    #[serde(default)]
    pub id: Option<String>,
    /// Inline elements never take part in the outline.
    #[serde(default)]
    pub inline: bool,
    /// What kind of element this is.
    pub kind: SymbolKind,
    /// Nesting depth. Only meaningful for headlines and columns.
    #[serde(default)]
    pub level: Option<u32>,
    /// Span of the element in the chapter source. Occurrences without one
    /// are kept for the record but never reach the outline.
    #[serde(default)]
    pub location: Option<Location>,
}

impl SymbolOccurrence {
    /// Display label for the outline.
    pub fn label(&self) -> String {
        return match (self.kind, &self.id) {
            (SymbolKind::Column, _) => format!("{COLUMN_LABEL_PREFIX}{}", self.caption),
            (_, Some(id)) if !id.is_empty() => format!("{} {{{id}}}", self.caption),
            _ => self.caption.clone(),
        };
    }

    /// Level used for nesting. `None` means the occurrence cannot nest.
    pub const fn nesting_level(&self) -> Option<u32> {
        return match self.kind {
            SymbolKind::Column | SymbolKind::Headline => self.level,
            SymbolKind::Other => None,
        };
    }

    /// 0-based span of the occurrence, if the compiler reported one.
    pub fn span(&self) -> Option<Range> {
        return self.location.map(Location::to_range);
    }
}

/// Read a saved compile output from a JSON file.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the file cannot be read,
/// or `Error::CompileOutputInvalid` if it does not parse.
pub fn load(path: &Path) -> Result<CompileOutput, Error> {
    let content = std::fs::read_to_string(path)
        .map_err(|_err| return Error::FileNotFound { path: path.to_path_buf() })?;
    let output = CompileOutput::parse(path, &content)?;
    tracing::debug!(
        path = %path.display(),
        symbols = output.symbols.len(),
        reports = output.reports.len(),
        "loaded compile output"
    );
    return Ok(output);
}

/// Run the external compiler on `file` and parse what it prints.
/// The chapter path is appended to `command`.
///
/// # Errors
///
/// Returns `Error::NoCompiler` if `command` is empty, `Error::CompileFailed`
/// if the process cannot start or exits non-zero, or
/// `Error::CompileOutputInvalid` if its stdout does not parse.
pub fn run(command: &[String], file: &Path) -> Result<CompileOutput, Error> {
    let Some((program, args)) = command.split_first() else {
        return Err(Error::NoCompiler);
    };

    tracing::info!(program = %program, file = %file.display(), "running compiler");
    let output = Command::new(program)
        .args(args)
        .arg(file)
        .output()
        .map_err(|e| {
            return Error::CompileFailed {
                file: file.to_path_buf(),
                reason: format!("cannot start `{program}`: {e}"),
            };
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::CompileFailed {
            file: file.to_path_buf(),
            reason: format!("`{program}` exited with {}: {stderr}", output.status),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    return CompileOutput::parse(&PathBuf::from(program), &stdout);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "symbols": [
            {"kind": "hd", "level": 1, "caption": "Intro", "id": "intro", "file": "ch01.re",
             "location": {"start": {"line": 1, "column": 1}, "end": {"line": 1, "column": 14}}},
            {"kind": "column", "level": 2, "caption": "Aside", "file": "ch01.re",
             "location": {"start": {"line": 3, "column": 1}, "end": {"line": 6, "column": 1}}},
            {"kind": "footnote", "caption": "note", "file": "ch01.re",
             "location": {"start": {"line": 8, "column": 1}, "end": {"line": 8, "column": 9}}},
            {"kind": "headline", "level": 2, "caption": "Inline", "file": "ch01.re", "inline": true,
             "location": {"start": {"line": 9, "column": 1}, "end": {"line": 9, "column": 9}}},
            {"kind": "headline", "level": 1, "caption": "Other", "file": "ch02.re",
             "location": {"start": {"line": 1, "column": 1}, "end": {"line": 1, "column": 9}}}
        ],
        "reports": [
            {"level": "warning", "message": "w", "file": "ch01.re", "location": null},
            {"level": "fatal", "message": "f", "file": "ch01.re"}
        ]
    }"#;

    fn sample() -> CompileOutput {
        return CompileOutput::parse(Path::new("sample.json"), SAMPLE).unwrap();
    }

    #[test]
    fn selects_structural_occurrences_of_one_chapter() {
        let output = sample();
        let selected = output.outline_occurrences("ch01.re");
        let captions: Vec<&str> = selected.iter().map(|s| s.caption.as_str()).collect();
        assert_eq!(captions, vec!["Intro", "Aside"]);
    }

    #[test]
    fn unknown_kinds_and_levels_are_tolerated() {
        let output = sample();
        assert_eq!(output.symbols[2].kind, SymbolKind::Other);
        assert_eq!(output.symbols[2].nesting_level(), None);
        assert_eq!(output.reports[1].level, ReportLevel::Unknown);
        assert!(output.chunks.is_empty());
    }

    #[test]
    fn labels_mark_columns_and_ids() {
        let output = sample();
        assert_eq!(output.symbols[0].label(), "Intro {intro}");
        assert_eq!(output.symbols[1].label(), "[column] Aside");
        assert_eq!(output.symbols[4].label(), "Other");
    }

    #[test]
    fn unknown_level_is_information() {
        let output = sample();
        let set = crate::diagnostics::group(&output.reports);
        let diags = set.get(Path::new("ch01.re")).unwrap();
        assert_eq!(diags[1].severity, crate::diagnostics::Severity::Information);
    }

    #[test]
    fn report_without_level_is_kept() {
        let output = CompileOutput::parse(Path::new("t.json"), r#"{"reports": [{"message": "m", "file": "ch01.re"}]}"#)
            .unwrap();
        assert_eq!(output.reports.len(), 1);
        assert_eq!(output.reports[0].level, ReportLevel::Unknown);
    }

    #[test]
    fn unlocated_symbol_does_not_sink_the_output() {
        let json = r#"{"symbols": [
            {"kind": "headline", "level": 1, "caption": "Intro", "file": "ch01.re",
             "location": {"start": {"line": 1, "column": 1}, "end": {"line": 1, "column": 9}}},
            {"kind": "footnote", "caption": "note", "file": "ch01.re"},
            {"kind": "headline", "level": 2, "caption": "Lost", "file": "ch01.re"}
        ]}"#;
        let output = CompileOutput::parse(Path::new("t.json"), json).unwrap();
        assert_eq!(output.symbols.len(), 3);
        assert_eq!(output.symbols[1].span(), None);
        let captions: Vec<String> = output
            .outline_occurrences("ch01.re")
            .into_iter()
            .map(|s| s.caption)
            .collect();
        assert_eq!(captions, vec!["Intro"]);
    }

    #[test]
    fn malformed_output_is_an_error() {
        let err = CompileOutput::parse(Path::new("bad.json"), "{\"symbols\": 3}").unwrap_err();
        assert!(matches!(err, Error::CompileOutputInvalid { .. }));
    }

    #[test]
    fn empty_command_means_no_compiler() {
        let err = run(&[], Path::new("ch01.re")).unwrap_err();
        assert!(matches!(err, Error::NoCompiler));
    }
}
