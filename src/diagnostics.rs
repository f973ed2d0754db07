//! Grouping of compiler reports into per-file diagnostic sets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::compiler::{ReportItem, ReportLevel};
use crate::types::{Location, Position, Range};

/// One diagnostic ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Message text from the compiler.
    pub message: String,
    /// Affected span. `None` when the report carried no location.
    pub range: Option<Range>,
    /// Display severity.
    pub severity: Severity,
}

impl Diagnostic {
    /// Range to show the diagnostic at. Reports without a location are
    /// pinned to the start of the first line.
    pub fn anchor(&self) -> Range {
        return self.range.unwrap_or_else(|| return Range::empty_at(Position::new(0, 0)));
    }
}

/// All diagnostics of one compile cycle, keyed by chapter file.
/// Files iterate in sorted order; diagnostics keep report order within a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiagnosticSet {
    /// Diagnostics per originating file.
    files: BTreeMap<PathBuf, Vec<Diagnostic>>,
}

impl DiagnosticSet {
    /// Number of diagnostics with `Severity::Error`.
    pub fn error_count(&self) -> usize {
        return self.count_severity(Severity::Error);
    }

    /// Number of diagnostics with the given severity.
    fn count_severity(&self, severity: Severity) -> usize {
        return self
            .files
            .values()
            .flatten()
            .filter(|d| return d.severity == severity)
            .count();
    }

    /// Diagnostics recorded for `file`, if any.
    pub fn get(&self, file: &Path) -> Option<&[Diagnostic]> {
        return self.files.get(file).map(Vec::as_slice);
    }

    /// True when no file has any diagnostic.
    pub fn is_empty(&self) -> bool {
        return self.files.is_empty();
    }

    /// Iterate over `(file, diagnostics)` in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[Diagnostic])> {
        return self
            .files
            .iter()
            .map(|(file, diags)| return (file.as_path(), diags.as_slice()));
    }

    /// Number of files with diagnostics.
    pub fn len(&self) -> usize {
        return self.files.len();
    }

    /// Number of diagnostics with `Severity::Warning`.
    pub fn warning_count(&self) -> usize {
        return self.count_severity(Severity::Warning);
    }
}

/// Display severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks a clean build.
    Error,
    /// Informational, also used for levels this tool does not recognize.
    Information,
    /// Worth a look.
    Warning,
}

impl Severity {
    /// Map a compiler level. Unknown levels are kept as information.
    pub const fn from_level(level: ReportLevel) -> Self {
        return match level {
            ReportLevel::Error => Self::Error,
            ReportLevel::Info | ReportLevel::Unknown => Self::Information,
            ReportLevel::Warning => Self::Warning,
        };
    }

    /// Lowercase label used in terminal output.
    pub const fn label(self) -> &'static str {
        return match self {
            Self::Error => "error",
            Self::Information => "info",
            Self::Warning => "warning",
        };
    }
}

/// Group reports by originating file. No report is dropped: a report
/// without a location gets an absent range.
pub fn group(reports: &[ReportItem]) -> DiagnosticSet {
    let mut files: BTreeMap<PathBuf, Vec<Diagnostic>> = BTreeMap::new();
    for report in reports {
        files.entry(PathBuf::from(&report.file)).or_default().push(Diagnostic {
            message: report.message.clone(),
            range: report.location.map(Location::to_range),
            severity: Severity::from_level(report.level),
        });
    }
    return DiagnosticSet { files };
}
