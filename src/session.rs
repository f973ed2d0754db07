//! Per-document state across compile cycles.
//!
//! Every cycle fully replaces the previous results. Cycles are numbered when
//! they start; a result older than the last one applied is discarded, so a
//! slow compile can never overwrite a newer outline. A failed cycle leaves the
//! last good results in place.

use std::path::Path;

use crate::compiler::CompileOutput;
use crate::diagnostics::{self, DiagnosticSet};
use crate::error::Error;
use crate::outline::{self, OutlineNode};
use crate::preview;
use crate::text::LineIndex;

/// What `Session::apply` did with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The snapshot replaced the session's results.
    Applied,
    /// A newer cycle had already been applied; the snapshot was dropped.
    Discarded,
}

/// State for one open document.
#[derive(Debug, Default)]
pub struct Session {
    /// Generation of the results currently shown. Zero before the first.
    applied: u64,
    /// Message of the most recent failure, cleared by the next success.
    last_error: Option<String>,
    /// Generation handed to the most recently started cycle.
    started: u64,
    /// Results currently shown.
    view: Snapshot,
}

/// Results of one compile cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Grouped diagnostics for every chapter the compile touched.
    pub diagnostics: DiagnosticSet,
    /// Preview HTML.
    pub html: String,
    /// Outline of the target chapter.
    pub outline: Vec<OutlineNode>,
}

/// Identifies one started compile cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(
    /// Generation number, strictly increasing per session.
    u64,
);

impl Session {
    /// Apply the results of the cycle identified by `ticket`.
    pub fn apply(&mut self, ticket: Ticket, snapshot: Snapshot) -> Outcome {
        if ticket.0 <= self.applied {
            tracing::debug!(generation = ticket.0, applied = self.applied, "discarding stale compile");
            return Outcome::Discarded;
        }
        tracing::debug!(
            generation = ticket.0,
            nodes = outline::count(&snapshot.outline),
            files = snapshot.diagnostics.len(),
            "applying compile"
        );
        self.applied = ticket.0;
        self.last_error = None;
        self.view = snapshot;
        return Outcome::Applied;
    }

    /// Start a compile cycle.
    pub fn begin(&mut self) -> Ticket {
        self.started = self.started.saturating_add(1);
        return Ticket(self.started);
    }

    /// Diagnostics currently shown.
    pub const fn diagnostics(&self) -> &DiagnosticSet {
        return &self.view.diagnostics;
    }

    /// Record a failed cycle. Results already shown stay in place.
    pub fn fail(&mut self, ticket: Ticket, error: &Error) {
        tracing::warn!(generation = ticket.0, %error, "compile failed, keeping previous results");
        if ticket.0 > self.applied {
            self.last_error = Some(error.to_string());
        }
    }

    /// Preview HTML currently shown.
    pub fn html(&self) -> &str {
        return &self.view.html;
    }

    /// Message of the latest failure not yet superseded by a success.
    pub fn last_error(&self) -> Option<&str> {
        return self.last_error.as_deref();
    }

    /// Outline currently shown.
    pub fn outline(&self) -> &[OutlineNode] {
        return &self.view.outline;
    }
}

/// Turn one compile output into a snapshot for `chapter`.
/// Pure: no I/O happens here.
pub fn compile_cycle(
    output: &CompileOutput,
    chapter: &str,
    index: &LineIndex,
    source: &Path,
    stylesheet: Option<&str>,
) -> Snapshot {
    let occurrences = output.outline_occurrences(chapter);
    return Snapshot {
        diagnostics: diagnostics::group(&output.reports),
        html: preview::render(&output.chunks, source, stylesheet),
        outline: outline::build(&occurrences, index),
    };
}
