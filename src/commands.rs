//! CLI commands: outline, check, preview, chapters.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::catalog::Catalog;
use crate::compiler::{self, CompileOutput};
use crate::config::Config;
use crate::diagnostics::{self, Diagnostic, Severity};
use crate::error;
use crate::outline::OutlineNode;
use crate::session::{self, Snapshot};
use crate::text::LineIndex;

/// A chapter file read from disk.
#[derive(Debug)]
pub struct Chapter {
    /// Line geometry of the chapter text.
    pub index: LineIndex,
    /// File name as the compiler reports it, e.g. `ch01.re`.
    pub name: String,
    /// Path the chapter was opened from.
    pub path: PathBuf,
}

impl Chapter {
    /// Directory holding the chapter, `.` for a bare file name.
    pub fn dir(&self) -> &Path {
        return parent_dir(&self.path);
    }

    /// Read a chapter from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the file cannot be read.
    pub fn open(path: &Path) -> Result<Self, error::Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|_err| return error::Error::FileNotFound { path: path.to_path_buf() })?;
        let name = path
            .file_name()
            .map(|n| return n.to_string_lossy().to_string())
            .unwrap_or_default();
        return Ok(Self {
            index: LineIndex::new(&text),
            name,
            path: path.to_path_buf(),
        });
    }
}

/// List the chapters of the book in catalog order. With a chapter file,
/// the catalog next to it is used and the chapter is added if unlisted.
///
/// # Errors
///
/// Returns errors from config or catalog loading.
pub fn chapters(file: Option<&Path>) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let catalog = match file {
        Some(path) => {
            let mut catalog = Catalog::load(parent_dir(path), &config.catalog)?;
            let name = path.file_name().map(|n| return n.to_string_lossy().to_string()).unwrap_or_default();
            catalog.ensure_chapter(&name);
            catalog
        },
        None => Catalog::load(Path::new("."), &config.catalog)?,
    };

    for (section, name) in catalog.chapters() {
        println!("{:<9} {name}", section.name());
    }
    return Ok(());
}

/// Show grouped compiler diagnostics for one chapter, or for every
/// catalog chapter passing the include/exclude filters.
///
/// Exit code: 2 if any error, 1 if any warning, 0 otherwise.
///
/// # Errors
///
/// Returns errors from config, catalog, chapter reading, or compiling.
pub fn check(file: Option<&Path>, compiled: Option<&Path>, json: bool) -> Result<ExitCode, error::Error> {
    let config = Config::load(Path::new("."))?;

    let Some(path) = file else {
        return check_book(&config, compiled, json);
    };

    let chapter = Chapter::open(path)?;
    let snapshot = run_cycle(&config, &chapter, compiled)?;
    let set = &snapshot.diagnostics;

    if json {
        println!("{}", serde_json::to_string_pretty(set)?);
    } else if set.is_empty() {
        eprintln!("No diagnostics for {}", chapter.name);
    } else {
        for (file, diags) in set.iter() {
            print!("{}", render_file_diagnostics(file, diags));
        }
    }

    return Ok(exit_code_for(set.error_count(), set.warning_count()));
}

/// Check every catalog chapter in the working directory.
///
/// # Errors
///
/// Returns errors from catalog loading or compiling.
fn check_book(config: &Config, compiled: Option<&Path>, json: bool) -> Result<ExitCode, error::Error> {
    let catalog = Catalog::load(Path::new("."), &config.catalog)?;
    let shared = compiled.map(compiler::load).transpose()?;

    let mut by_chapter: BTreeMap<String, Vec<Diagnostic>> = BTreeMap::new();
    for (_, name) in catalog.chapters() {
        if !config.should_check(name) {
            tracing::debug!(chapter = name, "skipped by include/exclude");
            continue;
        }
        let output = match &shared {
            Some(output) => output.clone(),
            None => compiler::run(&config.compiler, Path::new(name))?,
        };
        let set = diagnostics::group(&output.reports);
        let diags = set.get(Path::new(name)).map(<[Diagnostic]>::to_vec).unwrap_or_default();
        by_chapter.insert(name.to_string(), diags);
    }

    let all = by_chapter.values().flatten();
    let errors = all.clone().filter(|d| return d.severity == Severity::Error).count();
    let warnings = all.filter(|d| return d.severity == Severity::Warning).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&by_chapter)?);
    } else {
        for (name, diags) in &by_chapter {
            print!("{}", render_file_diagnostics(Path::new(name), diags));
        }
        let count = by_chapter.len();
        eprintln!("Checked {count} chapters: {errors} errors, {warnings} warnings");
    }

    return Ok(exit_code_for(errors, warnings));
}

/// Get compile output from a saved file or by running the compiler.
///
/// # Errors
///
/// Returns errors from loading or running the compiler.
pub fn compile(config: &Config, chapter: &Chapter, compiled: Option<&Path>) -> Result<CompileOutput, error::Error> {
    return match compiled {
        Some(path) => compiler::load(path),
        None => compiler::run(&config.compiler, &chapter.path),
    };
}

/// Exit code for the given counts.
pub fn exit_code_for(errors: usize, warnings: usize) -> ExitCode {
    return ExitCode::from(exit_status(errors, warnings));
}

/// Exit status priority: errors (2) > warnings (1) > clean (0).
const fn exit_status(errors: usize, warnings: usize) -> u8 {
    if errors > 0 {
        return 2;
    } else if warnings > 0 {
        return 1;
    } else {
        return 0;
    }
}

/// Directory holding `path`, `.` for a bare file name.
fn parent_dir(path: &Path) -> &Path {
    return match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
}

/// Print the outline of a chapter as an indented tree or as JSON.
///
/// # Errors
///
/// Returns errors from config, chapter reading, or compiling.
pub fn outline(file: &Path, compiled: Option<&Path>, json: bool) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let chapter = Chapter::open(file)?;
    let snapshot = run_cycle(&config, &chapter, compiled)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.outline)?);
    } else if snapshot.outline.is_empty() {
        eprintln!("No headings in {}", chapter.name);
    } else {
        print!("{}", render_outline(&snapshot.outline));
    }
    return Ok(());
}

/// Render preview HTML for a chapter to `out` or stdout.
///
/// # Errors
///
/// Returns errors from config, chapter reading, compiling, or writing.
pub fn preview(file: &Path, compiled: Option<&Path>, out: Option<&Path>) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let chapter = Chapter::open(file)?;
    let snapshot = run_cycle(&config, &chapter, compiled)?;

    match out {
        Some(path) => {
            std::fs::write(path, &snapshot.html)?;
            eprintln!("Wrote preview to {}", path.display());
        },
        None => println!("{}", snapshot.html),
    }
    return Ok(());
}

/// Render diagnostics of one file as `file:line:col: severity: message` lines.
pub fn render_file_diagnostics(file: &Path, diags: &[Diagnostic]) -> String {
    let mut out = String::new();
    for d in diags {
        let at = d.anchor().start;
        let _ = writeln!(
            out,
            "{}:{}:{}: {}: {}",
            file.display(),
            at.line.saturating_add(1),
            at.character.saturating_add(1),
            d.severity.label(),
            d.message,
        );
    }
    return out;
}

/// Render an outline forest as an indented tree, two spaces per level.
pub fn render_outline(nodes: &[OutlineNode]) -> String {
    let mut out = String::new();
    render_outline_into(nodes, 0, &mut out);
    return out;
}

/// Append `nodes` at `depth` to `out`.
fn render_outline_into(nodes: &[OutlineNode], depth: usize, out: &mut String) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        let _ = writeln!(out, "{indent}{}  [{}]  {}", node.name, node.kind.detail(), node.range);
        render_outline_into(&node.children, depth.saturating_add(1), out);
    }
    return;
}

/// One compile cycle for `chapter`.
///
/// # Errors
///
/// Returns errors from loading or running the compiler.
pub fn run_cycle(config: &Config, chapter: &Chapter, compiled: Option<&Path>) -> Result<Snapshot, error::Error> {
    let output = compile(config, chapter, compiled)?;
    return Ok(session::compile_cycle(
        &output,
        &chapter.name,
        &chapter.index,
        &chapter.path,
        config.stylesheet.as_deref(),
    ));
}
