//! File watcher: runs a compile cycle on startup, then again on chapter changes.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher as _};

use crate::commands::{self, Chapter};
use crate::config::Config;
use crate::error;
use crate::explain;
use crate::session::{Outcome, Session};

/// Quiet period that ends a burst of filesystem events.
const DEBOUNCE_MS: u64 = 100;

/// Directories to watch: the chapter's own and the saved output's, if any.
fn collect_watch_dirs(chapter: &Chapter, compiled: Option<&Path>) -> HashSet<PathBuf> {
    let mut dirs = HashSet::new();
    dirs.insert(chapter.dir().to_path_buf());
    if let Some(parent) = compiled.and_then(Path::parent)
        && !parent.as_os_str().is_empty()
    {
        dirs.insert(parent.to_path_buf());
    }
    return dirs;
}

/// Create a filesystem watcher that signals on changes to chapter sources
/// or to any file in `names`.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
    names: HashSet<OsString>,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
            )
            && event.paths.iter().any(|p| return is_relevant(p, &names))
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return error::Error::WatchFailed {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Exit code for the diagnostics currently shown.
fn exit_code(session: &Session) -> ExitCode {
    let diagnostics = session.diagnostics();
    return commands::exit_code_for(diagnostics.error_count(), diagnostics.warning_count());
}

/// Whether a changed path should trigger a recompute.
fn is_relevant(path: &Path, names: &HashSet<OsString>) -> bool {
    if path.extension().is_some_and(|ext| return ext == "re") {
        return true;
    }
    return path.file_name().is_some_and(|name| return names.contains(name));
}

/// Run one cycle through the session and print what it now shows.
/// Returns the exit code for the diagnostics on display.
fn refresh(
    session: &mut Session,
    config: &Config,
    chapter: &Chapter,
    compiled: Option<&Path>,
    out: Option<&Path>,
) -> ExitCode {
    let ticket = session.begin();
    match commands::run_cycle(config, chapter, compiled) {
        Ok(snapshot) => {
            if session.apply(ticket, snapshot) == Outcome::Discarded {
                return exit_code(session);
            }
        },
        Err(e) => {
            explain::print_error(&e);
            session.fail(ticket, &e);
            eprintln!("watch: keeping previous results");
            return ExitCode::from(3_u8);
        },
    }

    print!("{}", commands::render_outline(session.outline()));
    for (file, diags) in session.diagnostics().iter() {
        print!("{}", commands::render_file_diagnostics(file, diags));
    }

    if let Some(path) = out
        && let Err(e) = std::fs::write(path, session.html())
    {
        tracing::warn!(path = %path.display(), error = %e, "could not write preview");
    }

    let errors = session.diagnostics().error_count();
    let warnings = session.diagnostics().warning_count();
    eprintln!("watch: {errors} errors, {warnings} warnings");
    return exit_code(session);
}

/// Entry point for the watch command.
///
/// Runs an initial cycle, then watches the chapter directory and recomputes
/// on changes, at most once per configured throttle interval.
///
/// # Errors
///
/// Returns errors from config loading, chapter reading, or watcher setup.
pub fn run(file: &Path, compiled: Option<&Path>, out: Option<&Path>) -> Result<ExitCode, error::Error> {
    let config = Config::load(Path::new("."))?;
    let mut chapter = Chapter::open(file)?;
    let mut session = Session::default();

    eprintln!("watch: initial cycle for {}", chapter.name);
    let mut last_code = refresh(&mut session, &config, &chapter, compiled, out);
    let mut last_run = Instant::now();

    let mut names = HashSet::new();
    names.insert(OsString::from(&config.catalog));
    if let Some(name) = compiled.and_then(Path::file_name) {
        names.insert(name.to_os_string());
    }

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx, names)?;

    let watch_dirs = collect_watch_dirs(&chapter, compiled);
    for dir in &watch_dirs {
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                return error::Error::WatchFailed {
                    reason: format!("{}: {e}", dir.display()),
                };
            })?;
    }

    let dir_count = watch_dirs.len();
    eprintln!("watch: monitoring {dir_count} directories, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}

        if let Some(ready_at) = last_run.checked_add(config.throttle) {
            let mut remaining = ready_at.saturating_duration_since(Instant::now());
            while !remaining.is_zero() {
                let _ = rx.recv_timeout(remaining);
                remaining = ready_at.saturating_duration_since(Instant::now());
            }
        }

        eprintln!("watch: change detected, recomputing...");
        chapter = match Chapter::open(file) {
            Ok(c) => c,
            Err(e) => {
                explain::print_error(&e);
                continue;
            },
        };
        last_code = refresh(&mut session, &config, &chapter, compiled, out);
        last_run = Instant::now();
        if let Some(reason) = session.last_error() {
            tracing::debug!(reason, "showing results from an earlier cycle");
        }
    }

    return Ok(last_code);
}
