mod catalog;
mod commands;
mod compiler;
mod config;
mod diagnostics;
mod error;
mod explain;
mod logging;
mod outline;
mod preview;
mod session;
mod text;
mod types;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Command-line interface.
#[derive(Parser)]
#[command(name = "review-outline", about = "Outline, diagnostics and preview for Re:VIEW chapters")]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List the book's chapters in catalog order
    Chapters {
        /// Chapter file; its directory's catalog is used and the chapter added if unlisted
        file: Option<PathBuf>,
    },
    /// Show compiler diagnostics grouped by file (exit 2 on errors, 1 on warnings)
    Check {
        /// Chapter to check; every catalog chapter when omitted
        file: Option<PathBuf>,
        /// Read compile output from this JSON file instead of running the compiler
        #[arg(long)]
        compiled: Option<PathBuf>,
        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the headline and column outline of a chapter
    Outline {
        /// Chapter file
        file: PathBuf,
        /// Read compile output from this JSON file instead of running the compiler
        #[arg(long)]
        compiled: Option<PathBuf>,
        /// Print the outline as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render preview HTML for a chapter
    Preview {
        /// Chapter file
        file: PathBuf,
        /// Read compile output from this JSON file instead of running the compiler
        #[arg(long)]
        compiled: Option<PathBuf>,
        /// Write the HTML here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Recompute outline, diagnostics and preview whenever the chapter changes
    Watch {
        /// Chapter file
        file: PathBuf,
        /// Read compile output from this JSON file instead of running the compiler
        #[arg(long)]
        compiled: Option<PathBuf>,
        /// Write preview HTML here after each cycle
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Exit code for runtime failures, distinct from the diagnostic codes.
const RUNTIME_FAILURE: u8 = 3;

/// Parse arguments and run the chosen command.
fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Chapters { file } => commands::chapters(file.as_deref()).map(|()| return ExitCode::SUCCESS),
        Commands::Check { file, compiled, json } => commands::check(file.as_deref(), compiled.as_deref(), json),
        Commands::Outline { file, compiled, json } => {
            commands::outline(&file, compiled.as_deref(), json).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Preview { file, compiled, out } => {
            commands::preview(&file, compiled.as_deref(), out.as_deref()).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Watch { file, compiled, out } => watch::run(&file, compiled.as_deref(), out.as_deref()),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            explain::print_error(&e);
            ExitCode::from(RUNTIME_FAILURE)
        },
    };
}
