/// Crate-level error types for review-outline.
use std::path::PathBuf;

/// All errors carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, command, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The catalog file exists but is not a valid book manifest.
    #[error("catalog invalid: {}: {reason}", path.display())]
    CatalogInvalid {
        /// Catalog file that failed to parse.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The external compiler could not be run or rejected the chapter.
    #[error("compile failed: {}: {reason}", file.display())]
    CompileFailed {
        /// Chapter the compiler was run on.
        file: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Compile output is not in the expected JSON shape.
    #[error("compile output invalid: {}: {reason}", origin.display())]
    CompileOutputInvalid {
        /// File or program the output came from.
        origin: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A referenced file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of command output failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// No compile output was given and no compiler command is configured.
    #[error("no compiler configured")]
    NoCompiler,

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The filesystem watcher could not be set up.
    #[error("watch failed: {reason}")]
    WatchFailed {
        /// Description of the failure.
        reason: String,
    },
}
