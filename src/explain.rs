use crate::config::CONFIG_FILE;
use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::CatalogInvalid { path, reason } => render_catalog_invalid(&path.display().to_string(), reason),
        Error::CompileFailed { file, reason } => render_compile_failed(&file.display().to_string(), reason),
        Error::CompileOutputInvalid { origin, reason } => {
            render_compile_output_invalid(&origin.display().to_string(), reason)
        },
        Error::NoCompiler => render_no_compiler(),
        _ => render_generic(e),
    };
}

fn render_catalog_invalid(path: &str, reason: &str) -> String {
    return format!("\
# Error: Invalid Catalog

`{path}` is not a valid book catalog: {reason}

## Expected shape

    PREDEF:
      - preface.re
    CHAPS:
      - ch01.re
      - part1.re:
          - ch02.re
    APPENDIX:
      - appendix.re
    POSTDEF:
      - afterword.re
");
}

fn render_compile_failed(file: &str, reason: &str) -> String {
    return format!("\
# Error: Compile Failed

The compiler rejected `{file}`.

{reason}

## Fix

Run the configured `compiler` command by hand on `{file}` to see its full output.
The previous outline and diagnostics stay in effect until a compile succeeds.
");
}

fn render_compile_output_invalid(origin: &str, reason: &str) -> String {
    return format!("\
# Error: Invalid Compile Output

Output from `{origin}` is not compile-output JSON: {reason}

## Expected shape

    {{
      \"symbols\": [{{\"kind\": \"headline\", \"level\": 1, \"caption\": \"...\", \"file\": \"ch01.re\",
                   \"location\": {{\"start\": {{\"line\": 1, \"column\": 1}}, \"end\": {{\"line\": 1, \"column\": 9}}}}}}],
      \"reports\": [{{\"level\": \"error\", \"message\": \"...\", \"file\": \"ch01.re\"}}],
      \"chunks\":  [{{\"file\": \"ch01.re\", \"html\": \"...\"}}]
    }}
");
}

fn render_generic(e: &Error) -> String {
    return match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Check `{CONFIG_FILE}`.
"),
        Error::WatchFailed { reason } => format!("\
# Error: Watch Failed

{reason}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    };
}

fn render_no_compiler() -> String {
    return format!("\
# Error: No Compiler Configured

There is no compile output to work from.

## Fix

Pass a saved compile output:

    review-outline outline ch01.re --compiled ch01.json

Or configure the compiler in `{CONFIG_FILE}`:

    compiler = [\"node\", \"review-dump.js\"]
");
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn every_rendering_has_a_heading() {
        let errors = vec![
            Error::CatalogInvalid { path: PathBuf::from("catalog.yml"), reason: "bad".to_string() },
            Error::CompileFailed { file: PathBuf::from("ch01.re"), reason: "exit 1".to_string() },
            Error::CompileOutputInvalid { origin: PathBuf::from("out.json"), reason: "eof".to_string() },
            Error::FileNotFound { path: PathBuf::from("ch09.re") },
            Error::NoCompiler,
            Error::WatchFailed { reason: "inotify".to_string() },
        ];
        for e in &errors {
            assert!(render_error(e).starts_with("# Error"), "{e}");
        }
    }

    #[test]
    fn no_compiler_points_at_config() {
        let md = render_error(&Error::NoCompiler);
        assert!(md.contains(".review-outline.toml"));
        assert!(md.contains("--compiled"));
    }

    #[test]
    fn compile_output_shape_is_valid_json() {
        let md = render_error(&Error::CompileOutputInvalid {
            origin: PathBuf::from("out.json"),
            reason: "eof".to_string(),
        });
        let start = md.find("    {").unwrap();
        let json: String = md[start..].lines().map(str::trim).collect();
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok(), "{json}");
    }
}
