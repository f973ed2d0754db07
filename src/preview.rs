//! Preview HTML assembly.

use std::path::Path;

use crate::compiler::Chunk;

/// Inline style used when no stylesheet is configured.
const DEFAULT_STYLE: &str = "<style type='text/css'>body { color: black; background-color: white }</style>";

/// Concatenate chunk output and, unless it is already a full document,
/// wrap it in a minimal shell whose base href points at `source`.
pub fn render(chunks: &[Chunk], source: &Path, stylesheet: Option<&str>) -> String {
    let body: String = chunks.iter().map(|c| return c.html.as_str()).collect();
    if body.starts_with("<html") || body.starts_with("<!DOCTYPE") {
        return body;
    }

    let style = stylesheet.map_or_else(
        || return DEFAULT_STYLE.to_string(),
        |href| {
            let href = html_escape::encode_double_quoted_attribute(href);
            return format!("<link rel=\"stylesheet\" type=\"text/css\" href=\"{href}\" />");
        },
    );
    return format!(
        "<html><head><base href=\"{}\" />{style}</head><body>{body}</body></html>",
        html_escape::encode_double_quoted_attribute(&source.display().to_string()),
    );
}
