use std::path::Path;
use std::time::Duration;

use crate::error::Error;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = ".review-outline.toml";

/// Default catalog file name, relative to the chapter directory.
const DEFAULT_CATALOG: &str = "catalog.yml";

/// Default minimum interval between recomputes in `watch`.
const DEFAULT_THROTTLE_MS: u64 = 1000;

/// Project configuration loaded from `.review-outline.toml`.
/// Include/exclude patterns are path prefixes applied to chapter files.
#[derive(Debug, Clone)]
pub struct Config {
    /// Catalog file name, relative to the chapter directory.
    pub catalog: String,
    /// External compiler command; the chapter path is appended.
    pub compiler: Vec<String>,
    /// Chapter path prefixes to skip.
    exclude: Vec<String>,
    /// Chapter path prefixes to check. Empty means all.
    include: Vec<String>,
    /// Stylesheet href for the preview shell.
    pub stylesheet: Option<String>,
    /// Minimum interval between recomputes while watching.
    pub throttle: Duration,
}

/// Raw TOML structure for `.review-outline.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ReviewOutlineTomlConfig {
    /// See [`Config::catalog`].
    #[serde(default)]
    catalog: Option<String>,
    /// See [`Config::compiler`].
    #[serde(default)]
    compiler: Vec<String>,
    /// See [`Config::exclude`].
    #[serde(default)]
    exclude: Vec<String>,
    /// See [`Config::include`].
    #[serde(default)]
    include: Vec<String>,
    /// See [`Config::stylesheet`].
    #[serde(default)]
    stylesheet: Option<String>,
    /// See [`Config::throttle`], in milliseconds.
    #[serde(default)]
    throttle_ms: Option<u64>,
}

impl Config {
    /// Load config from `.review-outline.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::defaults());
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        let raw: ReviewOutlineTomlConfig = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        return Ok(Self {
            catalog: raw.catalog.unwrap_or_else(|| return DEFAULT_CATALOG.to_string()),
            compiler: raw.compiler,
            exclude: raw.exclude,
            include: raw.include,
            stylesheet: raw.stylesheet,
            throttle: Duration::from_millis(raw.throttle_ms.unwrap_or(DEFAULT_THROTTLE_MS)),
        });
    }

    /// Configuration used when no file is present.
    pub fn defaults() -> Self {
        return Self {
            catalog: DEFAULT_CATALOG.to_string(),
            compiler: Vec::new(),
            exclude: Vec::new(),
            include: Vec::new(),
            stylesheet: None,
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
        };
    }

    /// Check whether a chapter path should be checked.
    ///
    /// A path is included if no include patterns are set (check everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_check(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}
