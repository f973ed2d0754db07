//! Book manifest (`catalog.yml`): which chapter files make up the book, in
//! four ordered sections.

use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::Error;

/// The flattened book manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Appendix chapters.
    pub appendix: Vec<String>,
    /// Main chapters.
    pub contents: Vec<String>,
    /// Postscript material.
    pub postdef: Vec<String>,
    /// Front matter.
    pub predef: Vec<String>,
}

/// Raw YAML shape. Each section may be missing or null.
#[derive(Deserialize)]
struct RawCatalog {
    /// Appendix entries.
    #[serde(default, alias = "APPENDIX")]
    appendix: Option<Vec<Value>>,
    /// Main chapter entries.
    #[serde(default, alias = "CHAPS")]
    contents: Option<Vec<Value>>,
    /// Postscript entries.
    #[serde(default, alias = "POSTDEF")]
    postdef: Option<Vec<Value>>,
    /// Front matter entries.
    #[serde(default, alias = "PREDEF")]
    predef: Option<Vec<Value>>,
}

/// Catalog section a chapter is listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// `appendix` / `APPENDIX`.
    Appendix,
    /// `contents` / `CHAPS`.
    Contents,
    /// `postdef` / `POSTDEF`.
    Postdef,
    /// `predef` / `PREDEF`.
    Predef,
}

impl Section {
    /// Lowercase section name.
    pub const fn name(self) -> &'static str {
        return match self {
            Self::Appendix => "appendix",
            Self::Contents => "contents",
            Self::Postdef => "postdef",
            Self::Predef => "predef",
        };
    }
}

impl Catalog {
    /// Every chapter with its section, in book order:
    /// predef, contents, appendix, postdef.
    pub fn chapters(&self) -> impl Iterator<Item = (Section, &str)> {
        return tagged(Section::Predef, &self.predef)
            .chain(tagged(Section::Contents, &self.contents))
            .chain(tagged(Section::Appendix, &self.appendix))
            .chain(tagged(Section::Postdef, &self.postdef));
    }

    /// True if any section lists `name`.
    pub fn contains(&self, name: &str) -> bool {
        return self.chapters().any(|(_, n)| return n == name);
    }

    /// Make sure `name` is part of the book. A chapter no section lists is
    /// appended to contents.
    pub fn ensure_chapter(&mut self, name: &str) {
        if !self.contains(name) {
            tracing::debug!(chapter = name, "chapter not in catalog, appending to contents");
            self.contents.push(name.to_string());
        }
    }

    /// Load `file_name` from `dir`. A missing catalog is an empty book.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::CatalogInvalid` if the YAML does not describe a catalog.
    pub fn load(dir: &Path, file_name: &str) -> Result<Self, Error> {
        let path = dir.join(file_name);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no catalog, treating chapter as a one-file book");
                return Ok(Self::default());
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content).map_err(|reason| {
            return Error::CatalogInvalid { path, reason };
        });
    }

    /// Parse catalog YAML.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn parse(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawCatalog = serde_yaml::from_str(content).map_err(|e| return e.to_string())?;
        return Ok(Self {
            appendix: flatten_section(raw.appendix)?,
            contents: flatten_section(raw.contents)?,
            postdef: flatten_section(raw.postdef)?,
            predef: flatten_section(raw.predef)?,
        });
    }
}

/// Flatten one entry into `out`.
///
/// A string is a chapter. `{file: name}` is a chapter. Any other mapping is
/// a part: a key naming a `.re` file is a chapter itself, and its value is
/// a nested list of entries.
///
/// # Errors
///
/// Returns a description of an entry that is neither a string nor a mapping.
fn flatten_entry(entry: &Value, out: &mut Vec<String>) -> Result<(), String> {
    return match entry {
        Value::Mapping(map) => flatten_mapping(map, out),
        Value::String(name) => {
            out.push(name.clone());
            Ok(())
        },
        Value::Null => Ok(()),
        other => Err(format!("unexpected catalog entry: {other:?}")),
    };
}

/// Flatten a part/group mapping into `out`.
///
/// # Errors
///
/// Propagates errors from nested entries.
fn flatten_mapping(map: &Mapping, out: &mut Vec<String>) -> Result<(), String> {
    if let Some(Value::String(file)) = map.get("file") {
        out.push(file.clone());
        return Ok(());
    }
    for (key, value) in map {
        if let Value::String(name) = key
            && name.ends_with(".re")
        {
            out.push(name.clone());
        }
        match value {
            Value::Sequence(items) => {
                for item in items {
                    flatten_entry(item, out)?;
                }
            },
            other => flatten_entry(other, out)?,
        }
    }
    return Ok(());
}

/// Flatten an optional section into an ordered list of chapter names.
///
/// # Errors
///
/// Propagates errors from individual entries.
fn flatten_section(entries: Option<Vec<Value>>) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    for entry in entries.unwrap_or_default() {
        flatten_entry(&entry, &mut out)?;
    }
    return Ok(out);
}

/// Pair every name with its section.
fn tagged(section: Section, names: &[String]) -> impl Iterator<Item = (Section, &str)> {
    return names.iter().map(move |n| return (section, n.as_str()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_case_sections() {
        let catalog = Catalog::parse(
            "PREDEF:\n  - preface.re\nCHAPS:\n  - ch01.re\n  - ch02.re\nAPPENDIX:\n  - appA.re\nPOSTDEF:\n  - afterword.re\n",
        )
        .unwrap();
        let listed: Vec<(Section, &str)> = catalog.chapters().collect();
        assert_eq!(
            listed,
            vec![
                (Section::Predef, "preface.re"),
                (Section::Contents, "ch01.re"),
                (Section::Contents, "ch02.re"),
                (Section::Appendix, "appA.re"),
                (Section::Postdef, "afterword.re"),
            ]
        );
    }

    #[test]
    fn lower_case_sections_and_file_entries() {
        let catalog = Catalog::parse("contents:\n  - file: ch01.re\n  - ch02.re\n").unwrap();
        assert_eq!(catalog.contents, vec!["ch01.re", "ch02.re"]);
        assert!(catalog.predef.is_empty());
    }

    #[test]
    fn parts_are_flattened_in_order() {
        let catalog = Catalog::parse(
            "CHAPS:\n  - intro.re\n  - part1.re:\n      - ch01.re\n      - ch02.re\n  - Part Two:\n      - ch03.re\n  - ch04.re\n",
        )
        .unwrap();
        assert_eq!(
            catalog.contents,
            vec!["intro.re", "part1.re", "ch01.re", "ch02.re", "ch03.re", "ch04.re"]
        );
    }

    #[test]
    fn null_sections_are_empty() {
        let catalog = Catalog::parse("PREDEF:\nCHAPS:\n  - ch01.re\nAPPENDIX:\n").unwrap();
        assert!(catalog.predef.is_empty());
        assert!(catalog.appendix.is_empty());
        assert_eq!(catalog.contents, vec!["ch01.re"]);
    }

    #[test]
    fn unlisted_chapter_is_appended_to_contents() {
        let mut catalog = Catalog::parse("PREDEF:\n  - preface.re\nCHAPS:\n  - ch01.re\n").unwrap();
        catalog.ensure_chapter("preface.re");
        catalog.ensure_chapter("ch09.re");
        assert_eq!(catalog.contents, vec!["ch01.re", "ch09.re"]);
        assert_eq!(catalog.predef, vec!["preface.re"]);
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(Catalog::parse("CHAPS: [ch01.re").is_err());
        assert!(Catalog::parse("CHAPS:\n  - 42\n").is_err());
    }

    #[test]
    fn missing_file_is_empty_book() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(dir.path(), "catalog.yml").unwrap();
        assert_eq!(catalog, Catalog::default());
    }

    #[test]
    fn load_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("catalog.yml"), "CHAPS:\n  - [1, 2]\n").unwrap();
        let err = Catalog::load(dir.path(), "catalog.yml").unwrap_err();
        assert!(matches!(err, Error::CatalogInvalid { .. }));
    }
}
