//! Posts: a markdown source, its rendered target, and typed metadata.
//!
//! A [`Post`] is rebuilt from disk on every build; nothing about it is cached
//! between invocations. Loading is read-only. The one write a post source ever
//! receives is the `date:` line injected by [`ensure_date`], which the build
//! runs as a separate normalization step before loading.
//!
//! ## Metadata typing
//!
//! | label | type | when absent |
//! |-------|------|-------------|
//! | `draft` | scalar, lower-cased | parse error |
//! | `date` | `YYYY-MM-DD` | parse error (inject with [`ensure_date`]) |
//! | `tags` | list (a scalar becomes a one-element list) | `["blog"]` |
//! | anything else | scalar (lower-cased) or list (case kept) | kept as is |
//!
//! The title comes from the `# Title` heading. Labels listed in
//! [`RESERVED_LABELS`] are dropped with a warning.

use crate::parse::{self, MANDATORY_LABEL, ParseError, ParsedPost, RawValue};
use chrono::NaiveDate;
use log::{info, warn};
use pulldown_cmark::{Parser, html as md_html};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tag assigned to posts that declare none.
pub const DEFAULT_TAG: &str = "blog";

/// Labels that collide with post attributes and are never accepted as metadata.
pub const RESERVED_LABELS: &[&str] = &["_metadata", "target_path", "source_path", "title"];

const DATE_LABEL: &str = "date";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum PostError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("unknown metadata field `{0}`")]
    UnknownField(String),
    #[error("{path}: title `{title}` not found in the source text")]
    Content { path: PathBuf, title: String },
}

/// A typed metadata value, as returned by [`Post::field`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
    Date(NaiveDate),
}

impl From<RawValue> for FieldValue {
    fn from(value: RawValue) -> Self {
        match value {
            RawValue::Scalar(s) => FieldValue::Scalar(s),
            RawValue::List(items) => FieldValue::List(items),
        }
    }
}

/// Typed metadata of a post: the well-known fields plus everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub draft: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    /// Labels other than the well-known ones, lower-cased.
    pub extra: BTreeMap<String, FieldValue>,
}

impl Metadata {
    /// Apply typing rules to a parsed metadata run.
    ///
    /// Later duplicates of a label override earlier ones.
    pub fn from_parsed(parsed: &ParsedPost) -> Result<Self, ParseError> {
        let mut draft = None;
        let mut date = None;
        let mut tags = None;
        let mut extra = BTreeMap::new();

        for entry in &parsed.entries {
            let label = entry.label.to_lowercase();
            if RESERVED_LABELS.contains(&label.as_str()) {
                warn!("Invalid metadata label entry dropped: {}", entry.label);
                continue;
            }
            let value = match &entry.value {
                RawValue::Scalar(s) => RawValue::Scalar(s.to_lowercase()),
                list => list.clone(),
            };
            match label.as_str() {
                "draft" => draft = Some(scalar(value, "draft")?),
                DATE_LABEL => date = Some(parse_date(&scalar(value, DATE_LABEL)?)?),
                "tags" => {
                    tags = Some(match value {
                        RawValue::Scalar(tag) => vec![tag],
                        RawValue::List(items) => items,
                    })
                }
                _ => {
                    extra.insert(label, value.into());
                }
            }
        }

        Ok(Self {
            title: parsed.title.clone(),
            draft: draft.ok_or(ParseError::MissingField(MANDATORY_LABEL))?,
            date: date.ok_or(ParseError::MissingField(DATE_LABEL))?,
            tags: tags.unwrap_or_else(|| vec![DEFAULT_TAG.to_string()]),
            extra,
        })
    }
}

fn scalar(value: RawValue, label: &'static str) -> Result<String, ParseError> {
    match value {
        RawValue::Scalar(s) => Ok(s),
        RawValue::List(_) => Err(ParseError::NotScalar(label)),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| ParseError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

/// A blog post: one markdown source and the HTML file it renders to.
///
/// Equality compares source path, target path, and the full metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    source_path: PathBuf,
    target_path: PathBuf,
    metadata: Metadata,
}

impl Post {
    /// Read and parse `source_path`. Does not modify the file.
    pub fn load(
        source_path: impl Into<PathBuf>,
        target_path: impl Into<PathBuf>,
    ) -> Result<Self, PostError> {
        let source_path = source_path.into();
        let raw = read_source(&source_path)?;
        let metadata = parse::parse(&raw)
            .and_then(|parsed| Metadata::from_parsed(&parsed))
            .map_err(|source| PostError::Parse {
                path: source_path.clone(),
                source,
            })?;

        Ok(Self {
            source_path,
            target_path: target_path.into(),
            metadata,
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn date(&self) -> NaiveDate {
        self.metadata.date
    }

    pub fn tags(&self) -> &[String] {
        &self.metadata.tags
    }

    /// `false` only for `draft: yes`.
    pub fn is_public(&self) -> bool {
        self.metadata.draft != "yes"
    }

    /// Whether `target` is missing or older than the source file.
    pub fn is_dirty(&self, target: &Path) -> io::Result<bool> {
        let source_mtime = fs::metadata(&self.source_path)?.modified()?;
        match fs::metadata(target) {
            Ok(meta) => Ok(source_mtime > meta.modified()?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Look up a metadata field by label (case-insensitive).
    pub fn field(&self, label: &str) -> Result<FieldValue, PostError> {
        let label = label.to_lowercase();
        match label.as_str() {
            "title" => Ok(FieldValue::Scalar(self.metadata.title.clone())),
            "draft" => Ok(FieldValue::Scalar(self.metadata.draft.clone())),
            DATE_LABEL => Ok(FieldValue::Date(self.metadata.date)),
            "tags" => Ok(FieldValue::List(self.metadata.tags.clone())),
            _ => match self.metadata.extra.get(&label) {
                Some(value) => Ok(value.clone()),
                None => Err(PostError::UnknownField(label)),
            },
        }
    }

    /// Render the markdown that follows the title heading to HTML.
    ///
    /// Re-reads the source, so the output reflects the file as it is now.
    pub fn content_html(&self) -> Result<String, PostError> {
        let raw = read_source(&self.source_path)?;
        let title = &self.metadata.title;
        let start = title_offset(&raw, title).ok_or_else(|| PostError::Content {
            path: self.source_path.clone(),
            title: title.clone(),
        })?;
        let markdown = raw[start + title.len()..].trim();

        let mut html = String::new();
        md_html::push_html(&mut html, Parser::new(markdown));
        Ok(html.trim_end().to_string())
    }
}

/// Offset of the first occurrence of `title` that sits on a `#` heading line.
fn title_offset(raw: &str, title: &str) -> Option<usize> {
    raw.match_indices(title).map(|(idx, _)| idx).find(|&idx| {
        let line_start = raw[..idx].rfind('\n').map_or(0, |n| n + 1);
        raw[line_start..idx].trim() == "#"
    })
}

fn read_source(path: &Path) -> Result<String, PostError> {
    fs::read_to_string(path).map_err(|source| PostError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Insert `date: <today>` before the `draft` line if the post has no date.
///
/// Returns whether the file was rewritten. Posts that fail to parse are
/// reported as errors and left untouched.
pub fn ensure_date(source_path: &Path, today: NaiveDate) -> Result<bool, PostError> {
    let raw = read_source(source_path)?;
    let parse_error = |source| PostError::Parse {
        path: source_path.to_path_buf(),
        source,
    };
    let parsed = parse::parse(&raw).map_err(parse_error)?;
    if parsed.entry(DATE_LABEL).is_some() {
        return Ok(false);
    }
    let draft = parsed
        .entry(MANDATORY_LABEL)
        .ok_or_else(|| parse_error(ParseError::MissingField(MANDATORY_LABEL)))?;

    // Spans are relative to the trimmed text.
    let leading = raw.len() - raw.trim_start().len();
    let at = leading + draft.span.start;
    let line = format!("{DATE_LABEL}: {}\n", today.format(DATE_FORMAT));

    let mut updated = String::with_capacity(raw.len() + line.len());
    updated.push_str(&raw[..at]);
    updated.push_str(&line);
    updated.push_str(&raw[at..]);
    fs::write(source_path, updated).map_err(|source| PostError::Io {
        path: source_path.to_path_buf(),
        source,
    })?;

    info!("Added `{}` to {}", line.trim_end(), source_path.display());
    Ok(true)
}
