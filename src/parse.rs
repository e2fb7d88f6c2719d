//! Metadata header parsing for post sources.
//!
//! A post is plain markdown preceded by a block of `label: value` lines and a
//! level-1 title heading:
//!
//! ```text
//! draft: no
//! date: 2022-12-11
//! tags: [rust, tooling]
//!
//! # The Title
//!
//! Markdown body...
//! ```
//!
//! ## Positional rules
//!
//! - The metadata block starts on the first non-blank line of the file.
//! - Metadata lines are contiguous: blank lines may separate them, prose may not.
//!   The run ends at the first candidate line preceded by non-blank text.
//! - The `# Title` heading follows the last metadata line with nothing but
//!   blank lines in between. `## Subtitle` does not count.
//!
//! Everything here is pure: [`parse`] takes text and returns a [`ParsedPost`].
//! Typing the values (dates, tag lists) happens in [`crate::post`].

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use thiserror::Error;

/// Label that every post must carry.
pub const MANDATORY_LABEL: &str = "draft";

// `R` makes `$` and `.` treat `\r\n` as a line break, so CRLF sources parse
// the same as LF ones.
static METADATA_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)^[ \t]?(\w+):[ \t](.+)$").expect("metadata pattern must compile")
});

static TITLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)^[ \t]?#[ \t](.*)$").expect("title pattern must compile")
});

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("no metadata label found at the beginning of the text")]
    NoMetadata,
    #[error("missing mandatory field `{0}`")]
    MissingField(&'static str),
    #[error("missing or misplaced title: a `# Title` line must directly follow the metadata")]
    MissingTitle,
    #[error("invalid date `{value}`, expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("field `{0}` must be a single value, not a list")]
    NotScalar(&'static str),
}

/// Value of a metadata line before any typing is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Scalar(String),
    List(Vec<String>),
}

impl RawValue {
    /// A value containing `[` is a comma-separated list; anything else is a scalar.
    ///
    /// - `"yes"` → `Scalar("yes")`
    /// - `"[rust, Tokio]"` → `List(["rust", "Tokio"])`
    /// - `"[]"` → `List([])`
    pub fn from_text(text: &str) -> Self {
        if text.contains('[') {
            let items = text
                .trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace())
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect();
            RawValue::List(items)
        } else {
            RawValue::Scalar(text.trim().to_string())
        }
    }
}

/// One accepted `label: value` line.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    /// Label as written in the source (case preserved).
    pub label: String,
    pub value: RawValue,
    /// Byte range of the whole line within the trimmed source text.
    pub span: Range<usize>,
}

/// Result of [`parse`]: the metadata run, the title, and the markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPost {
    pub entries: Vec<MetadataEntry>,
    pub title: String,
    pub body: String,
}

impl ParsedPost {
    /// First entry whose label matches case-insensitively.
    pub fn entry(&self, label: &str) -> Option<&MetadataEntry> {
        self.entries
            .iter()
            .find(|e| e.label.eq_ignore_ascii_case(label))
    }
}

/// Parse raw post text into its metadata run, title, and body.
///
/// The input is trimmed first; entry spans refer to the trimmed text.
pub fn parse(raw: &str) -> Result<ParsedPost, ParseError> {
    let text = raw.trim();
    let entries = metadata_run(text);

    if entries.first().map(|e| e.span.start) != Some(0) {
        return Err(ParseError::NoMetadata);
    }
    if !entries
        .iter()
        .any(|e| e.label.eq_ignore_ascii_case(MANDATORY_LABEL))
    {
        return Err(ParseError::MissingField(MANDATORY_LABEL));
    }

    let run_end = entries.last().map_or(0, |e| e.span.end);
    let (heading, title) = TITLE_LINE
        .captures(text)
        .and_then(|caps| Some((caps.get(0)?, caps.get(1)?)))
        .ok_or(ParseError::MissingTitle)?;

    if heading.start() < run_end || !text[run_end..heading.start()].trim().is_empty() {
        return Err(ParseError::MissingTitle);
    }
    let title = title.as_str().trim();
    if title.is_empty() {
        return Err(ParseError::MissingTitle);
    }

    Ok(ParsedPost {
        entries,
        title: title.to_string(),
        body: text[heading.end()..].trim().to_string(),
    })
}

/// Collect the contiguous run of metadata lines from the top of `text`.
///
/// The first match is always taken (the caller rejects it if it is not at
/// offset 0). Each later match is accepted only if the text between it and the
/// previous accepted line is blank.
fn metadata_run(text: &str) -> Vec<MetadataEntry> {
    let mut entries: Vec<MetadataEntry> = Vec::new();
    for caps in METADATA_LINE.captures_iter(text) {
        let (Some(line), Some(label), Some(value)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        if let Some(prev) = entries.last()
            && !text[prev.span.end..line.start()].trim().is_empty()
        {
            break;
        }
        entries.push(MetadataEntry {
            label: label.as_str().to_string(),
            value: RawValue::from_text(value.as_str()),
            span: line.range(),
        });
    }
    entries
}
