//! Locating a heading inside a page of extracted text.
//!
//! Page text from a PDF renders headings inconsistently. The same heading
//! can appear as any of:
//!
//! ```text
//! "1.1 Background"
//! "1.1\tBackground"
//! "1.1\nBackground"
//! "1.1Background"
//! "BACKGROUND"            (chapter openers often drop the number)
//! ```
//!
//! Both the page and the title are normalized first (every whitespace run
//! becomes one space, ends trimmed). Then, case-insensitively, in order:
//!
//! 1. `number`, whitespace, `title`
//! 2. `number`, optional whitespace, `title`
//! 3. `title` alone
//!
//! The first pattern that matches anywhere wins, and its first match is the
//! result.
//!
//! ## Offsets
//!
//! A [`HeadingMatch`] reports the match twice: as a byte offset into the
//! normalized text, and as a byte span into the raw page text it was
//! normalized from. The raw span is what callers slice with.

use std::ops::Range;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A heading to search for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRef {
    /// Title without its section number.
    pub title: String,
    /// Section number, if the heading has one.
    pub number: Option<String>,
}

impl HeadingRef {
    /// Create a heading reference.
    #[must_use]
    pub fn new(title: impl Into<String>, number: Option<&str>) -> Self {
        Self {
            title: title.into(),
            number: number.map(str::to_string),
        }
    }

    /// Find this heading in `text`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Pattern`] if the search pattern cannot be built.
    pub fn find_in(&self, text: &str) -> Result<Option<HeadingMatch>> {
        find_heading(text, &self.title, self.number.as_deref())
    }
}

/// Where a heading was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    /// Byte offset of the match in the normalized text.
    pub offset: usize,
    /// Byte span of the match in the raw text.
    pub raw: Range<usize>,
}

/// Collapse every whitespace run to a single space and trim.
///
/// ```rust
/// use quire::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  1.1\t\nBackground  "), "1.1 Background");
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    Normalized::new(text).text
}

/// Normalized text plus, for each of its bytes, the raw byte it came from.
struct Normalized {
    text: String,
    raw: Vec<usize>,
}

impl Normalized {
    fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut raw = Vec::with_capacity(source.len());
        let mut gap: Option<usize> = None;

        for (i, ch) in source.char_indices() {
            if ch.is_whitespace() {
                if !text.is_empty() && gap.is_none() {
                    gap = Some(i);
                }
                continue;
            }
            if let Some(at) = gap.take() {
                text.push(' ');
                raw.push(at);
            }
            text.push(ch);
            raw.extend(i..i + ch.len_utf8());
        }

        Self { text, raw }
    }

    fn raw_span(&self, span: Range<usize>) -> Range<usize> {
        let start = self.raw[span.start];
        let end = self.raw[span.end - 1] + 1;
        start..end
    }
}

fn patterns(title: &str, number: Option<&str>) -> Vec<String> {
    let title = regex::escape(title);
    let mut patterns = Vec::with_capacity(3);
    if let Some(number) = number.filter(|n| !n.is_empty()) {
        let number = regex::escape(number);
        patterns.push(format!(r"{number}\s+{title}"));
        patterns.push(format!(r"{number}\s*{title}"));
    }
    patterns.push(title);
    patterns
}

fn compile(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

/// Find a heading in page text.
///
/// Returns `None` when no pattern matches, or when the title is blank.
///
/// ```rust
/// use quire::find_heading;
///
/// let page = "Chapter opening\n1.1\n  Background\nBody text.";
/// let hit = find_heading(page, "Background", Some("1.1")).unwrap().unwrap();
/// assert_eq!(hit.offset, 16);
/// assert_eq!(&page[hit.raw.clone()], "1.1\n  Background");
/// ```
///
/// # Errors
///
/// Returns [`crate::Error::Pattern`] if the search pattern cannot be built.
pub fn find_heading(text: &str, title: &str, number: Option<&str>) -> Result<Option<HeadingMatch>> {
    let title = normalize_whitespace(title);
    if title.is_empty() {
        return Ok(None);
    }

    let haystack = Normalized::new(text);
    for pattern in patterns(&title, number) {
        if let Some(m) = compile(&pattern)?.find(&haystack.text) {
            return Ok(Some(HeadingMatch {
                offset: m.start(),
                raw: haystack.raw_span(m.range()),
            }));
        }
    }

    Ok(None)
}
