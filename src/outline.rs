//! Outline normalization.
//!
//! A document outline arrives as a flat, ordered list of
//! `(level, title, page)` entries. It is an implicit tree:
//!
//! ```text
//! (1, "1 Introduction",            0)   chapter 1
//! (2, "1.5 Data Science Activities", 3)
//! (3, "1.5.1 Managing Data Flow",  4)   parent 1.5, chapter 1
//! (1, "Appendix",                 90)   unnumbered chapter: excluded
//! ```
//!
//! [`Outline`] recovers, for every entry, its section number, its clean
//! title, its chapter, and its parent section. Lookups are resolved in one
//! forward pass into index links (no ownership, just positions), so every
//! query afterwards is O(1). The result is identical to scanning backwards
//! from each entry:
//!
//! - the chapter is the nearest level-1 entry at or before the entry;
//! - the parent is the nearest *earlier* entry whose section number equals
//!   the entry's number minus its last component.
//!
//! Missing chapters and parents are not errors. They degrade to empty
//! strings or `None`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::HeadingRef;

static SECTION_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\s+").expect("invalid section number regex"));

/// One outline (bookmark) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Nesting level, 1 = chapter.
    pub level: u32,
    /// Raw title, possibly prefixed with a section number.
    pub title: String,
    /// Zero-based page the entry points at.
    pub page_index: usize,
}

impl OutlineEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(level: u32, title: impl Into<String>, page_index: usize) -> Self {
        Self {
            level,
            title: title.into(),
            page_index,
        }
    }
}

impl<S: Into<String>> From<(u32, S, usize)> for OutlineEntry {
    fn from((level, title, page_index): (u32, S, usize)) -> Self {
        Self::new(level, title, page_index)
    }
}

/// Hierarchy facts derived for one outline entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionIdentity {
    /// Dotted section number, if the title has one.
    pub section_number: Option<String>,
    /// Title with the section number removed.
    pub clean_title: String,
    /// Number of the enclosing chapter, empty if none or unnumbered.
    pub chapter_number: String,
    /// Clean title of the enclosing chapter, empty if none.
    pub chapter_title: String,
    /// Section number minus its last component.
    pub parent_section_number: Option<String>,
    /// Clean title of the parent section, if the outline has it.
    pub parent_section_title: Option<String>,
}

/// Zero-based inclusive page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    /// First page in the range.
    pub first: usize,
    /// Last page in the range (inclusive).
    pub last: usize,
}

impl PageRange {
    /// Create a range; the bounds are swapped if given in reverse.
    #[must_use]
    pub fn new(first: usize, last: usize) -> Self {
        Self {
            first: first.min(last),
            last: first.max(last),
        }
    }

    /// Whether `page` lies in the range.
    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        (self.first..=self.last).contains(&page)
    }
}

/// Extract a leading dotted section number such as `"1.5.1"`.
///
/// ```rust
/// use quire::parse_section_number;
///
/// assert_eq!(parse_section_number("1.5.1 Managing Data Flow"), Some("1.5.1"));
/// assert_eq!(parse_section_number("3 Basic Algorithms"), Some("3"));
/// assert_eq!(parse_section_number("Preface"), None);
/// ```
pub fn parse_section_number(title: &str) -> Option<&str> {
    SECTION_NUMBER
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Remove a leading section number and the whitespace after it.
pub fn strip_section_number(title: &str) -> &str {
    match SECTION_NUMBER.find(title) {
        Some(m) => &title[m.end()..],
        None => title,
    }
}

/// Drop the last dotted component: `"1.5.1"` → `"1.5"`, `"1"` → `None`.
pub fn parent_section_number(number: &str) -> Option<&str> {
    number.rsplit_once('.').map(|(parent, _)| parent)
}

/// Keep the entries whose page lies in `range`, stopping at the first entry
/// past its end.
pub fn filter_by_page_range(entries: &[OutlineEntry], range: PageRange) -> Vec<OutlineEntry> {
    entries
        .iter()
        .take_while(|e| e.page_index <= range.last)
        .filter(|e| range.contains(e.page_index))
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
struct Node {
    number: Option<String>,
    chapter: Option<usize>,
    parent: Option<usize>,
}

/// A normalized outline.
///
/// ```rust
/// use quire::Outline;
///
/// let outline = Outline::new(vec![
///     (1, "1 Intro", 0).into(),
///     (2, "1.1 Background", 0).into(),
///     (3, "1.1.1 History", 1).into(),
/// ]);
/// let history = outline.identity(2);
/// assert_eq!(history.clean_title, "History");
/// assert_eq!(history.chapter_title, "Intro");
/// assert_eq!(history.parent_section_title.as_deref(), Some("Background"));
/// ```
#[derive(Debug, Clone)]
pub struct Outline {
    entries: Vec<OutlineEntry>,
    nodes: Vec<Node>,
}

/// A retained outline entry with its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    /// Position in the outline.
    pub index: usize,
    /// The raw entry.
    pub entry: &'a OutlineEntry,
    /// The derived identity.
    pub identity: SectionIdentity,
}

impl Outline {
    /// Normalize an ordered list of entries.
    #[must_use]
    pub fn new(entries: Vec<OutlineEntry>) -> Self {
        let mut nodes = Vec::with_capacity(entries.len());
        let mut chapter = None;
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (i, entry) in entries.iter().enumerate() {
            let number = parse_section_number(&entry.title).map(str::to_string);
            if entry.level == 1 {
                chapter = Some(i);
            }
            let parent = number
                .as_deref()
                .and_then(parent_section_number)
                .and_then(|p| seen.get(p).copied());
            if let Some(n) = &number {
                seen.insert(n.clone(), i);
            }
            nodes.push(Node {
                number,
                chapter,
                parent,
            });
        }

        Self { entries, nodes }
    }

    /// The raw entries, in document order.
    #[must_use]
    pub fn entries(&self) -> &[OutlineEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the outline has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unnumbered chapters (front matter, appendices) carry no content of
    /// their own and are left out of segmentation.
    #[must_use]
    pub fn is_excluded(&self, index: usize) -> bool {
        self.entries[index].level == 1 && self.nodes[index].number.is_none()
    }

    /// The section number of entry `index`.
    #[must_use]
    pub fn section_number(&self, index: usize) -> Option<&str> {
        self.nodes[index].number.as_deref()
    }

    /// The heading to search page text for: clean title plus number.
    #[must_use]
    pub fn heading(&self, index: usize) -> HeadingRef {
        let entry = &self.entries[index];
        HeadingRef {
            title: strip_section_number(&entry.title).to_string(),
            number: self.nodes[index].number.clone(),
        }
    }

    /// Derive the identity of entry `index`.
    #[must_use]
    pub fn identity(&self, index: usize) -> SectionIdentity {
        let entry = &self.entries[index];
        let node = &self.nodes[index];

        let (chapter_number, chapter_title) = node
            .chapter
            .map(|c| {
                let chapter = &self.entries[c];
                match &self.nodes[c].number {
                    Some(n) => (n.clone(), strip_section_number(&chapter.title).to_string()),
                    None => (String::new(), chapter.title.clone()),
                }
            })
            .unwrap_or_default();

        let parent_section_number = node
            .number
            .as_deref()
            .and_then(parent_section_number)
            .map(str::to_string);
        let parent_section_title = node
            .parent
            .map(|p| strip_section_number(&self.entries[p].title).to_string());

        SectionIdentity {
            section_number: node.number.clone(),
            clean_title: strip_section_number(&entry.title).to_string(),
            chapter_number,
            chapter_title,
            parent_section_number,
            parent_section_title,
        }
    }

    /// Retained entries with their identities, in document order.
    pub fn sections(&self) -> impl Iterator<Item = Section<'_>> + '_ {
        (0..self.entries.len())
            .filter(|&i| !self.is_excluded(i))
            .map(|i| Section {
                index: i,
                entry: &self.entries[i],
                identity: self.identity(i),
            })
    }

    /// Identities of all retained entries.
    #[must_use]
    pub fn identities(&self) -> Vec<SectionIdentity> {
        self.sections().map(|s| s.identity).collect()
    }
}
