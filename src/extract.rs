//! Extracting the text between two headings.
//!
//! Outline page numbers say where a section *starts*, not where its text
//! is. A section may begin halfway down its page and run across several
//! more, ending wherever the next heading appears:
//!
//! ```text
//! page 4:  ...end of 1.4...   | 1.5 Data Science |  body......
//! page 5:  body......................................
//! page 6:  body.......  | 1.6 Next Section |  ...
//!
//! extract(start_page = 4, start = "1.5 Data Science", end = "1.6 Next Section")
//!   -> "body...... body...... body......."
//! ```
//!
//! ## The Scan
//!
//! Pages are read strictly in increasing order, at most `max_pages` of them:
//!
//! - **First non-blank page**: find the start heading. Capture begins on the line
//!   after the heading. If the end heading also appears on what remains of
//!   the page, capture stops there.
//! - **Heading missing there**: capture the whole page. The miss is
//!   logged at `warn` and reported in [`Extraction::start_found`].
//! - **Later pages**: capture up to the end heading and stop, or capture the
//!   whole page and continue.
//! - **Blank pages** are passed over, so a blank outline page defers the
//!   start heading search to the page after it.
//!
//! The fragments are joined with spaces and every whitespace run is
//! collapsed to one space. Not finding a heading is never an error; a page
//! source failure is, and is returned unchanged.

use crate::heading::normalize_whitespace;
use crate::{HeadingRef, PageSource, Result};

/// The text of one section, plus how it was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// The captured text, whitespace collapsed.
    pub text: String,
    /// Whether the start heading was found on the first non-blank page.
    pub start_found: bool,
    /// Whether the scan stopped at the end heading.
    pub end_found: bool,
    /// Pages read, including blank ones.
    pub pages_scanned: usize,
}

/// Scans pages for the text between two headings.
#[derive(Debug)]
pub struct BoundaryExtractor<'a, P: PageSource + ?Sized> {
    pages: &'a P,
}

impl<'a, P: PageSource + ?Sized> BoundaryExtractor<'a, P> {
    /// Create an extractor over `pages`.
    pub fn new(pages: &'a P) -> Self {
        Self { pages }
    }

    /// Extract the text after `start` and before `end`, reading at most
    /// `max_pages` pages from `start_page`.
    ///
    /// # Errors
    ///
    /// Propagates page source and pattern failures.
    pub fn extract(
        &self,
        start_page: usize,
        start: &HeadingRef,
        end: Option<&HeadingRef>,
        max_pages: usize,
    ) -> Result<Extraction> {
        let page_count = self.pages.page_count();
        let mut parts: Vec<String> = Vec::new();
        let mut extraction = Extraction::default();
        let mut searching_start = true;

        for offset in 0..max_pages {
            let page = start_page + offset;
            if page >= page_count {
                break;
            }

            let text = self.pages.page_text(page)?;
            extraction.pages_scanned += 1;
            if text.trim().is_empty() {
                continue;
            }

            let body = if searching_start {
                searching_start = false;
                match start.find_in(&text)? {
                    Some(hit) => {
                        extraction.start_found = true;
                        after_line(&text, hit.raw.end)
                    }
                    None => {
                        tracing::warn!(
                            page,
                            title = %start.title,
                            number = start.number.as_deref().unwrap_or(""),
                            "start heading not found, capturing the whole page"
                        );
                        parts.push(text);
                        continue;
                    }
                }
            } else {
                text.as_str()
            };

            if let Some(end) = end {
                if let Some(hit) = end.find_in(body)? {
                    parts.push(body[..hit.raw.start].to_string());
                    extraction.end_found = true;
                    break;
                }
            }
            parts.push(body.to_string());
        }

        extraction.text = normalize_whitespace(&parts.join(" "));
        Ok(extraction)
    }
}

/// Everything after the line containing byte `pos`.
fn after_line(text: &str, pos: usize) -> &str {
    match text[pos..].find('\n') {
        Some(nl) => &text[pos + nl + 1..],
        None => "",
    }
}
