//! Positioned text as delivered by the PDF extraction service.
//!
//! Coordinates use a top-left origin with y increasing downward. All types
//! deserialize from the service's JSON dump, with optional collections
//! defaulting to empty.

use serde::{Deserialize, Serialize};

/// Vertical tolerance when grouping spans into lines.
const LINE_TOLERANCE: f64 = 2.0;

/// A run of text sharing one font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// The text content
    pub text: String,
    /// Font name (e.g., "Arial-BoldMT")
    #[serde(default)]
    pub font: String,
    /// Font size in points
    #[serde(default)]
    pub size: f64,
    /// X origin (left edge)
    pub x: f64,
    /// Y origin (top edge)
    pub y: f64,
}

impl Span {
    /// Create a new span.
    pub fn new(text: impl Into<String>, font: impl Into<String>, size: f64, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            font: font.into(),
            size,
            x,
            y,
        }
    }
}

/// A word (or word group) with its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Word {
    /// Create a word with a nominal one-line height.
    pub fn new(text: impl Into<String>, x0: f64, top: f64) -> Self {
        let text = text.into();
        let width = text.chars().count() as f64 * 5.0;
        Self {
            text,
            x0,
            x1: x0 + width,
            top,
            bottom: top + 8.0,
        }
    }
}

/// A ruling line detected on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuledLine {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

/// A table cell as seen by line-based table detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub bbox: Option<BBox>,
}

impl CellGeometry {
    /// A cell carrying text but no geometry.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            bbox: None,
        }
    }

    /// A cell without content.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One row of a detected table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRowGeometry {
    pub cells: Vec<CellGeometry>,
}

impl TableRowGeometry {
    /// Build a row from plain cell texts; empty strings become empty cells.
    pub fn from_texts(texts: &[&str]) -> Self {
        let cells = texts
            .iter()
            .map(|t| {
                if t.is_empty() {
                    CellGeometry::empty()
                } else {
                    CellGeometry::text(*t)
                }
            })
            .collect();
        Self { cells }
    }
}

/// A table recovered from ruling lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableGeometry {
    #[serde(default)]
    pub bbox: Option<BBox>,
    pub rows: Vec<TableRowGeometry>,
}

/// Everything the extraction service knows about one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Page number (1-indexed)
    pub number: u32,
    /// Page width in points
    pub width: f64,
    /// Page height in points
    pub height: f64,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default)]
    pub words: Vec<Word>,
    #[serde(default)]
    pub lines: Vec<RuledLine>,
    #[serde(default)]
    pub tables: Vec<TableGeometry>,
}

impl PageLayout {
    /// Create an empty page.
    pub fn new(number: u32, width: f64, height: f64) -> Self {
        Self {
            number,
            width,
            height,
            ..Default::default()
        }
    }

    /// An empty A4 landscape page, the registry portal's format.
    pub fn a4_landscape(number: u32) -> Self {
        Self::new(number, 842.0, 595.0)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }

    pub fn with_word(mut self, word: Word) -> Self {
        self.words.push(word);
        self
    }

    pub fn with_table(mut self, table: TableGeometry) -> Self {
        self.tables.push(table);
        self
    }

    /// Reconstruct the page's plain text from its spans.
    ///
    /// Spans are ordered by (y, x) and grouped into lines; spans in a line
    /// are joined with a space, lines with a newline.
    pub fn plain_text(&self) -> String {
        let mut spans: Vec<&Span> = self.spans.iter().collect();
        spans.sort_by(|a, b| {
            a.y.partial_cmp(&b.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut lines: Vec<(f64, Vec<&Span>)> = Vec::new();
        for span in spans {
            match lines.last_mut() {
                Some((y, members)) if (span.y - *y).abs() <= LINE_TOLERANCE => members.push(span),
                _ => lines.push((span.y, vec![span])),
            }
        }

        lines
            .into_iter()
            .map(|(_, mut members)| {
                members.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
                members
                    .iter()
                    .map(|s| s.text.trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Words whose left/top corner falls inside the given region.
    pub fn words_in(&self, x0: f64, x1: f64, y0: f64, y1: f64) -> impl Iterator<Item = &Word> {
        self.words
            .iter()
            .filter(move |w| w.x0 >= x0 && w.x0 <= x1 && w.top >= y0 && w.top <= y1)
    }
}

/// A complete certificate layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// Where the layout came from, if known
    #[serde(default)]
    pub source: Option<String>,
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    /// Create a layout from pages.
    pub fn new(pages: Vec<PageLayout>) -> Self {
        Self { source: None, pages }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The first page, if any.
    pub fn first_page(&self) -> Option<&PageLayout> {
        self.pages.first()
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Short label for logs and reports.
    pub fn label(&self) -> &str {
        self.source.as_deref().unwrap_or("<layout>")
    }
}
