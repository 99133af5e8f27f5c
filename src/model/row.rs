//! Table rows recovered from a certificate.

use serde::{Deserialize, Serialize};

/// Number of generic cell columns carried by every row.
pub const CELL_COUNT: usize = 11;

/// Ordering key shared by rows, headers and observations.
///
/// Pages are spaced 1000 units apart so that a key sorts first by page
/// and then by vertical position.
pub fn ordering_key(page: u32, y: f64) -> i64 {
    i64::from(page) * 1000 + y.round() as i64
}

/// Classification state of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowState {
    /// Ordinary content row
    #[default]
    Data,
    /// Column caption or page-one label row
    Header,
    /// Continuation whose content was copied into the row above
    MergedAway,
}

impl RowState {
    /// Stable code used in the store.
    pub fn code(&self) -> &'static str {
        match self {
            RowState::Data => "DATA",
            RowState::Header => "HEADER",
            RowState::MergedAway => "MERGED_AWAY",
        }
    }

    /// Parse a stored code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "DATA" => Some(RowState::Data),
            "HEADER" => Some(RowState::Header),
            "MERGED_AWAY" => Some(RowState::MergedAway),
            _ => None,
        }
    }
}

/// Registry journal reference parsed out of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Journal (yevmiye) number
    pub number: String,
    /// Date as `dd.mm.yyyy`, optionally followed by ` hh:mm`
    pub date: String,
    /// Registry office preceding the date
    pub office: String,
}

/// One extracted table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    /// Document-wide row id, increasing in extraction order
    pub seq: u32,
    /// Page number (1-indexed)
    pub page: u32,
    /// Row index within its page
    pub row_index: u32,
    /// Document-wide running row number, 1-based
    pub row_number: u32,
    /// Cell values, left to right
    pub cells: [Option<String>; CELL_COUNT],
    /// Classification state
    pub state: RowState,
    /// Assigned section name
    pub section: Option<String>,
    /// Recovered vertical position
    pub y: Option<f64>,
    /// Ordering key derived from page and y
    pub key: Option<i64>,
    /// Parcel identity
    pub parcel: Option<String>,
    /// Set once every reconciliation phase has run on this row
    pub finalized: bool,
    /// Journal reference, when one could be parsed
    pub journal: Option<JournalEntry>,
}

impl RowRecord {
    /// Create a data row from cell texts.
    ///
    /// Empty and whitespace-only texts become empty cells; surplus cells
    /// beyond [`CELL_COUNT`] are dropped.
    pub fn new(seq: u32, page: u32, row_index: u32, texts: &[&str]) -> Self {
        let mut cells: [Option<String>; CELL_COUNT] = Default::default();
        for (slot, text) in cells.iter_mut().zip(texts) {
            let text = text.trim();
            if !text.is_empty() {
                *slot = Some(text.to_string());
            }
        }
        Self {
            seq,
            page,
            row_index,
            row_number: seq + 1,
            cells,
            state: RowState::Data,
            section: None,
            y: None,
            key: None,
            parcel: None,
            finalized: false,
            journal: None,
        }
    }

    pub fn with_y(mut self, y: f64) -> Self {
        self.set_position(y);
        self
    }

    pub fn with_parcel(mut self, parcel: impl Into<String>) -> Self {
        self.parcel = Some(parcel.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Cell text by 0-based column, `""` when empty.
    pub fn cell(&self, index: usize) -> &str {
        self.cells
            .get(index)
            .and_then(|c| c.as_deref())
            .unwrap_or("")
    }

    /// Text of the first cell.
    pub fn first_cell(&self) -> &str {
        self.cell(0)
    }

    /// Whether every cell is empty.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    /// Whether the cells in `range` (0-based) are all empty.
    pub fn cells_empty(&self, range: std::ops::Range<usize>) -> bool {
        range.into_iter().all(|i| self.cell(i).is_empty())
    }

    /// Set y and the ordering key derived from it.
    pub fn set_position(&mut self, y: f64) {
        self.y = Some(y);
        self.key = Some(ordering_key(self.page, y));
    }

    /// Whether a section has been assigned.
    pub fn has_section(&self) -> bool {
        self.section.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn is_header(&self) -> bool {
        self.state == RowState::Header
    }

    pub fn is_data(&self) -> bool {
        self.state == RowState::Data
    }
}
