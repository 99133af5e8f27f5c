//! Section headers found on a certificate.

use serde::{Deserialize, Serialize};

use super::row::ordering_key;

/// How a header was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderSource {
    /// Contains one of the known section names
    #[default]
    Lexicon,
    /// Accepted by the learned font/size signature
    Learned,
}

impl HeaderSource {
    pub fn code(&self) -> &'static str {
        match self {
            HeaderSource::Lexicon => "lexicon",
            HeaderSource::Learned => "learned",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "learned" => HeaderSource::Learned,
            _ => HeaderSource::Lexicon,
        }
    }
}

/// One occurrence of a section header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderRecord {
    /// Section name (cleaned header text)
    pub name: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// X origin of the header span
    pub x: f64,
    /// Y origin of the header span
    pub y: f64,
    /// Ordering key derived from page and y
    pub key: i64,
    /// Font of the header span
    pub font: String,
    /// Font size of the header span
    pub size: f64,
    /// How the header was recognised
    pub source: HeaderSource,
}

impl HeaderRecord {
    /// Create a lexicon header at the given position.
    pub fn new(name: impl Into<String>, page: u32, y: f64) -> Self {
        Self {
            name: name.into(),
            page,
            x: 0.0,
            y,
            key: ordering_key(page, y),
            font: String::new(),
            size: 0.0,
            source: HeaderSource::Lexicon,
        }
    }

    pub fn with_x(mut self, x: f64) -> Self {
        self.x = x;
        self
    }

    pub fn with_font(mut self, font: impl Into<String>, size: f64) -> Self {
        self.font = font.into();
        self.size = size;
        self
    }

    pub fn with_source(mut self, source: HeaderSource) -> Self {
        self.source = source;
        self
    }
}

/// Dominant font and size across lexicon headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderSignature {
    pub font: String,
    pub size: f64,
}

/// Headers of one document, kept sorted by ordering key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderSet {
    records: Vec<HeaderRecord>,
    /// Learned signature, when at least one lexicon header was found
    pub signature: Option<HeaderSignature>,
}

impl HeaderSet {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records in any order.
    pub fn from_records(records: Vec<HeaderRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.insert(record);
        }
        set
    }

    /// Insert a record, keeping key order (stable for equal keys).
    pub fn insert(&mut self, record: HeaderRecord) {
        let at = self.records.partition_point(|r| r.key <= record.key);
        self.records.insert(at, record);
    }

    /// Whether a header with this name has been recorded.
    pub fn contains_name(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    /// Whether `name` has already been recorded on `page`.
    pub fn contains_on_page(&self, name: &str, page: u32) -> bool {
        self.records.iter().any(|r| r.name == name && r.page == page)
    }

    /// Records sorted by ordering key.
    pub fn records(&self) -> &[HeaderRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The header with the greatest key not above `key`.
    pub fn governing(&self, key: i64) -> Option<&HeaderRecord> {
        let at = self.records.partition_point(|r| r.key <= key);
        at.checked_sub(1).map(|i| &self.records[i])
    }

    pub fn into_records(self) -> Vec<HeaderRecord> {
        self.records
    }
}
