//! Error types for the takbis library.
//!
//! Two families live here. [`Error`] is fatal for the document being
//! processed: nothing of that document reaches the store. [`Diagnostic`] is
//! recoverable: the document is still accepted and the diagnostic travels
//! with the result so callers can decide what to do with partial output.

use std::io;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for takbis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that can occur while processing a certificate.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The relational store rejected an operation.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Mandatory top-level section header or parcel identity missing.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// A parcel with this identity has already been stored.
    #[error("Parcel {0} already exists")]
    DuplicateParcel(String),

    /// Pipeline options could not be loaded or are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The layout handed over by the extraction service is unusable.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Error during rendering.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Whether this error leaves the rest of a batch untouched.
    ///
    /// A storage failure means the database itself is unusable and stops
    /// the batch; everything else is scoped to a single document.
    pub fn is_document_scoped(&self) -> bool {
        !matches!(self, Error::Storage(_))
    }
}

/// Recoverable outcomes reported alongside a processed document.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Fixed-zone extraction failed validation.
    #[error("zone extraction incomplete on page {page} ({}){}", reasons.join("; "), if *recovered { ", recovered from anchors" } else { "" })]
    ZoneExtractionIncomplete {
        page: u32,
        reasons: Vec<String>,
        recovered: bool,
    },

    /// A data row survived every repair pass without a section.
    #[error("row {seq} on page {page} of parcel {parcel} has no section")]
    UnresolvedSectionAssignment { parcel: String, page: u32, seq: u32 },

    /// Several rows share an ordering key and no raw observation matched.
    #[error("row {seq} on page {page} of parcel {parcel} shares key {key} and no observation matched {text:?}")]
    CollisionUnresolved {
        parcel: String,
        page: u32,
        key: i64,
        seq: u32,
        text: String,
    },
}
