//! # takbis
//!
//! Structural recovery for Turkish land-registry (TAKBİS) certificates.
//!
//! An external extraction service turns each certificate PDF into a layout
//! dump: positioned text spans, words, ruled lines and table geometry. This
//! library rebuilds the certificate from that dump: parcel summary, section
//! headers, table rows with their sections, mortgage entries and journal
//! references. Results are stored in SQLite.
//!
//! ## Quick Start
//!
//! ```no_run
//! use takbis::{process_file, render, PipelineOptions};
//!
//! fn main() -> takbis::Result<()> {
//!     let doc = process_file("certificate.json", PipelineOptions::default())?;
//!     println!("Parcel {}: {} rows", doc.parcel.identity, doc.rows.len());
//!
//!     let json = render::to_json(&doc, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Watermark-tolerant text**: scattered watermark letters are stripped
//! - **Section recovery**: lexicon and learned headers, collision repair
//! - **Mortgage zones**: fixed zones with anchor fallback
//! - **Institution names**: tax-id keyed bank directory with fuzzy matching
//! - **Persistence**: transactional SQLite store with parcel profiles

pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod store;
pub mod text;

// Re-export commonly used types
pub use error::{Diagnostic, Error, Result};
pub use model::{
    CertificateInfo, DocumentLayout, HeaderRecord, HeaderSet, JournalEntry, LandType,
    MortgageRecord, ObservationPool, PageLayout, ParcelEntity, RowRecord, RowState,
};
pub use parser::{PipelineOptions, ThresholdKey, Thresholds};
pub use pipeline::{
    load_layouts, BatchReport, DocumentOutcome, DocumentStatus, JsonLayoutSource, LayoutSource,
    Pipeline, ProcessedDocument,
};
pub use reconcile::{Encumbrance, EncumbranceKind, ParcelProfile};
pub use render::JsonFormat;
pub use store::Store;
pub use text::{BankDirectory, TextNormalizer};

use std::path::Path;

/// Load a layout dump from a JSON file.
///
/// # Example
///
/// ```no_run
/// use takbis::load_layout;
///
/// let layout = load_layout("certificate.json").unwrap();
/// println!("Pages: {}", layout.page_count());
/// ```
pub fn load_layout<P: AsRef<Path>>(path: P) -> Result<DocumentLayout> {
    JsonLayoutSource::new().load(path.as_ref())
}

/// Process a layout file with the given options.
///
/// The bank directory configured in `options` is opened and may grow.
pub fn process_file<P: AsRef<Path>>(path: P, options: PipelineOptions) -> Result<ProcessedDocument> {
    let layout = load_layout(path)?;
    let mut pipeline = Pipeline::new(options)?;
    pipeline.process(&layout)
}

/// Process a layout file and serialize the result to JSON.
///
/// # Example
///
/// ```no_run
/// use takbis::{to_json, JsonFormat};
///
/// let json = to_json("certificate.json", JsonFormat::Pretty).unwrap();
/// std::fs::write("parcel.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = process_file(path, PipelineOptions::default())?;
    render::to_json(&doc, format)
}

/// Process a layout file and store the result.
///
/// Returns the processed document. An already stored parcel fails with
/// [`Error::DuplicateParcel`] unless `overwrite` is set.
pub fn import_file<P: AsRef<Path>>(
    path: P,
    store: &mut Store,
    options: PipelineOptions,
    overwrite: bool,
) -> Result<ProcessedDocument> {
    let layout = load_layout(path)?;
    let mut pipeline = Pipeline::new(options)?;
    let doc = pipeline.process(&layout)?;
    pipeline.persist(store, &doc, overwrite)?;
    Ok(doc)
}
