//! Document model for recovered certificate structure.
//!
//! Layout types come straight from the extraction service; the remaining
//! types are what the pipeline derives and persists.

mod header;
mod layout;
mod mortgage;
mod observation;
mod parcel;
mod row;

pub use header::{HeaderRecord, HeaderSet, HeaderSignature, HeaderSource};
pub use layout::{
    BBox, CellGeometry, DocumentLayout, PageLayout, RuledLine, Span, TableGeometry,
    TableRowGeometry, Word,
};
pub use mortgage::{Establishment, MortgageRecord};
pub use observation::{CoordinateObservation, ObservationPool};
pub use parcel::{CertificateInfo, LandType, ParcelEntity, UnitDescriptor};
pub use row::{ordering_key, JournalEntry, RowRecord, RowState, CELL_COUNT};
