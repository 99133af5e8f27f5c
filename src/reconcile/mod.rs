//! Reconciliation passes over extracted rows.
//!
//! Each pass takes the row collection by value and returns the next one,
//! so the pipeline reads as a sequence of stages. Passes leave finalized
//! rows untouched.

mod cleanup;
mod collisions;
mod journal;
mod mortgages;
mod profile;
mod sections;
mod summary;

pub use cleanup::{drop_spillover_rows, is_spillover};
pub use collisions::repair_collisions;
pub use journal::{extract_journals, parse_journal};
pub use mortgages::{
    clean_dates, link_serial_tags, mark_empty_pledges, parse_establishment, EMPTY_PLEDGE_LABEL,
};
pub use profile::{
    encumbrances, risk_score, Encumbrance, EncumbranceKind, ParcelProfile, MORTGAGE_WEIGHT,
};
pub use sections::{
    assign_sections, label_identity_section, matches_label, repair_from_observations,
    repair_neighbors, section_for, IDENTITY_WINDOWS,
};
pub use summary::{build_parcel, SummaryField};
