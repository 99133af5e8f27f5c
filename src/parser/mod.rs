//! Layout parsing: from page geometry to rows, headers and mortgage zones.

mod classify;
mod document;
mod headers;
mod options;
mod rows;
mod zones;

pub use classify::{
    merge_continuations, remove_merged, HeaderArchetype, RowClassifier, HEADER_ARCHETYPES,
    PAGE_ONE_LABELS,
};
pub use document::{
    capture_observations, certificate_info, identity_from_region, identity_from_text,
    is_boilerplate, validate_document, MANDATORY_LABELS,
};
pub use headers::{
    clean_header_text, HeaderClassifier, HeaderClassifierConfig, IDENTITY_SECTION,
    OWNERSHIP_SECTION, SECTION_LEXICON,
};
pub use options::{PipelineOptions, ThresholdKey, Thresholds};
pub use rows::RowExtractor;
pub use zones::{
    is_mortgage_page, split_serial_tag, MortgageField, PageMortgage, ShareField, Zone,
    ZoneExtractor, ZoneLayout, ZoneReading, ZoneValue, LENDER_ANCHOR, SHARE_ANCHOR,
};
