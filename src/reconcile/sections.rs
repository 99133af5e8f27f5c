//! Section assignment.
//!
//! Every data row belongs to the section whose header precedes it in
//! ordering-key order. Rows the structural rule cannot place are repaired
//! from raw observations first and from their neighbours last; whatever is
//! still unplaced is reported, never defaulted.

use crate::error::Diagnostic;
use crate::model::{HeaderSet, ObservationPool, RowRecord, RowState};
use crate::parser::IDENTITY_SECTION;
use crate::text::{fold, ratio};

/// Page-one identity labels and the row-number windows they may occupy.
pub const IDENTITY_WINDOWS: &[(&str, u32, u32)] = &[
    ("Zemin Tipi", 1, 3),
    ("Taşınmaz Kimlik No", 2, 4),
    ("İl/İlçe", 3, 5),
    ("Kurum Adı", 4, 6),
    ("Mahalle", 5, 7),
    ("Mevkii", 6, 8),
    ("Cilt/Sayfa", 7, 9),
    ("Kayıt Durum", 8, 10),
    ("Ada/Parsel", 9, 11),
    ("AT Yüzölçüm", 10, 12),
    ("BB Nitelik", 11, 13),
    ("BB Brüt", 12, 14),
    ("BB Net", 13, 15),
    ("Blok/Kat", 14, 16),
    ("Arsa Pay", 15, 17),
    ("Ana Taşınmaz Nitelik", 16, 17),
];

/// Whether a first cell carries `label`: folded prefix match or similarity.
pub fn matches_label(cell: &str, label: &str, threshold: f64) -> bool {
    let cell = fold(cell.trim().trim_end_matches(':'));
    let label = fold(label);
    !cell.is_empty() && (cell.starts_with(&label) || ratio(&cell, &label) >= threshold)
}

/// Mark the page-one identity rows with the identity section.
pub fn label_identity_section(mut rows: Vec<RowRecord>, threshold: f64) -> Vec<RowRecord> {
    let mut labelled = 0;
    for row in rows.iter_mut() {
        if row.finalized || row.page != 1 || row.state == RowState::MergedAway {
            continue;
        }
        let hit = IDENTITY_WINDOWS.iter().any(|(label, from, to)| {
            (*from..=*to).contains(&row.row_number)
                && matches_label(row.first_cell(), label, threshold)
        });
        if hit {
            row.section = Some(IDENTITY_SECTION.to_string());
            labelled += 1;
        }
    }
    log::debug!("Sections: {} identity rows labelled", labelled);
    rows
}

/// Section governing a row at `key` on `page`.
///
/// The first header also owns the rows above it on its own page.
pub fn section_for(headers: &HeaderSet, page: u32, key: i64) -> Option<&str> {
    if let Some(header) = headers.governing(key) {
        return Some(header.name.as_str());
    }
    headers
        .records()
        .first()
        .filter(|first| first.page == page)
        .map(|first| first.name.as_str())
}

/// Assign every keyed data row to its governing header.
pub fn assign_sections(mut rows: Vec<RowRecord>, headers: &HeaderSet) -> Vec<RowRecord> {
    let mut assigned = 0;
    for row in rows.iter_mut() {
        if row.finalized || !row.is_data() {
            continue;
        }
        let Some(key) = row.key else { continue };
        if let Some(name) = section_for(headers, row.page, key) {
            row.section = Some(name.to_string());
            assigned += 1;
        }
    }
    log::debug!(
        "Sections: {} rows assigned against {} headers",
        assigned,
        headers.len()
    );
    rows
}

/// Place unassigned rows using the raw observation of their first cell.
///
/// Observations are looked up, not consumed.
pub fn repair_from_observations(
    mut rows: Vec<RowRecord>,
    pool: &ObservationPool,
    headers: &HeaderSet,
) -> Vec<RowRecord> {
    let mut repaired = 0;
    for row in rows.iter_mut() {
        if row.finalized || !row.is_data() || row.has_section() || row.first_cell().is_empty() {
            continue;
        }
        let Some(parcel) = row.parcel.as_deref() else { continue };
        let Some(observation) = pool.find_for_text(parcel, row.first_cell()) else {
            continue;
        };
        let Some(name) = section_for(headers, observation.page, observation.key) else {
            continue;
        };
        row.section = Some(name.to_string());
        row.y = Some(observation.y);
        row.key = Some(observation.key);
        repaired += 1;
    }
    log::debug!("Sections: {} rows placed from observations", repaired);
    rows
}

/// Borrow a section from a nearby data row.
///
/// Searches forward then backward through at most `window` rows of the same
/// parcel; a header row ends the search in that direction.
pub fn repair_neighbors(
    mut rows: Vec<RowRecord>,
    window: usize,
) -> (Vec<RowRecord>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    for i in 0..rows.len() {
        let row = &rows[i];
        if row.finalized || !row.is_data() || row.has_section() {
            continue;
        }

        let forward = (i + 1..rows.len()).take(window);
        let backward = (0..i).rev().take(window);
        let found = neighbor_section(&rows, i, forward).or_else(|| neighbor_section(&rows, i, backward));

        match found {
            Some(section) => rows[i].section = Some(section),
            None => {
                let row = &rows[i];
                log::warn!(
                    "Row {} on page {} has no section after repair",
                    row.seq,
                    row.page
                );
                diagnostics.push(Diagnostic::UnresolvedSectionAssignment {
                    parcel: row.parcel.clone().unwrap_or_default(),
                    page: row.page,
                    seq: row.seq,
                });
            }
        }
    }

    (rows, diagnostics)
}

fn neighbor_section(
    rows: &[RowRecord],
    origin: usize,
    candidates: impl Iterator<Item = usize>,
) -> Option<String> {
    for j in candidates {
        let other = &rows[j];
        if other.parcel != rows[origin].parcel || other.is_header() {
            break;
        }
        if other.is_data() && other.has_section() {
            return other.section.clone();
        }
    }
    None
}
