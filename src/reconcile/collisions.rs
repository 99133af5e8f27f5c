//! Duplicate ordering-key repair.
//!
//! Row positions come from the first page word that contains the row's
//! first cell, so repeated values ("Mesken", a recurring owner name) all
//! land on the same key. Each such row is re-anchored on the next unused
//! raw observation with the same text.

use std::collections::BTreeMap;

use crate::error::Diagnostic;
use crate::model::{HeaderSet, ObservationPool, RowRecord};
use crate::parser::IDENTITY_SECTION;

use super::sections::section_for;

/// Re-key rows whose ordering key collides with another row's.
///
/// Matched observations are consumed. Rows with no matching observation
/// keep their key and are reported as [`Diagnostic::CollisionUnresolved`].
pub fn repair_collisions(
    mut rows: Vec<RowRecord>,
    pool: &mut ObservationPool,
    headers: &HeaderSet,
) -> (Vec<RowRecord>, Vec<Diagnostic>) {
    let mut groups: BTreeMap<(String, u32, i64), Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        if row.finalized || !row.is_data() || row.section.as_deref() == Some(IDENTITY_SECTION) {
            continue;
        }
        let (Some(parcel), Some(key)) = (row.parcel.as_ref(), row.key) else {
            continue;
        };
        groups
            .entry((parcel.clone(), row.page, key))
            .or_default()
            .push(i);
    }

    let mut diagnostics = Vec::new();
    let mut repaired = 0;

    for ((parcel, page, key), members) in groups.into_iter().filter(|(_, m)| m.len() > 1) {
        for i in members {
            let row = &mut rows[i];
            let text = row.first_cell().to_string();
            match pool.consume_exact(&parcel, page, &text, row.seq) {
                Some(observation) => {
                    row.y = Some(observation.y);
                    row.key = Some(observation.key);
                    if let Some(name) = section_for(headers, observation.page, observation.key) {
                        row.section = Some(name.to_string());
                    }
                    repaired += 1;
                }
                None => {
                    log::warn!(
                        "Key {} collides on page {} and no observation matches {:?}",
                        key,
                        page,
                        text
                    );
                    diagnostics.push(Diagnostic::CollisionUnresolved {
                        parcel: parcel.clone(),
                        page,
                        key,
                        seq: row.seq,
                        text,
                    });
                }
            }
        }
    }

    log::debug!(
        "Collisions: {} rows re-keyed, {} unresolved",
        repaired,
        diagnostics.len()
    );
    (rows, diagnostics)
}
