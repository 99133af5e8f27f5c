//! Removal of caption rows the table detector spilled into the data.

use crate::model::RowRecord;

const JOURNAL_CAPTIONS: &[&str] = &["Yevmiye", "Sebebi- Tarih- Yevmiye"];

/// Whether a data row is a stray column caption.
pub fn is_spillover(row: &RowRecord) -> bool {
    if !row.is_data() {
        return false;
    }
    let caption = row.cells_empty(0..3) && JOURNAL_CAPTIONS.contains(&row.cell(3));
    let tail_only = row.cells_empty(0..4) && !row.cell(4).is_empty();
    caption || tail_only
}

/// Drop spillover rows; returns the survivors and the number dropped.
pub fn drop_spillover_rows(rows: Vec<RowRecord>) -> (Vec<RowRecord>, usize) {
    let before = rows.len();
    let rows: Vec<RowRecord> = rows
        .into_iter()
        .filter(|row| row.finalized || !is_spillover(row))
        .collect();
    let dropped = before - rows.len();
    if dropped > 0 {
        log::debug!("Cleanup: dropped {} spillover rows", dropped);
    }
    (rows, dropped)
}
