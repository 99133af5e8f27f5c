//! Row extraction from table geometry.

use crate::model::{DocumentLayout, PageLayout, RowRecord, TableRowGeometry, CELL_COUNT};
use crate::text::strip_watermark;

/// Turns detected tables into row records.
pub struct RowExtractor {
    average_row_height: f64,
}

impl RowExtractor {
    /// Create an extractor with the default fallback row height.
    pub fn new() -> Self {
        Self {
            average_row_height: 20.0,
        }
    }

    /// Set the row height used when nothing else locates a row.
    pub fn with_average_row_height(mut self, height: f64) -> Self {
        self.average_row_height = height;
        self
    }

    /// Extract rows from every table of every page.
    ///
    /// Rows whose cells are all empty after cleaning are skipped. Row ids
    /// and row numbers run across the whole document; row indices restart
    /// on every page.
    pub fn extract(&self, doc: &DocumentLayout) -> Vec<RowRecord> {
        let mut rows = Vec::new();
        let mut seq = 0u32;

        for page in &doc.pages {
            let mut row_index = 0u32;
            let mut previous_y: Option<f64> = None;

            for table in &page.tables {
                for geometry in &table.rows {
                    let texts = clean_cells(geometry);
                    if texts.iter().all(|t| t.is_empty()) {
                        continue;
                    }
                    if geometry.cells.len() > CELL_COUNT {
                        log::debug!(
                            "RowExtractor: page {} row {} has {} cells, truncating",
                            page.number,
                            row_index,
                            geometry.cells.len()
                        );
                    }

                    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                    let mut row = RowRecord::new(seq, page.number, row_index, &refs);
                    if !row.first_cell().is_empty() {
                        let y = self.locate(page, &row, geometry, previous_y);
                        row.set_position(y);
                        previous_y = Some(y);
                    }

                    rows.push(row);
                    seq += 1;
                    row_index += 1;
                }
            }
        }

        log::debug!("RowExtractor: {} rows from {} pages", rows.len(), doc.page_count());
        rows
    }

    /// Recover a row's vertical position.
    fn locate(
        &self,
        page: &PageLayout,
        row: &RowRecord,
        geometry: &TableRowGeometry,
        previous_y: Option<f64>,
    ) -> f64 {
        let first = row.first_cell();
        if let Some(word) = page.words.iter().find(|w| w.text.contains(first)) {
            return word.top;
        }
        if let Some(bbox) = geometry.cells.first().and_then(|c| c.bbox) {
            return bbox.top;
        }
        previous_y.unwrap_or(0.0) + self.average_row_height
    }
}

impl Default for RowExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn clean_cells(geometry: &TableRowGeometry) -> Vec<String> {
    geometry
        .cells
        .iter()
        .take(CELL_COUNT)
        .map(|cell| cell.text.as_deref().map(strip_watermark).unwrap_or_default())
        .collect()
}
